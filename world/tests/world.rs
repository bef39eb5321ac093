use std::time::Duration;

use ember_keep_core::{
    AlchemyConfig, ArenaConfig, BlueprintId, BuildError, BuildSlotConfig, ChestConfig, ChestError,
    ChestId, Command, CraftError, DragonId, DragonTemplate, EnemyId, EnemySpawn, EnemyTemplate,
    Event, FireError, GemSource, HatchError, HatcheryConfig, LootTable, OreError, OreNodeConfig,
    OreNodeId, Outcome, PathId, PlayState, PotionEffect, PotionKind, PotionRecipe,
    ProjectilePayload, ProjectileSource, ProjectileSpec, RecipeId, SlotId, SpawnError,
    TowerBlueprint, TowerId, TowerLevel, UpgradeError, WaveIndex,
};
use ember_keep_world::{self as world, query, World};
use glam::Vec2;

fn configure(arena: ArenaConfig) -> World {
    let mut world = World::new();
    let _ = run(
        &mut world,
        [Command::ConfigureArena {
            arena: Box::new(arena),
        }],
    );
    world
}

fn run(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    run(
        world,
        [Command::Tick {
            dt: Duration::from_millis(millis),
        }],
    )
}

fn spec(payload: ProjectilePayload) -> ProjectileSpec {
    ProjectileSpec {
        speed: 100.0,
        lifetime: Duration::from_secs(5),
        payload,
    }
}

fn level(build_time: Duration, upgrade_cost: u32, sell_refund: u32, payload: ProjectilePayload) -> TowerLevel {
    TowerLevel {
        range: 20.0,
        fire_rate: 1.0,
        targets_per_shot: 1,
        build_time,
        upgrade_cost,
        sell_refund,
        projectile: spec(payload),
    }
}

fn single_slot_arena(levels: Vec<TowerLevel>, starting_gems: u32) -> ArenaConfig {
    ArenaConfig {
        base_max_health: 10.0,
        starting_gems,
        paths: vec![vec![Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)]],
        blueprints: vec![TowerBlueprint {
            name: "test".to_owned(),
            build_cost: 30,
            levels,
        }],
        build_slots: vec![BuildSlotConfig {
            position: Vec2::ZERO,
            blueprints: vec![BlueprintId::new(0)],
        }],
        ..ArenaConfig::default()
    }
}

fn still(health: f32, gem_reward: u32) -> EnemyTemplate {
    EnemyTemplate {
        max_health: health,
        move_speed: 0.0,
        damage_to_base: 1.0,
        gem_reward,
        reach_threshold: 0.1,
    }
}

fn spawn_at(world: &mut World, position: Vec2, template: EnemyTemplate) -> EnemyId {
    let mut spawn = EnemySpawn::new(template, PathId::new(0));
    spawn.spawn_point = Some(position);
    let events = run(
        world,
        [Command::SpawnEnemy {
            wave: WaveIndex::new(0),
            spawn,
        }],
    );
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn build_ready_tower(world: &mut World) -> TowerId {
    let events = run(
        world,
        [Command::BuildTower {
            slot: SlotId::new(0),
            blueprint: BlueprintId::new(0),
        }],
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::TowerConstructionStarted { tower, .. } => Some(*tower),
            _ => None,
        })
        .expect("tower construction started")
}

fn fire(world: &mut World, tower: TowerId, targets: Vec<EnemyId>) -> Vec<Event> {
    run(
        world,
        [Command::FireVolley {
            source: ProjectileSource::Tower(tower),
            targets,
        }],
    )
}

fn damage_of(events: &[Event], id: EnemyId) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDamaged { enemy, amount, .. } if *enemy == id => Some(*amount),
            _ => None,
        })
        .collect()
}

#[test]
fn leaking_enemies_damage_base_and_destroy_it_once() {
    let mut world = configure(ArenaConfig {
        base_max_health: 1.5,
        paths: vec![vec![Vec2::ZERO, Vec2::new(10.0, 0.0)]],
        ..ArenaConfig::default()
    });
    let template = EnemyTemplate {
        move_speed: 10.0,
        ..EnemyTemplate::default()
    };
    for _ in 0..3 {
        let _ = run(
            &mut world,
            [Command::SpawnEnemy {
                wave: WaveIndex::new(2),
                spawn: EnemySpawn::new(template, PathId::new(0)),
            }],
        );
    }

    let first = tick(&mut world, 1000);
    assert!(!first
        .iter()
        .any(|event| matches!(event, Event::EnemyReachedBase { .. })));

    let second = tick(&mut world, 1000);
    let leaks = second
        .iter()
        .filter(|event| matches!(event, Event::EnemyReachedBase { wave, .. } if *wave == WaveIndex::new(2)))
        .count();
    let destroyed = second
        .iter()
        .filter(|event| matches!(event, Event::BaseDestroyed))
        .count();

    assert_eq!(leaks, 3);
    assert_eq!(destroyed, 1);
    assert_eq!(query::base_health(&world), 0.0);
    assert_eq!(query::enemy_count(&world), 0);
}

#[test]
fn spawning_on_unknown_path_is_rejected() {
    let mut world = configure(ArenaConfig::default());
    let events = run(
        &mut world,
        [Command::SpawnEnemy {
            wave: WaveIndex::new(1),
            spawn: EnemySpawn::new(EnemyTemplate::default(), PathId::new(4)),
        }],
    );

    assert_eq!(
        events,
        vec![Event::EnemySpawnRejected {
            wave: WaveIndex::new(1),
            reason: SpawnError::UnknownPath,
        }]
    );
}

#[test]
fn spawning_after_conclusion_is_rejected() {
    let mut world = configure(ArenaConfig {
        paths: vec![vec![Vec2::ZERO, Vec2::new(5.0, 0.0)]],
        ..ArenaConfig::default()
    });
    let events = run(
        &mut world,
        [
            Command::ConcludeGame {
                outcome: Outcome::Victory,
            },
            Command::SpawnEnemy {
                wave: WaveIndex::new(2),
                spawn: EnemySpawn::new(EnemyTemplate::default(), PathId::new(0)),
            },
        ],
    );

    assert_eq!(
        events,
        vec![
            Event::GameConcluded {
                outcome: Outcome::Victory
            },
            Event::EnemySpawnRejected {
                wave: WaveIndex::new(2),
                reason: SpawnError::GameOver,
            },
        ]
    );
    assert!(query::enemy_view(&world).is_empty());
}

#[test]
fn slight_health_multiplier_still_scales_health() {
    let mut world = configure(ArenaConfig {
        paths: vec![vec![Vec2::ZERO, Vec2::new(5.0, 0.0)]],
        ..ArenaConfig::default()
    });
    let mut spawn = EnemySpawn::new(still(1000.0, 0), PathId::new(0));
    spawn.health_multiplier = 1.0005;
    let events = run(
        &mut world,
        [Command::SpawnEnemy {
            wave: WaveIndex::new(0),
            spawn,
        }],
    );

    match events.as_slice() {
        [Event::EnemySpawned { max_health, .. }] => {
            assert!((*max_health - 1000.5).abs() < 1e-3, "max health {max_health}");
        }
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

#[test]
fn tower_lifecycle_spends_and_refunds_gems() {
    let direct = ProjectilePayload::Direct { damage: 1.0 };
    let mut world = configure(single_slot_arena(
        vec![
            level(Duration::from_secs(1), 20, 10, direct),
            level(Duration::from_secs(2), 0, 40, direct),
        ],
        60,
    ));

    let tower = build_ready_tower(&mut world);
    assert_eq!(query::gems(&world), 30);
    assert_eq!(query::tower_at(&world, SlotId::new(0)), Some(tower));

    let occupied = run(
        &mut world,
        [Command::BuildTower {
            slot: SlotId::new(0),
            blueprint: BlueprintId::new(0),
        }],
    );
    assert!(occupied.contains(&Event::BuildRejected {
        slot: SlotId::new(0),
        blueprint: BlueprintId::new(0),
        reason: BuildError::Occupied,
    }));

    let early = run(&mut world, [Command::UpgradeTower { tower }]);
    assert_eq!(
        early,
        vec![Event::UpgradeRejected {
            tower,
            reason: UpgradeError::UnderConstruction,
        }]
    );

    let built = tick(&mut world, 1000);
    assert!(built.contains(&Event::TowerBuilt { tower, level: 0 }));

    let upgraded = run(&mut world, [Command::UpgradeTower { tower }]);
    assert!(upgraded.contains(&Event::TowerConstructionStarted {
        tower,
        slot: SlotId::new(0),
        blueprint: BlueprintId::new(0),
        level: 1,
    }));
    assert_eq!(query::gems(&world), 10);
    let snapshot = query::tower_view(&world).into_vec()[0];
    assert!(!snapshot.built);
    assert_eq!(snapshot.level, 1);

    let _ = tick(&mut world, 2000);
    let maxed = run(&mut world, [Command::UpgradeTower { tower }]);
    assert_eq!(
        maxed,
        vec![Event::UpgradeRejected {
            tower,
            reason: UpgradeError::MaxLevel,
        }]
    );

    let sold = run(&mut world, [Command::SellTower { tower }]);
    assert!(sold.contains(&Event::TowerSold {
        tower,
        slot: SlotId::new(0),
        refund: 40,
    }));
    assert_eq!(query::gems(&world), 50);
    assert_eq!(query::tower_at(&world, SlotId::new(0)), None);
}

#[test]
fn build_requests_validate_slot_blueprint_and_wallet() {
    let direct = ProjectilePayload::Direct { damage: 1.0 };
    let mut arena = single_slot_arena(vec![level(Duration::ZERO, 0, 0, direct)], 10);
    arena.blueprints.push(TowerBlueprint {
        name: "other".to_owned(),
        build_cost: 1,
        levels: vec![level(Duration::ZERO, 0, 0, direct)],
    });
    let mut world = configure(arena);

    let events = run(
        &mut world,
        [
            Command::BuildTower {
                slot: SlotId::new(3),
                blueprint: BlueprintId::new(0),
            },
            Command::BuildTower {
                slot: SlotId::new(0),
                blueprint: BlueprintId::new(1),
            },
            Command::BuildTower {
                slot: SlotId::new(0),
                blueprint: BlueprintId::new(0),
            },
        ],
    );

    let reasons: Vec<BuildError> = events
        .iter()
        .filter_map(|event| match event {
            Event::BuildRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            BuildError::MissingSlot,
            BuildError::BlueprintUnavailable,
            BuildError::InsufficientGems,
        ]
    );
    assert_eq!(query::gems(&world), 10);
}

#[test]
fn volley_kills_enemy_and_credits_reward() {
    let mut world = configure(single_slot_arena(
        vec![level(
            Duration::ZERO,
            0,
            0,
            ProjectilePayload::Direct { damage: 20.0 },
        )],
        30,
    ));
    let tower = build_ready_tower(&mut world);
    let enemy = spawn_at(&mut world, Vec2::new(5.0, 0.0), still(10.0, 3));

    let launched = fire(&mut world, tower, vec![enemy]);
    assert!(matches!(
        launched.as_slice(),
        [Event::ProjectileLaunched { target, .. }] if *target == enemy
    ));

    let cooling = fire(&mut world, tower, vec![enemy]);
    assert_eq!(
        cooling,
        vec![Event::VolleyRejected {
            source: ProjectileSource::Tower(tower),
            reason: FireError::CoolingDown,
        }]
    );

    let impact = tick(&mut world, 100);
    assert!(impact.contains(&Event::EnemyDied {
        enemy,
        wave: WaveIndex::new(0),
        gem_reward: 3,
    }));
    assert_eq!(query::gems(&world), 3);
    assert_eq!(query::projectiles_in_flight(&world), 0);
}

#[test]
fn volley_without_live_targets_is_rejected() {
    let mut world = configure(single_slot_arena(
        vec![level(Duration::ZERO, 0, 0, ProjectilePayload::Direct { damage: 1.0 })],
        30,
    ));
    let tower = build_ready_tower(&mut world);

    let events = fire(&mut world, tower, vec![EnemyId::new(99)]);

    assert_eq!(
        events,
        vec![Event::VolleyRejected {
            source: ProjectileSource::Tower(tower),
            reason: FireError::NoTargets,
        }]
    );
}

#[test]
fn mortar_shell_damages_everything_in_radius() {
    let mut world = configure(single_slot_arena(
        vec![level(
            Duration::ZERO,
            0,
            0,
            ProjectilePayload::Mortar {
                damage: 4.0,
                radius: 1.0,
                flight_time: Duration::from_millis(500),
            },
        )],
        30,
    ));
    let tower = build_ready_tower(&mut world);
    let near = spawn_at(&mut world, Vec2::new(5.0, 0.0), still(10.0, 0));
    let close = spawn_at(&mut world, Vec2::new(5.5, 0.0), still(10.0, 0));
    let far = spawn_at(&mut world, Vec2::new(9.0, 0.0), still(10.0, 0));

    let _ = fire(&mut world, tower, vec![near]);
    let events = tick(&mut world, 500);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileImpact { hits: 2, .. })));
    assert_eq!(damage_of(&events, near), vec![4.0]);
    assert_eq!(damage_of(&events, close), vec![4.0]);
    assert!(damage_of(&events, far).is_empty());
}

#[test]
fn fire_bolt_splashes_and_burns_with_multipliers() {
    let mut world = configure(single_slot_arena(
        vec![level(
            Duration::ZERO,
            0,
            0,
            ProjectilePayload::Fire {
                damage: 10.0,
                burn_duration: Duration::from_secs(2),
                burn_dps: 2.0,
                splash_radius: 2.0,
                splash_damage_multiplier: 0.5,
                splash_burn_multiplier: 0.5,
            },
        )],
        30,
    ));
    let tower = build_ready_tower(&mut world);
    let target = spawn_at(&mut world, Vec2::new(5.0, 0.0), still(100.0, 0));
    let splashed = spawn_at(&mut world, Vec2::new(6.0, 0.0), still(100.0, 0));

    let _ = fire(&mut world, tower, vec![target]);
    let impact = tick(&mut world, 100);
    assert_eq!(damage_of(&impact, target), vec![10.0]);
    assert_eq!(damage_of(&impact, splashed), vec![5.0]);

    let burn = tick(&mut world, 500);
    assert_eq!(damage_of(&burn, target), vec![1.0]);
    assert_eq!(damage_of(&burn, splashed), vec![0.5]);
}

#[test]
fn slow_projectile_reduces_enemy_speed() {
    let mut world = configure(single_slot_arena(
        vec![level(
            Duration::ZERO,
            0,
            0,
            ProjectilePayload::Slow {
                damage: 0.0,
                factor: 0.5,
                duration: Duration::from_secs(3),
            },
        )],
        30,
    ));
    let tower = build_ready_tower(&mut world);
    let enemy = spawn_at(
        &mut world,
        Vec2::new(5.0, 0.0),
        EnemyTemplate {
            move_speed: 2.0,
            ..still(10.0, 0)
        },
    );

    let _ = fire(&mut world, tower, vec![enemy]);
    let events = tick(&mut world, 100);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ProjectileImpact { hits: 1, .. })));
    assert!(damage_of(&events, enemy).is_empty());

    let view = query::enemy_view(&world);
    assert_eq!(view.get(enemy).map(|snapshot| snapshot.speed), Some(1.0));
}

#[test]
fn ore_node_depletes_after_max_hits() {
    let mut world = configure(ArenaConfig {
        ore_nodes: vec![OreNodeConfig {
            position: Vec2::ZERO,
            max_hits: 2,
            gems_per_hit: 5,
        }],
        ..ArenaConfig::default()
    });
    let node = OreNodeId::new(0);

    let events = run(
        &mut world,
        [
            Command::MineOre { node },
            Command::MineOre { node },
            Command::MineOre { node },
        ],
    );

    assert!(events.contains(&Event::OreDepleted { node }));
    assert!(events.contains(&Event::OreRejected {
        node,
        reason: OreError::Depleted,
    }));
    assert_eq!(query::gems(&world), 10);
    assert_eq!(query::ore_hits_remaining(&world, node), Some(0));
}

#[test]
fn crafted_lightning_potion_damages_and_paralyses() {
    let mut world = configure(ArenaConfig {
        starting_gems: 10,
        paths: vec![vec![Vec2::ZERO, Vec2::new(100.0, 0.0)]],
        alchemy: Some(AlchemyConfig {
            recipes: vec![PotionRecipe {
                kind: PotionKind::Lightning,
                gem_cost: 10,
                craft_time: Duration::from_secs(1),
            }],
            lightning: PotionEffect {
                damage: 10.0,
                paralyze_duration: Duration::from_millis(600),
            },
        }),
        ..ArenaConfig::default()
    });
    let recipe = RecipeId::new(0);

    let started = run(
        &mut world,
        [Command::CraftPotion { recipe }, Command::CraftPotion { recipe }],
    );
    assert!(started.contains(&Event::CraftRejected {
        recipe,
        reason: CraftError::Busy,
    }));
    assert_eq!(query::gems(&world), 0);

    let crafted = tick(&mut world, 1000);
    assert!(crafted.contains(&Event::PotionCrafted {
        kind: PotionKind::Lightning
    }));
    assert_eq!(query::potions(&world, PotionKind::Lightning), 1);

    let enemy = spawn_at(
        &mut world,
        Vec2::new(1.0, 0.0),
        EnemyTemplate {
            move_speed: 3.0,
            ..still(30.0, 0)
        },
    );
    let used = run(
        &mut world,
        [Command::UsePotion {
            kind: PotionKind::Lightning,
        }],
    );
    assert!(used.contains(&Event::PotionUsed {
        kind: PotionKind::Lightning,
        affected: 1,
    }));

    let paralysed = query::enemy_view(&world);
    let snapshot = paralysed.get(enemy).copied().expect("enemy alive");
    assert_eq!(snapshot.health, 20.0);
    assert_eq!(snapshot.speed, 0.0);

    let _ = tick(&mut world, 600);
    let recovered = query::enemy_view(&world);
    assert_eq!(recovered.get(enemy).map(|snapshot| snapshot.speed), Some(3.0));
}

#[test]
fn hatchery_produces_dragon_that_hunts_until_target_dies() {
    let mut world = configure(ArenaConfig {
        starting_gems: 15,
        paths: vec![vec![Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)]],
        hatchery: Some(HatcheryConfig {
            position: Vec2::ZERO,
            gem_cost: 15,
            egg_move_duration: Duration::from_millis(500),
            hatch_time: Duration::from_secs(1),
            dragon: DragonTemplate {
                fire_rate: 1.0,
                retarget_interval: Duration::from_secs(2),
                projectile: spec(ProjectilePayload::Direct { damage: 100.0 }),
            },
        }),
        ..ArenaConfig::default()
    });

    let placed = run(&mut world, [Command::PlaceEgg, Command::PlaceEgg]);
    assert!(placed.contains(&Event::HatchStarted {
        duration: Duration::from_millis(1500)
    }));
    assert!(placed.contains(&Event::HatchRejected {
        reason: HatchError::Busy
    }));

    let hatched = tick(&mut world, 1500);
    let dragon = DragonId::new(0);
    assert!(hatched.contains(&Event::DragonHatched {
        dragon,
        position: Vec2::ZERO,
    }));

    let enemy = spawn_at(&mut world, Vec2::new(5.0, 0.0), still(50.0, 0));
    let assigned = run(
        &mut world,
        [
            Command::AssignDragonTarget {
                dragon,
                target: Some(enemy),
            },
            Command::FireVolley {
                source: ProjectileSource::Dragon(dragon),
                targets: vec![enemy],
            },
        ],
    );
    assert!(assigned.contains(&Event::DragonRetargeted {
        dragon,
        target: Some(enemy),
    }));

    let _ = tick(&mut world, 100);
    assert_eq!(query::enemy_count(&world), 0);

    let _ = tick(&mut world, 500);
    let snapshot = query::dragon_view(&world).into_vec()[0];
    assert_eq!(snapshot.target, None);
    assert_eq!(snapshot.ready_in, Duration::from_millis(900));
    assert_eq!(snapshot.retarget_in, Duration::from_millis(1500));
}

#[test]
fn chests_open_once() {
    let loot = LootTable {
        min_gems: 1,
        max_gems: 2,
        gem_value: 5,
        min_potions: 0,
        max_potions: 0,
        potion: PotionKind::Lightning,
        delay: Duration::ZERO,
    };
    let mut world = configure(ArenaConfig {
        chests: vec![ChestConfig {
            position: Vec2::ZERO,
            loot,
        }],
        ..ArenaConfig::default()
    });
    let chest = ChestId::new(0);

    let events = run(
        &mut world,
        [
            Command::OpenChest { chest },
            Command::OpenChest { chest },
            Command::OpenChest {
                chest: ChestId::new(1),
            },
        ],
    );

    assert_eq!(
        events,
        vec![
            Event::ChestOpened { chest, loot },
            Event::ChestRejected {
                chest,
                reason: ChestError::AlreadyOpened,
            },
            Event::ChestRejected {
                chest: ChestId::new(1),
                reason: ChestError::MissingChest,
            },
        ]
    );
    assert!(query::chest_opened(&world, chest));
}

#[test]
fn first_conclusion_wins() {
    let mut world = configure(ArenaConfig::default());

    let events = run(
        &mut world,
        [
            Command::ConcludeGame {
                outcome: Outcome::Defeat,
            },
            Command::ConcludeGame {
                outcome: Outcome::Victory,
            },
            Command::GrantGems {
                amount: 4,
                source: GemSource::Script,
            },
        ],
    );

    assert_eq!(
        events,
        vec![
            Event::GameConcluded {
                outcome: Outcome::Defeat
            },
            Event::GemsChanged { total: 4, delta: 4 },
        ]
    );
    assert_eq!(
        query::play_state(&world),
        PlayState::Concluded(Outcome::Defeat)
    );
}
