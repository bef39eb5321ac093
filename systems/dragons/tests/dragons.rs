use std::time::Duration;

use ember_keep_core::{
    ArenaConfig, Command, DragonTemplate, EnemyId, EnemySpawn, EnemyTemplate, Event,
    HatcheryConfig, PathId, ProjectilePayload, ProjectileSpec, WaveIndex,
};
use ember_keep_system_dragons::Dragons;
use ember_keep_world::{self as world, query, World};
use glam::Vec2;

fn arena() -> ArenaConfig {
    ArenaConfig {
        starting_gems: 10,
        paths: vec![vec![Vec2::new(5.0, 0.0), Vec2::new(50.0, 0.0)]],
        hatchery: Some(HatcheryConfig {
            position: Vec2::ZERO,
            gem_cost: 10,
            egg_move_duration: Duration::from_millis(100),
            hatch_time: Duration::from_millis(100),
            dragon: DragonTemplate {
                fire_rate: 2.0,
                retarget_interval: Duration::from_millis(500),
                projectile: ProjectileSpec {
                    speed: 100.0,
                    lifetime: Duration::from_secs(2),
                    payload: ProjectilePayload::Direct { damage: 100.0 },
                },
            },
        }),
        ..ArenaConfig::default()
    }
}

fn spawn(world: &mut World, x: f32, health: f32, log: &mut Vec<Event>) {
    let mut spawn = EnemySpawn::new(
        EnemyTemplate {
            max_health: health,
            move_speed: 0.0,
            ..EnemyTemplate::default()
        },
        PathId::new(0),
    );
    spawn.spawn_point = Some(Vec2::new(x, 0.0));
    world::apply(
        world,
        Command::SpawnEnemy {
            wave: WaveIndex::new(0),
            spawn,
        },
        log,
    );
}

fn run(frames: usize) -> (World, Vec<Event>) {
    let mut world = World::new();
    let mut system = Dragons::new();
    let mut log = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureArena {
            arena: Box::new(arena()),
        },
        &mut log,
    );
    spawn(&mut world, 5.0, 30.0, &mut log);
    spawn(&mut world, 8.0, 60.0, &mut log);
    world::apply(&mut world, Command::PlaceEgg, &mut log);

    for _ in 0..frames {
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut log,
        );
        let mut commands = Vec::new();
        system.handle(
            query::play_state(&world),
            &query::dragon_view(&world),
            &query::enemy_view(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut log);
        }
    }
    (world, log)
}

#[test]
fn dragon_hunts_the_strongest_enemy_first() {
    let (world, log) = run(40);

    let deaths: Vec<EnemyId> = log
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDied { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(deaths, vec![EnemyId::new(1), EnemyId::new(0)]);
    assert_eq!(query::enemy_count(&world), 0);

    let first_assignment = log.iter().find_map(|event| match event {
        Event::DragonRetargeted { target, .. } => Some(*target),
        _ => None,
    });
    assert_eq!(first_assignment, Some(Some(EnemyId::new(1))));
    assert!(
        !log.iter().any(|event| matches!(event, Event::VolleyRejected { .. })),
        "dragons only fire when ready"
    );
}

#[test]
fn dragon_replay_is_deterministic() {
    let first = run(60).1;
    let second = run(60).1;

    assert_eq!(first, second, "replay diverged between runs");
}
