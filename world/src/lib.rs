#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Ember Keep.

mod dragons;
mod economy;
mod enemies;
mod projectiles;
mod towers;

use std::time::Duration;

use ember_keep_core::{
    ArenaConfig, BlueprintId, BuildError, ChestError, ChestId, Command, CraftError, DragonId,
    EnemyId, EnemySpawn, Event, FireError, HatchError, OreError, OreNodeId, Outcome, PlayState,
    PotionEffect, PotionError, PotionKind, ProjectilePayload, ProjectileSource, RecipeId,
    SellError, SlotId, SpawnError, TowerId, UpgradeError, WaveIndex,
};
use glam::Vec2;

use dragons::DragonRoster;
use economy::{CraftJob, HatchJob, Inventory, OreState, Wallet};
use enemies::{Enemy, EnemyRoster, StatusEffects};
use projectiles::{ProjectileSet, Resolution, Shooter};
use towers::TowerRegistry;

/// Health multipliers closer to one than this leave enemy health untouched.
const HEALTH_MULTIPLIER_EPSILON: f32 = 1e-6;

/// Smallest health multiplier a wave may apply.
const MIN_HEALTH_MULTIPLIER: f32 = 0.01;

/// Splash radii at or below this value disable fire splash.
const MIN_SPLASH_RADIUS: f32 = 0.01;

#[derive(Debug)]
struct Base {
    health: f32,
    max_health: f32,
    destroyed: bool,
}

impl Base {
    fn new(max_health: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            destroyed: false,
        }
    }

    fn take_damage(&mut self, amount: f32, out_events: &mut Vec<Event>) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
        out_events.push(Event::BaseHealthChanged {
            current: self.health,
            max: self.max_health,
        });

        if self.health <= 0.0 && !self.destroyed {
            self.destroyed = true;
            tracing::info!("base destroyed");
            out_events.push(Event::BaseDestroyed);
        }
    }
}

/// Represents the authoritative Ember Keep world state.
#[derive(Debug)]
pub struct World {
    arena: ArenaConfig,
    play_state: PlayState,
    base: Base,
    wallet: Wallet,
    inventory: Inventory,
    enemies: EnemyRoster,
    towers: TowerRegistry,
    dragons: DragonRoster,
    projectiles: ProjectileSet,
    ore: Vec<OreState>,
    chests_opened: Vec<bool>,
    crafting: Option<CraftJob>,
    hatching: Option<HatchJob>,
    elapsed: Duration,
}

impl World {
    /// Creates a new world with an empty default arena.
    #[must_use]
    pub fn new() -> Self {
        Self::with_arena(ArenaConfig::default())
    }

    fn with_arena(arena: ArenaConfig) -> Self {
        Self {
            play_state: PlayState::Active,
            base: Base::new(arena.base_max_health),
            wallet: Wallet::with_balance(arena.starting_gems),
            inventory: Inventory::default(),
            enemies: EnemyRoster::default(),
            towers: TowerRegistry::new(arena.build_slots.len()),
            dragons: DragonRoster::default(),
            projectiles: ProjectileSet::default(),
            ore: vec![OreState::default(); arena.ore_nodes.len()],
            chests_opened: vec![false; arena.chests.len()],
            crafting: None,
            hatching: None,
            elapsed: Duration::ZERO,
            arena,
        }
    }

    fn is_concluded(&self) -> bool {
        matches!(self.play_state, PlayState::Concluded(_))
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.is_concluded() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for tower in self.towers.iter_mut() {
            if tower.advance(dt) {
                out_events.push(Event::TowerBuilt {
                    tower: tower.id,
                    level: tower.level,
                });
            }
        }

        for dragon in self.dragons.iter_mut() {
            dragon.advance(dt);
        }

        self.advance_crafting(dt, out_events);
        self.advance_hatching(dt, out_events);
        self.advance_status_effects(dt, out_events);
        self.advance_enemies(dt, out_events);
        self.advance_projectiles(dt, out_events);
    }

    fn advance_crafting(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(job) = self.crafting.as_mut() else {
            return;
        };
        if !job.advance(dt) {
            return;
        }

        let kind = job.kind;
        self.crafting = None;
        out_events.push(Event::PotionCrafted { kind });
        self.inventory.add(kind, 1, out_events);
    }

    fn advance_hatching(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(job) = self.hatching.as_mut() else {
            return;
        };
        if !job.advance(dt) {
            return;
        }

        self.hatching = None;
        let Some(hatchery) = self.arena.hatchery else {
            return;
        };
        let dragon = self.dragons.hatch(hatchery.position, hatchery.dragon);
        tracing::info!(dragon = dragon.get(), "dragon hatched");
        out_events.push(Event::DragonHatched {
            dragon,
            position: hatchery.position,
        });
    }

    fn advance_status_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let interval = self.arena.burn_tick_interval;
        let mut burns = Vec::new();
        for enemy in self.enemies.iter_mut() {
            let damage = enemy.effects.advance(dt, interval);
            if damage > 0.0 {
                burns.push((enemy.id, damage));
            }
        }

        for (enemy, damage) in burns {
            let _ = self.damage_enemy(enemy, damage, out_events);
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut leaked = Vec::new();
        for enemy in self.enemies.iter_mut() {
            let Some(waypoints) = self.arena.path(enemy.path) else {
                continue;
            };
            if enemy.advance_along(waypoints, dt) {
                leaked.push(enemy.id);
            }
        }

        for id in leaked {
            let Some(enemy) = self.enemies.remove(id) else {
                continue;
            };
            self.dragons.forget_target(id);
            out_events.push(Event::EnemyReachedBase {
                enemy: id,
                wave: enemy.wave,
                damage: enemy.damage_to_base,
            });
            self.base.take_damage(enemy.damage_to_base, out_events);
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for resolution in self.projectiles.advance(dt, &self.enemies) {
            match resolution {
                Resolution::Expired { projectile } => {
                    out_events.push(Event::ProjectileExpired { projectile });
                }
                Resolution::Impact {
                    projectile,
                    target,
                    position,
                    payload,
                } => {
                    let victims = self.victims(target, position, payload);
                    out_events.push(Event::ProjectileImpact {
                        projectile,
                        position,
                        hits: u32::try_from(victims.len()).unwrap_or(u32::MAX),
                    });
                    for victim in victims {
                        self.apply_payload(victim, victim == target, payload, out_events);
                    }
                }
            }
        }
    }

    fn victims(&self, target: EnemyId, position: Vec2, payload: ProjectilePayload) -> Vec<EnemyId> {
        let single = || {
            if self.enemies.contains(target) {
                vec![target]
            } else {
                Vec::new()
            }
        };

        match payload {
            ProjectilePayload::Mortar { radius, .. } => self.enemies.within(position, radius),
            ProjectilePayload::Fire { splash_radius, .. } if splash_radius > MIN_SPLASH_RADIUS => {
                self.enemies.within(position, splash_radius)
            }
            _ => single(),
        }
    }

    fn apply_payload(
        &mut self,
        enemy: EnemyId,
        primary: bool,
        payload: ProjectilePayload,
        out_events: &mut Vec<Event>,
    ) {
        match payload {
            ProjectilePayload::Direct { damage } | ProjectilePayload::Mortar { damage, .. } => {
                let _ = self.damage_enemy(enemy, damage, out_events);
            }
            ProjectilePayload::Slow {
                damage,
                factor,
                duration,
            } => {
                if self.damage_enemy(enemy, damage, out_events) {
                    return;
                }
                self.with_effects(enemy, |effects| effects.apply_slow(factor, duration));
            }
            ProjectilePayload::Frost {
                damage,
                factor,
                duration,
                stacks_to_freeze,
                freeze_duration,
            } => {
                if self.damage_enemy(enemy, damage, out_events) {
                    return;
                }
                self.with_effects(enemy, |effects| {
                    effects.apply_frost(factor, duration, stacks_to_freeze, freeze_duration);
                });
            }
            ProjectilePayload::Fire {
                damage,
                burn_duration,
                burn_dps,
                splash_damage_multiplier,
                splash_burn_multiplier,
                ..
            } => {
                let (damage, burn_duration, burn_dps) = if primary {
                    (damage, burn_duration, burn_dps)
                } else {
                    let burn_scale = splash_burn_multiplier.max(0.0);
                    (
                        damage * splash_damage_multiplier,
                        burn_duration.mul_f32(burn_scale),
                        burn_dps * burn_scale,
                    )
                };
                if self.damage_enemy(enemy, damage, out_events) {
                    return;
                }
                self.with_effects(enemy, |effects| effects.apply_burn(burn_duration, burn_dps));
            }
        }
    }

    fn with_effects(&mut self, enemy: EnemyId, apply: impl FnOnce(&mut StatusEffects)) {
        if let Some(enemy) = self.enemies.get_mut(enemy) {
            apply(&mut enemy.effects);
        }
    }

    /// Deals damage and reports whether the enemy died from it.
    fn damage_enemy(&mut self, id: EnemyId, amount: f32, out_events: &mut Vec<Event>) -> bool {
        if amount <= 0.0 {
            return false;
        }
        let Some(enemy) = self.enemies.get_mut(id) else {
            return false;
        };

        let died = enemy.take_damage(amount);
        out_events.push(Event::EnemyDamaged {
            enemy: id,
            amount,
            remaining: enemy.health,
        });

        if died {
            if let Some(enemy) = self.enemies.remove(id) {
                self.dragons.forget_target(id);
                out_events.push(Event::EnemyDied {
                    enemy: id,
                    wave: enemy.wave,
                    gem_reward: enemy.gem_reward,
                });
                self.wallet.credit(enemy.gem_reward, out_events);
            }
        }
        died
    }

    fn spawn_enemy(&mut self, wave: WaveIndex, spawn: EnemySpawn, out_events: &mut Vec<Event>) {
        let reject = |reason: SpawnError, out_events: &mut Vec<Event>| {
            tracing::debug!(wave = wave.get(), ?reason, "enemy spawn rejected");
            out_events.push(Event::EnemySpawnRejected { wave, reason });
        };

        if self.is_concluded() {
            reject(SpawnError::GameOver, out_events);
            return;
        }
        let Some(&start) = self.arena.path(spawn.path).and_then(<[Vec2]>::first) else {
            reject(SpawnError::UnknownPath, out_events);
            return;
        };

        let template = spawn.template;
        let mut move_speed = template.move_speed;
        if spawn.speed_multiplier != 1.0 {
            move_speed *= spawn.speed_multiplier;
        }

        let mut max_health = template.max_health;
        if (spawn.health_multiplier - 1.0).abs() > HEALTH_MULTIPLIER_EPSILON {
            let multiplier = spawn.health_multiplier.max(MIN_HEALTH_MULTIPLIER);
            max_health = (max_health * multiplier).max(1.0);
        }

        let id = self.enemies.allocate_id();
        let position = spawn.spawn_point.unwrap_or(start);
        self.enemies.insert(Enemy {
            id,
            wave,
            path: spawn.path,
            waypoint: 0,
            position,
            health: max_health,
            max_health,
            move_speed,
            damage_to_base: template.damage_to_base,
            gem_reward: template.gem_reward,
            reach_threshold: template.reach_threshold,
            effects: StatusEffects::default(),
        });
        out_events.push(Event::EnemySpawned {
            enemy: id,
            wave,
            position,
            max_health,
        });
    }

    fn build_tower(&mut self, slot: SlotId, blueprint: BlueprintId, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            if self.is_concluded() {
                break 'checks BuildError::GameOver;
            }
            let Some(slot_config) = self.arena.build_slots.get(slot.get() as usize) else {
                break 'checks BuildError::MissingSlot;
            };
            if self.towers.occupant(slot).is_some() {
                break 'checks BuildError::Occupied;
            }
            if !slot_config.blueprints.contains(&blueprint) {
                break 'checks BuildError::BlueprintUnavailable;
            }
            let Some(config) = self.arena.blueprint(blueprint) else {
                break 'checks BuildError::BlueprintUnavailable;
            };
            let Some(&stats) = config.level(0) else {
                break 'checks BuildError::BlueprintUnavailable;
            };
            if !self.wallet.spend(config.build_cost, out_events) {
                break 'checks BuildError::InsufficientGems;
            }

            let tower = self
                .towers
                .insert(slot, blueprint, stats, slot_config.position);
            tracing::debug!(tower = tower.get(), slot = slot.get(), "tower construction started");
            out_events.push(Event::TowerConstructionStarted {
                tower,
                slot,
                blueprint,
                level: 0,
            });
            return;
        };

        tracing::debug!(slot = slot.get(), ?reason, "build rejected");
        out_events.push(Event::BuildRejected {
            slot,
            blueprint,
            reason,
        });
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            if self.is_concluded() {
                break 'checks UpgradeError::GameOver;
            }
            let Some(state) = self.towers.get(tower) else {
                break 'checks UpgradeError::MissingTower;
            };
            if !state.is_built() {
                break 'checks UpgradeError::UnderConstruction;
            }
            let next = state.level.saturating_add(1);
            let Some(&stats) = self
                .arena
                .blueprint(state.blueprint)
                .and_then(|config| config.level(next))
            else {
                break 'checks UpgradeError::MaxLevel;
            };
            if !self.wallet.spend(state.stats.upgrade_cost, out_events) {
                break 'checks UpgradeError::InsufficientGems;
            }

            if let Some(state) = self.towers.get_mut(tower) {
                state.begin_level(next, stats);
                out_events.push(Event::TowerConstructionStarted {
                    tower,
                    slot: state.slot,
                    blueprint: state.blueprint,
                    level: next,
                });
            }
            return;
        };

        tracing::debug!(tower = tower.get(), ?reason, "upgrade rejected");
        out_events.push(Event::UpgradeRejected { tower, reason });
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            if self.is_concluded() {
                break 'checks SellError::GameOver;
            }
            let Some(state) = self.towers.remove(tower) else {
                break 'checks SellError::MissingTower;
            };

            let refund = state.stats.sell_refund;
            out_events.push(Event::TowerSold {
                tower,
                slot: state.slot,
                refund,
            });
            self.wallet.credit(refund, out_events);
            return;
        };

        tracing::debug!(tower = tower.get(), ?reason, "sell rejected");
        out_events.push(Event::SellRejected { tower, reason });
    }

    fn shooter(&mut self, source: ProjectileSource) -> Result<Shooter, FireError> {
        if self.is_concluded() {
            return Err(FireError::GameOver);
        }

        match source {
            ProjectileSource::Tower(id) => {
                let tower = self.towers.get(id).ok_or(FireError::MissingSource)?;
                if !tower.is_built() {
                    return Err(FireError::UnderConstruction);
                }
                if !tower.cooldown.is_zero() {
                    return Err(FireError::CoolingDown);
                }
                Ok(Shooter {
                    source,
                    position: tower.position,
                    spec: tower.stats.projectile,
                    max_targets: tower.stats.targets_per_shot.max(1) as usize,
                })
            }
            ProjectileSource::Dragon(id) => {
                let dragon = self.dragons.get_mut(id).ok_or(FireError::MissingSource)?;
                if !dragon.cooldown.is_zero() {
                    return Err(FireError::CoolingDown);
                }
                Ok(Shooter {
                    source,
                    position: dragon.position,
                    spec: dragon.template.projectile,
                    max_targets: 1,
                })
            }
        }
    }

    fn fire_volley(
        &mut self,
        source: ProjectileSource,
        targets: &[EnemyId],
        out_events: &mut Vec<Event>,
    ) {
        let shooter = match self.shooter(source) {
            Ok(shooter) => shooter,
            Err(reason) => {
                tracing::debug!(?source, ?reason, "volley rejected");
                out_events.push(Event::VolleyRejected { source, reason });
                return;
            }
        };

        let mut aimed: Vec<(EnemyId, Vec2)> = Vec::with_capacity(shooter.max_targets);
        for &target in targets {
            if aimed.len() >= shooter.max_targets {
                break;
            }
            if aimed.iter().any(|(id, _)| *id == target) {
                continue;
            }
            if let Some(enemy) = self.enemies.get(target) {
                aimed.push((target, enemy.position));
            }
        }

        if aimed.is_empty() {
            out_events.push(Event::VolleyRejected {
                source,
                reason: FireError::NoTargets,
            });
            return;
        }

        for (target, position) in aimed {
            let projectile = self
                .projectiles
                .launch(shooter.position, target, position, shooter.spec);
            out_events.push(Event::ProjectileLaunched {
                projectile,
                source: shooter.source,
                target,
            });
        }

        match source {
            ProjectileSource::Tower(id) => {
                if let Some(tower) = self.towers.get_mut(id) {
                    tower.cooldown = tower.stats.fire_interval();
                }
            }
            ProjectileSource::Dragon(id) => {
                if let Some(dragon) = self.dragons.get_mut(id) {
                    dragon.cooldown = dragon.template.fire_interval();
                }
            }
        }
    }

    fn assign_dragon_target(
        &mut self,
        dragon: DragonId,
        target: Option<EnemyId>,
        out_events: &mut Vec<Event>,
    ) {
        let target = target.filter(|enemy| self.enemies.contains(*enemy));
        let Some(state) = self.dragons.get_mut(dragon) else {
            tracing::debug!(dragon = dragon.get(), "target assigned to unknown dragon");
            return;
        };

        state.target = target;
        state.retarget = state.template.retarget_interval;
        out_events.push(Event::DragonRetargeted { dragon, target });
    }

    fn mine_ore(&mut self, node: OreNodeId, out_events: &mut Vec<Event>) {
        let index = node.get() as usize;
        let reason = 'checks: {
            let (Some(config), Some(state)) =
                (self.arena.ore_nodes.get(index), self.ore.get_mut(index))
            else {
                break 'checks OreError::MissingNode;
            };
            if state.hits >= config.max_hits {
                break 'checks OreError::Depleted;
            }

            state.hits += 1;
            let hits_remaining = config.max_hits - state.hits;
            let gems = config.gems_per_hit;
            out_events.push(Event::OreMined {
                node,
                gems,
                hits_remaining,
            });
            self.wallet.credit(gems, out_events);
            if hits_remaining == 0 {
                out_events.push(Event::OreDepleted { node });
            }
            return;
        };

        tracing::debug!(node = node.get(), ?reason, "mining rejected");
        out_events.push(Event::OreRejected { node, reason });
    }

    fn craft_potion(&mut self, recipe: RecipeId, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            let Some(alchemy) = self.arena.alchemy.as_ref() else {
                break 'checks CraftError::MissingStation;
            };
            if self.crafting.is_some() {
                break 'checks CraftError::Busy;
            }
            let Some(config) = alchemy.recipes.get(recipe.get() as usize) else {
                break 'checks CraftError::UnknownRecipe;
            };
            if !self.wallet.spend(config.gem_cost, out_events) {
                break 'checks CraftError::InsufficientGems;
            }

            let job = CraftJob::new(config.kind, config.craft_time);
            out_events.push(Event::CraftStarted {
                recipe,
                duration: job.remaining,
            });
            self.crafting = Some(job);
            return;
        };

        tracing::debug!(recipe = recipe.get(), ?reason, "crafting rejected");
        out_events.push(Event::CraftRejected { recipe, reason });
    }

    fn use_potion(&mut self, kind: PotionKind, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            if self.is_concluded() {
                break 'checks PotionError::GameOver;
            }
            if !self.inventory.take(kind, out_events) {
                break 'checks PotionError::NoneHeld;
            }

            let effect = self
                .arena
                .alchemy
                .as_ref()
                .map_or_else(PotionEffect::default, |alchemy| alchemy.lightning);
            let struck: Vec<EnemyId> = self.enemies.iter().map(|enemy| enemy.id).collect();
            out_events.push(Event::PotionUsed {
                kind,
                affected: u32::try_from(struck.len()).unwrap_or(u32::MAX),
            });

            match kind {
                PotionKind::Lightning => {
                    for enemy in struck {
                        self.with_effects(enemy, |effects| {
                            effects.apply_paralysis(effect.paralyze_duration);
                        });
                        let _ = self.damage_enemy(enemy, effect.damage, out_events);
                    }
                }
            }
            return;
        };

        tracing::debug!(?kind, ?reason, "potion rejected");
        out_events.push(Event::PotionRejected { kind, reason });
    }

    fn place_egg(&mut self, out_events: &mut Vec<Event>) {
        let reason = 'checks: {
            let Some(hatchery) = self.arena.hatchery else {
                break 'checks HatchError::MissingHatchery;
            };
            if self.hatching.is_some() {
                break 'checks HatchError::Busy;
            }
            if !self.wallet.spend(hatchery.gem_cost, out_events) {
                break 'checks HatchError::InsufficientGems;
            }

            let job = HatchJob::new(hatchery.egg_move_duration, hatchery.hatch_time);
            out_events.push(Event::HatchStarted {
                duration: job.total(),
            });
            self.hatching = Some(job);
            return;
        };

        tracing::debug!(?reason, "egg placement rejected");
        out_events.push(Event::HatchRejected { reason });
    }

    fn open_chest(&mut self, chest: ChestId, out_events: &mut Vec<Event>) {
        let index = chest.get() as usize;
        let reason = 'checks: {
            let (Some(config), Some(opened)) =
                (self.arena.chests.get(index), self.chests_opened.get_mut(index))
            else {
                break 'checks ChestError::MissingChest;
            };
            if *opened {
                break 'checks ChestError::AlreadyOpened;
            }

            *opened = true;
            out_events.push(Event::ChestOpened {
                chest,
                loot: config.loot,
            });
            return;
        };

        tracing::debug!(chest = chest.get(), ?reason, "chest rejected");
        out_events.push(Event::ChestRejected { chest, reason });
    }

    fn conclude(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if self.is_concluded() {
            tracing::debug!(?outcome, "game already concluded");
            return;
        }

        tracing::info!(?outcome, elapsed = ?self.elapsed, "game concluded");
        self.play_state = PlayState::Concluded(outcome);
        out_events.push(Event::GameConcluded { outcome });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureArena { arena } => {
            *world = World::with_arena(*arena);
            out_events.push(Event::ArenaConfigured {
                base_max_health: world.base.max_health,
                gems: world.wallet.balance(),
            });
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy { wave, spawn } => world.spawn_enemy(wave, spawn, out_events),
        Command::BuildTower { slot, blueprint } => world.build_tower(slot, blueprint, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::FireVolley { source, targets } => world.fire_volley(source, &targets, out_events),
        Command::AssignDragonTarget { dragon, target } => {
            world.assign_dragon_target(dragon, target, out_events);
        }
        Command::GrantGems { amount, source } => {
            tracing::trace!(amount, ?source, "gems granted");
            world.wallet.credit(amount, out_events);
        }
        Command::GrantPotions { kind, count } => world.inventory.add(kind, count, out_events),
        Command::MineOre { node } => world.mine_ore(node, out_events),
        Command::CraftPotion { recipe } => world.craft_potion(recipe, out_events),
        Command::UsePotion { kind } => world.use_potion(kind, out_events),
        Command::PlaceEgg => world.place_egg(out_events),
        Command::OpenChest { chest } => world.open_chest(chest, out_events),
        Command::ConcludeGame { outcome } => world.conclude(outcome, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use ember_keep_core::{
        ArenaConfig, ChestId, DragonView, EnemyView, OreNodeId, PlayState, PotionKind, SlotId,
        TowerId, TowerView,
    };

    use super::World;

    /// Reports whether the game is still running.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.play_state
    }

    /// Provides read-only access to the installed arena.
    #[must_use]
    pub fn arena(world: &World) -> &ArenaConfig {
        &world.arena
    }

    /// Simulated time elapsed since the arena was installed.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Remaining base health.
    #[must_use]
    pub fn base_health(world: &World) -> f32 {
        world.base.health
    }

    /// Maximum base health.
    #[must_use]
    pub fn base_max_health(world: &World) -> f32 {
        world.base.max_health
    }

    /// Gems currently held.
    #[must_use]
    pub fn gems(world: &World) -> u32 {
        world.wallet.balance()
    }

    /// Potions of the given kind currently held.
    #[must_use]
    pub fn potions(world: &World, kind: PotionKind) -> u32 {
        world.inventory.count(kind)
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of the towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.iter().map(|tower| tower.snapshot()).collect())
    }

    /// Tower standing on the slot, if any.
    #[must_use]
    pub fn tower_at(world: &World, slot: SlotId) -> Option<TowerId> {
        world.towers.occupant(slot)
    }

    /// Captures a read-only view of the hatched dragons.
    #[must_use]
    pub fn dragon_view(world: &World) -> DragonView {
        DragonView::from_snapshots(
            world
                .dragons
                .iter()
                .map(|dragon| dragon.snapshot())
                .collect(),
        )
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectiles_in_flight(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Strikes left before the ore node is depleted.
    #[must_use]
    pub fn ore_hits_remaining(world: &World, node: OreNodeId) -> Option<u32> {
        let index = node.get() as usize;
        let config = world.arena.ore_nodes.get(index)?;
        let state = world.ore.get(index)?;
        Some(config.max_hits.saturating_sub(state.hits))
    }

    /// Reports whether the chest was opened.
    #[must_use]
    pub fn chest_opened(world: &World, chest: ChestId) -> bool {
        world
            .chests_opened
            .get(chest.get() as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Reports whether the alchemy station is brewing.
    #[must_use]
    pub fn is_crafting(world: &World) -> bool {
        world.crafting.is_some()
    }

    /// Reports whether an egg is hatching.
    #[must_use]
    pub fn is_hatching(world: &World) -> bool {
        world.hatching.is_some()
    }
}
