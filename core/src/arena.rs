//! Static arena description installed into the world by `Command::ConfigureArena`.
//!
//! Every value here is plain data. Scenario loaders construct these types after
//! validating user input, so the world can assume durations are finite and rates
//! positive.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{BlueprintId, PathId, PotionKind};

/// Default interval between burn damage ticks.
pub const DEFAULT_BURN_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Complete static layout and rule set for a single game.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaConfig {
    /// Health the base starts with.
    pub base_max_health: f32,
    /// Gems credited to the wallet when the arena is installed.
    pub starting_gems: u32,
    /// Waypoint routes enemies follow, indexed by [`PathId`].
    pub paths: Vec<Vec<Vec2>>,
    /// Tower types available in the arena, indexed by [`BlueprintId`].
    pub blueprints: Vec<TowerBlueprint>,
    /// Build slots, indexed by `SlotId`.
    pub build_slots: Vec<BuildSlotConfig>,
    /// Ore nodes, indexed by `OreNodeId`.
    pub ore_nodes: Vec<OreNodeConfig>,
    /// Loot chests, indexed by `ChestId`.
    pub chests: Vec<ChestConfig>,
    /// Alchemy station, if the arena has one.
    pub alchemy: Option<AlchemyConfig>,
    /// Dragon hatchery, if the arena has one.
    pub hatchery: Option<HatcheryConfig>,
    /// Interval between burn damage ticks.
    pub burn_tick_interval: Duration,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            base_max_health: 20.0,
            starting_gems: 0,
            paths: Vec::new(),
            blueprints: Vec::new(),
            build_slots: Vec::new(),
            ore_nodes: Vec::new(),
            chests: Vec::new(),
            alchemy: None,
            hatchery: None,
            burn_tick_interval: DEFAULT_BURN_TICK_INTERVAL,
        }
    }
}

impl ArenaConfig {
    /// Looks up the waypoints of a path.
    #[must_use]
    pub fn path(&self, path: PathId) -> Option<&[Vec2]> {
        self.paths.get(path.get() as usize).map(Vec::as_slice)
    }

    /// Looks up a tower blueprint.
    #[must_use]
    pub fn blueprint(&self, blueprint: BlueprintId) -> Option<&TowerBlueprint> {
        self.blueprints.get(blueprint.get() as usize)
    }
}

/// Stats shared by every enemy spawned from the same group.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Health before wave multipliers.
    pub max_health: f32,
    /// Movement speed in world units per second before wave multipliers.
    pub move_speed: f32,
    /// Damage dealt to the base when the enemy reaches the end of its path.
    pub damage_to_base: f32,
    /// Gems credited when the enemy is killed.
    pub gem_reward: u32,
    /// Distance at which a waypoint counts as reached.
    pub reach_threshold: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            max_health: 10.0,
            move_speed: 3.0,
            damage_to_base: 1.0,
            gem_reward: 0,
            reach_threshold: 0.1,
        }
    }
}

/// Flight characteristics and impact payload of a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Travel speed of homing projectiles in world units per second.
    pub speed: f32,
    /// Time after which an unresolved projectile disappears.
    pub lifetime: Duration,
    /// Effect applied on impact.
    pub payload: ProjectilePayload,
}

/// Effect applied by a projectile when it resolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectilePayload {
    /// Plain single-target damage.
    Direct {
        /// Damage dealt to the target.
        damage: f32,
    },
    /// Damage plus a temporary movement slow.
    Slow {
        /// Damage dealt to the target, ignored when not positive.
        damage: f32,
        /// Speed multiplier applied while slowed.
        factor: f32,
        /// How long the slow lasts.
        duration: Duration,
    },
    /// Stacking slow that freezes the target once enough stacks accumulate.
    Frost {
        /// Damage dealt to the target, ignored when not positive.
        damage: f32,
        /// Speed multiplier applied by each stack.
        factor: f32,
        /// Lifetime of the stack counter and each slow.
        duration: Duration,
        /// Number of stacks that trigger a freeze.
        stacks_to_freeze: u32,
        /// How long a freeze lasts.
        freeze_duration: Duration,
    },
    /// Lobbed shell that explodes at the position captured when it was fired.
    Mortar {
        /// Damage dealt to every enemy inside the blast.
        damage: f32,
        /// Blast radius.
        radius: f32,
        /// Time the shell spends in the air.
        flight_time: Duration,
    },
    /// Fire bolt that burns the target and splashes nearby enemies.
    Fire {
        /// Direct damage on impact.
        damage: f32,
        /// Burn length applied to the direct target.
        burn_duration: Duration,
        /// Burn damage per second applied to the direct target.
        burn_dps: f32,
        /// Splash radius; values at or below 0.01 disable splashing.
        splash_radius: f32,
        /// Damage multiplier for splashed enemies other than the target.
        splash_damage_multiplier: f32,
        /// Burn duration and dps multiplier for splashed enemies.
        splash_burn_multiplier: f32,
    },
}

/// One upgrade level of a tower blueprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerLevel {
    /// Targeting radius in world units.
    pub range: f32,
    /// Volleys per second.
    pub fire_rate: f32,
    /// Maximum number of enemies engaged per volley.
    pub targets_per_shot: u32,
    /// Construction time before the level becomes active.
    pub build_time: Duration,
    /// Gems required to upgrade to the next level.
    pub upgrade_cost: u32,
    /// Gems returned when the tower is sold at this level.
    pub sell_refund: u32,
    /// Projectile launched at each target.
    pub projectile: ProjectileSpec,
}

impl TowerLevel {
    /// Cooldown between volleys derived from the fire rate.
    #[must_use]
    pub fn fire_interval(&self) -> Duration {
        fire_interval(self.fire_rate)
    }
}

/// Tower type with its build cost and upgrade chain.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerBlueprint {
    /// Display name of the blueprint.
    pub name: String,
    /// Gems required to construct the first level.
    pub build_cost: u32,
    /// Upgrade chain, starting with the level built first.
    pub levels: Vec<TowerLevel>,
}

impl TowerBlueprint {
    /// Stats for the requested level, if the blueprint has it.
    #[must_use]
    pub fn level(&self, level: u32) -> Option<&TowerLevel> {
        self.levels.get(level as usize)
    }

    /// Reports whether the level can be upgraded further.
    #[must_use]
    pub fn has_next_level(&self, level: u32) -> bool {
        (level as usize).saturating_add(1) < self.levels.len()
    }
}

/// Location where a single tower may be constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildSlotConfig {
    /// Position of the tower once built.
    pub position: Vec2,
    /// Blueprints offered at this slot.
    pub blueprints: Vec<BlueprintId>,
}

/// Minable resource node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OreNodeConfig {
    /// Position of the node.
    pub position: Vec2,
    /// Hits the node survives before it is depleted.
    pub max_hits: u32,
    /// Gems dropped by every hit.
    pub gems_per_hit: u32,
}

/// Loot chest that can be opened once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChestConfig {
    /// Position of the chest.
    pub position: Vec2,
    /// Rewards rolled when the chest is opened.
    pub loot: LootTable,
}

/// Ranges rolled when a loot chest opens.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LootTable {
    /// Minimum number of gem pickups.
    pub min_gems: u32,
    /// Maximum number of gem pickups; zero disables gem drops.
    pub max_gems: u32,
    /// Gems carried by each pickup.
    pub gem_value: u32,
    /// Minimum number of potions.
    pub min_potions: u32,
    /// Maximum number of potions; zero disables potion drops.
    pub max_potions: u32,
    /// Kind of potion dropped.
    pub potion: PotionKind,
    /// Delay between opening the chest and the loot appearing.
    pub delay: Duration,
}

/// Strength of the lightning potion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PotionEffect {
    /// Damage dealt to every enemy.
    pub damage: f32,
    /// How long struck enemies are unable to move.
    pub paralyze_duration: Duration,
}

impl Default for PotionEffect {
    fn default() -> Self {
        Self {
            damage: 10.0,
            paralyze_duration: Duration::from_millis(600),
        }
    }
}

/// Potion that the alchemy station can brew.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PotionRecipe {
    /// Potion produced.
    pub kind: PotionKind,
    /// Gems spent when brewing starts.
    pub gem_cost: u32,
    /// Brewing time.
    pub craft_time: Duration,
}

/// Alchemy station that converts gems into potions.
#[derive(Clone, Debug, PartialEq)]
pub struct AlchemyConfig {
    /// Recipes indexed by `RecipeId`.
    pub recipes: Vec<PotionRecipe>,
    /// Effect of lightning potions brewed here.
    pub lightning: PotionEffect,
}

/// Stats of a hatched dragon.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragonTemplate {
    /// Volleys per second.
    pub fire_rate: f32,
    /// Delay between searches for a new target while idle.
    pub retarget_interval: Duration,
    /// Projectile launched at the target.
    pub projectile: ProjectileSpec,
}

impl DragonTemplate {
    /// Cooldown between shots derived from the fire rate.
    #[must_use]
    pub fn fire_interval(&self) -> Duration {
        fire_interval(self.fire_rate)
    }
}

/// Hatchery that turns eggs and gems into dragons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HatcheryConfig {
    /// Position where hatched dragons appear.
    pub position: Vec2,
    /// Gems spent when hatching starts.
    pub gem_cost: u32,
    /// Time the egg takes to settle into the socket before hatching starts.
    pub egg_move_duration: Duration,
    /// Hatching time.
    pub hatch_time: Duration,
    /// Dragon produced.
    pub dragon: DragonTemplate,
}

/// Converts a rate in events per second into the interval between events.
///
/// Non-positive or non-finite rates never become ready.
#[must_use]
pub fn fire_interval(rate: f32) -> Duration {
    if !rate.is_finite() || rate <= 0.0 {
        return Duration::MAX;
    }
    Duration::try_from_secs_f32(1.0 / rate).unwrap_or(Duration::MAX)
}
