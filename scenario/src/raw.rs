//! Serde mirror of the scenario file. Durations are plain seconds here.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawScenario {
    pub(crate) version: u32,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    #[serde(default)]
    pub(crate) base: RawBase,
    pub(crate) paths: Vec<RawPath>,
    pub(crate) enemies: BTreeMap<String, RawEnemy>,
    #[serde(default)]
    pub(crate) blueprints: Vec<RawBlueprint>,
    #[serde(default)]
    pub(crate) build_slots: Vec<RawBuildSlot>,
    #[serde(default)]
    pub(crate) ore_nodes: Vec<RawOreNode>,
    #[serde(default)]
    pub(crate) chests: Vec<RawChest>,
    #[serde(default)]
    pub(crate) alchemy: Option<RawAlchemy>,
    #[serde(default)]
    pub(crate) hatchery: Option<RawHatchery>,
    #[serde(default)]
    pub(crate) reward_chest: Option<RawRewardChest>,
    #[serde(default)]
    pub(crate) schedule: RawSchedule,
    pub(crate) waves: Vec<RawWave>,
    #[serde(default)]
    pub(crate) script: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawBase {
    pub(crate) max_health: f32,
    pub(crate) starting_gems: u32,
    pub(crate) burn_tick_interval: f64,
}

impl Default for RawBase {
    fn default() -> Self {
        Self {
            max_health: 20.0,
            starting_gems: 0,
            burn_tick_interval: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawPath {
    pub(crate) name: String,
    pub(crate) points: Vec<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawEnemy {
    pub(crate) max_health: f32,
    pub(crate) move_speed: f32,
    pub(crate) damage_to_base: f32,
    pub(crate) gem_reward: u32,
    pub(crate) reach_threshold: f32,
}

impl Default for RawEnemy {
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

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawBlueprint {
    pub(crate) name: String,
    pub(crate) build_cost: u32,
    pub(crate) levels: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawLevel {
    pub(crate) range: f32,
    pub(crate) fire_rate: f32,
    #[serde(default = "one")]
    pub(crate) targets_per_shot: u32,
    #[serde(default)]
    pub(crate) build_time: f64,
    #[serde(default)]
    pub(crate) upgrade_cost: u32,
    #[serde(default)]
    pub(crate) sell_refund: u32,
    pub(crate) projectile: RawProjectile,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawProjectile {
    pub(crate) speed: f32,
    pub(crate) lifetime: f64,
    pub(crate) payload: RawPayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum RawPayload {
    Direct {
        damage: f32,
    },
    Slow {
        damage: f32,
        factor: f32,
        duration: f64,
    },
    Frost {
        damage: f32,
        factor: f32,
        duration: f64,
        stacks_to_freeze: u32,
        freeze_duration: f64,
    },
    Mortar {
        damage: f32,
        radius: f32,
        flight_time: f64,
    },
    Fire {
        damage: f32,
        burn_duration: f64,
        burn_dps: f32,
        splash_radius: f32,
        splash_damage_multiplier: f32,
        splash_burn_multiplier: f32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawBuildSlot {
    pub(crate) position: [f32; 2],
    /// Blueprint names; every blueprint when omitted.
    #[serde(default)]
    pub(crate) blueprints: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawOreNode {
    pub(crate) position: [f32; 2],
    pub(crate) max_hits: u32,
    pub(crate) gems_per_hit: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawChest {
    pub(crate) position: [f32; 2],
    pub(crate) min_gems: u32,
    pub(crate) max_gems: u32,
    pub(crate) gem_value: u32,
    pub(crate) min_potions: u32,
    pub(crate) max_potions: u32,
    pub(crate) potion: RawPotionKind,
    pub(crate) delay: f64,
}

impl Default for RawChest {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            min_gems: 2,
            max_gems: 5,
            gem_value: 1,
            min_potions: 0,
            max_potions: 2,
            potion: RawPotionKind::Lightning,
            delay: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RawPotionKind {
    Lightning,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawAlchemy {
    pub(crate) recipes: Vec<RawRecipe>,
    #[serde(default)]
    pub(crate) lightning: RawPotionEffect,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRecipe {
    pub(crate) kind: RawPotionKind,
    pub(crate) gem_cost: u32,
    pub(crate) craft_time: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawPotionEffect {
    pub(crate) damage: f32,
    pub(crate) paralyze_duration: f64,
}

impl Default for RawPotionEffect {
    fn default() -> Self {
        Self {
            damage: 10.0,
            paralyze_duration: 0.6,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawHatchery {
    pub(crate) position: [f32; 2],
    pub(crate) gem_cost: u32,
    pub(crate) egg_move_duration: f64,
    pub(crate) hatch_time: f64,
    pub(crate) dragon: RawDragon,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDragon {
    pub(crate) fire_rate: f32,
    pub(crate) retarget_interval: f64,
    pub(crate) projectile: RawProjectile,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawRewardChest {
    pub(crate) base_reward: i32,
    pub(crate) reward_per_wave: i32,
    pub(crate) value_per_pickup: u32,
    pub(crate) open_delay: f64,
    pub(crate) pop_duration: f64,
    pub(crate) stay_open: f64,
    pub(crate) close_delay: f64,
}

impl Default for RawRewardChest {
    fn default() -> Self {
        Self {
            base_reward: 10,
            reward_per_wave: 5,
            value_per_pickup: 5,
            open_delay: 1.0,
            pop_duration: 0.25,
            stay_open: 0.5,
            close_delay: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RawSchedule {
    pub(crate) first_wave_delay: f64,
    pub(crate) auto_start: bool,
}

impl Default for RawSchedule {
    fn default() -> Self {
        Self {
            first_wave_delay: 0.0,
            auto_start: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawWave {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) time_before_next_wave: f64,
    #[serde(default = "unit")]
    pub(crate) speed_multiplier: f32,
    #[serde(default = "unit")]
    pub(crate) health_multiplier: f32,
    pub(crate) groups: Vec<RawGroup>,
}

fn unit() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawGroup {
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) enemy: String,
    pub(crate) path: String,
    pub(crate) count: u32,
    #[serde(default)]
    pub(crate) spawn_interval: f64,
    #[serde(default)]
    pub(crate) start_delay: f64,
    #[serde(default)]
    pub(crate) spawn_point: Option<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawStep {
    pub(crate) at: f64,
    pub(crate) action: RawAction,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum RawAction {
    Build { slot: u32, blueprint: String },
    Upgrade { slot: u32 },
    Sell { slot: u32 },
    Mine {
        node: u32,
        #[serde(default = "one")]
        hits: u32,
    },
    Craft { recipe: u32 },
    UsePotion { potion: RawPotionKind },
    PlaceEgg,
    OpenChest { chest: u32 },
    StartWaves,
}
