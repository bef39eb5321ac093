#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loads TOML scenario files and validates them into engine configuration.
//!
//! A scenario bundles the arena layout, the wave schedule, the optional wave
//! reward chest and a timed player script. Files carry a `version` field;
//! only [`SUPPORTED_VERSION`] is accepted. All durations are written in
//! seconds and converted during validation.

mod raw;

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use ember_keep_core::{
    AlchemyConfig, ArenaConfig, BlueprintId, BuildSlotConfig, ChestConfig, ChestId,
    DragonTemplate, EnemyTemplate, HatcheryConfig, LootTable, OreNodeConfig, OreNodeId, PathId,
    PotionEffect, PotionKind, PotionRecipe, ProjectilePayload, ProjectileSpec, RecipeId, SlotId,
    TowerBlueprint, TowerLevel,
};
use ember_keep_system_rewards::WaveChestConfig;
use ember_keep_system_wave_spawner::{SpawnGroup, Wave, WaveSchedule};
use glam::Vec2;
use raw::{
    RawAction, RawAlchemy, RawBlueprint, RawChest, RawGroup, RawHatchery, RawPayload,
    RawPotionKind, RawProjectile, RawRewardChest, RawScenario, RawStep,
};

/// Scenario file version understood by this loader.
pub const SUPPORTED_VERSION: u32 = 1;

/// Failure raised while loading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario {path}: {source}")]
    Io {
        /// Location that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid scenario TOML.
    #[error("failed to parse scenario toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// The file declares a version this loader does not understand.
    #[error("unsupported scenario version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the file.
        found: u32,
        /// Version supported by the loader.
        expected: u32,
    },
    /// A duration is negative or not finite.
    #[error("{field}: {value} is not a valid duration in seconds")]
    InvalidDuration {
        /// Location of the offending value.
        field: String,
        /// Value found in the file.
        value: f64,
    },
    /// A value is outside of its allowed domain.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Location of the offending value.
        field: String,
        /// Constraint that was violated.
        reason: &'static str,
    },
    /// A name or index refers to nothing declared in the file.
    #[error("{field}: unknown {kind} `{name}`")]
    UnknownReference {
        /// Location of the reference.
        field: String,
        /// Kind of entity referenced.
        kind: &'static str,
        /// Name or index that failed to resolve.
        name: String,
    },
    /// Two entities of the same kind share a name.
    #[error("duplicate {kind} `{name}`")]
    Duplicate {
        /// Kind of entity declared twice.
        kind: &'static str,
        /// Name declared twice.
        name: String,
    },
}

/// Fully validated scenario ready to drive a game.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// Display name.
    pub name: String,
    /// Default seed used when the runner does not override it.
    pub seed: Option<u64>,
    /// Static layout handed to the world.
    pub arena: ArenaConfig,
    /// Waves handed to the spawner.
    pub schedule: WaveSchedule,
    /// Wave reward chest, if the arena has one.
    pub reward_chest: Option<WaveChestConfig>,
    /// Player actions ordered by time.
    pub script: Vec<ScriptStep>,
}

/// Player action scheduled at a fixed game time.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptStep {
    /// Game time at which the action is issued.
    pub at: Duration,
    /// Action to perform.
    pub action: ScriptAction,
}

/// Player actions a scenario script can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptAction {
    /// Start construction of a blueprint on a slot.
    Build {
        /// Slot to build on.
        slot: SlotId,
        /// Blueprint to construct.
        blueprint: BlueprintId,
    },
    /// Upgrade the tower standing on a slot.
    Upgrade {
        /// Slot holding the tower.
        slot: SlotId,
    },
    /// Sell the tower standing on a slot.
    Sell {
        /// Slot holding the tower.
        slot: SlotId,
    },
    /// Strike an ore node one or more times.
    Mine {
        /// Node to strike.
        node: OreNodeId,
        /// Number of strikes.
        hits: u32,
    },
    /// Start crafting a recipe at the alchemy station.
    Craft {
        /// Recipe to craft.
        recipe: RecipeId,
    },
    /// Consume a potion.
    UsePotion {
        /// Potion kind consumed.
        kind: PotionKind,
    },
    /// Deliver an egg to the hatchery.
    PlaceEgg,
    /// Open a loot chest.
    OpenChest {
        /// Chest to open.
        chest: ChestId,
    },
    /// Start the wave schedule when it does not start automatically.
    StartWaves,
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates scenario TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, ScenarioError> {
        let raw: RawScenario = toml::from_str(contents)?;
        let scenario = validate(raw)?;
        tracing::debug!(
            name = %scenario.name,
            waves = scenario.schedule.waves.len(),
            steps = scenario.script.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }
}

fn validate(raw: RawScenario) -> Result<Scenario, ScenarioError> {
    if raw.version != SUPPORTED_VERSION {
        return Err(ScenarioError::UnsupportedVersion {
            found: raw.version,
            expected: SUPPORTED_VERSION,
        });
    }

    if raw.base.max_health <= 0.0 || !raw.base.max_health.is_finite() {
        return Err(invalid("base.max_health", "must be positive"));
    }

    let mut path_ids = BTreeMap::new();
    let mut paths = Vec::with_capacity(raw.paths.len());
    for (index, path) in raw.paths.iter().enumerate() {
        if path.points.is_empty() {
            return Err(invalid(
                format!("paths[{index}].points"),
                "needs at least one waypoint",
            ));
        }
        if path_ids
            .insert(path.name.as_str(), PathId::new(index as u32))
            .is_some()
        {
            return Err(duplicate("path", &path.name));
        }
        paths.push(path.points.iter().copied().map(Vec2::from).collect());
    }

    let enemies = raw
        .enemies
        .iter()
        .map(|(name, enemy)| {
            if enemy.max_health <= 0.0 {
                return Err(invalid(
                    format!("enemies.{name}.max_health"),
                    "must be positive",
                ));
            }
            Ok((
                name.as_str(),
                EnemyTemplate {
                    max_health: enemy.max_health,
                    move_speed: enemy.move_speed.max(0.0),
                    damage_to_base: enemy.damage_to_base.max(0.0),
                    gem_reward: enemy.gem_reward,
                    reach_threshold: enemy.reach_threshold.max(0.0),
                },
            ))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let mut blueprint_ids = BTreeMap::new();
    let mut blueprints = Vec::with_capacity(raw.blueprints.len());
    for (index, blueprint) in raw.blueprints.iter().enumerate() {
        if blueprint_ids
            .insert(blueprint.name.as_str(), BlueprintId::new(index as u32))
            .is_some()
        {
            return Err(duplicate("blueprint", &blueprint.name));
        }
        blueprints.push(convert_blueprint(index, blueprint)?);
    }

    let mut build_slots = Vec::with_capacity(raw.build_slots.len());
    for (index, slot) in raw.build_slots.iter().enumerate() {
        let allowed = match &slot.blueprints {
            None => (0..blueprints.len() as u32).map(BlueprintId::new).collect(),
            Some(names) => names
                .iter()
                .map(|name| {
                    lookup(
                        &blueprint_ids,
                        name,
                        format!("build_slots[{index}].blueprints"),
                        "blueprint",
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        build_slots.push(BuildSlotConfig {
            position: Vec2::from(slot.position),
            blueprints: allowed,
        });
    }

    let ore_nodes = raw
        .ore_nodes
        .iter()
        .map(|node| OreNodeConfig {
            position: Vec2::from(node.position),
            max_hits: node.max_hits,
            gems_per_hit: node.gems_per_hit,
        })
        .collect();

    let chests = raw
        .chests
        .iter()
        .enumerate()
        .map(|(index, chest)| convert_chest(index, chest))
        .collect::<Result<Vec<_>, _>>()?;

    let alchemy = raw.alchemy.as_ref().map(convert_alchemy).transpose()?;
    let hatchery = raw.hatchery.as_ref().map(convert_hatchery).transpose()?;
    let reward_chest = raw
        .reward_chest
        .as_ref()
        .map(convert_reward_chest)
        .transpose()?;

    let arena = ArenaConfig {
        base_max_health: raw.base.max_health,
        starting_gems: raw.base.starting_gems,
        paths,
        blueprints,
        build_slots,
        ore_nodes,
        chests,
        alchemy,
        hatchery,
        burn_tick_interval: seconds("base.burn_tick_interval", raw.base.burn_tick_interval)?,
    };

    let mut waves = Vec::with_capacity(raw.waves.len());
    for (index, wave) in raw.waves.iter().enumerate() {
        let groups = wave
            .groups
            .iter()
            .enumerate()
            .map(|(group_index, group)| {
                convert_group(
                    &format!("waves[{index}].groups[{group_index}]"),
                    group,
                    &enemies,
                    &path_ids,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        if wave.speed_multiplier <= 0.0 || wave.health_multiplier <= 0.0 {
            return Err(invalid(
                format!("waves[{index}]"),
                "multipliers must be positive",
            ));
        }
        waves.push(Wave {
            name: wave.name.clone(),
            groups,
            time_before_next_wave: seconds(
                &format!("waves[{index}].time_before_next_wave"),
                wave.time_before_next_wave,
            )?,
            speed_multiplier: wave.speed_multiplier,
            health_multiplier: wave.health_multiplier,
        });
    }

    let schedule = WaveSchedule {
        first_wave_delay: seconds("schedule.first_wave_delay", raw.schedule.first_wave_delay)?,
        auto_start: raw.schedule.auto_start,
        waves,
    };

    let mut script = raw
        .script
        .iter()
        .enumerate()
        .map(|(index, step)| convert_step(index, step, &arena, &blueprint_ids))
        .collect::<Result<Vec<_>, _>>()?;
    script.sort_by_key(|step| step.at);

    Ok(Scenario {
        name: raw.name,
        seed: raw.seed,
        arena,
        schedule,
        reward_chest,
        script,
    })
}

fn convert_blueprint(index: usize, raw: &RawBlueprint) -> Result<TowerBlueprint, ScenarioError> {
    if raw.levels.is_empty() {
        return Err(invalid(
            format!("blueprints[{index}].levels"),
            "needs at least one level",
        ));
    }

    let levels = raw
        .levels
        .iter()
        .enumerate()
        .map(|(level_index, level)| -> Result<TowerLevel, ScenarioError> {
            let field = format!("blueprints[{index}].levels[{level_index}]");
            if level.range <= 0.0 {
                return Err(invalid(format!("{field}.range"), "must be positive"));
            }
            Ok(TowerLevel {
                range: level.range,
                fire_rate: level.fire_rate,
                targets_per_shot: level.targets_per_shot.max(1),
                build_time: seconds(&format!("{field}.build_time"), level.build_time)?,
                upgrade_cost: level.upgrade_cost,
                sell_refund: level.sell_refund,
                projectile: convert_projectile(&format!("{field}.projectile"), &level.projectile)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TowerBlueprint {
        name: raw.name.clone(),
        build_cost: raw.build_cost,
        levels,
    })
}

fn convert_projectile(field: &str, raw: &RawProjectile) -> Result<ProjectileSpec, ScenarioError> {
    if raw.speed <= 0.0 {
        return Err(invalid(format!("{field}.speed"), "must be positive"));
    }

    let payload_field = format!("{field}.payload");
    let payload = match raw.payload {
        RawPayload::Direct { damage } => ProjectilePayload::Direct { damage },
        RawPayload::Slow {
            damage,
            factor,
            duration,
        } => ProjectilePayload::Slow {
            damage,
            factor: factor.clamp(0.0, 1.0),
            duration: seconds(&payload_field, duration)?,
        },
        RawPayload::Frost {
            damage,
            factor,
            duration,
            stacks_to_freeze,
            freeze_duration,
        } => ProjectilePayload::Frost {
            damage,
            factor: factor.clamp(0.0, 1.0),
            duration: seconds(&payload_field, duration)?,
            stacks_to_freeze: stacks_to_freeze.max(1),
            freeze_duration: seconds(&payload_field, freeze_duration)?,
        },
        RawPayload::Mortar {
            damage,
            radius,
            flight_time,
        } => ProjectilePayload::Mortar {
            damage,
            radius: radius.max(0.0),
            flight_time: seconds(&payload_field, flight_time)?,
        },
        RawPayload::Fire {
            damage,
            burn_duration,
            burn_dps,
            splash_radius,
            splash_damage_multiplier,
            splash_burn_multiplier,
        } => ProjectilePayload::Fire {
            damage,
            burn_duration: seconds(&payload_field, burn_duration)?,
            burn_dps,
            splash_radius: splash_radius.max(0.0),
            splash_damage_multiplier,
            splash_burn_multiplier,
        },
    };

    Ok(ProjectileSpec {
        speed: raw.speed,
        lifetime: seconds(&format!("{field}.lifetime"), raw.lifetime)?,
        payload,
    })
}

fn convert_chest(index: usize, raw: &RawChest) -> Result<ChestConfig, ScenarioError> {
    let field = format!("chests[{index}]");
    if raw.min_gems > raw.max_gems && raw.max_gems > 0 {
        return Err(invalid(field, "min_gems exceeds max_gems"));
    }
    if raw.min_potions > raw.max_potions && raw.max_potions > 0 {
        return Err(invalid(field, "min_potions exceeds max_potions"));
    }

    Ok(ChestConfig {
        position: Vec2::from(raw.position),
        loot: LootTable {
            min_gems: raw.min_gems,
            max_gems: raw.max_gems,
            gem_value: raw.gem_value,
            min_potions: raw.min_potions,
            max_potions: raw.max_potions,
            potion: potion_kind(raw.potion),
            delay: seconds(&format!("{field}.delay"), raw.delay)?,
        },
    })
}

fn convert_alchemy(raw: &RawAlchemy) -> Result<AlchemyConfig, ScenarioError> {
    let recipes = raw
        .recipes
        .iter()
        .enumerate()
        .map(|(index, recipe)| -> Result<PotionRecipe, ScenarioError> {
            Ok(PotionRecipe {
                kind: potion_kind(recipe.kind),
                gem_cost: recipe.gem_cost,
                craft_time: seconds(
                    &format!("alchemy.recipes[{index}].craft_time"),
                    recipe.craft_time,
                )?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AlchemyConfig {
        recipes,
        lightning: PotionEffect {
            damage: raw.lightning.damage,
            paralyze_duration: seconds(
                "alchemy.lightning.paralyze_duration",
                raw.lightning.paralyze_duration,
            )?,
        },
    })
}

fn convert_hatchery(raw: &RawHatchery) -> Result<HatcheryConfig, ScenarioError> {
    Ok(HatcheryConfig {
        position: Vec2::from(raw.position),
        gem_cost: raw.gem_cost,
        egg_move_duration: seconds("hatchery.egg_move_duration", raw.egg_move_duration)?,
        hatch_time: seconds("hatchery.hatch_time", raw.hatch_time)?,
        dragon: DragonTemplate {
            fire_rate: raw.dragon.fire_rate,
            retarget_interval: seconds(
                "hatchery.dragon.retarget_interval",
                raw.dragon.retarget_interval,
            )?,
            projectile: convert_projectile("hatchery.dragon.projectile", &raw.dragon.projectile)?,
        },
    })
}

fn convert_reward_chest(raw: &RawRewardChest) -> Result<WaveChestConfig, ScenarioError> {
    Ok(WaveChestConfig {
        base_reward: raw.base_reward,
        reward_per_wave: raw.reward_per_wave,
        value_per_pickup: raw.value_per_pickup.max(1),
        open_delay: seconds("reward_chest.open_delay", raw.open_delay)?,
        pop_duration: seconds("reward_chest.pop_duration", raw.pop_duration)?,
        stay_open: seconds("reward_chest.stay_open", raw.stay_open)?,
        close_delay: seconds("reward_chest.close_delay", raw.close_delay)?,
    })
}

fn convert_group(
    field: &str,
    raw: &RawGroup,
    enemies: &BTreeMap<&str, EnemyTemplate>,
    paths: &BTreeMap<&str, PathId>,
) -> Result<SpawnGroup, ScenarioError> {
    let template = enemies
        .get(raw.enemy.as_str())
        .copied()
        .ok_or_else(|| unknown(format!("{field}.enemy"), "enemy", &raw.enemy))?;
    let path = lookup(paths, &raw.path, format!("{field}.path"), "path")?;

    Ok(SpawnGroup {
        name: raw.name.clone(),
        template,
        path,
        spawn_point: raw.spawn_point.map(Vec2::from),
        count: raw.count,
        spawn_interval: seconds(&format!("{field}.spawn_interval"), raw.spawn_interval)?,
        start_delay: seconds(&format!("{field}.start_delay"), raw.start_delay)?,
    })
}

fn convert_step(
    index: usize,
    raw: &RawStep,
    arena: &ArenaConfig,
    blueprints: &BTreeMap<&str, BlueprintId>,
) -> Result<ScriptStep, ScenarioError> {
    let field = format!("script[{index}]");
    let slot = |slot: u32| {
        if (slot as usize) < arena.build_slots.len() {
            Ok(SlotId::new(slot))
        } else {
            Err(unknown(format!("{field}.slot"), "build slot", &slot.to_string()))
        }
    };

    let action = match &raw.action {
        RawAction::Build {
            slot: slot_index,
            blueprint,
        } => ScriptAction::Build {
            slot: slot(*slot_index)?,
            blueprint: lookup(blueprints, blueprint, format!("{field}.blueprint"), "blueprint")?,
        },
        RawAction::Upgrade { slot: slot_index } => ScriptAction::Upgrade {
            slot: slot(*slot_index)?,
        },
        RawAction::Sell { slot: slot_index } => ScriptAction::Sell {
            slot: slot(*slot_index)?,
        },
        RawAction::Mine { node, hits } => {
            if (*node as usize) >= arena.ore_nodes.len() {
                return Err(unknown(format!("{field}.node"), "ore node", &node.to_string()));
            }
            ScriptAction::Mine {
                node: OreNodeId::new(*node),
                hits: *hits,
            }
        }
        RawAction::Craft { recipe } => {
            let known = arena
                .alchemy
                .as_ref()
                .is_some_and(|alchemy| (*recipe as usize) < alchemy.recipes.len());
            if !known {
                return Err(unknown(format!("{field}.recipe"), "recipe", &recipe.to_string()));
            }
            ScriptAction::Craft {
                recipe: RecipeId::new(*recipe),
            }
        }
        RawAction::UsePotion { potion } => ScriptAction::UsePotion {
            kind: potion_kind(*potion),
        },
        RawAction::PlaceEgg => {
            if arena.hatchery.is_none() {
                return Err(invalid(field, "place_egg requires a hatchery"));
            }
            ScriptAction::PlaceEgg
        }
        RawAction::OpenChest { chest } => {
            if (*chest as usize) >= arena.chests.len() {
                return Err(unknown(format!("{field}.chest"), "chest", &chest.to_string()));
            }
            ScriptAction::OpenChest {
                chest: ChestId::new(*chest),
            }
        }
        RawAction::StartWaves => ScriptAction::StartWaves,
    };

    Ok(ScriptStep {
        at: seconds(&format!("{field}.at"), raw.at)?,
        action,
    })
}

fn potion_kind(raw: RawPotionKind) -> PotionKind {
    match raw {
        RawPotionKind::Lightning => PotionKind::Lightning,
    }
}

/// Converts seconds into a `Duration`, rejecting negative and non-finite values.
fn seconds(field: &str, value: f64) -> Result<Duration, ScenarioError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScenarioError::InvalidDuration {
            field: field.to_owned(),
            value,
        });
    }
    Duration::try_from_secs_f64(value).map_err(|_| ScenarioError::InvalidDuration {
        field: field.to_owned(),
        value,
    })
}

fn lookup<T: Copy>(
    table: &BTreeMap<&str, T>,
    name: &str,
    field: String,
    kind: &'static str,
) -> Result<T, ScenarioError> {
    table
        .get(name)
        .copied()
        .ok_or_else(|| unknown(field, kind, name))
}

fn invalid(field: impl Into<String>, reason: &'static str) -> ScenarioError {
    ScenarioError::InvalidValue {
        field: field.into(),
        reason,
    }
}

fn unknown(field: String, kind: &'static str, name: &str) -> ScenarioError {
    ScenarioError::UnknownReference {
        field,
        kind,
        name: name.to_owned(),
    }
}

fn duplicate(kind: &'static str, name: &str) -> ScenarioError {
    ScenarioError::Duplicate {
        kind,
        name: name.to_owned(),
    }
}
