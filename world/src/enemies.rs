//! Enemy state, movement and status effects.

use std::{collections::BTreeMap, time::Duration};

use ember_keep_core::{EnemyId, EnemySnapshot, PathId, WaveIndex};
use glam::Vec2;

/// Slow factors closer than this are treated as equal.
const FACTOR_EPSILON: f32 = 1e-4;

/// Smallest speed multiplier a slow may impose.
const MIN_SLOW_FACTOR: f32 = 0.01;

/// Live enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) wave: WaveIndex,
    pub(crate) path: PathId,
    pub(crate) waypoint: usize,
    pub(crate) position: Vec2,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) move_speed: f32,
    pub(crate) damage_to_base: f32,
    pub(crate) gem_reward: u32,
    pub(crate) reach_threshold: f32,
    pub(crate) effects: StatusEffects,
}

impl Enemy {
    /// Speed after slows, freezes and paralysis.
    pub(crate) fn current_speed(&self) -> f32 {
        self.move_speed * self.effects.speed_multiplier()
    }

    /// Applies damage and reports whether the enemy died.
    pub(crate) fn take_damage(&mut self, amount: f32) -> bool {
        if amount > 0.0 && self.health > 0.0 {
            self.health = (self.health - amount).max(0.0);
        }
        self.is_dead()
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Moves toward the current waypoint.
    ///
    /// Returns `true` once the final waypoint is reached.
    pub(crate) fn advance_along(&mut self, waypoints: &[Vec2], dt: Duration) -> bool {
        let Some(&target) = waypoints.get(self.waypoint) else {
            return false;
        };

        let step = self.current_speed() * dt.as_secs_f32();
        self.position = move_towards(self.position, target, step);

        if self.position.distance(target) <= self.reach_threshold {
            self.waypoint += 1;
            return self.waypoint >= waypoints.len();
        }
        false
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            wave: self.wave,
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            speed: self.current_speed(),
        }
    }
}

/// Registry of live enemies keyed by identifier.
#[derive(Debug, Default)]
pub(crate) struct EnemyRoster {
    entries: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
}

impl EnemyRoster {
    pub(crate) fn allocate_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) {
        let _ = self.entries.insert(enemy.id, enemy);
    }

    pub(crate) fn remove(&mut self, enemy: EnemyId) -> Option<Enemy> {
        self.entries.remove(&enemy)
    }

    pub(crate) fn get(&self, enemy: EnemyId) -> Option<&Enemy> {
        self.entries.get(&enemy)
    }

    pub(crate) fn get_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&enemy)
    }

    pub(crate) fn contains(&self, enemy: EnemyId) -> bool {
        self.entries.contains_key(&enemy)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    /// Identifiers of enemies within `radius` of `center`, in id order.
    pub(crate) fn within(&self, center: Vec2, radius: f32) -> Vec<EnemyId> {
        let radius_sq = radius * radius;
        self.entries
            .values()
            .filter(|enemy| enemy.position.distance_squared(center) <= radius_sq)
            .map(|enemy| enemy.id)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    factor: f32,
    remaining: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Burn {
    dps: f32,
    duration: Duration,
    elapsed: Duration,
    since_tick: Duration,
}

/// Timed effects that alter an enemy's speed or deal damage over time.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StatusEffects {
    slow: Option<Slow>,
    frost_stacks: u32,
    frost_remaining: Duration,
    frozen_remaining: Duration,
    burn: Option<Burn>,
    paralysis_remaining: Duration,
}

impl StatusEffects {
    pub(crate) fn speed_multiplier(&self) -> f32 {
        if self.is_frozen() || !self.paralysis_remaining.is_zero() {
            return 0.0;
        }
        self.slow.map_or(1.0, |slow| slow.factor)
    }

    pub(crate) fn is_frozen(&self) -> bool {
        !self.frozen_remaining.is_zero()
    }

    pub(crate) fn apply_slow(&mut self, factor: f32, duration: Duration) {
        let mut factor = factor.clamp(0.0, 1.0);
        if factor <= 0.0 {
            factor = MIN_SLOW_FACTOR;
        }

        let replace = match self.slow.as_mut() {
            Some(active) if (factor - active.factor).abs() <= FACTOR_EPSILON => {
                if duration > active.remaining {
                    active.remaining = duration;
                }
                false
            }
            Some(active) => factor < active.factor,
            None => true,
        };

        if replace {
            self.slow = Some(Slow {
                factor,
                remaining: duration,
            });
        }
    }

    pub(crate) fn apply_frost(
        &mut self,
        factor: f32,
        duration: Duration,
        stacks_to_freeze: u32,
        freeze_duration: Duration,
    ) {
        if self.is_frozen() {
            self.frozen_remaining = self.frozen_remaining.max(freeze_duration);
            return;
        }

        self.frost_stacks = self.frost_stacks.saturating_add(1);
        self.frost_remaining = duration;

        if stacks_to_freeze > 0 && self.frost_stacks >= stacks_to_freeze {
            self.frozen_remaining = freeze_duration;
            self.apply_slow(factor, freeze_duration);
        } else {
            self.apply_slow(factor, duration);
        }
    }

    pub(crate) fn apply_burn(&mut self, duration: Duration, dps: f32) {
        if duration.is_zero() || dps <= 0.0 {
            return;
        }
        self.burn = Some(Burn {
            dps,
            duration,
            elapsed: Duration::ZERO,
            since_tick: Duration::ZERO,
        });
    }

    pub(crate) fn apply_paralysis(&mut self, duration: Duration) {
        self.paralysis_remaining = self.paralysis_remaining.max(duration);
    }

    /// Advances every timer and returns the burn damage that came due.
    pub(crate) fn advance(&mut self, dt: Duration, burn_interval: Duration) -> f32 {
        if let Some(slow) = &mut self.slow {
            slow.remaining = slow.remaining.saturating_sub(dt);
            if slow.remaining.is_zero() {
                self.slow = None;
            }
        }

        if self.is_frozen() {
            self.frozen_remaining = self.frozen_remaining.saturating_sub(dt);
            if self.frozen_remaining.is_zero() {
                self.frost_stacks = 0;
                self.frost_remaining = Duration::ZERO;
            }
        } else if self.frost_stacks > 0 {
            self.frost_remaining = self.frost_remaining.saturating_sub(dt);
            if self.frost_remaining.is_zero() {
                self.frost_stacks = 0;
            }
        }

        self.paralysis_remaining = self.paralysis_remaining.saturating_sub(dt);

        let mut damage = 0.0;
        if let Some(burn) = &mut self.burn {
            let step = dt.min(burn.duration.saturating_sub(burn.elapsed));
            burn.elapsed += step;
            burn.since_tick += step;
            if !burn_interval.is_zero() {
                while burn.since_tick >= burn_interval {
                    burn.since_tick -= burn_interval;
                    damage += burn.dps * burn_interval.as_secs_f32();
                }
            }
            if burn.elapsed >= burn.duration {
                self.burn = None;
            }
        }
        damage
    }
}

/// Moves `from` toward `to` by at most `max_step`.
pub(crate) fn move_towards(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return to;
    }
    from + delta / distance * max_step.max(0.0)
}
