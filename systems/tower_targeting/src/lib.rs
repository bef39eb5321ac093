#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use std::cmp::Ordering;

use ember_keep_core::{EnemyId, EnemyView, PlayState, TowerId, TowerTarget, TowerView};
use glam::Vec2;

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    tower_workspace: Vec<TowerWorkspace>,
    enemy_workspace: Vec<EnemyCandidate>,
    in_range: Vec<RangedCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// Each built tower receives up to `targets_per_shot` enemies inside its
    /// range, nearest first, with ties broken by the smaller enemy id. The
    /// output buffer is cleared before populating it with the latest
    /// assignments.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if play_state != PlayState::Active {
            return;
        }

        if towers.iter().next().is_none() || enemies.is_empty() {
            return;
        }

        self.prepare_tower_workspace(towers);
        if self.tower_workspace.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for tower in &self.tower_workspace {
            let max_distance_sq = tower.range * tower.range;

            self.in_range.clear();
            for candidate in &self.enemy_workspace {
                let distance_sq = candidate.position.distance_squared(tower.position);
                if distance_sq > max_distance_sq {
                    continue;
                }
                self.in_range.push(RangedCandidate {
                    distance_sq,
                    enemy: candidate.id,
                });
            }

            if self.in_range.is_empty() {
                continue;
            }

            self.in_range.sort_by(RangedCandidate::order);
            out.push(TowerTarget {
                tower: tower.id,
                enemies: self
                    .in_range
                    .iter()
                    .take(tower.targets_per_shot)
                    .map(|candidate| candidate.enemy)
                    .collect(),
            });
        }
    }

    fn prepare_tower_workspace(&mut self, towers: &TowerView) {
        self.tower_workspace.clear();
        let (lower, _) = towers.iter().size_hint();
        self.tower_workspace.reserve(lower);

        for snapshot in towers.iter() {
            if !snapshot.built || snapshot.range <= 0.0 {
                continue;
            }

            self.tower_workspace.push(TowerWorkspace {
                id: snapshot.id,
                position: snapshot.position,
                range: snapshot.range,
                targets_per_shot: snapshot.targets_per_shot.max(1) as usize,
            });
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());

        for snapshot in enemies.iter() {
            self.enemy_workspace.push(EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TowerWorkspace {
    id: TowerId,
    position: Vec2,
    range: f32,
    targets_per_shot: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RangedCandidate {
    distance_sq: f32,
    enemy: EnemyId,
}

impl RangedCandidate {
    fn order(a: &Self, b: &Self) -> Ordering {
        a.distance_sq
            .total_cmp(&b.distance_sq)
            .then_with(|| a.enemy.cmp(&b.enemy))
    }
}
