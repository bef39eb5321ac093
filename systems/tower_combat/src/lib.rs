#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits volley commands from targeting data.

use ember_keep_core::{Command, PlayState, ProjectileSource, TowerTarget, TowerView};

/// Tower combat system that queues volleys for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireVolley` entries for built towers whose cooldown elapsed.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Active {
            return;
        }

        if tower_targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            if target.enemies.is_empty() {
                continue;
            }
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if snapshot.can_fire() {
                self.scratch.push(Command::FireVolley {
                    source: ProjectileSource::Tower(target.tower),
                    targets: target.enemies.clone(),
                });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_keep_core::{BlueprintId, EnemyId, Outcome, SlotId, TowerId, TowerSnapshot};
    use glam::Vec2;
    use std::time::Duration;

    #[test]
    fn concluded_game_is_silent() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![snapshot(1, Duration::ZERO, true)]);
        let targets = vec![target(1, &[7])];
        let mut out = Vec::new();

        system.handle(
            PlayState::Concluded(Outcome::Defeat),
            &towers,
            &targets,
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn firing_respects_cooldown_readiness() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(5, Duration::ZERO, true),
            snapshot(2, Duration::ZERO, true),
        ]);
        let targets = vec![target(2, &[4]), target(5, &[1, 3])];
        let mut out = Vec::new();

        system.handle(PlayState::Active, &towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireVolley {
                    source: ProjectileSource::Tower(TowerId::new(2)),
                    targets: vec![EnemyId::new(4)],
                },
                Command::FireVolley {
                    source: ProjectileSource::Tower(TowerId::new(5)),
                    targets: vec![EnemyId::new(1), EnemyId::new(3)],
                },
            ],
        );
    }

    #[test]
    fn cooling_unbuilt_or_missing_towers_are_skipped() {
        let mut system = TowerCombat::new();
        let towers = TowerView::from_snapshots(vec![
            snapshot(3, Duration::from_millis(250), true),
            snapshot(8, Duration::ZERO, true),
            snapshot(9, Duration::ZERO, false),
        ]);
        let targets = vec![
            target(3, &[9]),
            target(8, &[2]),
            target(9, &[5]),
            target(42, &[3]),
            target(8, &[]),
        ];
        let mut out = Vec::new();

        system.handle(PlayState::Active, &towers, &targets, &mut out);

        assert_eq!(
            out,
            vec![Command::FireVolley {
                source: ProjectileSource::Tower(TowerId::new(8)),
                targets: vec![EnemyId::new(2)],
            }],
        );
    }

    fn snapshot(tower: u32, ready_in: Duration, built: bool) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(tower),
            slot: SlotId::new(tower),
            blueprint: BlueprintId::new(0),
            level: 0,
            position: Vec2::ZERO,
            built,
            ready_in,
            range: 5.0,
            targets_per_shot: 2,
        }
    }

    fn target(tower: u32, enemies: &[u32]) -> TowerTarget {
        TowerTarget {
            tower: TowerId::new(tower),
            enemies: enemies.iter().copied().map(EnemyId::new).collect(),
        }
    }
}
