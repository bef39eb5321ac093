//! Projectiles in flight and their resolution points.

use std::time::Duration;

use ember_keep_core::{EnemyId, ProjectileId, ProjectilePayload, ProjectileSpec, ProjectileSource};
use glam::Vec2;

use crate::enemies::{move_towards, EnemyRoster};

/// Shortest flight a lobbed shell may take.
pub(crate) const MIN_FLIGHT_TIME: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Flight {
    Homing,
    Lobbed {
        origin: Vec2,
        destination: Vec2,
        duration: Duration,
    },
}

#[derive(Clone, Debug)]
struct Projectile {
    id: ProjectileId,
    target: EnemyId,
    position: Vec2,
    spec: ProjectileSpec,
    age: Duration,
    flight: Flight,
}

/// Result of advancing a projectile that left the air this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Resolution {
    /// The payload reached its destination.
    Impact {
        projectile: ProjectileId,
        target: EnemyId,
        position: Vec2,
        payload: ProjectilePayload,
    },
    /// The projectile vanished without effect.
    Expired { projectile: ProjectileId },
}

/// Projectiles currently in the air, kept in launch order.
#[derive(Debug, Default)]
pub(crate) struct ProjectileSet {
    entries: Vec<Projectile>,
    next_id: u32,
}

impl ProjectileSet {
    /// Launches a projectile from `origin` toward a live enemy.
    pub(crate) fn launch(
        &mut self,
        origin: Vec2,
        target: EnemyId,
        target_position: Vec2,
        spec: ProjectileSpec,
    ) -> ProjectileId {
        let id = ProjectileId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let flight = match spec.payload {
            ProjectilePayload::Mortar { flight_time, .. } => Flight::Lobbed {
                origin,
                destination: target_position,
                duration: flight_time.max(MIN_FLIGHT_TIME),
            },
            _ => Flight::Homing,
        };

        self.entries.push(Projectile {
            id,
            target,
            position: origin,
            spec,
            age: Duration::ZERO,
            flight,
        });
        id
    }

    /// Moves every projectile and drains those that resolved.
    pub(crate) fn advance(&mut self, dt: Duration, enemies: &EnemyRoster) -> Vec<Resolution> {
        let mut resolved = Vec::new();

        self.entries.retain_mut(|projectile| {
            projectile.age += dt;
            match projectile.flight {
                Flight::Homing => {
                    let Some(enemy) = enemies.get(projectile.target) else {
                        resolved.push(Resolution::Expired {
                            projectile: projectile.id,
                        });
                        return false;
                    };

                    let step = projectile.spec.speed * dt.as_secs_f32();
                    if projectile.position.distance(enemy.position) <= step {
                        resolved.push(Resolution::Impact {
                            projectile: projectile.id,
                            target: projectile.target,
                            position: enemy.position,
                            payload: projectile.spec.payload,
                        });
                        return false;
                    }

                    projectile.position = move_towards(projectile.position, enemy.position, step);
                    if projectile.age >= projectile.spec.lifetime {
                        resolved.push(Resolution::Expired {
                            projectile: projectile.id,
                        });
                        return false;
                    }
                    true
                }
                Flight::Lobbed {
                    origin,
                    destination,
                    duration,
                } => {
                    let progress =
                        (projectile.age.as_secs_f32() / duration.as_secs_f32()).min(1.0);
                    projectile.position = origin.lerp(destination, progress);
                    if projectile.age >= duration {
                        resolved.push(Resolution::Impact {
                            projectile: projectile.id,
                            target: projectile.target,
                            position: destination,
                            payload: projectile.spec.payload,
                        });
                        return false;
                    }
                    true
                }
            }
        });

        resolved
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Shooter bookkeeping shared by towers and dragons when launching a volley.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Shooter {
    pub(crate) source: ProjectileSource,
    pub(crate) position: Vec2,
    pub(crate) spec: ProjectileSpec,
    pub(crate) max_targets: usize,
}
