#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that steers hatched dragons.
//!
//! Dragons have unlimited range. An idle dragon whose retarget timer elapsed
//! locks onto the live enemy with the most health; an engaged dragon fires at
//! its target whenever its cooldown allows.

use ember_keep_core::{
    Command, DragonView, EnemyId, EnemySnapshot, EnemyView, PlayState, ProjectileSource,
};

/// Dragon system that emits retarget and volley commands.
#[derive(Debug, Default)]
pub struct Dragons {
    scratch: Vec<Command>,
}

impl Dragons {
    /// Creates a new dragon system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `AssignDragonTarget` for idle dragons that may retarget and
    /// `FireVolley` for engaged dragons that are ready.
    pub fn handle(
        &mut self,
        play_state: PlayState,
        dragons: &DragonView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if play_state != PlayState::Active {
            return;
        }

        self.scratch.clear();

        for dragon in dragons.iter() {
            match dragon.target {
                Some(target) if enemies.get(target).is_some() => {
                    if dragon.ready_in.is_zero() {
                        self.scratch.push(Command::FireVolley {
                            source: ProjectileSource::Dragon(dragon.id),
                            targets: vec![target],
                        });
                    }
                }
                _ => {
                    if !dragon.retarget_in.is_zero() {
                        continue;
                    }
                    let target = strongest(enemies);
                    tracing::trace!(
                        dragon = dragon.id.get(),
                        target = target.as_ref().map(EnemyId::get),
                        "dragon retargeting"
                    );
                    self.scratch.push(Command::AssignDragonTarget {
                        dragon: dragon.id,
                        target,
                    });
                }
            }
        }

        out.append(&mut self.scratch);
    }
}

/// Live enemy with the highest current health, lowest id on ties.
fn strongest(enemies: &EnemyView) -> Option<EnemyId> {
    let mut best: Option<&EnemySnapshot> = None;
    for candidate in enemies.iter() {
        best = match best {
            Some(current) if candidate.health <= current.health => Some(current),
            _ => Some(candidate),
        };
    }
    best.map(|snapshot| snapshot.id)
}
