#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that gates win and loss and tracks the player-facing game phase.

use ember_keep_core::{Command, Event, Outcome, WaveIndex};

/// Player-facing stage of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// No wave has started yet.
    Preparing,
    /// The wave is spawning or still has enemies alive.
    Wave(WaveIndex),
    /// The latest wave was cleared and the next one has not begun.
    Intermission,
    /// Every wave was cleared.
    Victory,
    /// The base fell.
    Defeat,
}

/// Game manager that issues the single `ConcludeGame` command of a game.
#[derive(Debug)]
pub struct GameManager {
    phase: GamePhase,
    decided: Option<Outcome>,
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GameManager {
    /// Creates a game manager for a fresh game.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Preparing,
            decided: None,
        }
    }

    /// Current phase of the game.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Outcome requested so far, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.decided
    }

    /// Consumes events and emits at most one conclusion per game.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::ArenaConfigured { .. } => *self = Self::new(),
                Event::BaseDestroyed => self.decide(Outcome::Defeat, out),
                Event::AllWavesCleared => self.decide(Outcome::Victory, out),
                Event::GameConcluded { outcome } => {
                    self.decided = Some(*outcome);
                    self.phase = match outcome {
                        Outcome::Victory => GamePhase::Victory,
                        Outcome::Defeat => GamePhase::Defeat,
                    };
                }
                Event::WaveStarted { wave } if !self.is_over() => {
                    self.phase = GamePhase::Wave(*wave);
                }
                Event::WaveCleared { wave, .. } if self.phase == GamePhase::Wave(*wave) => {
                    self.phase = GamePhase::Intermission;
                }
                _ => {}
            }
        }
    }

    fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Victory | GamePhase::Defeat)
    }

    fn decide(&mut self, outcome: Outcome, out: &mut Vec<Command>) {
        if self.decided.is_some() {
            return;
        }

        match outcome {
            Outcome::Defeat => tracing::info!("game over"),
            Outcome::Victory => tracing::info!("victory"),
        }
        self.decided = Some(outcome);
        out.push(Command::ConcludeGame { outcome });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defeat_takes_precedence_within_one_batch() {
        let mut manager = GameManager::new();
        let mut out = Vec::new();

        manager.handle(&[Event::BaseDestroyed, Event::AllWavesCleared], &mut out);

        assert_eq!(
            out,
            vec![Command::ConcludeGame {
                outcome: Outcome::Defeat
            }]
        );
    }

    #[test]
    fn victory_is_requested_once() {
        let mut manager = GameManager::new();
        let mut out = Vec::new();

        manager.handle(&[Event::AllWavesCleared], &mut out);
        manager.handle(&[Event::AllWavesCleared, Event::BaseDestroyed], &mut out);

        assert_eq!(
            out,
            vec![Command::ConcludeGame {
                outcome: Outcome::Victory
            }]
        );
        assert_eq!(manager.outcome(), Some(Outcome::Victory));
    }

    #[test]
    fn phase_follows_wave_progress() {
        let mut manager = GameManager::new();
        let mut out = Vec::new();
        let wave = WaveIndex::new(0);
        assert_eq!(manager.phase(), GamePhase::Preparing);

        manager.handle(&[Event::WaveStarted { wave }], &mut out);
        assert_eq!(manager.phase(), GamePhase::Wave(wave));

        manager.handle(
            &[Event::WaveCleared {
                wave,
                waves_cleared: 1,
            }],
            &mut out,
        );
        assert_eq!(manager.phase(), GamePhase::Intermission);
    }

    #[test]
    fn stale_clear_does_not_interrupt_a_newer_wave() {
        let mut manager = GameManager::new();
        let mut out = Vec::new();

        manager.handle(
            &[
                Event::WaveStarted {
                    wave: WaveIndex::new(0),
                },
                Event::WaveStarted {
                    wave: WaveIndex::new(1),
                },
                Event::WaveCleared {
                    wave: WaveIndex::new(0),
                    waves_cleared: 1,
                },
            ],
            &mut out,
        );

        assert_eq!(manager.phase(), GamePhase::Wave(WaveIndex::new(1)));
    }

    #[test]
    fn conclusion_event_freezes_phase() {
        let mut manager = GameManager::new();
        let mut out = Vec::new();

        manager.handle(
            &[
                Event::GameConcluded {
                    outcome: Outcome::Defeat,
                },
                Event::WaveStarted {
                    wave: WaveIndex::new(3),
                },
            ],
            &mut out,
        );

        assert_eq!(manager.phase(), GamePhase::Defeat);
        assert!(out.is_empty());
    }
}
