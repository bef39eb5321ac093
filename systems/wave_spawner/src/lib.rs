#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave schedule state machine that emits enemy spawn commands and tracks
//! which waves still have enemies alive.
//!
//! The spawner consumes exact simulated time from `TimeAdvanced` events. A
//! single large delta may finish several waits and issue several spawns; any
//! leftover time is carried into the next wait. Every spawn it issues counts
//! as a live enemy of its wave until the world reports the enemy's removal
//! through `EnemyDied`, `EnemyReachedBase` or `EnemySpawnRejected`.

use std::time::Duration;

use ember_keep_core::{Command, EnemySpawn, EnemyTemplate, Event, PathId, WaveIndex};
use glam::Vec2;

/// One spawn instruction inside a wave.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnGroup {
    /// Label used in logs.
    pub name: String,
    /// Stats of every enemy in the group.
    pub template: EnemyTemplate,
    /// Route the enemies follow.
    pub path: PathId,
    /// Entry position; the first waypoint of the path when absent.
    pub spawn_point: Option<Vec2>,
    /// Number of enemies spawned. Groups with zero are skipped.
    pub count: u32,
    /// Wait between consecutive spawns of the group.
    pub spawn_interval: Duration,
    /// Wait before the group's first spawn.
    pub start_delay: Duration,
}

/// Timed group of spawn instructions.
#[derive(Clone, Debug, PartialEq)]
pub struct Wave {
    /// Label used in logs.
    pub name: String,
    /// Groups spawned one after another.
    pub groups: Vec<SpawnGroup>,
    /// Pause after the wave finishes spawning, skipped after the last wave.
    pub time_before_next_wave: Duration,
    /// Speed multiplier applied to every enemy of the wave.
    pub speed_multiplier: f32,
    /// Health multiplier applied to every enemy of the wave.
    pub health_multiplier: f32,
}

impl Wave {
    fn spawn_total(&self) -> u64 {
        self.groups.iter().map(|group| u64::from(group.count)).sum()
    }
}

/// Complete wave schedule of a scenario.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveSchedule {
    /// Wait between starting the schedule and the first wave.
    pub first_wave_delay: Duration,
    /// Starts the schedule on the first `TimeAdvanced` event.
    pub auto_start: bool,
    /// Waves in the order they are spawned.
    pub waves: Vec<Wave>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    FirstWaveDelay {
        remaining: Duration,
    },
    Spawning {
        wave: usize,
        group: usize,
        spawned: u32,
        wait: Duration,
    },
    Intermission {
        next_wave: usize,
        remaining: Duration,
    },
    Finished,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct WaveProgress {
    fully_issued: bool,
    alive: u32,
    cleared: bool,
}

/// Pure system that turns a wave schedule into spawn commands.
#[derive(Debug)]
pub struct WaveSpawner {
    schedule: WaveSchedule,
    phase: Phase,
    progress: Vec<WaveProgress>,
    current_wave: Option<WaveIndex>,
    waves_cleared: u32,
    all_cleared_announced: bool,
}

impl WaveSpawner {
    /// Creates an idle spawner for the provided schedule.
    #[must_use]
    pub fn new(schedule: WaveSchedule) -> Self {
        let progress = vec![WaveProgress::default(); schedule.waves.len()];
        Self {
            schedule,
            phase: Phase::Idle,
            progress,
            current_wave: None,
            waves_cleared: 0,
            all_cleared_announced: false,
        }
    }

    /// Starts the schedule.
    ///
    /// Returns `false` when the spawner already ran or has no waves.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Idle || self.schedule.waves.is_empty() {
            return false;
        }

        tracing::info!(
            waves = self.schedule.waves.len(),
            delay = ?self.schedule.first_wave_delay,
            "wave schedule started"
        );
        self.phase = Phase::FirstWaveDelay {
            remaining: self.schedule.first_wave_delay,
        };
        true
    }

    /// Wave currently or most recently spawning, `None` before the first wave.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveIndex> {
        self.current_wave
    }

    /// Reports whether the schedule is running and has spawns left to issue.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        !matches!(self.phase, Phase::Idle | Phase::Finished)
    }

    /// Number of waves cleared so far.
    #[must_use]
    pub fn waves_cleared(&self) -> u32 {
        self.waves_cleared
    }

    /// Number of waves in the schedule.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.schedule.waves.len()
    }

    /// Enemies of the wave that were issued and not yet reported removed.
    #[must_use]
    pub fn alive_in(&self, wave: WaveIndex) -> u32 {
        self.progress
            .get(wave.get() as usize)
            .map_or(0, |progress| progress.alive)
    }

    /// Consumes world events, emitting spawn commands and wave progress events.
    pub fn handle(
        &mut self,
        events: &[Event],
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => {
                    if self.schedule.auto_start && self.phase == Phase::Idle {
                        let _ = self.start();
                    }
                    self.advance(*dt, out_commands, out_events);
                }
                Event::EnemyDied { wave, .. }
                | Event::EnemyReachedBase { wave, .. }
                | Event::EnemySpawnRejected { wave, .. } => {
                    self.report_removed(*wave, out_events);
                }
                _ => {}
            }
        }
    }

    fn advance(&mut self, dt: Duration, out_commands: &mut Vec<Command>, out_events: &mut Vec<Event>) {
        let mut budget = dt;

        loop {
            match self.phase {
                Phase::Idle | Phase::Finished => break,
                Phase::FirstWaveDelay { remaining } => {
                    if budget < remaining {
                        self.phase = Phase::FirstWaveDelay {
                            remaining: remaining - budget,
                        };
                        break;
                    }
                    budget -= remaining;
                    self.begin_wave(0, out_events);
                }
                Phase::Intermission {
                    next_wave,
                    remaining,
                } => {
                    if budget < remaining {
                        self.phase = Phase::Intermission {
                            next_wave,
                            remaining: remaining - budget,
                        };
                        break;
                    }
                    budget -= remaining;
                    self.begin_wave(next_wave, out_events);
                }
                Phase::Spawning {
                    wave,
                    group,
                    spawned,
                    wait,
                } => {
                    if group >= self.group_count(wave) {
                        self.finish_issuing(wave, out_events);
                        continue;
                    }
                    if budget < wait {
                        self.phase = Phase::Spawning {
                            wave,
                            group,
                            spawned,
                            wait: wait - budget,
                        };
                        break;
                    }
                    budget -= wait;

                    self.issue_spawn(wave, group, out_commands);
                    let spawned = spawned + 1;
                    self.phase = match self.group(wave, group) {
                        Some(config) if spawned < config.count => Phase::Spawning {
                            wave,
                            group,
                            spawned,
                            wait: config.spawn_interval,
                        },
                        _ => self.enter_group(wave, group + 1),
                    };
                }
            }
        }
    }

    fn group_count(&self, wave: usize) -> usize {
        self.schedule
            .waves
            .get(wave)
            .map_or(0, |config| config.groups.len())
    }

    fn group(&self, wave: usize, group: usize) -> Option<&SpawnGroup> {
        self.schedule.waves.get(wave)?.groups.get(group)
    }

    /// Phase for the first group at or after `from` that spawns anything.
    fn enter_group(&self, wave: usize, from: usize) -> Phase {
        let groups = self
            .schedule
            .waves
            .get(wave)
            .map_or(&[][..], |config| config.groups.as_slice());

        match groups
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, group)| group.count > 0)
        {
            Some((index, group)) => Phase::Spawning {
                wave,
                group: index,
                spawned: 0,
                wait: group.start_delay,
            },
            None => Phase::Spawning {
                wave,
                group: groups.len(),
                spawned: 0,
                wait: Duration::ZERO,
            },
        }
    }

    fn begin_wave(&mut self, wave: usize, out_events: &mut Vec<Event>) {
        let index = wave_index(wave);
        self.current_wave = Some(index);
        if let Some(config) = self.schedule.waves.get(wave) {
            tracing::info!(
                wave = index.get(),
                name = %config.name,
                enemies = config.spawn_total(),
                "wave started"
            );
        }
        out_events.push(Event::WaveStarted { wave: index });
        self.phase = self.enter_group(wave, 0);
    }

    fn issue_spawn(&mut self, wave: usize, group: usize, out_commands: &mut Vec<Command>) {
        let Some(config) = self.schedule.waves.get(wave) else {
            return;
        };
        let Some(group_config) = config.groups.get(group) else {
            return;
        };

        let spawn = EnemySpawn {
            template: group_config.template,
            path: group_config.path,
            spawn_point: group_config.spawn_point,
            speed_multiplier: config.speed_multiplier,
            health_multiplier: config.health_multiplier,
        };
        tracing::debug!(wave, group = %group_config.name, "spawn issued");
        out_commands.push(Command::SpawnEnemy {
            wave: wave_index(wave),
            spawn,
        });

        if let Some(progress) = self.progress.get_mut(wave) {
            progress.alive = progress.alive.saturating_add(1);
        }
    }

    fn finish_issuing(&mut self, wave: usize, out_events: &mut Vec<Event>) {
        if let Some(progress) = self.progress.get_mut(wave) {
            progress.fully_issued = true;
        }
        self.check_cleared(wave, out_events);

        let next_wave = wave + 1;
        if next_wave >= self.schedule.waves.len() {
            tracing::info!("wave schedule finished spawning");
            self.phase = Phase::Finished;
            return;
        }

        let pause = self
            .schedule
            .waves
            .get(wave)
            .map_or(Duration::ZERO, |config| config.time_before_next_wave);
        if pause.is_zero() {
            self.begin_wave(next_wave, out_events);
        } else {
            self.phase = Phase::Intermission {
                next_wave,
                remaining: pause,
            };
        }
    }

    fn report_removed(&mut self, wave: WaveIndex, out_events: &mut Vec<Event>) {
        let index = wave.get() as usize;
        let Some(progress) = self.progress.get_mut(index) else {
            return;
        };
        progress.alive = progress.alive.saturating_sub(1);
        self.check_cleared(index, out_events);
    }

    fn check_cleared(&mut self, wave: usize, out_events: &mut Vec<Event>) {
        let Some(progress) = self.progress.get_mut(wave) else {
            return;
        };
        if progress.cleared || !progress.fully_issued || progress.alive > 0 {
            return;
        }

        progress.cleared = true;
        self.waves_cleared += 1;
        tracing::info!(
            wave,
            waves_cleared = self.waves_cleared,
            "wave cleared"
        );
        out_events.push(Event::WaveCleared {
            wave: wave_index(wave),
            waves_cleared: self.waves_cleared,
        });

        if !self.all_cleared_announced && self.progress.iter().all(|progress| progress.cleared) {
            self.all_cleared_announced = true;
            tracing::info!("all waves cleared");
            out_events.push(Event::AllWavesCleared);
        }
    }
}

fn wave_index(wave: usize) -> WaveIndex {
    WaveIndex::new(u32::try_from(wave).unwrap_or(u32::MAX))
}
