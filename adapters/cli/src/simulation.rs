//! Fixed-step orchestration of the world, the systems and a scenario script.

use std::{collections::VecDeque, fmt, time::Duration};

use ember_keep_core::{Command, Event, Outcome, PlayState, PotionKind, TowerTarget};
use ember_keep_scenario::{Scenario, ScriptAction, ScriptStep};
use ember_keep_system_dragons::Dragons;
use ember_keep_system_game_manager::GameManager;
use ember_keep_system_rewards::Rewards;
use ember_keep_system_tower_combat::TowerCombat;
use ember_keep_system_tower_targeting::TowerTargeting;
use ember_keep_system_wave_spawner::WaveSpawner;
use ember_keep_world::{self as world, query, World};

const MIN_FRAME: Duration = Duration::from_millis(1);

/// A running game: the world, its systems and the remaining player script.
#[derive(Debug)]
pub struct Simulation {
    name: String,
    seed: u64,
    frame: Duration,
    world: World,
    spawner: WaveSpawner,
    manager: GameManager,
    targeting: TowerTargeting,
    combat: TowerCombat,
    dragons: Dragons,
    rewards: Rewards,
    script: VecDeque<ScriptStep>,
    targets: Vec<TowerTarget>,
    tally: Tally,
}

#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    killed: u32,
    leaked: u32,
    rejected: u32,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::EnemyDied { .. } => self.killed += 1,
                Event::EnemyReachedBase { .. } => self.leaked += 1,
                Event::EnemySpawnRejected { .. }
                | Event::BuildRejected { .. }
                | Event::UpgradeRejected { .. }
                | Event::SellRejected { .. }
                | Event::VolleyRejected { .. }
                | Event::OreRejected { .. }
                | Event::CraftRejected { .. }
                | Event::PotionRejected { .. }
                | Event::HatchRejected { .. }
                | Event::ChestRejected { .. } => self.rejected += 1,
                _ => {}
            }
        }
    }
}

/// End-of-run report.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Scenario name.
    pub scenario: String,
    /// Seed used for loot rolls.
    pub seed: u64,
    /// Outcome, `None` when the time limit ended the run.
    pub outcome: Option<Outcome>,
    /// Game time simulated.
    pub elapsed: Duration,
    /// Waves cleared.
    pub waves_cleared: u32,
    /// Waves in the schedule.
    pub wave_count: usize,
    /// Remaining base health.
    pub base_health: f32,
    /// Maximum base health.
    pub base_max_health: f32,
    /// Gems in the wallet.
    pub gems: u32,
    /// Lightning potions held.
    pub potions: u32,
    /// Towers standing.
    pub towers: usize,
    /// Dragons hatched.
    pub dragons: usize,
    /// Enemies killed.
    pub enemies_killed: u32,
    /// Enemies that reached the base.
    pub enemies_leaked: u32,
    /// Commands the world rejected.
    pub rejections: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(Outcome::Victory) => "victory",
            Some(Outcome::Defeat) => "defeat",
            None => "time limit reached",
        };
        writeln!(f, "scenario:   {} (seed {})", self.scenario, self.seed)?;
        writeln!(f, "outcome:    {outcome}")?;
        writeln!(f, "elapsed:    {:.2}s", self.elapsed.as_secs_f64())?;
        writeln!(f, "waves:      {}/{}", self.waves_cleared, self.wave_count)?;
        writeln!(
            f,
            "base:       {:.1}/{:.1}",
            self.base_health, self.base_max_health
        )?;
        writeln!(f, "gems:       {}", self.gems)?;
        writeln!(f, "potions:    {}", self.potions)?;
        writeln!(f, "towers:     {}", self.towers)?;
        writeln!(f, "dragons:    {}", self.dragons)?;
        writeln!(
            f,
            "enemies:    {} killed, {} leaked",
            self.enemies_killed, self.enemies_leaked
        )?;
        write!(f, "rejections: {}", self.rejections)
    }
}

impl Simulation {
    /// Builds the world for `scenario` and configures its arena.
    ///
    /// Frames shorter than a millisecond are raised to one millisecond.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64, frame: Duration) -> Self {
        let Scenario {
            name,
            arena,
            schedule,
            reward_chest,
            script,
            ..
        } = scenario;

        let mut simulation = Self {
            name,
            seed,
            frame: frame.max(MIN_FRAME),
            world: World::new(),
            spawner: WaveSpawner::new(schedule),
            manager: GameManager::new(),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            dragons: Dragons::new(),
            rewards: Rewards::new(reward_chest, seed),
            script: script.into(),
            targets: Vec::new(),
            tally: Tally::default(),
        };
        simulation.dispatch(Command::ConfigureArena {
            arena: Box::new(arena),
        });
        simulation
    }

    /// Read-only access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Reports whether the game is still being played.
    #[must_use]
    pub fn is_active(&self) -> bool {
        query::play_state(&self.world) == PlayState::Active
    }

    /// Issues due script actions and advances the game by one frame.
    pub fn step(&mut self) {
        let now = query::elapsed(&self.world);
        while self.script.front().is_some_and(|step| step.at <= now) {
            if let Some(step) = self.script.pop_front() {
                self.perform(step.action);
            }
        }

        self.dispatch(Command::Tick { dt: self.frame });
    }

    /// Steps until the game concludes or `limit` of game time elapsed.
    pub fn run(&mut self, limit: Duration) -> Summary {
        tracing::info!(scenario = %self.name, seed = self.seed, frame = ?self.frame, "run started");
        while self.is_active() && query::elapsed(&self.world) < limit {
            self.step();
        }

        let summary = self.summary();
        tracing::info!(outcome = ?summary.outcome, elapsed = ?summary.elapsed, "run finished");
        summary
    }

    /// Snapshot of the current results.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            scenario: self.name.clone(),
            seed: self.seed,
            outcome: self.manager.outcome(),
            elapsed: query::elapsed(&self.world),
            waves_cleared: self.spawner.waves_cleared(),
            wave_count: self.spawner.wave_count(),
            base_health: query::base_health(&self.world),
            base_max_health: query::base_max_health(&self.world),
            gems: query::gems(&self.world),
            potions: query::potions(&self.world, PotionKind::Lightning),
            towers: query::tower_view(&self.world).iter().count(),
            dragons: query::dragon_view(&self.world).iter().count(),
            enemies_killed: self.tally.killed,
            enemies_leaked: self.tally.leaked,
            rejections: self.tally.rejected,
        }
    }

    fn perform(&mut self, action: ScriptAction) {
        tracing::debug!(?action, "script action");
        match action {
            ScriptAction::Build { slot, blueprint } => {
                self.dispatch(Command::BuildTower { slot, blueprint });
            }
            ScriptAction::Upgrade { slot } => match query::tower_at(&self.world, slot) {
                Some(tower) => self.dispatch(Command::UpgradeTower { tower }),
                None => tracing::warn!(slot = slot.get(), "no tower to upgrade"),
            },
            ScriptAction::Sell { slot } => match query::tower_at(&self.world, slot) {
                Some(tower) => self.dispatch(Command::SellTower { tower }),
                None => tracing::warn!(slot = slot.get(), "no tower to sell"),
            },
            ScriptAction::Mine { node, hits } => {
                for _ in 0..hits {
                    self.dispatch(Command::MineOre { node });
                }
            }
            ScriptAction::Craft { recipe } => self.dispatch(Command::CraftPotion { recipe }),
            ScriptAction::UsePotion { kind } => self.dispatch(Command::UsePotion { kind }),
            ScriptAction::PlaceEgg => self.dispatch(Command::PlaceEgg),
            ScriptAction::OpenChest { chest } => self.dispatch(Command::OpenChest { chest }),
            ScriptAction::StartWaves => {
                if !self.spawner.start() {
                    tracing::warn!("wave schedule already started");
                }
            }
        }
    }

    /// Applies a command and pumps every resulting event through the systems
    /// until the world settles.
    fn dispatch(&mut self, command: Command) {
        let mut pending = Vec::new();
        world::apply(&mut self.world, command, &mut pending);

        while !pending.is_empty() {
            let mut commands = Vec::new();
            let mut produced = Vec::new();
            self.spawner.handle(&pending, &mut commands, &mut produced);
            let frame_started = pending
                .iter()
                .any(|event| matches!(event, Event::TimeAdvanced { .. }));
            pending.append(&mut produced);

            self.manager.handle(&pending, &mut commands);
            self.rewards.handle(&pending, &mut commands);
            self.tally.record(&pending);
            let concluding = commands
                .iter()
                .any(|command| matches!(command, Command::ConcludeGame { .. }));
            if frame_started && !concluding {
                self.engage(&mut commands);
            }

            pending.clear();
            for command in commands {
                world::apply(&mut self.world, command, &mut pending);
            }
        }
    }

    /// Lets towers and dragons pick targets and fire.
    fn engage(&mut self, out: &mut Vec<Command>) {
        let play_state = query::play_state(&self.world);
        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);

        self.targeting
            .handle(play_state, &towers, &enemies, &mut self.targets);
        self.combat.handle(play_state, &towers, &self.targets, out);
        self.dragons
            .handle(play_state, &query::dragon_view(&self.world), &enemies, out);
    }
}
