#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that pays out wave reward chests and rolls loot chest contents.

use std::time::Duration;

use ember_keep_core::{ChestId, Command, Event, GemSource, LootTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Extra time the reward chest lingers after the gems finished popping.
pub const POP_SETTLE: Duration = Duration::from_millis(100);

/// Tuning for the chest that pays out whenever a wave is cleared.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveChestConfig {
    /// Flat reward granted for every cleared wave.
    pub base_reward: i32,
    /// Additional reward multiplied by the number of waves cleared so far.
    pub reward_per_wave: i32,
    /// Gems carried by a single pickup.
    pub value_per_pickup: u32,
    /// Time between the clear and the gems appearing.
    pub open_delay: Duration,
    /// Duration of the gem pop animation.
    pub pop_duration: Duration,
    /// Time the chest stays open after the gems popped.
    pub stay_open: Duration,
    /// Duration of the closing animation.
    pub close_delay: Duration,
}

impl WaveChestConfig {
    /// Reward owed after `waves_cleared` waves, never negative.
    #[must_use]
    pub fn reward(&self, waves_cleared: u32) -> u32 {
        let reward = i64::from(self.base_reward)
            + i64::from(self.reward_per_wave) * i64::from(waves_cleared);
        u32::try_from(reward.max(0)).unwrap_or(u32::MAX)
    }

    /// Gems carried by one pickup; at least one.
    #[must_use]
    pub fn pickup_value(&self) -> u32 {
        self.value_per_pickup.max(1)
    }

    /// Number of pickups needed to cover `reward`.
    #[must_use]
    pub fn pickups(&self, reward: u32) -> u32 {
        reward.div_ceil(self.pickup_value())
    }

    /// Window during which further clears are ignored.
    #[must_use]
    pub fn busy_window(&self) -> Duration {
        self.open_delay
            .saturating_add(self.pop_duration)
            .saturating_add(POP_SETTLE)
            .saturating_add(self.stay_open)
            .saturating_add(self.close_delay)
    }
}

impl Default for WaveChestConfig {
    fn default() -> Self {
        Self {
            base_reward: 10,
            reward_per_wave: 5,
            value_per_pickup: 5,
            open_delay: Duration::from_secs(1),
            pop_duration: Duration::from_millis(250),
            stay_open: Duration::from_millis(500),
            close_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Payout {
    WaveChest { pickups: u32, value: u32 },
    Loot { chest: ChestId, loot: LootTable },
}

#[derive(Clone, Copy, Debug)]
struct Delivery {
    remaining: Duration,
    payout: Payout,
}

/// Reward system that turns wave clears and opened chests into grants.
#[derive(Debug)]
pub struct Rewards {
    wave_chest: Option<WaveChestConfig>,
    seed: u64,
    rng: ChaCha8Rng,
    pending: Vec<Delivery>,
    busy: Duration,
}

impl Rewards {
    /// Creates a reward system; `wave_chest` is `None` when the arena has no reward chest.
    #[must_use]
    pub fn new(wave_chest: Option<WaveChestConfig>, seed: u64) -> Self {
        Self {
            wave_chest,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            pending: Vec::new(),
            busy: Duration::ZERO,
        }
    }

    /// Reports whether the wave chest is still playing a reward sequence.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !self.busy.is_zero()
    }

    /// Number of payouts waiting for their delay to elapse.
    #[must_use]
    pub fn pending_deliveries(&self) -> usize {
        self.pending.len()
    }

    /// Consumes events and emits grant commands for due payouts.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::ArenaConfigured { .. } => {
                    self.pending.clear();
                    self.busy = Duration::ZERO;
                    self.rng = ChaCha8Rng::seed_from_u64(self.seed);
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, out),
                Event::WaveCleared { waves_cleared, .. } => self.wave_cleared(*waves_cleared, out),
                Event::ChestOpened { chest, loot } => {
                    self.schedule(
                        loot.delay,
                        Payout::Loot {
                            chest: *chest,
                            loot: *loot,
                        },
                        out,
                    );
                }
                _ => {}
            }
        }
    }

    fn wave_cleared(&mut self, waves_cleared: u32, out: &mut Vec<Command>) {
        let Some(config) = self.wave_chest else {
            return;
        };

        let reward = config.reward(waves_cleared);
        if reward == 0 {
            return;
        }
        if self.is_busy() {
            tracing::debug!(waves_cleared, reward, "reward chest busy, clear dropped");
            return;
        }

        self.busy = config.busy_window();
        tracing::debug!(waves_cleared, reward, "reward chest opening");
        self.schedule(
            config.open_delay,
            Payout::WaveChest {
                pickups: config.pickups(reward),
                value: config.pickup_value(),
            },
            out,
        );
    }

    fn schedule(&mut self, delay: Duration, payout: Payout, out: &mut Vec<Command>) {
        if delay.is_zero() {
            self.deliver(payout, out);
            return;
        }
        self.pending.push(Delivery {
            remaining: delay,
            payout,
        });
    }

    fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        self.busy = self.busy.saturating_sub(dt);
        if self.pending.is_empty() {
            return;
        }

        let mut due = Vec::new();
        self.pending.retain_mut(|delivery| {
            delivery.remaining = delivery.remaining.saturating_sub(dt);
            if delivery.remaining.is_zero() {
                due.push(delivery.payout);
                false
            } else {
                true
            }
        });

        for payout in due {
            self.deliver(payout, out);
        }
    }

    fn deliver(&mut self, payout: Payout, out: &mut Vec<Command>) {
        match payout {
            Payout::WaveChest { pickups, value } => {
                for _ in 0..pickups {
                    out.push(Command::GrantGems {
                        amount: value,
                        source: GemSource::WaveChest,
                    });
                }
            }
            Payout::Loot { chest, loot } => {
                let gems = self.roll(loot.min_gems, loot.max_gems);
                let potions = self.roll(loot.min_potions, loot.max_potions);
                tracing::debug!(chest = chest.get(), gems, potions, "loot rolled");

                for _ in 0..gems {
                    out.push(Command::GrantGems {
                        amount: loot.gem_value,
                        source: GemSource::LootChest(chest),
                    });
                }
                if potions > 0 {
                    out.push(Command::GrantPotions {
                        kind: loot.potion,
                        count: potions,
                    });
                }
            }
        }
    }

    /// Inclusive roll; a zero maximum disables the roll.
    fn roll(&mut self, min: u32, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(min.min(max)..=max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_keep_core::{PotionKind, WaveIndex};

    fn cleared(waves_cleared: u32) -> Event {
        Event::WaveCleared {
            wave: WaveIndex::new(waves_cleared.saturating_sub(1)),
            waves_cleared,
        }
    }

    fn time(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    fn gems(commands: &[Command]) -> u32 {
        commands
            .iter()
            .map(|command| match command {
                Command::GrantGems { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn reward_grows_with_waves_and_never_goes_negative() {
        let config = WaveChestConfig {
            base_reward: -10,
            reward_per_wave: 4,
            ..WaveChestConfig::default()
        };
        assert_eq!(config.reward(1), 0);
        assert_eq!(config.reward(3), 2);
        assert_eq!(WaveChestConfig::default().reward(2), 20);
    }

    #[test]
    fn pickups_round_up() {
        let config = WaveChestConfig {
            value_per_pickup: 5,
            ..WaveChestConfig::default()
        };
        assert_eq!(config.pickups(15), 3);
        assert_eq!(config.pickups(16), 4);

        let zero_value = WaveChestConfig {
            value_per_pickup: 0,
            ..WaveChestConfig::default()
        };
        assert_eq!(zero_value.pickups(3), 3);
    }

    #[test]
    fn wave_chest_pays_after_open_delay() {
        let mut rewards = Rewards::new(Some(WaveChestConfig::default()), 7);
        let mut out = Vec::new();

        rewards.handle(&[cleared(1)], &mut out);
        assert!(out.is_empty());
        assert_eq!(rewards.pending_deliveries(), 1);

        rewards.handle(&[time(999)], &mut out);
        assert!(out.is_empty());

        rewards.handle(&[time(1)], &mut out);
        assert_eq!(out.len(), 3);
        assert_eq!(gems(&out), 15);
        assert!(out.iter().all(|command| matches!(
            command,
            Command::GrantGems {
                source: GemSource::WaveChest,
                ..
            }
        )));
    }

    #[test]
    fn clear_during_busy_window_is_dropped() {
        let mut rewards = Rewards::new(Some(WaveChestConfig::default()), 7);
        let mut out = Vec::new();

        rewards.handle(&[cleared(1)], &mut out);
        rewards.handle(&[time(2000), cleared(2)], &mut out);
        assert_eq!(gems(&out), 15);
        assert!(rewards.is_busy());

        rewards.handle(&[time(350)], &mut out);
        assert!(!rewards.is_busy());

        rewards.handle(&[cleared(3), time(1000)], &mut out);
        assert_eq!(gems(&out), 15 + 25);
    }

    #[test]
    fn arena_without_wave_chest_ignores_clears() {
        let mut rewards = Rewards::new(None, 7);
        let mut out = Vec::new();

        rewards.handle(&[cleared(1), time(10_000)], &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn loot_rolls_stay_within_bounds_and_are_seeded() {
        let loot = LootTable {
            min_gems: 2,
            max_gems: 5,
            gem_value: 3,
            min_potions: 0,
            max_potions: 2,
            potion: PotionKind::Lightning,
            delay: Duration::from_millis(200),
        };
        let opened: Vec<Event> = (0..20)
            .map(|chest| Event::ChestOpened {
                chest: ChestId::new(chest),
                loot,
            })
            .collect();

        let roll = |seed| {
            let mut rewards = Rewards::new(None, seed);
            let mut out = Vec::new();
            rewards.handle(&opened, &mut out);
            assert!(out.is_empty());
            rewards.handle(&[time(200)], &mut out);
            out
        };
        let first = roll(11);
        assert_eq!(first, roll(11));

        for chest in 0..20 {
            let id = ChestId::new(chest);
            let pickups = first
                .iter()
                .filter(|command| {
                    matches!(
                        command,
                        Command::GrantGems {
                            amount: 3,
                            source: GemSource::LootChest(source),
                        } if *source == id
                    )
                })
                .count();
            assert!((2..=5).contains(&pickups), "chest {chest} rolled {pickups}");
        }
        for command in &first {
            if let Command::GrantPotions { count, .. } = command {
                assert!((1..=2).contains(count));
            }
        }
    }

    #[test]
    fn zero_maximum_disables_the_roll() {
        let mut rewards = Rewards::new(None, 3);
        let mut out = Vec::new();

        rewards.handle(
            &[Event::ChestOpened {
                chest: ChestId::new(0),
                loot: LootTable {
                    min_gems: 4,
                    max_gems: 0,
                    gem_value: 1,
                    min_potions: 2,
                    max_potions: 0,
                    potion: PotionKind::Lightning,
                    delay: Duration::ZERO,
                },
            }],
            &mut out,
        );

        assert!(out.is_empty());
    }
}
