//! Gems, potions, ore nodes, chests and the timed crafting stations.

use std::{collections::BTreeMap, time::Duration};

use ember_keep_core::{Event, PotionKind};

/// Shortest brewing time the alchemy station accepts.
pub(crate) const MIN_CRAFT_TIME: Duration = Duration::from_millis(10);

/// Gem balance of the player.
#[derive(Debug, Default)]
pub(crate) struct Wallet {
    gems: u32,
}

impl Wallet {
    pub(crate) fn with_balance(gems: u32) -> Self {
        Self { gems }
    }

    pub(crate) fn balance(&self) -> u32 {
        self.gems
    }

    pub(crate) fn can_afford(&self, amount: u32) -> bool {
        self.gems >= amount
    }

    pub(crate) fn credit(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        if amount == 0 {
            return;
        }
        self.gems = self.gems.saturating_add(amount);
        out_events.push(Event::GemsChanged {
            total: self.gems,
            delta: i64::from(amount),
        });
    }

    /// Deducts `amount` when the balance covers it.
    pub(crate) fn spend(&mut self, amount: u32, out_events: &mut Vec<Event>) -> bool {
        if !self.can_afford(amount) {
            return false;
        }
        if amount > 0 {
            self.gems -= amount;
            out_events.push(Event::GemsChanged {
                total: self.gems,
                delta: -i64::from(amount),
            });
        }
        true
    }
}

/// Potions held by the player.
#[derive(Debug, Default)]
pub(crate) struct Inventory {
    potions: BTreeMap<PotionKind, u32>,
}

impl Inventory {
    pub(crate) fn count(&self, kind: PotionKind) -> u32 {
        self.potions.get(&kind).copied().unwrap_or(0)
    }

    pub(crate) fn add(&mut self, kind: PotionKind, count: u32, out_events: &mut Vec<Event>) {
        if count == 0 {
            return;
        }
        let total = self.potions.entry(kind).or_insert(0);
        *total = total.saturating_add(count);
        out_events.push(Event::PotionsChanged {
            kind,
            total: *total,
        });
    }

    pub(crate) fn take(&mut self, kind: PotionKind, out_events: &mut Vec<Event>) -> bool {
        match self.potions.get_mut(&kind) {
            Some(total) if *total > 0 => {
                *total -= 1;
                out_events.push(Event::PotionsChanged {
                    kind,
                    total: *total,
                });
                true
            }
            _ => false,
        }
    }
}

/// Potion brewing at the alchemy station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CraftJob {
    pub(crate) kind: PotionKind,
    pub(crate) remaining: Duration,
}

impl CraftJob {
    pub(crate) fn new(kind: PotionKind, craft_time: Duration) -> Self {
        Self {
            kind,
            remaining: craft_time.max(MIN_CRAFT_TIME),
        }
    }

    /// Counts down and reports whether brewing finished.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }
}

/// Egg progressing through the hatchery.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum HatchJob {
    /// The egg is settling into the socket.
    Settling {
        remaining: Duration,
        hatch_time: Duration,
    },
    /// The egg is hatching.
    Hatching { remaining: Duration },
}

impl HatchJob {
    pub(crate) fn new(egg_move_duration: Duration, hatch_time: Duration) -> Self {
        Self::Settling {
            remaining: egg_move_duration,
            hatch_time,
        }
    }

    /// Total time before the dragon emerges.
    pub(crate) fn total(&self) -> Duration {
        match *self {
            Self::Settling {
                remaining,
                hatch_time,
            } => remaining.saturating_add(hatch_time),
            Self::Hatching { remaining } => remaining,
        }
    }

    /// Counts down, carrying leftover time into the hatching stage.
    ///
    /// Returns `true` once the dragon hatches.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        let mut dt = dt;
        if let Self::Settling {
            remaining,
            hatch_time,
        } = *self
        {
            if dt < remaining {
                *self = Self::Settling {
                    remaining: remaining - dt,
                    hatch_time,
                };
                return false;
            }
            dt -= remaining;
            *self = Self::Hatching {
                remaining: hatch_time,
            };
        }

        if let Self::Hatching { remaining } = self {
            *remaining = remaining.saturating_sub(dt);
            return remaining.is_zero();
        }
        false
    }
}

/// Runtime state of an ore node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct OreState {
    pub(crate) hits: u32,
}
