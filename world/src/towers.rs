//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use ember_keep_core::{BlueprintId, SlotId, TowerId, TowerLevel, TowerSnapshot};
use glam::Vec2;

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) slot: SlotId,
    pub(crate) blueprint: BlueprintId,
    pub(crate) level: u32,
    pub(crate) stats: TowerLevel,
    pub(crate) position: Vec2,
    /// Construction time left before the active level engages.
    pub(crate) construction: Duration,
    /// Time left before the tower may fire again.
    pub(crate) cooldown: Duration,
}

impl TowerState {
    pub(crate) fn is_built(&self) -> bool {
        self.construction.is_zero()
    }

    /// Advances timers and reports whether construction finished this tick.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        self.cooldown = self.cooldown.saturating_sub(dt);
        if self.construction.is_zero() {
            return false;
        }
        self.construction = self.construction.saturating_sub(dt);
        self.construction.is_zero()
    }

    /// Swaps in the next level and restarts construction.
    pub(crate) fn begin_level(&mut self, level: u32, stats: TowerLevel) {
        self.level = level;
        self.stats = stats;
        self.construction = stats.build_time;
        self.cooldown = Duration::ZERO;
    }

    pub(crate) fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            slot: self.slot,
            blueprint: self.blueprint,
            level: self.level,
            position: self.position,
            built: self.is_built(),
            ready_in: self.cooldown,
            range: self.stats.range,
            targets_per_shot: self.stats.targets_per_shot,
        }
    }
}

/// Registry that stores towers, slot occupancy and identifier allocation.
#[derive(Debug, Default)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    slots: Vec<Option<TowerId>>,
    next_tower_id: u32,
}

impl TowerRegistry {
    /// Creates an empty registry covering `slot_count` build slots.
    pub(crate) fn new(slot_count: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            slots: vec![None; slot_count],
            next_tower_id: 0,
        }
    }

    /// Tower occupying the slot, if any.
    pub(crate) fn occupant(&self, slot: SlotId) -> Option<TowerId> {
        self.slots.get(slot.get() as usize).copied().flatten()
    }

    /// Registers a new tower on the slot and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        slot: SlotId,
        blueprint: BlueprintId,
        stats: TowerLevel,
        position: Vec2,
    ) -> TowerId {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id = self.next_tower_id.wrapping_add(1);

        if let Some(entry) = self.slots.get_mut(slot.get() as usize) {
            *entry = Some(id);
        }

        let _ = self.entries.insert(
            id,
            TowerState {
                id,
                slot,
                blueprint,
                level: 0,
                stats,
                position,
                construction: stats.build_time,
                cooldown: Duration::ZERO,
            },
        );
        id
    }

    /// Removes a tower and frees its slot.
    pub(crate) fn remove(&mut self, tower: TowerId) -> Option<TowerState> {
        let state = self.entries.remove(&tower)?;
        if let Some(entry) = self.slots.get_mut(state.slot.get() as usize) {
            *entry = None;
        }
        Some(state)
    }

    pub(crate) fn get(&self, tower: TowerId) -> Option<&TowerState> {
        self.entries.get(&tower)
    }

    pub(crate) fn get_mut(&mut self, tower: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&tower)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}
