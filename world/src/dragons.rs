//! Hatched dragons and their timers.

use std::{collections::BTreeMap, time::Duration};

use ember_keep_core::{DragonId, DragonSnapshot, DragonTemplate, EnemyId};
use glam::Vec2;

#[derive(Clone, Debug)]
pub(crate) struct Dragon {
    pub(crate) id: DragonId,
    pub(crate) position: Vec2,
    pub(crate) template: DragonTemplate,
    pub(crate) target: Option<EnemyId>,
    pub(crate) cooldown: Duration,
    pub(crate) retarget: Duration,
}

impl Dragon {
    /// Counts down the cooldown while engaged and the retarget timer while idle.
    pub(crate) fn advance(&mut self, dt: Duration) {
        if self.target.is_some() {
            self.cooldown = self.cooldown.saturating_sub(dt);
        } else {
            self.retarget = self.retarget.saturating_sub(dt);
        }
    }

    pub(crate) fn snapshot(&self) -> DragonSnapshot {
        DragonSnapshot {
            id: self.id,
            position: self.position,
            target: self.target,
            ready_in: self.cooldown,
            retarget_in: self.retarget,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DragonRoster {
    entries: BTreeMap<DragonId, Dragon>,
    next_id: u32,
}

impl DragonRoster {
    pub(crate) fn hatch(&mut self, position: Vec2, template: DragonTemplate) -> DragonId {
        let id = DragonId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            Dragon {
                id,
                position,
                template,
                target: None,
                cooldown: Duration::ZERO,
                retarget: Duration::ZERO,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, dragon: DragonId) -> Option<&mut Dragon> {
        self.entries.get_mut(&dragon)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Dragon> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Dragon> {
        self.entries.values_mut()
    }

    /// Drops every reference to an enemy that left the arena.
    pub(crate) fn forget_target(&mut self, enemy: EnemyId) {
        for dragon in self.entries.values_mut() {
            if dragon.target == Some(enemy) {
                dragon.target = None;
            }
        }
    }
}
