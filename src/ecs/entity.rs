//! Entity identifiers and slot allocation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle into the component store.
///
/// The version is bumped every time a slot is freed, so a handle kept past
/// the entity's destruction no longer resolves.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub index: u32,
    pub version: u32,
}

impl EntityRef {
    /// Never refers to a live entity.
    pub const NONE: EntityRef = EntityRef {
        index: u32::MAX,
        version: 0,
    };

    pub fn is_none(self) -> bool {
        self == EntityRef::NONE
    }
}

impl Default for EntityRef {
    fn default() -> Self {
        EntityRef::NONE
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}:{}", self.index, self.version)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Slot allocator. Versions start at 1 so `EntityRef::NONE` never matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    versions: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    live_count: usize,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> EntityRef {
        self.live_count += 1;
        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return EntityRef {
                index,
                version: self.versions[slot],
            };
        }
        let index = self.versions.len() as u32;
        self.versions.push(1);
        self.alive.push(true);
        EntityRef { index, version: 1 }
    }

    /// Free the slot. Returns `false` for stale or dead references.
    pub fn destroy(&mut self, entity: EntityRef) -> bool {
        if !self.exists(entity) {
            return false;
        }
        let slot = entity.index as usize;
        self.alive[slot] = false;
        self.versions[slot] = self.versions[slot].wrapping_add(1).max(1);
        self.free.push(entity.index);
        self.live_count -= 1;
        true
    }

    pub fn exists(&self, entity: EntityRef) -> bool {
        let slot = entity.index as usize;
        slot < self.versions.len() && self.alive[slot] && self.versions[slot] == entity.version
    }

    pub fn len(&self) -> usize {
        self.live_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Live entities in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef> + '_ {
        self.versions
            .iter()
            .zip(self.alive.iter())
            .enumerate()
            .filter(|(_, (_, alive))| **alive)
            .map(|(index, (version, _))| EntityRef {
                index: index as u32,
                version: *version,
            })
    }
}
