//! Typed component storage keyed by entity slot

use serde::{Deserialize, Serialize};

use super::EntityRef;

/// One component type's data. Each slot remembers the entity version it was
/// attached under, so lookups through stale references miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage<T> {
    slots: Vec<Option<(u32, T)>>,
    count: usize,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            count: 0,
        }
    }
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or replace the component.
    pub fn insert(&mut self, entity: EntityRef, value: T) {
        let slot = entity.index as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        if self.slots[slot].is_none() {
            self.count += 1;
        }
        self.slots[slot] = Some((entity.version, value));
    }

    pub fn remove(&mut self, entity: EntityRef) -> Option<T> {
        let slot = self.slots.get_mut(entity.index as usize)?;
        if slot.as_ref().map(|(version, _)| *version) != Some(entity.version) {
            return None;
        }
        self.count -= 1;
        slot.take().map(|(_, value)| value)
    }

    pub fn get(&self, entity: EntityRef) -> Option<&T> {
        match self.slots.get(entity.index as usize) {
            Some(Some((version, value))) if *version == entity.version => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, entity: EntityRef) -> Option<&mut T> {
        match self.slots.get_mut(entity.index as usize) {
            Some(Some((version, value))) if *version == entity.version => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.get(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Components in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityRef, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref().map(|(version, value)| {
                (
                    EntityRef {
                        index: index as u32,
                        version: *version,
                    },
                    value,
                )
            })
        })
    }

    /// Owning entities in ascending slot order.
    pub fn entities(&self) -> Vec<EntityRef> {
        self.iter().map(|(entity, _)| entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32, version: u32) -> EntityRef {
        EntityRef { index, version }
    }

    #[test]
    fn test_version_mismatch_misses() {
        let mut storage = Storage::new();
        storage.insert(entity(3, 1), "tank");
        assert_eq!(storage.get(entity(3, 1)), Some(&"tank"));
        assert_eq!(storage.get(entity(3, 2)), None);
        assert_eq!(storage.remove(entity(3, 2)), None);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_iteration_is_slot_ordered() {
        let mut storage = Storage::new();
        storage.insert(entity(5, 1), 'c');
        storage.insert(entity(0, 1), 'a');
        storage.insert(entity(2, 4), 'b');
        let order: Vec<char> = storage.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(storage.entities()[1], entity(2, 4));
    }
}
