//! Entity identity and collections
//!
//! Each `Registry` owns its own id counter. Ids are handed out in increasing
//! order and never reused for the lifetime of the registry, including across
//! `clear()`, so a stale reference can never alias a newer entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable entity identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything stored in a [`Registry`]
pub trait Entity {
    fn id(&self) -> EntityId;
}

/// Ordered entity collection with registry-assigned ids
///
/// Iteration order equals creation order (ascending id).
#[derive(Debug, Clone)]
pub struct Registry<T> {
    items: Vec<T>,
    next_id: u32,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with a freshly allocated id and store it
    pub fn add(&mut self, build: impl FnOnce(EntityId) -> T) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        let entity = build(id);
        debug_assert_eq!(entity.id(), id, "entity must keep the id it was built with");
        self.items.push(entity);
        id
    }

    /// Remove a single entity, returning it if present
    pub fn remove_by_id(&mut self, id: EntityId) -> Option<T> {
        let index = self.items.iter().position(|e| e.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Remove a batch of entities in one filter pass
    ///
    /// Callers collect ids while iterating and apply them afterwards.
    pub fn remove_all(&mut self, ids: &[EntityId]) {
        if ids.is_empty() {
            return;
        }
        self.items.retain(|e| !ids.contains(&e.id()));
    }

    /// Remove and return every entity matching `pred`, preserving order
    pub fn extract(&mut self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        let (taken, kept): (Vec<T>, Vec<T>) =
            std::mem::take(&mut self.items).into_iter().partition(|e| pred(e));
        self.items = kept;
        taken
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Snapshot view of every live entity
    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every entity; the id counter keeps counting
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Dummy {
        id: EntityId,
        value: u32,
    }

    impl Entity for Dummy {
        fn id(&self) -> EntityId {
            self.id
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut reg = Registry::new();
        let a = reg.add(|id| Dummy { id, value: 1 });
        let b = reg.add(|id| Dummy { id, value: 2 });
        assert!(b > a);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(b).map(|d| d.value), Some(2));
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut reg = Registry::new();
        let a = reg.add(|id| Dummy { id, value: 0 });
        reg.clear();
        let b = reg.add(|id| Dummy { id, value: 0 });
        assert_ne!(a, b);
        assert!(!reg.contains(a));
    }

    #[test]
    fn test_remove_by_id() {
        let mut reg = Registry::new();
        let a = reg.add(|id| Dummy { id, value: 10 });
        let b = reg.add(|id| Dummy { id, value: 20 });

        let removed = reg.remove_by_id(a);
        assert_eq!(removed.map(|d| d.value), Some(10));
        assert!(reg.remove_by_id(a).is_none());
        assert_eq!(reg.all().len(), 1);
        assert_eq!(reg.all()[0].id, b);
    }

    #[test]
    fn test_batch_removal_keeps_order() {
        let mut reg = Registry::new();
        let ids: Vec<_> = (0..6).map(|v| reg.add(|id| Dummy { id, value: v })).collect();

        let doomed: Vec<_> = reg
            .iter()
            .filter(|d| d.value % 2 == 0)
            .map(|d| d.id)
            .collect();
        reg.remove_all(&doomed);

        let left: Vec<_> = reg.iter().map(|d| d.id).collect();
        assert_eq!(left, vec![ids[1], ids[3], ids[5]]);
    }

    proptest! {
        #[test]
        fn prop_live_ids_unique(ops in proptest::collection::vec(0u8..3, 1..64)) {
            let mut reg = Registry::new();
            for op in ops {
                match op {
                    0 | 1 => {
                        reg.add(|id| Dummy { id, value: 0 });
                    }
                    _ => {
                        if let Some(first) = reg.all().first().map(|d| d.id) {
                            reg.remove_by_id(first);
                        }
                    }
                }
            }
            let mut ids: Vec<_> = reg.iter().map(|d| d.id).collect();
            let before = ids.len();
            ids.dedup();
            prop_assert_eq!(before, ids.len());
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
