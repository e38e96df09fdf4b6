//! Identifier-keyed entity storage shared by every live collection.

use std::collections::BTreeMap;

use crystal_defence_core::{DropId, EffectId, EnemyId, ProjectileId, TowerId};

/// Identifier types that the registry can allocate.
pub(crate) trait Identifier: Copy + Ord {
    /// Builds the identifier from its raw counter value.
    fn from_raw(raw: u32) -> Self;
}

impl Identifier for TowerId {
    fn from_raw(raw: u32) -> Self {
        TowerId::new(raw)
    }
}

impl Identifier for EnemyId {
    fn from_raw(raw: u32) -> Self {
        EnemyId::new(raw)
    }
}

impl Identifier for ProjectileId {
    fn from_raw(raw: u32) -> Self {
        ProjectileId::new(raw)
    }
}

impl Identifier for DropId {
    fn from_raw(raw: u32) -> Self {
        DropId::new(raw)
    }
}

impl Identifier for EffectId {
    fn from_raw(raw: u32) -> Self {
        EffectId::new(raw)
    }
}

/// Registry that stores entities and manages identifier allocation.
///
/// Iteration follows ascending identifier order, which is also creation
/// order, so every consumer observes the same deterministic sequence.
/// Identifiers are never reused; a lookup of a removed entity misses.
#[derive(Clone, Debug)]
pub(crate) struct Registry<K, V> {
    entries: BTreeMap<K, V>,
    next_id: u32,
}

impl<K: Identifier, V> Registry<K, V> {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Allocates an identifier and stores the entity built from it.
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(K) -> V) -> K {
        let id = K::from_raw(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(id, build(id));
        id
    }

    pub(crate) fn get(&self, id: K) -> Option<&V> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: K) -> Option<V> {
        self.entries.remove(&id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.values_mut()
    }

    /// Identifiers of the entities that satisfy the predicate, in order.
    pub(crate) fn ids_where(&self, mut predicate: impl FnMut(&V) -> bool) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, value)| predicate(value))
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&mut V) -> bool) {
        self.entries.retain(|_, value| keep(value));
    }

    /// Identifier that the next insertion will receive.
    pub(crate) fn next_id(&self) -> K {
        K::from_raw(self.next_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_and_allocates_sequential_ids() {
        let mut registry: Registry<TowerId, &str> = Registry::new();
        assert_eq!(registry.len(), 0);

        let first = registry.insert_with(|_| "first");
        assert_eq!(registry.next_id(), TowerId::new(1));
        let second = registry.insert_with(|_| "second");
        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert_eq!(registry.values().copied().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut registry: Registry<EnemyId, u32> = Registry::new();
        let first = registry.insert_with(|id| id.get());
        assert_eq!(registry.remove(first), Some(0));
        assert!(registry.get(first).is_none());

        let next = registry.insert_with(|id| id.get());
        assert_eq!(next, EnemyId::new(1));
    }

    #[test]
    fn ids_where_preserves_creation_order() {
        let mut registry: Registry<DropId, u32> = Registry::new();
        for value in [5, 2, 8, 1] {
            let _ = registry.insert_with(|_| value);
        }
        let ids = registry.ids_where(|value| *value > 1);
        assert_eq!(ids, vec![DropId::new(0), DropId::new(1), DropId::new(2)]);

        registry.retain(|value| *value != 2);
        assert_eq!(registry.len(), 3);
    }
}
