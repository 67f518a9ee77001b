//! Game entity system with typed integer IDs

use crate::MtgError;
use crate::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Integer ID tagged with the entity type it refers to
///
/// IDs come from a single counter per game, so a `CardId` and a `PlayerId`
/// never share a value. They are stable for the whole game.
pub struct EntityId<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub const fn new(raw: u32) -> Self {
        EntityId {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.raw
    }
}

// Manual impls so the marker type does not need to implement anything.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EntityId::new)
    }
}

/// Anything addressable by an `EntityId`
pub trait GameEntity<T> {
    fn id(&self) -> EntityId<T>;
    fn name(&self) -> &str;
}

/// Central storage for all game entities of one kind
///
/// Uses FxHashMap for fast hashing of integer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId<T>, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, id: EntityId<T>, entity: T) {
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: EntityId<T>) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut(&mut self, id: EntityId<T>) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn contains(&self, id: EntityId<T>) -> bool {
        self.entities.contains_key(&id)
    }

    /// Remove an entity (only tokens leaving the battlefield are removed)
    pub fn remove(&mut self, id: EntityId<T>) -> Option<T> {
        self.entities.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId<T>, &T)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEntity {
        id: EntityId<TestEntity>,
        name: String,
    }

    #[test]
    fn test_entity_store() {
        let mut store = EntityStore::new();
        let id1 = EntityId::new(0);
        let id2 = EntityId::new(1);

        store.insert(
            id1,
            TestEntity {
                id: id1,
                name: "Test1".to_string(),
            },
        );
        store.insert(
            id2,
            TestEntity {
                id: id2,
                name: "Test2".to_string(),
            },
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id1).unwrap().name, "Test1");
        assert_eq!(store.get(id2).unwrap().name, "Test2");
        assert!(store.get(EntityId::new(999)).is_err());
        assert!(store.remove(id1).is_some());
        assert!(!store.contains(id1));
    }

    #[test]
    fn test_entity_id_serde_is_plain_integer() {
        let id: EntityId<TestEntity> = EntityId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: EntityId<TestEntity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_id_ordering() {
        let a: EntityId<TestEntity> = EntityId::new(3);
        let b: EntityId<TestEntity> = EntityId::new(7);
        assert!(a < b);
    }
}
