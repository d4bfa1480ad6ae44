//! # Entity Registry
//!
//! Arena of named entities with version-parity soft deletion.
//!
//! An entity slot is allocated on first creation and never freed. Deleting
//! an entity bumps its version to an odd value; re-creating it bumps the
//! version back to even in the same slot. Indices that captured an older
//! version detect the change by comparison instead of holding a dangling
//! reference.

use crate::avl::AvlTree;
use crate::{EntityId, RelationId, Version};
use std::collections::BTreeMap;

/// A named entity.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    version: Version,
    /// Relation types this entity has entered since it was last (re)created,
    /// keyed by relation name. Non-owning: values are catalog handles.
    relations: AvlTree<String, RelationId>,
}

impl Entity {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: Version::INITIAL,
            relations: AvlTree::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.version.is_live()
    }

    /// Relation handles this entity participates in, in relation-name order.
    pub fn relations(&self) -> impl Iterator<Item = RelationId> + '_ {
        self.relations.iter().map(|(_, id)| *id)
    }
}

/// Snapshot of a live entity taken at the start of a relation mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub id: EntityId,
    pub name: &'a str,
    pub version: Version,
}

/// What `EntityRegistry::create` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creation {
    /// A new slot was allocated.
    Created,
    /// A deleted entity was brought back in its existing slot.
    Revived,
    /// The entity was already live; nothing changed.
    AlreadyLive,
    /// The entity is deleted and its version cannot advance any further.
    /// It stays deleted.
    Exhausted,
}

/// Registry of every entity ever mentioned by a create command.
///
/// Uses `BTreeMap` for the name index, matching the deterministic
/// containers used everywhere else in the crate.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    by_name: BTreeMap<String, EntityId>,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `name`, revive it if deleted, or do nothing if live.
    pub fn create(&mut self, name: &str) -> (EntityId, Creation) {
        if let Some(&id) = self.by_name.get(name) {
            let Some(entity) = self.entities.get_mut(id.0) else {
                return (id, Creation::AlreadyLive);
            };
            if entity.is_live() {
                return (id, Creation::AlreadyLive);
            }
            let Some(next) = entity.version.bump() else {
                return (id, Creation::Exhausted);
            };
            entity.version = next;
            return (id, Creation::Revived);
        }

        let id = EntityId(self.entities.len());
        self.entities.push(Entity::new(name));
        self.by_name.insert(name.to_owned(), id);
        (id, Creation::Created)
    }

    /// Delete `name` if it is live.
    ///
    /// Returns the relations the entity had entered, which the caller must
    /// invalidate, or `None` if the entity was unknown or already deleted.
    /// The back-reference tree is emptied: a revived entity re-registers on
    /// its next relation insert.
    pub fn delete(&mut self, name: &str) -> Option<Vec<RelationId>> {
        let id = *self.by_name.get(name)?;
        let entity = self.entities.get_mut(id.0)?;
        if !entity.is_live() {
            return None;
        }
        entity.version = entity.version.bump()?;
        let affected = entity.relations().collect();
        entity.relations.destroy();
        Some(affected)
    }

    /// Find an entity by name, live or not.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    /// Snapshot a live entity for a relation mutation.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<Endpoint<'_>> {
        let id = self.lookup(name)?;
        let entity = self.get(id)?;
        entity.is_live().then_some(Endpoint {
            id,
            name: &entity.name,
            version: entity.version,
        })
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    /// Current version of an entity, if the handle is valid.
    #[must_use]
    pub fn version_of(&self, id: EntityId) -> Option<Version> {
        self.get(id).map(Entity::version)
    }

    /// Record that `id` participates in `relation`. Idempotent.
    pub fn register_relation(&mut self, id: EntityId, relation_name: &str, relation: RelationId) {
        if let Some(entity) = self.entities.get_mut(id.0)
            && !entity.relations.contains_key(relation_name)
        {
            entity.relations.insert(relation_name.to_owned(), relation);
        }
    }

    /// Number of entity slots, live or deleted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of currently live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_live()).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent_while_live() {
        let mut registry = EntityRegistry::new();
        let (a, first) = registry.create("a");
        let (b, second) = registry.create("a");
        assert_eq!(a, b);
        assert_eq!(first, Creation::Created);
        assert_eq!(second, Creation::AlreadyLive);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_then_create_reuses_slot() {
        let mut registry = EntityRegistry::new();
        let (id, _) = registry.create("a");
        assert!(registry.delete("a").is_some());
        assert_eq!(registry.version_of(id), Some(Version(1)));
        assert!(registry.endpoint("a").is_none());

        let (revived, creation) = registry.create("a");
        assert_eq!(revived, id);
        assert_eq!(creation, Creation::Revived);
        assert_eq!(registry.version_of(id), Some(Version(2)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_unknown_or_deleted_is_noop() {
        let mut registry = EntityRegistry::new();
        assert!(registry.delete("ghost").is_none());
        registry.create("a");
        assert!(registry.delete("a").is_some());
        assert!(registry.delete("a").is_none());
        assert_eq!(registry.version_of(EntityId(0)), Some(Version(1)));
    }

    #[test]
    fn delete_returns_and_clears_back_references() {
        let mut registry = EntityRegistry::new();
        let (id, _) = registry.create("a");
        registry.register_relation(id, "likes", RelationId(1));
        registry.register_relation(id, "follows", RelationId(0));
        registry.register_relation(id, "likes", RelationId(1));

        let affected = registry.delete("a").unwrap_or_default();
        // Relation-name order: "follows" < "likes".
        assert_eq!(affected, vec![RelationId(0), RelationId(1)]);

        registry.create("a");
        assert_eq!(registry.get(id).map(|e| e.relations().count()), Some(0));
    }

    #[test]
    fn exhausted_version_stays_deleted() {
        let mut registry = EntityRegistry::new();
        let (id, _) = registry.create("a");
        if let Some(entity) = registry.entities.get_mut(id.0) {
            entity.version = Version(u64::MAX - 1);
        }
        assert!(registry.delete("a").is_some());
        assert_eq!(registry.version_of(id), Some(Version(u64::MAX)));

        assert_eq!(registry.create("a"), (id, Creation::Exhausted));
        assert_eq!(registry.version_of(id), Some(Version(u64::MAX)));
        assert!(registry.endpoint("a").is_none());
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn live_count_tracks_parity() {
        let mut registry = EntityRegistry::new();
        registry.create("a");
        registry.create("b");
        registry.delete("b");
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.len(), 2);
    }
}
