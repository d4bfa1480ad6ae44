//! # Relation Catalog
//!
//! Sole owner of every relation type. Relation types are created on first
//! use and never removed; other structures refer to them by `RelationId`.

use crate::avl::AvlTree;
use crate::registry::EntityRegistry;
use crate::relation::{LeaderState, Relation};
use crate::RelationId;

/// Arena of relation types plus a name-ordered index over them.
#[derive(Debug, Clone, Default)]
pub struct RelationCatalog {
    relations: Vec<Relation>,
    by_name: AvlTree<String, RelationId>,
}

impl RelationCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the relation type named `name`, creating it if absent.
    pub fn get_or_create(&mut self, name: &str) -> RelationId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let id = RelationId(self.relations.len());
        self.relations.push(Relation::new(name));
        self.by_name.insert(name.to_owned(), id);
        id
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<RelationId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id.0)
    }

    pub fn get_mut(&mut self, id: RelationId) -> Option<&mut Relation> {
        self.relations.get_mut(id.0)
    }

    /// Flag a relation's leader cache for a rebuild.
    pub fn mark_dirty(&mut self, id: RelationId) {
        if let Some(relation) = self.get_mut(id) {
            relation.invalidate();
        }
    }

    /// Rebuild every dirty relation, walking in name order.
    ///
    /// Returns the number of relations rebuilt.
    pub fn recalculate_dirty(&mut self, entities: &EntityRegistry) -> usize {
        let mut rebuilt = 0;
        for (_, id) in &self.by_name {
            if let Some(relation) = self.relations.get_mut(id.0)
                && relation.recalculate(entities)
            {
                rebuilt += 1;
            }
        }
        rebuilt
    }

    /// Relation types in ascending name order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.by_name
            .iter()
            .filter_map(|(_, id)| self.relations.get(id.0))
    }

    /// Number of relation types ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Number of relation types awaiting recalculation.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.relations
            .iter()
            .filter(|r| r.state() == LeaderState::NeedsRecalc)
            .count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
