//! # Relation Index
//!
//! The façade over the entity registry and the relation catalog. It exposes
//! the four mutating operations and the report query.
//!
//! - Unknown or deleted endpoints make relation commands silent no-ops
//! - Deleting an entity flags only the relations it participates in
//! - Reports rebuild flagged relations lazily, then read cached leaders

use crate::catalog::RelationCatalog;
use crate::registry::{Creation, EntityRegistry};
use crate::report::{Report, ReportEntry};
use serde::Serialize;

/// Point-in-time counters describing the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct IndexStats {
    /// Entity slots ever allocated.
    pub entities: usize,
    /// Entities currently live.
    pub live_entities: usize,
    /// Relation types ever created.
    pub relations: usize,
    /// Relation types awaiting recalculation.
    pub dirty_relations: usize,
    /// Recipient nodes held across all relation types.
    pub recipient_nodes: usize,
}

/// The incremental "most distinct senders per relation" index.
#[derive(Debug, Clone, Default)]
pub struct RelationIndex {
    entities: EntityRegistry,
    relations: RelationCatalog,
}

impl RelationIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or revive entity `name`.
    pub fn create_entity(&mut self, name: &str) -> Creation {
        self.entities.create(name).1
    }

    /// Delete entity `name` and flag every relation it had entered.
    ///
    /// Returns `true` if a live entity was deleted.
    pub fn delete_entity(&mut self, name: &str) -> bool {
        let Some(affected) = self.entities.delete(name) else {
            return false;
        };
        for id in affected {
            self.relations.mark_dirty(id);
        }
        true
    }

    /// Record that `sender` relates to `recipient` under `relation`.
    ///
    /// Returns `true` if the recipient gained an active sender.
    pub fn add_relation(&mut self, sender: &str, recipient: &str, relation: &str) -> bool {
        let (Some(from), Some(to)) = (
            self.entities.endpoint(sender),
            self.entities.endpoint(recipient),
        ) else {
            return false;
        };
        let (sender_id, recipient_id) = (from.id, to.id);

        let relation_id = self.relations.get_or_create(relation);
        let grown = self
            .relations
            .get_mut(relation_id)
            .is_some_and(|rel| rel.add_instance(from, to));

        self.entities
            .register_relation(sender_id, relation, relation_id);
        self.entities
            .register_relation(recipient_id, relation, relation_id);
        grown
    }

    /// Remove the `sender -> recipient` instance of `relation`.
    ///
    /// Returns `true` if an active instance was removed.
    pub fn delete_relation(&mut self, sender: &str, recipient: &str, relation: &str) -> bool {
        let Some(relation_id) = self.relations.lookup(relation) else {
            return false;
        };
        let (Some(from), Some(to)) = (
            self.entities.endpoint(sender),
            self.entities.endpoint(recipient),
        ) else {
            return false;
        };
        self.relations
            .get_mut(relation_id)
            .is_some_and(|rel| rel.remove_instance(from, to))
    }

    /// Rebuild flagged relations, then collect every relation's leaders.
    pub fn report(&mut self) -> Report {
        self.relations.recalculate_dirty(&self.entities);

        let entries = self
            .relations
            .iter_in_order()
            .filter_map(|rel| {
                let count = rel.max_senders().filter(|max| !max.is_zero())?;
                Some(ReportEntry {
                    relation: rel.name().to_owned(),
                    leaders: rel.leaders().map(str::to_owned).collect(),
                    count: count.value(),
                })
            })
            .collect();
        Report { entries }
    }

    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    #[must_use]
    pub fn relations(&self) -> &RelationCatalog {
        &self.relations
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entities: self.entities.len(),
            live_entities: self.entities.live_count(),
            relations: self.relations.len(),
            dirty_relations: self.relations.dirty_count(),
            recipient_nodes: self
                .relations
                .iter_in_order()
                .map(|rel| rel.recipient_count())
                .sum(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(names: &[&str]) -> RelationIndex {
        let mut index = RelationIndex::new();
        for name in names {
            index.create_entity(name);
        }
        index
    }

    #[test]
    fn relation_needs_live_endpoints() {
        let mut index = index_with(&["a"]);
        assert!(!index.add_relation("a", "ghost", "r"));
        assert!(index.relations().is_empty());

        index.create_entity("b");
        index.delete_entity("b");
        assert!(!index.add_relation("a", "b", "r"));
        assert_eq!(index.report().to_string(), "none");
    }

    #[test]
    fn delete_relation_on_unknown_relation_is_noop() {
        let mut index = index_with(&["a", "b"]);
        assert!(!index.delete_relation("a", "b", "r"));
        assert!(index.relations().is_empty());
    }

    #[test]
    fn delete_entity_flags_only_its_relations() {
        let mut index = index_with(&["a", "b", "c", "d"]);
        index.add_relation("a", "b", "r");
        index.add_relation("c", "d", "s");

        assert!(index.delete_entity("a"));
        let stats = index.stats();
        assert_eq!(stats.dirty_relations, 1);
        assert_eq!(stats.live_entities, 3);

        assert_eq!(index.report().to_string(), "\"s\" \"d\" 1; ");
        assert_eq!(index.stats().dirty_relations, 0);
    }

    #[test]
    fn delete_entity_twice_is_noop() {
        let mut index = index_with(&["a"]);
        assert!(index.delete_entity("a"));
        assert!(!index.delete_entity("a"));
        assert!(!index.delete_entity("nobody"));
    }

    #[test]
    fn create_entity_reports_outcome() {
        let mut index = RelationIndex::new();
        assert_eq!(index.create_entity("a"), Creation::Created);
        assert_eq!(index.create_entity("a"), Creation::AlreadyLive);
        index.delete_entity("a");
        assert_eq!(index.create_entity("a"), Creation::Revived);
    }

    #[test]
    fn self_relation_counts_once() {
        let mut index = index_with(&["a"]);
        assert!(index.add_relation("a", "a", "r"));
        assert_eq!(index.report().to_string(), "\"r\" \"a\" 1; ");
        index.delete_entity("a");
        assert_eq!(index.report().to_string(), "none");
    }

    #[test]
    fn revived_entity_reregisters_back_reference() {
        let mut index = index_with(&["a", "b", "c"]);
        index.add_relation("a", "b", "r");
        index.delete_entity("a");
        index.report();

        index.create_entity("a");
        index.add_relation("a", "c", "r");
        assert_eq!(index.report().to_string(), "\"r\" \"c\" 1; ");

        // Second deletion must still invalidate "r".
        index.delete_entity("a");
        assert_eq!(index.report().to_string(), "none");
    }

    #[test]
    fn stats_count_recipient_nodes() {
        let mut index = index_with(&["a", "b", "c"]);
        index.add_relation("a", "b", "r");
        index.add_relation("a", "c", "r");
        index.add_relation("b", "c", "s");
        assert_eq!(index.stats().recipient_nodes, 3);
        assert_eq!(index.stats().relations, 2);
    }
}
