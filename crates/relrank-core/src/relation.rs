//! # Relation Type
//!
//! One relation type owns:
//! - a recipient tree keyed by recipient name, where each node owns the set
//!   of senders pointing at that recipient and a cached active count
//! - a leader cache holding the current maximum count and the recipients
//!   that reach it
//!
//! Inserts keep the leader cache exact. Deletes that could lower the maximum
//! only flag the cache; the next report rebuilds it with a full scan.

use crate::avl::AvlTree;
use crate::registry::{Endpoint, EntityRegistry};
use crate::{EntityId, SenderCount, Version};

// =============================================================================
// SENDER ENTRY
// =============================================================================

/// A sender recorded under one recipient, stamped with the sender's version
/// at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderEntry {
    pub entity: EntityId,
    pub version: Version,
}

impl SenderEntry {
    /// Active iff the stamp matches the entity's current, live version.
    #[must_use]
    pub fn is_active(&self, entities: &EntityRegistry) -> bool {
        self.version.is_live() && entities.version_of(self.entity) == Some(self.version)
    }
}

// =============================================================================
// RECIPIENT NODE
// =============================================================================

/// Per-recipient state inside a relation.
#[derive(Debug, Clone)]
pub struct RecipientNode {
    entity: EntityId,
    /// Recipient version when this node was last written. A mismatch means
    /// the recipient was deleted since, and every sender here is stale.
    rec_version: Version,
    active: SenderCount,
    senders: AvlTree<String, SenderEntry>,
}

impl RecipientNode {
    fn new(entity: EntityId, rec_version: Version) -> Self {
        Self {
            entity,
            rec_version,
            active: SenderCount::ZERO,
            senders: AvlTree::new(),
        }
    }

    #[must_use]
    pub fn active(&self) -> SenderCount {
        self.active
    }

    /// Sender names in order, including entries not yet found stale.
    pub fn sender_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.senders.keys().map(String::as_str)
    }

    /// Admit `sender`. Returns the new active count if it grew.
    fn admit(&mut self, sender: Endpoint<'_>, rec_version: Version) -> Option<SenderCount> {
        if self.rec_version != rec_version {
            self.senders.destroy();
            self.active = SenderCount::ZERO;
            self.rec_version = rec_version;
        }

        let mut refreshed = false;
        let inserted = self.senders.insert_with(
            sender.name.to_owned(),
            || SenderEntry {
                entity: sender.id,
                version: sender.version,
            },
            |entry| {
                // Sender was deleted and re-created since it was recorded.
                if entry.version < sender.version {
                    entry.version = sender.version;
                    refreshed = true;
                }
            },
        );

        if inserted || refreshed {
            self.active = self.active.increment();
            Some(self.active)
        } else {
            None
        }
    }

    /// Remove `sender` if it is currently active. Returns the count before
    /// removal.
    fn withdraw(&mut self, sender: Endpoint<'_>, rec_version: Version) -> Option<SenderCount> {
        if self.rec_version != rec_version {
            return None;
        }
        let entry = self.senders.get(sender.name)?;
        if entry.version != sender.version {
            return None;
        }
        self.senders.remove(sender.name);
        let before = self.active;
        self.active = self.active.decrement();
        Some(before)
    }

    /// Drop stale senders and recompute the exact active count.
    fn recount(&mut self, entities: &EntityRegistry) {
        let recipient_current = self.rec_version.is_live()
            && entities.version_of(self.entity) == Some(self.rec_version);
        if !recipient_current {
            self.senders.destroy();
            self.active = SenderCount::ZERO;
            return;
        }
        self.senders.retain(|_, entry| entry.is_active(entities));
        self.active = SenderCount::from_len(self.senders.len());
    }
}

// =============================================================================
// LEADER CACHE
// =============================================================================

/// Validity of a relation's leader cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderState {
    /// `max` is the exact maximum active count; zero means no leaders.
    Clean { max: SenderCount },
    /// A deletion may have lowered the maximum; rebuild before reporting.
    NeedsRecalc,
}

/// The recipients achieving the maximum active-sender count.
#[derive(Debug, Clone)]
pub struct LeaderCache {
    state: LeaderState,
    set: AvlTree<String, ()>,
}

impl Default for LeaderCache {
    fn default() -> Self {
        Self {
            state: LeaderState::Clean {
                max: SenderCount::ZERO,
            },
            set: AvlTree::new(),
        }
    }
}

impl LeaderCache {
    /// Account for `recipient` reaching `count`.
    ///
    /// A tie extends the set; a strictly higher count replaces it. Ignored
    /// while the cache awaits recalculation.
    fn offer(&mut self, recipient: &str, count: SenderCount) {
        let LeaderState::Clean { max } = self.state else {
            return;
        };
        if count.is_zero() || count < max {
            return;
        }
        if count > max {
            self.set.destroy();
            self.state = LeaderState::Clean { max: count };
        }
        self.set.insert(recipient.to_owned(), ());
    }

    /// Account for a recipient dropping from `before`. Losing a leader
    /// invalidates the cache, since the runner-up is unknown.
    fn withdraw(&mut self, before: SenderCount) {
        if let LeaderState::Clean { max } = self.state
            && before == max
        {
            self.state = LeaderState::NeedsRecalc;
        }
    }

    fn invalidate(&mut self) {
        self.state = LeaderState::NeedsRecalc;
    }

    fn reset(&mut self) {
        self.set.destroy();
        self.state = LeaderState::Clean {
            max: SenderCount::ZERO,
        };
    }
}

// =============================================================================
// RELATION
// =============================================================================

/// A relation type and its incremental index.
#[derive(Debug, Clone)]
pub struct Relation {
    name: String,
    recipients: AvlTree<String, RecipientNode>,
    leaders: LeaderCache,
}

impl Relation {
    /// Create an empty relation type.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            recipients: AvlTree::new(),
            leaders: LeaderCache::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> LeaderState {
        self.leaders.state
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        matches!(self.state(), LeaderState::NeedsRecalc)
    }

    /// Cached maximum, or `None` while awaiting recalculation.
    #[must_use]
    pub fn max_senders(&self) -> Option<SenderCount> {
        match self.state() {
            LeaderState::Clean { max } => Some(max),
            LeaderState::NeedsRecalc => None,
        }
    }

    /// Leading recipient names in order. Only meaningful while clean.
    pub fn leaders(&self) -> impl Iterator<Item = &str> + '_ {
        self.leaders.set.keys().map(String::as_str)
    }

    /// Number of recipient nodes currently held.
    #[must_use]
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    #[must_use]
    pub fn recipient(&self, name: &str) -> Option<&RecipientNode> {
        self.recipients.get(name)
    }

    /// Active-sender count recorded for `recipient`; zero if it has no node.
    ///
    /// May overcount while the relation is dirty.
    #[must_use]
    pub fn active_senders(&self, recipient: &str) -> SenderCount {
        self.recipient(recipient)
            .map_or(SenderCount::ZERO, RecipientNode::active)
    }

    /// Record `sender -> recipient`. Both endpoints must be live snapshots.
    ///
    /// Returns `true` if the recipient's active count grew.
    pub fn add_instance(&mut self, sender: Endpoint<'_>, recipient: Endpoint<'_>) -> bool {
        let grown = self.recipients.upsert(
            recipient.name.to_owned(),
            || RecipientNode::new(recipient.id, recipient.version),
            |node| node.admit(sender, recipient.version),
        );
        let Some(count) = grown else {
            return false;
        };
        self.leaders.offer(recipient.name, count);
        true
    }

    /// Remove `sender -> recipient` if that instance is active.
    ///
    /// Returns `true` if an active instance was removed. A recipient left
    /// with no active senders is pruned from the tree.
    pub fn remove_instance(&mut self, sender: Endpoint<'_>, recipient: Endpoint<'_>) -> bool {
        let Some(node) = self.recipients.get_mut(recipient.name) else {
            return false;
        };
        let Some(before) = node.withdraw(sender, recipient.version) else {
            return false;
        };
        if node.active().is_zero() {
            self.recipients.remove(recipient.name);
        }
        self.leaders.withdraw(before);
        true
    }

    /// Flag the leader cache for a full rebuild.
    pub fn invalidate(&mut self) {
        self.leaders.invalidate();
    }

    /// Rebuild counts and leaders by full scan if the cache is dirty.
    ///
    /// Returns `true` if a rebuild happened.
    pub fn recalculate(&mut self, entities: &EntityRegistry) -> bool {
        if !self.is_dirty() {
            return false;
        }
        self.leaders.reset();
        self.recipients
            .for_each_mut(|_, node| node.recount(entities));
        self.recipients.retain(|_, node| !node.active().is_zero());
        for (name, node) in &self.recipients {
            self.leaders.offer(name, node.active());
        }
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================
