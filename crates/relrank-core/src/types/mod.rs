//! # Core Type Definitions
//!
//! This module contains the small value types shared by every layer of the
//! relrank index:
//! - Arena handles (`EntityId`, `RelationId`)
//! - Liveness versions (`Version`)
//! - Sender counters (`SenderCount`)
//! - Error types (`RelrankError`)
//!
//! ## Handle Discipline
//!
//! Entities and relation types live in arenas owned by the registry and the
//! catalog. Every other structure refers to them through `Copy` handles and
//! detects staleness by comparing versions, never by holding a reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ARENA HANDLES
// =============================================================================

/// Handle to an entity slot in the `EntityRegistry` arena.
///
/// A slot is never freed; a deleted and re-created entity keeps its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub usize);

/// Handle to a relation type in the `RelationCatalog` arena.
///
/// Relation types are never deleted, so a handle stays valid for the
/// lifetime of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub usize);

// =============================================================================
// VERSION
// =============================================================================

/// Monotonic entity version. Parity encodes liveness:
/// even means active, odd means deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Version(pub u64);

impl Version {
    /// Version of a freshly created entity.
    pub const INITIAL: Self = Self(0);

    /// Advance the version by one, flipping liveness.
    ///
    /// Returns `None` once the counter is exhausted. `u64::MAX` is odd, so
    /// only a revival can run out.
    #[must_use]
    pub const fn bump(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(next) => Some(Self(next)),
            None => None,
        }
    }

    /// Whether an entity at this version is active.
    #[must_use]
    pub const fn is_live(self) -> bool {
        self.0 % 2 == 0
    }

    /// Get the raw version value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

// =============================================================================
// SENDER COUNT
// =============================================================================

/// Number of distinct active senders of one relation toward one recipient.
/// Uses saturating arithmetic in both directions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SenderCount(pub u32);

impl SenderCount {
    /// No active senders.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    #[must_use]
    pub const fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Get the raw count.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Convert a collection length, clamping at `u32::MAX`.
    #[must_use]
    pub fn from_len(len: usize) -> Self {
        Self(u32::try_from(len).unwrap_or(u32::MAX))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur around the relrank index.
///
/// Index mutations never fail: operations naming unknown or deleted
/// entities are silent no-ops. Errors come only from reading the command
/// stream, from configuration, and from output encoding.
#[derive(Debug, Error)]
pub enum RelrankError {
    /// A command line could not be parsed.
    #[error("Malformed command on line {line}: {reason}")]
    MalformedCommand { line: usize, reason: String },

    /// A quoted name exceeds the configured length limit.
    #[error("Name on line {line} is {len} bytes, above the limit of {max}")]
    NameTooLong { line: usize, len: usize, max: usize },

    /// An I/O error occurred while reading commands or writing reports.
    #[error("I/O error: {0}")]
    Io(String),

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for RelrankError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
