//! # relrank-core
//!
//! An incremental index answering, for every relation type, "which entities
//! receive the most distinct active senders of that relation, and how many?"
//!
//! ## Layers
//!
//! - `avl`: the one balanced ordered set used by every layer
//! - `registry`: named entities with version-parity soft deletion
//! - `catalog`: relation types, owned in an arena, ordered by name
//! - `relation`: per-relation recipient trees, sender sets and leader cache
//! - `index`: the façade implementing the five commands
//! - `command` / `dispatch`: the line-oriented command stream
//!
//! ## Constraints
//!
//! - Single-threaded, synchronous, in memory; no persistence
//! - Mutations never fail; unknown or deleted endpoints are no-ops
//! - Deletions invalidate lazily; reports rebuild only flagged relations

// =============================================================================
// MODULES
// =============================================================================

pub mod avl;
pub mod catalog;
pub mod command;
pub mod dispatch;
pub mod index;
pub mod primitives;
pub mod registry;
pub mod relation;
pub mod report;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use types::{EntityId, RelationId, RelrankError, SenderCount, Version};

pub use avl::AvlTree;
pub use catalog::RelationCatalog;
pub use command::{Command, CommandReader, ParseLimits, parse_line};
pub use dispatch::{Dispatcher, OutputFormat, RunOptions, RunSummary};
pub use index::{IndexStats, RelationIndex};
pub use registry::{Creation, Endpoint, Entity, EntityRegistry};
pub use relation::{LeaderState, Relation};
pub use report::{Report, ReportEntry};
