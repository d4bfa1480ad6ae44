//! # Command Vocabulary and Limits
//!
//! Hardcoded constants for the relrank command stream.
//!
//! The stream is line oriented. Each line starts with one of five verbs and
//! carries zero, one or three double-quoted names. The stream ends at a line
//! holding only the end marker.

/// Verb that creates (or revives) an entity.
pub const VERB_ADD_ENTITY: &str = "addent";

/// Verb that deletes an entity.
pub const VERB_DELETE_ENTITY: &str = "delent";

/// Verb that adds a relation instance `"sender" "recipient" "relation"`.
pub const VERB_ADD_RELATION: &str = "addrel";

/// Verb that removes a relation instance.
pub const VERB_DELETE_RELATION: &str = "delrel";

/// Verb that requests a report line.
pub const VERB_REPORT: &str = "report";

/// Line that terminates the command stream.
pub const END_MARKER: &str = "end";

/// Report line emitted when no relation has an active leader.
pub const NO_RESULTS: &str = "none";

/// Default maximum length for a quoted name, in bytes.
///
/// Names longer than this are rejected by the parser. The binary can raise
/// or lower the limit through its configuration.
pub const MAX_NAME_LENGTH: usize = 100;

/// Height of an absent tree node. A leaf therefore has height 0.
pub const ABSENT_HEIGHT: i32 = -1;
