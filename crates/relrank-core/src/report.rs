//! # Report
//!
//! Output of a `report` command: for every relation type with at least one
//! active sender, the recipients receiving the most distinct active senders
//! and that count.
//!
//! The text form is one line:
//! `"<relation>" "<recipient>" ... <count>; ` per relation in ascending
//! name order, or `none` when no relation has a leader.

use crate::primitives::NO_RESULTS;
use crate::RelrankError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One relation's leading recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// The relation type name.
    pub relation: String,
    /// Leading recipient names, in ascending order.
    pub leaders: Vec<String>,
    /// Active-sender count shared by every leader.
    pub count: u32,
}

/// A full report, entries in ascending relation-name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Whether no relation produced output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as a single JSON line.
    pub fn to_json(&self) -> Result<String, RelrankError> {
        serde_json::to_string(self).map_err(|e| RelrankError::Serialization(e.to_string()))
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.relation)?;
        for leader in &self.leaders {
            write!(f, " \"{leader}\"")?;
        }
        write!(f, " {}; ", self.count)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(NO_RESULTS);
        }
        for entry in &self.entries {
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
