//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::Settings;
use serde::Serialize;
use relrank_core::{Dispatcher, IndexStats, OutputFormat, RelationIndex, RelrankError, RunSummary};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// INPUT HANDLING
// =============================================================================

/// Validate an input path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, RelrankError> {
    let canonical = path.canonicalize().map_err(|e| {
        RelrankError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(RelrankError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Open the command stream: a validated file, or stdin.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>, RelrankError> {
    match path {
        Some(path) => {
            let validated = validate_file_path(path)?;
            tracing::info!("Reading commands from {:?}", validated);
            let file = File::open(&validated)?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn log_summary(summary: &RunSummary) {
    tracing::info!(
        commands = summary.commands,
        reports = summary.reports,
        lines = summary.lines,
        "Command stream processed"
    );
    if !summary.saw_end_marker {
        tracing::warn!("Input ended without the 'end' marker");
    }
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Apply `input` to a fresh index, writing report lines to `output`.
pub fn run_stream<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    settings: &Settings,
) -> Result<(RunSummary, IndexStats), RelrankError> {
    let mut index = RelationIndex::new();
    let summary = Dispatcher::run(input, output, &mut index, settings.run_options())?;
    log_summary(&summary);
    Ok((summary, index.stats()))
}

/// Apply a command stream and print report lines to stdout.
pub fn cmd_run(input: Option<&Path>, settings: &Settings) -> Result<(), RelrankError> {
    let reader = open_input(input)?;
    let mut out = BufWriter::new(io::stdout().lock());
    run_stream(reader, &mut out, settings)?;
    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Parse a command stream without applying it.
pub fn cmd_check(input: Option<&Path>, settings: &Settings) -> Result<(), RelrankError> {
    let reader = open_input(input)?;
    let summary = Dispatcher::check(reader, settings.limits)?;
    log_summary(&summary);

    match settings.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!(
                "OK: {} commands ({} reports) on {} lines",
                summary.commands, summary.reports, summary.lines
            );
        }
    }
    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Run counters and index statistics printed by `relrank stats`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsOutput {
    #[serde(flatten)]
    pub run: RunSummary,
    #[serde(flatten)]
    pub index: IndexStats,
}

/// Apply a command stream, discard reports and print index statistics.
pub fn cmd_stats(input: Option<&Path>, settings: &Settings) -> Result<(), RelrankError> {
    let reader = open_input(input)?;
    let (summary, stats) = run_stream(reader, &mut io::sink(), settings)?;

    match settings.format {
        OutputFormat::Json => print_json(&StatsOutput {
            run: summary,
            index: stats,
        })?,
        OutputFormat::Text => {
            println!("relrank Index Statistics");
            println!("========================");
            println!("Commands:        {}", summary.commands);
            println!("Reports:         {}", summary.reports);
            println!();
            println!("Entities:        {}", stats.entities);
            println!("Live Entities:   {}", stats.live_entities);
            println!("Relations:       {}", stats.relations);
            println!("Dirty Relations: {}", stats.dirty_relations);
            println!("Recipient Nodes: {}", stats.recipient_nodes);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RelrankError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| RelrankError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
