//! # Dispatcher
//!
//! Maps parsed commands onto `RelationIndex` operations and drives a whole
//! command stream, writing one line per report.

use crate::command::{Command, CommandReader, ParseLimits};
use crate::index::RelationIndex;
use crate::report::Report;
use crate::RelrankError;
use serde::Serialize;
use std::io::{BufRead, Write};

/// How report lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `"rel" "recipient" count; ` or `none`.
    #[default]
    Text,
    /// One JSON object per report.
    Json,
}

/// Options for [`Dispatcher::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub limits: ParseLimits,
    pub format: OutputFormat,
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct RunSummary {
    /// Commands applied, excluding the end marker.
    pub commands: usize,
    /// Report lines written.
    pub reports: usize,
    /// Input lines consumed.
    pub lines: usize,
    /// Whether the stream ended with the end marker rather than EOF.
    pub saw_end_marker: bool,
}

/// Stateless command dispatch.
pub struct Dispatcher;

impl Dispatcher {
    /// Apply one command. Returns the report for a `report` command.
    pub fn apply(index: &mut RelationIndex, command: &Command) -> Option<Report> {
        match command {
            Command::AddEntity(name) => {
                index.create_entity(name);
            }
            Command::DeleteEntity(name) => {
                index.delete_entity(name);
            }
            Command::AddRelation {
                sender,
                recipient,
                relation,
            } => {
                index.add_relation(sender, recipient, relation);
            }
            Command::DeleteRelation {
                sender,
                recipient,
                relation,
            } => {
                index.delete_relation(sender, recipient, relation);
            }
            Command::Report => return Some(index.report()),
            // `CommandReader` consumes the end marker; only direct callers get here.
            Command::End => {}
        }
        None
    }

    /// Run every command of `input` against `index`, writing report lines
    /// to `output`. Stops at the first malformed line.
    pub fn run<R: BufRead, W: Write>(
        input: R,
        output: &mut W,
        index: &mut RelationIndex,
        options: RunOptions,
    ) -> Result<RunSummary, RelrankError> {
        let mut reader = CommandReader::with_limits(input, options.limits);
        let mut summary = RunSummary::default();

        for command in reader.by_ref() {
            let command = command?;
            summary.commands += 1;
            if let Some(report) = Self::apply(index, &command) {
                write_report(output, &report, options.format)?;
                summary.reports += 1;
            }
        }
        output.flush()?;

        summary.lines = reader.lines_read();
        summary.saw_end_marker = reader.saw_end_marker();
        Ok(summary)
    }

    /// Parse `input` without applying anything.
    pub fn check<R: BufRead>(input: R, limits: ParseLimits) -> Result<RunSummary, RelrankError> {
        let mut reader = CommandReader::with_limits(input, limits);
        let mut summary = RunSummary::default();

        for command in reader.by_ref() {
            if command? == Command::Report {
                summary.reports += 1;
            }
            summary.commands += 1;
        }

        summary.lines = reader.lines_read();
        summary.saw_end_marker = reader.saw_end_marker();
        Ok(summary)
    }
}

fn write_report<W: Write>(
    output: &mut W,
    report: &Report,
    format: OutputFormat,
) -> Result<(), RelrankError> {
    match format {
        OutputFormat::Text => writeln!(output, "{report}")?,
        OutputFormat::Json => writeln!(output, "{}", report.to_json()?)?,
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run_text(input: &str) -> (String, RunSummary) {
        let mut index = RelationIndex::new();
        let mut out = Vec::new();
        let summary = Dispatcher::run(input.as_bytes(), &mut out, &mut index, RunOptions::default())
            .expect("run");
        (String::from_utf8(out).expect("utf8"), summary)
    }

    #[test]
    fn apply_returns_report_only_for_report() {
        let mut index = RelationIndex::new();
        assert!(Dispatcher::apply(&mut index, &Command::AddEntity("a".into())).is_none());
        assert!(Dispatcher::apply(&mut index, &Command::End).is_none());
        let report = Dispatcher::apply(&mut index, &Command::Report);
        assert_eq!(report.map(|r| r.to_string()), Some("none".to_string()));
    }

    #[test]
    fn run_writes_one_line_per_report() {
        let input = "addent \"a\"\naddent \"b\"\nreport\naddrel \"a\" \"b\" \"r\"\nreport\nend\n";
        let (out, summary) = run_text(input);
        assert_eq!(out, "none\n\"r\" \"b\" 1; \n");
        assert_eq!(summary.reports, 2);
        assert_eq!(summary.commands, 5);
        assert!(summary.saw_end_marker);
    }

    #[test]
    fn run_emits_json_lines() {
        let input = "addent \"a\"\naddrel \"a\" \"a\" \"r\"\nreport\nend\n";
        let mut index = RelationIndex::new();
        let mut out = Vec::new();
        let options = RunOptions {
            format: OutputFormat::Json,
            ..RunOptions::default()
        };
        Dispatcher::run(input.as_bytes(), &mut out, &mut index, options).expect("run");
        let line = String::from_utf8(out).expect("utf8");
        assert_eq!(
            line.trim_end(),
            r#"{"entries":[{"relation":"r","leaders":["a"],"count":1}]}"#
        );
    }

    #[test]
    fn run_stops_on_malformed_line() {
        let mut index = RelationIndex::new();
        let mut out = Vec::new();
        let result = Dispatcher::run(
            "report\nnope\nreport\n".as_bytes(),
            &mut out,
            &mut index,
            RunOptions::default(),
        );
        assert!(matches!(
            result,
            Err(RelrankError::MalformedCommand { line: 2, .. })
        ));
        assert_eq!(out, b"none\n");
    }

    #[test]
    fn check_counts_without_applying() {
        let summary = Dispatcher::check(
            "addent \"a\"\nreport\nreport\nend\n".as_bytes(),
            ParseLimits::default(),
        )
        .expect("check");
        assert_eq!(summary.commands, 3);
        assert_eq!(summary.reports, 2);
        assert_eq!(summary.lines, 4);
    }
}
