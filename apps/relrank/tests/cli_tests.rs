//! # CLI Tests
//!
//! Argument parsing, configuration loading and stream execution through the
//! library half of the binary.

use clap::Parser;
use relrank::cli::{Cli, Commands, StatsOutput, resolve_settings, run_stream};
use relrank::config::{FileConfig, Settings};
use relrank_core::{OutputFormat, RelrankError};
use std::io::Write;

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn no_subcommand_defaults_to_stdin_run() {
    let cli = Cli::try_parse_from(["relrank"]).expect("parse");
    assert!(cli.command.is_none());
    assert!(!cli.json_mode);
}

#[test]
fn run_accepts_input_and_global_flags() {
    let cli = Cli::try_parse_from([
        "relrank",
        "run",
        "--input",
        "commands.txt",
        "--json-mode",
        "--max-name-length",
        "42",
    ])
    .expect("parse");
    assert!(cli.json_mode);
    assert_eq!(cli.max_name_length, Some(42));
    assert!(matches!(
        cli.command,
        Some(Commands::Run { input: Some(ref p) }) if p.ends_with("commands.txt")
    ));
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["relrank", "serve"]).is_err());
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn config_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "max_name_length = 8\njson_mode = true").expect("write");

    let config = FileConfig::load(file.path()).expect("load");
    assert_eq!(config.max_name_length, Some(8));

    let cli = Cli::try_parse_from([
        "relrank",
        "--config",
        file.path().to_str().expect("utf8 path"),
    ])
    .expect("parse");
    let settings = resolve_settings(&cli).expect("settings");
    assert_eq!(settings.limits.max_name_length, 8);
    assert_eq!(settings.format, OutputFormat::Json);
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = FileConfig::load(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(RelrankError::Config(_))));
}

// =============================================================================
// STREAM EXECUTION
// =============================================================================

#[test]
fn run_stream_writes_reports_and_stats() {
    let input = "addent \"a\"\naddent \"b\"\naddent \"c\"\n\
                 addrel \"a\" \"b\" \"r\"\naddrel \"c\" \"b\" \"r\"\n\
                 report\ndelent \"b\"\nreport\nend\n";
    let mut out = Vec::new();
    let (summary, stats) =
        run_stream(input.as_bytes(), &mut out, &Settings::default()).expect("run");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "\"r\" \"b\" 2; \nnone\n"
    );
    assert_eq!(summary.reports, 2);
    assert_eq!(stats.live_entities, 2);
    assert_eq!(stats.relations, 1);
}

#[test]
fn stats_output_is_one_flat_object() {
    let input = "addent \"a\"\naddent \"b\"\naddrel \"a\" \"b\" \"r\"\ndelent \"a\"\nend\n";
    let (summary, stats) =
        run_stream(input.as_bytes(), &mut std::io::sink(), &Settings::default()).expect("run");
    let value = serde_json::to_value(StatsOutput {
        run: summary,
        index: stats,
    })
    .expect("json");

    assert_eq!(value["commands"], 4);
    assert_eq!(value["reports"], 0);
    assert_eq!(value["saw_end_marker"], true);
    assert_eq!(value["entities"], 2);
    assert_eq!(value["live_entities"], 1);
    assert_eq!(value["dirty_relations"], 1);
    assert_eq!(value["recipient_nodes"], 1);
    assert!(value.get("run").is_none());
}

#[test]
fn run_stream_honours_name_limit() {
    let settings = Settings::resolve(None, false, Some(2)).expect("settings");
    let mut out = Vec::new();
    let result = run_stream("addent \"abc\"\nend\n".as_bytes(), &mut out, &settings);
    assert!(matches!(result, Err(RelrankError::NameTooLong { .. })));
}

#[test]
fn run_stream_reads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "addent \"x\"\naddrel \"x\" \"x\" \"self\"\nreport\nend\n").expect("write");

    let reader = relrank::cli::open_input(Some(file.path())).expect("open");
    let mut out = Vec::new();
    run_stream(reader, &mut out, &Settings::default()).expect("run");
    assert_eq!(String::from_utf8(out).expect("utf8"), "\"self\" \"x\" 1; \n");
}

#[test]
fn open_input_rejects_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        relrank::cli::open_input(Some(dir.path())),
        Err(RelrankError::Io(_))
    ));
}
