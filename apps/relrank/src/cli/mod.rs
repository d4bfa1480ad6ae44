//! # relrank CLI Module
//!
//! ## Available Commands
//!
//! - `run` - Apply a command stream and print report lines (default)
//! - `check` - Parse a command stream without applying it
//! - `stats` - Apply a command stream and print index statistics

mod commands;

use crate::config::{FileConfig, Settings};
use clap::{Parser, Subcommand};
use relrank_core::RelrankError;
use std::path::PathBuf;

pub use commands::*;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "RELRANK_CONFIG";

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// relrank - most-related recipients per relation type
///
/// Reads `addent`, `delent`, `addrel`, `delrel` and `report` commands, one
/// per line, until a line reading `end`.
#[derive(Parser, Debug)]
#[command(name = "relrank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output reports and statistics as JSON
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Maximum byte length of a quoted name
    #[arg(long, global = true)]
    pub max_name_length: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a command stream and print one line per report
    Run {
        /// Input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Parse a command stream without applying it
    Check {
        /// Input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Apply a command stream, discard reports, print index statistics
    Stats {
        /// Input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve settings from the config file, environment and flags.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, RelrankError> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

    let file = match config_path {
        Some(path) => {
            tracing::debug!("Loading config from {:?}", path);
            Some(FileConfig::load(&path)?)
        }
        None => None,
    };

    Settings::resolve(file, cli.json_mode, cli.max_name_length)
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), RelrankError> {
    let settings = resolve_settings(&cli)?;
    tracing::debug!(?settings, "Resolved settings");

    match cli.command {
        Some(Commands::Run { input }) => cmd_run(input.as_deref(), &settings),
        Some(Commands::Check { input }) => cmd_check(input.as_deref(), &settings),
        Some(Commands::Stats { input }) => cmd_stats(input.as_deref(), &settings),
        // No subcommand - run stdin by default
        None => cmd_run(None, &settings),
    }
}
