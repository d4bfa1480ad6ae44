//! # relrank
//!
//! Reads a stream of entity and relation commands and prints, on every
//! `report`, the recipients with the most distinct active senders per
//! relation type.
//!
//! ## Usage
//!
//! ```bash
//! # Run a command stream from stdin
//! relrank < commands.txt
//!
//! # Run from a file, JSON report lines
//! relrank run -i commands.txt --json-mode
//!
//! # Validate syntax only
//! relrank check -i commands.txt
//! ```

use clap::Parser;
use relrank::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // RELRANK_LOG_FORMAT=json enables machine-parseable logs on stderr.
    let log_format = std::env::var("RELRANK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "relrank=debug"
    } else {
        "relrank=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
