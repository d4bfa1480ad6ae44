//! # relrank
//!
//! Library half of the relrank binary: CLI definitions, command
//! implementations and configuration loading. `main.rs` only sets up
//! tracing and calls [`cli::execute`].

pub mod cli;
pub mod config;
