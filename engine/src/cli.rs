//! CLI interface for Conductor
//!
//! Defines commands and global flags with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conductor task-assignment service
///
/// Keeps a registry of workers and tasks and asks an LLM to decide who
/// should take each task.
#[derive(Parser, Debug)]
#[command(name = "conductor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Seed the demo organization
        #[arg(long)]
        load_test_data: bool,
    },

    /// Verify the LLM credential
    Check {
        /// Also send a one-line prompt to the provider
        #[arg(long)]
        ping: bool,
    },

    /// Print the organization state report
    State {
        /// Seed the demo organization first
        #[arg(long)]
        load_test_data: bool,
    },
}
