//! Command-line interface for Brigade
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Brigade - minimal virtual network bridge manager
#[derive(Parser)]
#[command(name = "brigade")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "brigade.toml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Bring up the configured bridges and open the admin console
    Run {
        /// Number of bridges to create (overrides the config file)
        #[arg(short = 'n', long)]
        num_bridges: Option<usize>,
    },

    /// Validate configuration
    Check,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
