//! CLI module for devbook
//!
//! Provides command-line interface parsing for the devbook-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// devbook - social network HTTP backend
#[derive(Parser, Debug)]
#[command(
    name = "devbook-server",
    version,
    about = "devbook - social network HTTP backend",
    long_about = "Users, posts, follows and likes behind JWT bearer authentication.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  devbook-server                          # Start the server (reads devbook.toml)\n    \
                  devbook-server --config prod.toml       # Use a custom config file\n    \
                  devbook-server config --validate        # Check the configuration and exit\n    \
                  devbook-server hash-password hunter2    # Print an Argon2id hash for seeding"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "devbook.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration information
    Config {
        /// Validate the configuration file, including the signing secret
        #[arg(long)]
        validate: bool,
    },

    /// Hash a password with the configured Argon2 cost
    HashPassword {
        /// Plaintext to hash
        plaintext: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
