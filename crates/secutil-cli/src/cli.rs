//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// secutil - check TLS key material and generate nonces
#[derive(Parser, Debug)]
#[command(name = "secutil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a random hex nonce
    Nonce {
        /// Number of random bytes (output is twice as many hex characters)
        #[arg(short, long, default_value_t = 16)]
        bytes: usize,
    },

    /// Validate a certificate, key and optional CA bundle; abort if unusable
    Check {
        /// Settings file (TOML); SECUTIL__* environment variables override it
        #[arg(short, long, env = "SECUTIL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Print a sample settings file
    GenerateConfig,
}
