//! NSKV CLI
//!
//! Command-line tools for NSKV stores.
//!
//! # Commands
//!
//! - `get` / `set` / `delete` - Single-entry operations
//! - `list` - Page through the keys of a namespace
//! - `sweep` - Remove expired entries
//! - `health` - Liveness probe
//! - `stats` - Show per-namespace entry counts

mod commands;

use clap::{Parser, Subcommand};
use commands::CliError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// NSKV command-line store tools.
#[derive(Parser)]
#[command(name = "nskv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a single entry
    Get {
        /// Namespace
        namespace: String,
        /// Key
        key: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write a single entry
    Set {
        /// Namespace
        namespace: String,
        /// Key
        key: String,
        /// Value, stored as UTF-8 bytes
        value: String,

        /// Expire the entry after this many seconds
        #[arg(short, long)]
        ttl: Option<u64>,

        /// Content type (defaults to application/json)
        #[arg(short, long)]
        content_type: Option<String>,

        /// Only write if the current version equals this one
        #[arg(long)]
        cas: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete a single entry
    Delete {
        /// Namespace
        namespace: String,
        /// Key
        key: String,
    },

    /// List keys of a namespace
    List {
        /// Namespace
        namespace: String,

        /// Only list keys with this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Maximum number of keys
        #[arg(short, long)]
        limit: Option<usize>,

        /// Continue from a previous page
        #[arg(long)]
        cursor: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove expired entries from disk
    Sweep,

    /// Check that the store answers
    Health,

    /// Display store statistics
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = |command: &'static str| cli.path.clone().ok_or(CliError::MissingPath { command });

    match cli.command {
        Commands::Get {
            ref namespace,
            ref key,
            ref format,
        } => {
            commands::get::run(&path("get")?, namespace, key, format)?;
        }
        Commands::Set {
            ref namespace,
            ref key,
            ref value,
            ttl,
            ref content_type,
            cas,
            ref format,
        } => {
            commands::set::run(
                &path("set")?,
                namespace,
                key,
                value,
                ttl,
                content_type.clone(),
                cas,
                format,
            )?;
        }
        Commands::Delete {
            ref namespace,
            ref key,
        } => {
            commands::delete::run(&path("delete")?, namespace, key)?;
        }
        Commands::List {
            ref namespace,
            ref prefix,
            limit,
            ref cursor,
            ref format,
        } => {
            commands::list::run(
                &path("list")?,
                namespace,
                prefix.clone(),
                limit,
                cursor.clone(),
                format,
            )?;
        }
        Commands::Sweep => {
            commands::sweep::run(&path("sweep")?)?;
        }
        Commands::Health => {
            commands::health::run(&path("health")?)?;
        }
        Commands::Stats { ref format } => {
            commands::stats::run(&path("stats")?, format)?;
        }
        Commands::Version => {
            println!("NSKV CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("NSKV Core v{}", nskv_core::VERSION);
        }
    }

    Ok(())
}
