//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod health;
pub mod list;
pub mod set;
pub mod stats;
pub mod sweep;

use nskv_core::{Config, KvStore};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the CLI itself, as opposed to the store.
#[derive(Debug, Error)]
pub enum CliError {
    /// A command needs `--path` and none was given.
    #[error("database path required for {command} (use --path)")]
    MissingPath {
        /// Subcommand name.
        command: &'static str,
    },

    /// `get` found nothing.
    #[error("{namespace}/{key} not found")]
    NotFound {
        /// Namespace looked up.
        namespace: String,
        /// Key looked up.
        key: String,
    },

    /// The store answered the health probe negatively.
    #[error("store at {path} is unhealthy")]
    Unhealthy {
        /// Database path.
        path: String,
    },
}

/// Opens the store at `path`.
///
/// Only writing commands may create a missing database file.
pub fn open_store(path: &Path, create: bool) -> Result<KvStore, Box<dyn std::error::Error>> {
    let config = Config::new().create_if_missing(create);
    Ok(KvStore::open_with_config(path, config)?)
}

/// Renders a payload for terminal output.
pub fn display_value(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}
