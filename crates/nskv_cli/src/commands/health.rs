//! Health command implementation.

use super::{open_store, CliError};
use std::path::Path;

/// Runs the health command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let healthy = store.healthcheck();
    store.close()?;

    if !healthy {
        return Err(CliError::Unhealthy {
            path: path.display().to_string(),
        }
        .into());
    }
    println!("OK");
    Ok(())
}
