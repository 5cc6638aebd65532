//! Sweep command implementation.

use super::open_store;
use std::path::Path;

/// Runs the sweep command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let removed = store.cleanup_all_expired()?;
    println!("Removed {removed} expired entries");
    store.close()?;
    Ok(())
}
