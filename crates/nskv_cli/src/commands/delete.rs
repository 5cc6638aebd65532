//! Delete command implementation.

use super::open_store;
use std::path::Path;

/// Runs the delete command.
pub fn run(path: &Path, namespace: &str, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    if store.delete(namespace, key)? {
        println!("Deleted {namespace}/{key}");
    } else {
        println!("{namespace}/{key} did not exist");
    }
    store.close()?;
    Ok(())
}
