//! Set command implementation.

use super::open_store;
use nskv_core::{SetOptions, Version};
use serde::Serialize;
use std::path::Path;

/// Outcome of a write.
#[derive(Debug, Serialize)]
pub struct SetResult {
    /// Version after the write.
    pub version: u64,
}

/// Runs the set command.
#[allow(clippy::too_many_arguments)]
pub fn run(
    path: &Path,
    namespace: &str,
    key: &str,
    value: &str,
    ttl: Option<u64>,
    content_type: Option<String>,
    cas: Option<u64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, true)?;

    let mut options = SetOptions::new();
    if let Some(secs) = ttl {
        options = options.ttl_seconds(secs);
    }
    if let Some(content_type) = content_type {
        options = options.content_type(content_type);
    }
    if let Some(expected) = cas {
        options = options.cas(Version::new(expected));
    }

    let version = store.set_with(namespace, key, value.as_bytes(), &options)?;
    let result = SetResult {
        version: version.as_u64(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string(&result)?),
        _ => println!("OK {version}"),
    }

    store.close()?;
    Ok(())
}
