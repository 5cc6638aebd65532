//! Get command implementation.

use super::{display_value, open_store, CliError};
use serde::Serialize;
use std::path::Path;

/// A single entry, as printed by `get`.
#[derive(Debug, Serialize)]
pub struct GetResult {
    /// Namespace.
    pub namespace: String,
    /// Key.
    pub key: String,
    /// Current version.
    pub version: u64,
    /// Content type.
    pub content_type: String,
    /// Expiry in epoch millis, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Last write in epoch millis.
    pub updated_at: u64,
    /// Payload, lossily decoded as UTF-8.
    pub value: String,
}

/// Runs the get command.
pub fn run(
    path: &Path,
    namespace: &str,
    key: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let entry = store
        .get(namespace, key)?
        .ok_or_else(|| CliError::NotFound {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
        })?;

    let result = GetResult {
        namespace: entry.namespace,
        key: entry.key,
        version: entry.version.as_u64(),
        content_type: entry.content_type,
        expires_at: entry.expires_at.map(|at| at.as_millis()),
        updated_at: entry.updated_at.as_millis(),
        value: display_value(&entry.value),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Version:      {}", result.version);
            println!("Content type: {}", result.content_type);
            if let Some(expires_at) = result.expires_at {
                println!("Expires at:   {expires_at}");
            }
            println!();
            println!("{}", result.value);
        }
    }

    store.close()?;
    Ok(())
}
