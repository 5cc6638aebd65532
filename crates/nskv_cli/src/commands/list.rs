//! List command implementation.

use super::open_store;
use nskv_core::ListOptions;
use serde::Serialize;
use std::path::Path;

/// One page of keys.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Keys in ascending order.
    pub keys: Vec<String>,
    /// Cursor for the next page, if any.
    pub next_cursor: Option<String>,
}

/// Runs the list command.
pub fn run(
    path: &Path,
    namespace: &str,
    prefix: Option<String>,
    limit: Option<usize>,
    cursor: Option<String>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;

    let mut options = ListOptions::new();
    options.prefix = prefix;
    options.limit = limit;
    options.cursor = cursor;

    let page = store.list(namespace, &options)?;
    let result = ListResult {
        keys: page.keys,
        next_cursor: page.next_cursor,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            for key in &result.keys {
                println!("{key}");
            }
            if let Some(cursor) = &result.next_cursor {
                println!();
                println!("More keys available. Continue with --cursor {cursor}");
            }
        }
    }

    store.close()?;
    Ok(())
}
