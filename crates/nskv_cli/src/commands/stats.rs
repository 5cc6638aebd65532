//! Stats command implementation.

use super::open_store;
use serde::Serialize;
use std::path::Path;

/// Store summary.
#[derive(Debug, Serialize)]
pub struct StatsResult {
    /// Database path.
    pub path: String,
    /// Main database file size in bytes.
    pub file_size: u64,
    /// Live entries across all namespaces.
    pub total_entries: u64,
    /// Live entries per namespace.
    pub namespaces: Vec<NamespaceStats>,
}

/// Statistics for a single namespace.
#[derive(Debug, Serialize)]
pub struct NamespaceStats {
    /// Namespace name.
    pub name: String,
    /// Number of live entries.
    pub entries: u64,
}

/// Runs the stats command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let namespaces: Vec<NamespaceStats> = store
        .namespaces()?
        .into_iter()
        .map(|(name, entries)| NamespaceStats { name, entries })
        .collect();
    store.close()?;

    let result = StatsResult {
        path: path.display().to_string(),
        file_size: std::fs::metadata(path)?.len(),
        total_entries: namespaces.iter().map(|ns| ns.entries).sum(),
        namespaces,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &StatsResult) {
    println!("NSKV Store Statistics");
    println!("=====================");
    println!();
    println!("Path:          {}", result.path);
    println!("File size:     {}", format_size(result.file_size));
    println!("Live entries:  {}", result.total_entries);

    if !result.namespaces.is_empty() {
        println!();
        println!("Namespaces:");
        for ns in &result.namespaces {
            println!("  {:<24} {} entries", ns.name, ns.entries);
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
