//! The `query-hash` subcommand: persisted-query hashes for GraphQL clients.
//!
//! Computes the SHA-256 digest of a query file, prints an Apollo-style
//! persisted-query extension snippet, and writes the digest to a sidecar
//! `<stem>.hash` file next to the source.

use anyhow::{Context, Result};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::path::Path;

/// SHA-256 of a query string, as lowercase hex.
pub fn hash_query(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn run_query_hash(path: &Path) -> Result<()> {
    let query = std::fs::read_to_string(path)
        .with_context(|| format!("Query file not found: {}", path.display()))?;

    let query_hash = hash_query(&query);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    println!("Query: {}", file_name);
    println!("Hash: {}", query_hash);
    println!();
    println!("Use in GraphQL request:");
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "extensions": {
                "persistedQuery": {
                    "version": 1,
                    "sha256Hash": query_hash,
                }
            }
        }))?
    );

    let hash_file = path.with_extension("hash");
    std::fs::write(&hash_file, &query_hash)
        .with_context(|| format!("Failed to write hash file: {}", hash_file.display()))?;
    println!();
    println!("Hash saved to: {}", hash_file.display());

    Ok(())
}
