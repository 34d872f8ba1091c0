// crates/strata-cli/src/source.rs
//
// File-based seed source: a JSON array of strings, a JSON object (the keys
// are the ids), or plain newline-delimited text. Entries that are already
// derived identities are canonicalized into seeds through the shared
// transform; duplicates are dropped preserving first occurrence.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use strata_core::{is_valid_identity, seed_from_identity, SeedSource, StrataError, IDENTITY_LEN};

/// Seed source backed by a listing file.
#[derive(Debug, Clone)]
pub struct FileSeedSource {
    path: PathBuf,
}

impl FileSeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeedSource for FileSeedSource {
    fn load(&self) -> Result<Vec<String>, StrataError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            StrataError::Storage(format!("Failed to read input {}: {}", self.path.display(), e))
        })?;

        let raw_entries: Vec<String> = match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(serde_json::Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Ok(serde_json::Value::Object(map)) => map.into_iter().map(|(k, _)| k).collect(),
            // Not JSON (or a scalar): treat as newline-delimited text.
            _ => contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut ids = Vec::new();
        let mut dropped = 0usize;

        for raw in raw_entries {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }

            // A 60-char identity is canonicalized into the seed it implies.
            let id = if entry.len() == IDENTITY_LEN && is_valid_identity(entry) {
                match seed_from_identity(entry) {
                    Some(seed) => seed,
                    None => {
                        dropped += 1;
                        tracing::warn!(
                            "Input identity {}... has no valid seed prefix; dropped",
                            &entry[..12]
                        );
                        continue;
                    }
                }
            } else {
                entry.to_string()
            };

            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }

        if dropped > 0 {
            tracing::warn!("Dropped {} untransformable input entries", dropped);
        }
        tracing::info!("Loaded {} input ids from {}", ids.len(), self.path.display());
        Ok(ids)
    }
}
