// crates/strata-store/src/results.rs
//
// Append-only result log: one JSON line per completed item. Lines are
// appended and synced before the item's id may enter a saved checkpoint,
// so a torn trailing line can only belong to an uncommitted item and is
// safe to skip on load.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use strata_core::{CompletedItem, StrataError};

/// File-backed append-only log of completed items.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one completed item and sync it to disk.
    pub fn append(&self, item: &CompletedItem) -> Result<(), StrataError> {
        let mut line = serde_json::to_string(item)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StrataError::Storage(format!(
                        "Failed to create result log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                StrataError::Storage(format!(
                    "Failed to open result log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| {
                StrataError::Storage(format!(
                    "Failed to append to result log {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }

    /// Load all persisted items in file order.
    ///
    /// Unparseable lines (a torn tail after a crash) are skipped with a
    /// warning rather than failing the load.
    pub fn load(&self) -> Result<Vec<CompletedItem>, StrataError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StrataError::Storage(format!(
                    "Failed to read result log {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut items = Vec::new();
        let mut skipped = 0usize;
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<CompletedItem>(line) {
                Ok(item) => items.push(item),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping unparseable result log line in {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "Result log {}: skipped {} unparseable line(s); affected items will be reprocessed",
                self.path.display(),
                skipped
            );
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ItemState, LayerResult, OnChain};

    fn item(id: &str) -> CompletedItem {
        CompletedItem {
            id: id.to_string(),
            state: ItemState::Done,
            history: vec![LayerResult {
                layer: 1,
                seed: id.to_string(),
                identity: Some("X".repeat(60)),
                derivable: true,
                on_chain: OnChain::Unknown,
                balance: None,
                error: None,
            }],
        }
    }

    #[test]
    fn test_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.jsonl"));

        log.append(&item("a")).unwrap();
        log.append(&item("b")).unwrap();

        let loaded = log.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1].id, "b");
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.jsonl"));
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_torn_trailing_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = ResultLog::new(dir.path().join("results.jsonl"));
        log.append(&item("a")).unwrap();

        // Simulate a crash mid-append: a truncated JSON object on the tail.
        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(b"{\"id\": \"b\", \"sta").unwrap();
        drop(file);

        let loaded = log.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }
}
