// crates/strata-store/src/checkpoint.rs
//
// Atomic checkpoint persistence. Saves write the full JSON document to a
// sibling temp file and commit by rename, so a crash never leaves a
// half-written checkpoint observable to a subsequent load.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use strata_core::{Checkpoint, StrataError};

/// File-backed checkpoint store.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last successfully saved checkpoint.
    ///
    /// A missing file yields an empty checkpoint. A file that is present but
    /// structurally corrupt is fatal (silently discarding progress would
    /// cause duplicate ledger calls) unless `force_restart` is set, in
    /// which case the corrupt data is discarded with a warning.
    pub fn load(&self, force_restart: bool) -> Result<Checkpoint, StrataError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No checkpoint at {}; starting fresh", self.path.display());
                return Ok(Checkpoint::default());
            }
            Err(e) => {
                return Err(StrataError::Storage(format!(
                    "Failed to read checkpoint {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_str::<Checkpoint>(&contents) {
            Ok(checkpoint) => {
                tracing::info!(
                    "Loaded checkpoint: {} items committed (saved {})",
                    checkpoint.processed_ids.len(),
                    checkpoint.saved_at
                );
                Ok(checkpoint)
            }
            Err(e) if force_restart => {
                tracing::warn!(
                    "Checkpoint {} is corrupt ({}); discarding due to force-restart",
                    self.path.display(),
                    e
                );
                Ok(Checkpoint::default())
            }
            Err(e) => Err(StrataError::CheckpointCorruption(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Save a checkpoint atomically: write `<path>.tmp`, sync, then rename
    /// over the target.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<(), StrataError> {
        let mut stamped = checkpoint.clone();
        stamped.saved_at = Utc::now();

        let json = serde_json::to_vec_pretty(&stamped)?;
        let tmp_path = self.tmp_path();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StrataError::Storage(format!(
                        "Failed to create checkpoint directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            StrataError::Storage(format!("Failed to create {}: {}", tmp_path.display(), e))
        })?;
        file.write_all(&json)
            .and_then(|_| file.sync_data())
            .map_err(|e| {
                StrataError::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
            })?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            StrataError::Storage(format!(
                "Failed to commit checkpoint to {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CheckpointStore {
        CheckpointStore::new(dir.path().join("checkpoint.json"))
    }

    #[test]
    fn test_load_missing_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let checkpoint = store.load(false).unwrap();
        assert!(checkpoint.processed_ids.is_empty());
        assert_eq!(checkpoint.counters.processed, 0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut checkpoint = Checkpoint::default();
        checkpoint.processed_ids.insert("seed-a".to_string());
        checkpoint.processed_ids.insert("seed-b".to_string());
        checkpoint.counters.processed = 2;
        store.save(&checkpoint).unwrap();

        let loaded = store.load(false).unwrap();
        assert_eq!(loaded.processed_ids, checkpoint.processed_ids);
        assert_eq!(loaded.counters.processed, 2);
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Checkpoint::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("checkpoint.json")]);
    }

    #[test]
    fn test_corrupt_checkpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"{ not json").unwrap();

        match store.load(false) {
            Err(StrataError::CheckpointCorruption(_)) => {}
            other => panic!("expected CheckpointCorruption, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_checkpoint_with_force_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), b"{ not json").unwrap();

        let checkpoint = store.load(true).unwrap();
        assert!(checkpoint.processed_ids.is_empty());
    }

    #[test]
    fn test_save_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut first = Checkpoint::default();
        first.processed_ids.insert("one".to_string());
        store.save(&first).unwrap();

        let mut second = Checkpoint::default();
        second.processed_ids.insert("one".to_string());
        second.processed_ids.insert("two".to_string());
        store.save(&second).unwrap();

        let loaded = store.load(false).unwrap();
        assert_eq!(loaded.processed_ids.len(), 2);
    }
}
