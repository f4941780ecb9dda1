//! Archive repository handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tarchive_core::{sanitize_id, DateKey};
use tracing::{debug, info};

use crate::error::PersistenceResult;

/// Idle per-file locks are dropped once the table grows past this size.
const LOCK_TABLE_PRUNE_THRESHOLD: usize = 4096;

/// Repository over the archive directory tree.
///
/// Writes to the same archive file are serialized through a per-file mutex, so
/// concurrent `record` calls inside one process never drop a snapshot.
/// Separate processes writing the same tree are not coordinated.
pub struct ArchiveStore {
    root: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl ArchiveStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(root = %root.display(), "Opened token archive");

        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one day's archive files.
    pub(crate) fn date_dir(&self, date: &DateKey) -> PathBuf {
        self.root.join(date.as_str())
    }

    /// Archive file for a raw token id on a given day.
    pub(crate) fn archive_path(&self, date: &DateKey, id: &str) -> PathBuf {
        self.date_dir(date).join(format!("{}.json", sanitize_id(id)))
    }

    /// Mutex guarding read-modify-write of one archive file.
    pub(crate) fn file_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        if self.locks.len() > LOCK_TABLE_PRUNE_THRESHOLD {
            let before = self.locks.len();
            // Only the table itself holds an idle lock.
            self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            debug!(before, after = self.locks.len(), "Pruned archive lock table");
        }

        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data").join("tokens");
        let store = ArchiveStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_archive_path_is_sanitized_and_contained() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        let date = DateKey::parse("2025-05-22").unwrap();

        let path = store.archive_path(&date, "../../a/b:c*");
        assert_eq!(path, temp_dir.path().join("2025-05-22").join(".._.._a_b_c_.json"));
        assert_eq!(path.parent().unwrap(), store.date_dir(&date));
    }

    #[test]
    fn test_file_lock_is_shared_per_path() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        let a = store.file_lock(Path::new("x.json"));
        let b = store.file_lock(Path::new("x.json"));
        let c = store.file_lock(Path::new("y.json"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
