//! Read side of the archive: date listing and per-day loading.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tarchive_core::{DateKey, TokenArchive};
use tarchive_telemetry::Metrics;
use tracing::warn;

use crate::error::PersistenceResult;
use crate::store::ArchiveStore;

impl ArchiveStore {
    /// All date partitions, most recent first.
    ///
    /// Entries whose name is not `YYYY-MM-DD`, and plain files, are ignored.
    /// A missing root yields an empty list.
    pub fn list_dates(&self) -> PersistenceResult<Vec<DateKey>> {
        let entries = match fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(date) = DateKey::parse(&name) {
                dates.push(date);
            }
        }

        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// `.json` files of one day, in directory-listing order.
    ///
    /// Returns `None` when the date partition does not exist.
    pub fn json_files(&self, date: &DateKey) -> PersistenceResult<Option<Vec<PathBuf>>> {
        let entries = match fs::read_dir(self.date_dir(date)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_json = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".json"));
            if is_json && path.is_file() {
                files.push(path);
            }
        }

        Ok(Some(files))
    }

    /// Parse every archive file of one day.
    ///
    /// Any JSON object loads, whatever its field types. Files that cannot be
    /// read, are not valid JSON, or hold a non-object are skipped with a
    /// warning. A missing date partition yields an empty list.
    pub fn load_tokens(&self, date: &DateKey) -> PersistenceResult<Vec<TokenArchive>> {
        let Some(files) = self.json_files(date)? else {
            return Ok(Vec::new());
        };

        let mut tokens = Vec::with_capacity(files.len());
        for path in files {
            let parsed = fs::read(&path).map_err(|e| e.to_string()).and_then(|raw| {
                serde_json::from_slice::<TokenArchive>(&raw).map_err(|e| e.to_string())
            });

            match parsed {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    warn!(%error, path = %path.display(), "Skipping unreadable archive file");
                    Metrics::corrupt_file("export");
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tarchive_core::TokenObservation;
    use tempfile::TempDir;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).unwrap()
    }

    #[test]
    fn test_list_dates_filters_and_sorts_descending() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        for name in ["2025-05-01", "2025-05-03", "2025-04-30", "latest", "2025-5-2", "tmp"] {
            fs::create_dir_all(temp_dir.path().join(name)).unwrap();
        }
        fs::write(temp_dir.path().join("2025-06-01"), "not a dir").unwrap();

        let dates = store.list_dates().unwrap();
        let names: Vec<&str> = dates.iter().map(DateKey::as_str).collect();
        assert_eq!(names, vec!["2025-05-03", "2025-05-01", "2025-04-30"]);
    }

    #[test]
    fn test_list_dates_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path().join("archive")).unwrap();
        fs::remove_dir(temp_dir.path().join("archive")).unwrap();
        assert!(store.list_dates().unwrap().is_empty());
    }

    #[test]
    fn test_load_tokens_missing_date_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        assert!(store.load_tokens(&key("2030-01-01")).unwrap().is_empty());
        assert!(store.json_files(&key("2030-01-01")).unwrap().is_none());
    }

    #[test]
    fn test_load_tokens_skips_corrupt_and_non_json() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 22, 8, 0, 0).unwrap();
        store.record_at(&TokenObservation::new("one"), now).unwrap();
        store.record_at(&TokenObservation::new("two"), now).unwrap();

        let dir = temp_dir.path().join("2025-05-22");
        fs::write(dir.join("broken.json"), "{").unwrap();
        fs::write(dir.join("notes.txt"), "{}").unwrap();
        fs::write(dir.join("old.json.corrupt-20250522T000000000Z"), "{}").unwrap();

        let files = store.json_files(&key("2025-05-22")).unwrap().unwrap();
        assert_eq!(files.len(), 3);

        let mut ids: Vec<String> = store
            .load_tokens(&key("2025-05-22"))
            .unwrap()
            .iter()
            .filter_map(|t| t.id().map(str::to_owned))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_load_tokens_keeps_loosely_typed_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArchiveStore::open(temp_dir.path()).unwrap();
        let dir = temp_dir.path().join("2025-05-22");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("a.json"),
            r#"{"id":"a","checkHistory":[{"time":"2025-05-22T12:00:00+02:00","priceSOL":"0.1"}]}"#,
        )
        .unwrap();
        fs::write(dir.join("b.json"), r#"{"name":5,"createdAt":1716372000000}"#).unwrap();

        let files = store.json_files(&key("2025-05-22")).unwrap().unwrap();
        let tokens = store.load_tokens(&key("2025-05-22")).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(tokens.len(), 2);
    }
}
