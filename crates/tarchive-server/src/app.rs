//! Application wiring: archive store, recorder and export server.

use std::io::BufRead;
use std::sync::Arc;

use tarchive_core::{DateKey, TokenObservation};
use tarchive_export::{run_server, ExportService};
use tarchive_persistence::{ArchiveStore, PersistenceError, RecordOutcome};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Counters for one JSON Lines ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub created: usize,
    pub appended: usize,
    pub replaced: usize,
    /// Lines that did not parse or carried an unusable token.
    pub skipped: usize,
}

impl IngestStats {
    /// Snapshots written.
    pub fn recorded(&self) -> usize {
        self.created + self.appended + self.replaced
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    store: Arc<ArchiveStore>,
}

impl Application {
    /// Open the archive described by `config`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let store = Arc::new(ArchiveStore::open(&config.archive.data_dir)?);
        Ok(Self { config, store })
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(self.store.clone(), &self.config.export)
    }

    /// Serve the export endpoints until shutdown.
    pub async fn serve(&self) -> AppResult<()> {
        run_server(self.export_service(), self.config.export.clone())
            .await
            .map_err(|e| AppError::Server(e.to_string()))
    }

    /// Dates offered for export, most recent first.
    pub fn available_dates(&self) -> AppResult<Vec<DateKey>> {
        Ok(self.export_service().list_available_dates()?)
    }

    /// Record every token observation read from a JSON Lines stream.
    ///
    /// Blank lines are ignored. Lines that fail to parse, and tokens without
    /// an id, are logged and counted as skipped. Filesystem errors abort the
    /// run.
    pub fn ingest<R: BufRead>(&self, reader: R) -> AppResult<IngestStats> {
        let mut stats = IngestStats::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let token: TokenObservation = match serde_json::from_str(&line) {
                Ok(token) => token,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping unparsable token line");
                    stats.skipped += 1;
                    continue;
                }
            };

            match self.store.record(&token) {
                Ok(RecordOutcome::Created) => stats.created += 1,
                Ok(RecordOutcome::Appended { .. }) => stats.appended += 1,
                Ok(RecordOutcome::Replaced { .. }) => stats.replaced += 1,
                Err(PersistenceError::Core(e)) => {
                    warn!(line = line_no, error = %e, "Skipping invalid token");
                    stats.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            recorded = stats.recorded(),
            created = stats.created,
            appended = stats.appended,
            replaced = stats.replaced,
            skipped = stats.skipped,
            "Ingest finished"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn app(temp_dir: &TempDir) -> Application {
        let mut config = AppConfig::default();
        config.archive.data_dir = temp_dir.path().join("tokens").to_string_lossy().into_owned();
        Application::new(config).unwrap()
    }

    #[test]
    fn test_ingest_counts() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let input = concat!(
            "{\"id\":\"a\",\"priceSOL\":1.0}\n",
            "\n",
            "{\"id\":\"b\",\"marketCap\":\"4.7K\"}\n",
            "not json\n",
            "{\"id\":\"\"}\n",
            "{\"id\":\"a\",\"priceSOL\":2.0}\n",
        );
        let stats = app.ingest(Cursor::new(input)).unwrap();

        assert_eq!(
            stats,
            IngestStats {
                created: 2,
                appended: 1,
                replaced: 0,
                skipped: 2,
            }
        );
        assert_eq!(stats.recorded(), 3);
    }

    #[test]
    fn test_available_dates_after_ingest() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);
        assert!(app.available_dates().unwrap().is_empty());

        app.ingest(Cursor::new("{\"id\":\"a\"}\n")).unwrap();
        assert_eq!(app.available_dates().unwrap().len(), 1);
    }
}
