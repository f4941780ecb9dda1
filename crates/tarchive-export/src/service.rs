//! Export service.
//!
//! Everything here does blocking filesystem IO; async callers go through
//! `spawn_blocking`. Every date string from the outside is turned into a
//! `DateKey` before the store sees it.

use std::io::{Seek, SeekFrom};
use std::sync::Arc;

use tarchive_core::{DateKey, TokenArchive};
use tarchive_persistence::ArchiveStore;
use tarchive_telemetry::Metrics;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::csv_export::tokens_to_csv;
use crate::error::{ExportError, ExportResult};
use crate::types::{Download, DownloadBody, ExportContext};
use crate::zip_export::zip_files;

/// Read-only export view over an `ArchiveStore`.
#[derive(Clone)]
pub struct ExportService {
    store: Arc<ArchiveStore>,
    max_dates: usize,
    compression_level: i64,
}

impl ExportService {
    pub fn new(store: Arc<ArchiveStore>, config: &ExportConfig) -> Self {
        Self {
            store,
            max_dates: config.max_dates,
            compression_level: config.compression_level,
        }
    }

    /// Most recent dates with an archive partition, newest first, capped at
    /// the configured maximum.
    pub fn list_available_dates(&self) -> ExportResult<Vec<DateKey>> {
        let mut dates = self.store.list_dates()?;
        dates.truncate(self.max_dates);
        Ok(dates)
    }

    /// Parsed archives of one day; empty if the day does not exist.
    pub fn load_tokens(&self, date: &str) -> ExportResult<Vec<TokenArchive>> {
        let date = DateKey::parse(date)?;
        Ok(self.store.load_tokens(&date)?)
    }

    /// Context for the export page.
    ///
    /// An absent or empty `date` selects the most recent available date.
    pub fn ui_context(&self, date: Option<&str>) -> ExportResult<ExportContext> {
        let dates = self.list_available_dates()?;

        let selected = match date.filter(|d| !d.is_empty()) {
            Some(requested) => Some(DateKey::parse(requested)?),
            None => dates.first().cloned(),
        };

        let token_count = match &selected {
            Some(date) => self.store.load_tokens(date)?.len(),
            None => 0,
        };

        Ok(ExportContext {
            dates: dates.into_iter().map(String::from).collect(),
            selected_date: selected.map(String::from),
            token_count,
        })
    }

    /// Zip of every `.json` file of one day, spooled to an unlinked temp
    /// file and rewound for streaming.
    ///
    /// Fails with `NotFound` when the day has no partition.
    pub fn export_zip(&self, date: &str) -> ExportResult<Download> {
        let date = DateKey::parse(date)?;
        let files = self
            .store
            .json_files(&date)?
            .ok_or_else(|| ExportError::NotFound(date.to_string()))?;

        let mut spool = zip_files(&files, self.compression_level, tempfile::tempfile()?)?;
        let bytes = spool.stream_position()?;
        spool.seek(SeekFrom::Start(0))?;

        Metrics::export_size("zip", files.len());
        info!(date = %date, files = files.len(), bytes, "Built zip export");

        Ok(Download {
            file_name: format!("tokens-{date}.zip"),
            content_type: "application/zip",
            body: DownloadBody::Spooled(spool),
            entries: files.len(),
        })
    }

    /// CSV summary of one day. A missing day yields a header-only file.
    pub fn export_csv(&self, date: &str) -> ExportResult<Download> {
        let date = DateKey::parse(date)?;
        let tokens = self.store.load_tokens(&date)?;
        let body = tokens_to_csv(&tokens)?;
        Metrics::export_size("csv", tokens.len());
        debug!(date = %date, rows = tokens.len(), "Built CSV export");

        Ok(Download {
            file_name: format!("tokens-{date}.csv"),
            content_type: "text/csv",
            body: DownloadBody::Bytes(body.into_bytes()),
            entries: tokens.len(),
        })
    }
}
