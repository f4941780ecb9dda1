//! Export API types.

use std::fs::File;

use serde::Serialize;

/// Context behind the export page: which dates can be exported and how many
/// tokens the selected date holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportContext {
    /// Available dates, most recent first.
    pub dates: Vec<String>,
    /// Requested date, or the most recent one. `None` when the archive is empty.
    pub selected_date: Option<String>,
    /// Number of parsable token files for the selected date.
    pub token_count: usize,
}

/// A rendered export file.
#[derive(Debug)]
pub struct Download {
    /// Suggested attachment name, e.g. `tokens-2025-05-22.zip`.
    pub file_name: String,
    pub content_type: &'static str,
    pub body: DownloadBody,
    /// Token files (zip) or rows (CSV) included.
    pub entries: usize,
}

/// Where a download's bytes live.
#[derive(Debug)]
pub enum DownloadBody {
    Bytes(Vec<u8>),
    /// Unlinked temp file positioned at its start; sent in chunks.
    Spooled(File),
}
