//! Archive writer: append one snapshot per call to a token's daily file.
//!
//! Every write replaces the whole file through a temp file plus rename, so a
//! reader sees either the previous version or the new one. Existing files are
//! appended to as raw JSON, so earlier entries are written back unchanged. A
//! file that is not a JSON object, or whose `checkHistory` cannot take an
//! entry, is renamed aside (`*.json.corrupt-<timestamp>`) and history restarts
//! from the new snapshot.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tarchive_core::{DateKey, Snapshot, TokenArchive, TokenObservation};
use tarchive_telemetry::Metrics;
use tracing::{debug, warn};

use crate::error::PersistenceResult;
use crate::store::ArchiveStore;

/// What a `record` call did to the archive file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No file existed; a new one with a single snapshot was written.
    Created,
    /// The snapshot was appended; `history_len` counts it.
    Appended { history_len: usize },
    /// The existing file could not be appended to. It was moved to
    /// `quarantined` and a new file with a single snapshot was written.
    Replaced { quarantined: PathBuf },
}

impl RecordOutcome {
    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Appended { .. } => "appended",
            Self::Replaced { .. } => "replaced",
        }
    }
}

enum Existing {
    Missing,
    Parsed(TokenArchive),
    Corrupt(String),
}

impl ArchiveStore {
    /// Append a snapshot of `token` to today's (UTC) archive file.
    pub fn record(&self, token: &TokenObservation) -> PersistenceResult<RecordOutcome> {
        self.record_at(token, Utc::now())
    }

    /// Append a snapshot of `token` taken at `now`.
    ///
    /// `now` picks the date partition and stamps the snapshot.
    pub fn record_at(
        &self,
        token: &TokenObservation,
        now: DateTime<Utc>,
    ) -> PersistenceResult<RecordOutcome> {
        token.validate()?;

        let date = DateKey::from_datetime(&now);
        fs::create_dir_all(self.date_dir(&date))?;

        let path = self.archive_path(&date, &token.id);
        let lock = self.file_lock(&path);
        let _guard = lock.lock();

        let snapshot = Snapshot::capture(token, now);
        let (archive, outcome) = match read_existing(&path)? {
            Existing::Missing => (TokenArchive::first(token, &snapshot), RecordOutcome::Created),
            Existing::Parsed(mut archive) => match archive.push(&snapshot) {
                Ok(history_len) => (archive, RecordOutcome::Appended { history_len }),
                Err(e) => replace_corrupt(&path, token, &snapshot, &e.to_string())?,
            },
            Existing::Corrupt(reason) => replace_corrupt(&path, token, &snapshot, &reason)?,
        };

        write_atomic(&path, &archive)?;
        Metrics::snapshot_recorded(outcome.label());

        debug!(
            date = %date,
            token_id = %token.id,
            outcome = outcome.label(),
            checks = archive.check_count(),
            "Recorded token snapshot"
        );

        Ok(outcome)
    }
}

fn read_existing(path: &Path) -> PersistenceResult<Existing> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Existing::Missing),
        Err(e) => return Err(e.into()),
    };

    Ok(match serde_json::from_slice::<TokenArchive>(&bytes) {
        Ok(archive) => Existing::Parsed(archive),
        Err(e) => Existing::Corrupt(e.to_string()),
    })
}

/// Move an archive that cannot take a new entry aside and start over.
fn replace_corrupt(
    path: &Path,
    token: &TokenObservation,
    snapshot: &Snapshot,
    reason: &str,
) -> PersistenceResult<(TokenArchive, RecordOutcome)> {
    let quarantined = quarantine(path, &snapshot.time)?;
    warn!(
        error = %reason,
        path = %path.display(),
        quarantined = %quarantined.display(),
        "Archive file unusable, moved aside and starting fresh history"
    );
    Metrics::corrupt_file("record");
    Ok((
        TokenArchive::first(token, snapshot),
        RecordOutcome::Replaced { quarantined },
    ))
}

/// Rename an unparsable archive file out of the `*.json` namespace.
fn quarantine(path: &Path, now: &DateTime<Utc>) -> PersistenceResult<PathBuf> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", now.format("%Y%m%dT%H%M%S%3fZ")));
    let target = path.with_file_name(name);
    fs::rename(path, &target)?;
    Ok(target)
}

/// Write pretty-printed JSON next to `path`, then rename it into place.
fn write_atomic(path: &Path, archive: &TokenArchive) -> PersistenceResult<()> {
    let json = serde_json::to_vec_pretty(archive)?;

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path)?;
    Ok(())
}
