//! Date-partitioned JSON archive store for token snapshots.
//!
//! Layout: `<root>/<YYYY-MM-DD>/<sanitized-id>.json`, one pretty-printed
//! `TokenArchive` per file. `ArchiveStore` owns the root; nothing outside this
//! crate builds archive paths.

pub mod error;
pub mod reader;
pub mod store;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use store::ArchiveStore;
pub use writer::RecordOutcome;
