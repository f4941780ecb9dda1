//! tarchive-export - bulk export of archived token snapshots.
//!
//! ```text
//!  data/tokens/<YYYY-MM-DD>/<id>.json
//!              │
//!              ▼
//!  ┌────────────────────────────┐
//!  │ ExportService              │  list dates, load tokens, zip, CSV
//!  └─────────────┬──────────────┘
//!                ▼
//!  ┌────────────────────────────────────────────────────┐
//!  │ axum HTTP server                                   │
//!  │  GET /export              → HTML page              │
//!  │  GET /api/export          → JSON context           │
//!  │  GET /export/json/{d}.zip → zip of the day's files │
//!  │  GET /export/csv/{d}.csv  → CSV summary            │
//!  │  GET /metrics, /health                             │
//!  └────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tarchive_export::{run_server, ExportConfig, ExportService};
//!
//! let service = ExportService::new(store.clone(), &config);
//! run_server(service, config).await?;
//! ```

mod config;
mod csv_export;
mod error;
mod page;
mod server;
mod service;
mod types;
mod zip_export;

pub use config::ExportConfig;
pub use csv_export::{tokens_to_csv, CSV_HEADER};
pub use error::{ExportError, ExportResult};
pub use server::{create_router, run_server, AppState};
pub use service::ExportService;
pub use types::{Download, DownloadBody, ExportContext};
