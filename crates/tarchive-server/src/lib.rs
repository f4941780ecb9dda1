//! Token snapshot archive application.
//!
//! Wires the archive store, the export server and the JSON Lines recorder
//! behind one configuration.

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, IngestStats};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
