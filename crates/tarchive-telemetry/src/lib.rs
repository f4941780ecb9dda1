//! Prometheus metrics and structured logging for the token archive.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for archive writes, corrupt files and exports

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
