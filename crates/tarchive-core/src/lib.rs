//! Core domain types for the token snapshot archive.
//!
//! This crate provides the types shared by the writer and the export side:
//! - `TokenObservation`: a token as handed over by the upstream pipeline
//! - `TokenArchive`, `Snapshot`: the on-disk per-token, per-day record
//! - `DateKey`: validated `YYYY-MM-DD` partition name
//! - `sanitize_id`, `parse_market_cap`: input normalization

pub mod date;
pub mod error;
mod lenient;
pub mod market_cap;
pub mod sanitize;
pub mod token;

pub use date::DateKey;
pub use error::{CoreError, Result};
pub use market_cap::parse_market_cap;
pub use sanitize::sanitize_id;
pub use token::{Snapshot, TokenArchive, TokenObservation};
