//! Export error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tarchive_core::CoreError;
use tarchive_persistence::PersistenceError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<CoreError> for ExportError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidDate(date) => Self::InvalidDate(date),
            other => Self::Persistence(PersistenceError::Core(other)),
        }
    }
}

impl ExportError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Export failed");
            return (status, "Internal server error").into_response();
        }
        (status, self.to_string()).into_response()
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
