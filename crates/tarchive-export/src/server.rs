//! HTTP server implementation using axum.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tarchive_telemetry::Metrics;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::error::{ExportError, ExportResult};
use crate::page::render_export_page;
use crate::service::ExportService;
use crate::types::{Download, DownloadBody, ExportContext};

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    service: ExportService,
    config: Arc<ExportConfig>,
}

impl AppState {
    pub fn new(service: ExportService, config: ExportConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    date: Option<String>,
}

impl IntoResponse for Download {
    fn into_response(self) -> Response {
        let body = match self.body {
            DownloadBody::Bytes(bytes) => Body::from(bytes),
            DownloadBody::Spooled(file) => {
                Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file)))
            }
        };

        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", self.file_name),
                ),
            ],
            body,
        )
            .into_response()
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/export", get(export_page))
        .route("/api/export", get(export_context))
        .route("/export/json/{file}", get(export_zip))
        .route("/export/csv/{file}", get(export_csv))
        .route("/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run blocking export work off the async runtime.
async fn blocking<T, F>(service: &ExportService, f: F) -> ExportResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ExportService) -> ExportResult<T> + Send + 'static,
{
    let service = service.clone();
    tokio::task::spawn_blocking(move || f(&service)).await?
}

fn observe<T>(format: &str, result: &ExportResult<T>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status(),
    };
    Metrics::export_served(format, status.as_u16());
}

/// `{date}.{ext}` → `{date}`; other shapes are treated as unknown files.
fn strip_extension<'a>(file: &'a str, ext: &str) -> ExportResult<&'a str> {
    file.strip_suffix(ext)
        .ok_or_else(|| ExportError::NotFound(file.to_string()))
}

async fn health() -> &'static str {
    "ok"
}

/// Export page.
async fn export_page(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ExportResult<Html<String>> {
    let result = blocking(&state.service, move |s| s.ui_context(query.date.as_deref())).await;
    observe("ui", &result);
    Ok(Html(render_export_page(&result?)))
}

/// Export page context as JSON.
async fn export_context(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ExportResult<Json<ExportContext>> {
    let result = blocking(&state.service, move |s| s.ui_context(query.date.as_deref())).await;
    observe("ui", &result);
    Ok(Json(result?))
}

/// Zip of a day's raw JSON files.
async fn export_zip(State(state): State<AppState>, Path(file): Path<String>) -> ExportResult<Download> {
    let result = match strip_extension(&file, ".zip") {
        Ok(date) => {
            let date = date.to_string();
            blocking(&state.service, move |s| s.export_zip(&date)).await
        }
        Err(e) => Err(e),
    };
    observe("zip", &result);
    result
}

/// CSV summary of a day.
async fn export_csv(State(state): State<AppState>, Path(file): Path<String>) -> ExportResult<Download> {
    let result = match strip_extension(&file, ".csv") {
        Ok(date) => {
            let date = date.to_string();
            blocking(&state.service, move |s| s.export_csv(&date)).await
        }
        Err(e) => Err(e),
    };
    observe("csv", &result);
    result
}

/// Prometheus text exposition.
async fn metrics() -> Response {
    match Metrics::gather_text() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Reject requests without valid credentials when basic auth is configured.
async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.config.auth_enabled() && !check_basic_auth(request.headers(), &state.config) {
        return unauthorized_response();
    }
    next.run(request).await
}

/// Check basic authentication.
fn check_basic_auth(headers: &HeaderMap, config: &ExportConfig) -> bool {
    let Some(auth_str) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    let Some(encoded) = auth_str.strip_prefix("Basic ") else {
        return false;
    };

    let Some(decoded) = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    decoded == format!("{}:{}", config.username, config.password)
}

/// Create an unauthorized response.
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Token export\"")],
        "Unauthorized",
    )
        .into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the export HTTP server until Ctrl-C.
pub async fn run_server(
    service: ExportService,
    config: ExportConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = config.listen_addr();
    let app = create_router(AppState::new(service, config));

    info!(addr = %addr, "Starting export server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request as HttpRequest;
    use base64::Engine as _;
    use chrono::{TimeZone, Utc};
    use std::io::Cursor;
    use tarchive_core::TokenObservation;
    use tarchive_persistence::ArchiveStore;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app_with(config: ExportConfig) -> (TempDir, Router) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(ArchiveStore::open(temp_dir.path()).unwrap());
        let now = Utc.with_ymd_and_hms(2025, 5, 22, 10, 0, 0).unwrap();
        for id in ["alpha", "beta"] {
            let mut token = TokenObservation::new(id);
            token.name = Some(id.to_uppercase());
            store.record_at(&token, now).unwrap();
        }
        let service = ExportService::new(store, &config);
        (temp_dir, create_router(AppState::new(service, config)))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_zip_download() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export/json/2025-05-22.zip").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=tokens-2025-05-22.zip"
        );

        let archive = zip::ZipArchive::new(Cursor::new(body_bytes(response).await)).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[tokio::test]
    async fn test_large_zip_streams_intact() {
        let (dir, app) = app_with(ExportConfig::default());
        let store = ArchiveStore::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 22, 11, 0, 0).unwrap();
        for i in 0..300 {
            let mut token = TokenObservation::new(format!("bulk-{i}"));
            token.mint = Some(format!("Mint{i:0>40}"));
            store.record_at(&token, now).unwrap();
        }

        let response = get(app, "/export/json/2025-05-22.zip").await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = body_bytes(response).await;
        assert!(bytes.len() > 8 * 1024);
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 302);
    }

    #[tokio::test]
    async fn test_zip_unknown_date_is_404() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export/json/2030-01-01.zip").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app.clone(), "/export/json/..%2F..%2Fetc.zip").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(app, "/export/csv/..%2F2025-05-22.csv").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_extension_is_404() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export/json/2025-05-22.tar").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_csv_download() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export/csv/2025-05-22.csv").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=tokens-2025-05-22.csv"
        );

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_csv_unknown_date_is_header_only() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export/csv/2030-01-01.csv").await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text, "name,mint,createdAt,latestPrice,checkCount\n");
    }

    #[tokio::test]
    async fn test_api_context() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/api/export").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["dates"], serde_json::json!(["2025-05-22"]));
        assert_eq!(json["selectedDate"], "2025-05-22");
        assert_eq!(json["tokenCount"], 2);
    }

    #[tokio::test]
    async fn test_export_page() {
        let (_dir, app) = app_with(ExportConfig::default());
        let response = get(app, "/export?date=2025-05-22").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("2025-05-22: 2 tokens."));
    }

    #[tokio::test]
    async fn test_basic_auth() {
        let config = ExportConfig {
            username: "ops".to_string(),
            password: "secret".to_string(),
            ..ExportConfig::default()
        };
        let (_dir, app) = app_with(config);

        let response = get(app.clone(), "/export/csv/2025-05-22.csv").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let health = get(app.clone(), "/health").await;
        assert_eq!(health.status(), StatusCode::OK);

        let authed = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/export/csv/2025-05-22.csv")
                    .header(header::AUTHORIZATION, format!("Basic {}", STANDARD.encode("ops:secret")))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(authed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (_dir, app) = app_with(ExportConfig::default());
        let _ = get(app.clone(), "/export/csv/2025-05-22.csv").await;
        let response = get(app, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("tarchive_exports_total"));
    }
}
