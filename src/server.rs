//! HTTP surface: `GET /export/{model}/` plus a `/health` liveness route.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;

use crate::config::ExportConfig;
use crate::engine::Engine;
use crate::errors::ExportError;
use crate::views::{ExportResponse, GenericExporter};

#[derive(Clone)]
pub struct AppState {
    pub exporter: GenericExporter,
}

impl AppState {
    pub fn new(config: Arc<ExportConfig>, engine: Arc<Engine>) -> Self {
        Self { exporter: GenericExporter::new(config, engine) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/export/{model_name}", get(export_handler))
        .route("/export/{model_name}/", get(export_handler))
        .with_state(state)
}

/// Runs the generic export on the blocking pool. Query pairs are kept in
/// request order so a repeated key resolves to its last value.
pub async fn export_handler(
    State(state): State<AppState>,
    Path(model_name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<ExportResponse, ExportError> {
    let exporter = state.exporter.clone();
    tokio::task::spawn_blocking(move || {
        exporter.export(&model_name, params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    })
    .await
    .map_err(|e| ExportError::Internal(format!("export task failed: {e}")))?
}

impl IntoResponse for ExportResponse {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, self.content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
            self.body,
        )
            .into_response()
    }
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if !self.is_client_error() {
            log::error!("export failed: {self}");
            return (status, "Internal Server Error").into_response();
        }
        (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], self.to_string())
            .into_response()
    }
}

/// Serves on an already-bound listener until the connection loop ends.
///
/// # Errors
/// Propagates accept-loop I/O failures.
pub async fn serve_on(listener: tokio::net::TcpListener, state: AppState) -> Result<(), ExportError> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("tabex listening on http://{addr}/");
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Binds `config.server.bind` and serves exports from `engine`.
///
/// # Errors
/// Bind or serve failure.
pub async fn serve(config: Arc<ExportConfig>, engine: Arc<Engine>) -> Result<(), ExportError> {
    let addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExportError::Io(format!("failed to bind {addr}: {e}")))?;
    serve_on(listener, AppState::new(config, engine)).await
}
