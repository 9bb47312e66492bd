//! HTTP API over the persisted report.

use crate::error::SprintError;
use crate::refresh::Refresher;
use crate::report::{generate_html_report, generate_placeholder_page};
use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
    /// Static page served at "/" in place of the rendered report.
    pub report_page: Option<PathBuf>,
}

/// Error body in the `{"detail": ...}` shape.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<SprintError> for ApiError {
    fn from(err: SprintError) -> Self {
        match err {
            SprintError::ReportMissing => {
                Self::new(StatusCode::NOT_FOUND, "Sprints data file not found")
            }
            SprintError::Json(_) => Self::internal("Error decoding JSON data"),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(report_page))
        .route("/sprints", get(get_sprints))
        .route("/reload", get(reload))
        .route("/status", get(status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn report_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    if let Some(ref page) = state.report_page {
        return match tokio::fs::read_to_string(page).await {
            Ok(content) => Ok(Html(content)),
            Err(e) => {
                warn!("Cannot read report page {}: {}", page.display(), e);
                Err(ApiError::new(StatusCode::NOT_FOUND, "Report page not found"))
            }
        };
    }

    let Some(document) = state.refresher.store().load_report().await? else {
        return Ok(Html(generate_placeholder_page()));
    };

    let rendered_at = state
        .refresher
        .last_refresh()
        .await
        .map(|summary| summary.completed_at)
        .unwrap_or_else(Utc::now);

    Ok(Html(generate_html_report(&document, rendered_at)))
}

async fn get_sprints(State(state): State<AppState>) -> Result<Response, ApiError> {
    let document = state
        .refresher
        .store()
        .load_report()
        .await?
        .ok_or(SprintError::ReportMissing)?;

    Ok(Json(document).into_response())
}

async fn reload(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.refresher.refresh().await {
        Ok(_) => Ok(Json(json!({ "message": "Sprints data reloaded successfully" })).into_response()),
        Err(e) => {
            error!("Reload failed: {}", e);
            Err(ApiError::internal(e.to_string()))
        }
    }
}

async fn status(State(state): State<AppState>) -> Response {
    let last = state.refresher.last_refresh().await;
    Json(json!({ "last_refresh": last })).into_response()
}

/// Bind `address` and serve until Ctrl-C.
pub async fn serve(address: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
