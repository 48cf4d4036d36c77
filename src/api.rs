use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::connections::ConnectionAnalyzer;
use crate::db::Database;
use crate::discovery::Discovery;
use crate::error::{PipelineError, Result};
use crate::gazetteer::Gazetteer;
use crate::importer::{run_location_backfill, BatchConfig, BatchImporter, ImportItem, Importer};
use crate::llm::Summarizer;
use crate::mysteries::MysteryDeriver;
use crate::TARGET_WEB_REQUEST;

/// Shared handler state. Optional clients stay `None` when their environment
/// is not configured; the handlers that need them reply 500.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub discovery: Option<Arc<dyn Discovery>>,
    pub gazetteer: Arc<Gazetteer>,
    pub secret: Option<String>,
}

#[derive(Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Checks the `key` query parameter against the configured shared secret.
/// With no secret configured, every caller is allowed.
fn authorize(secret: Option<&str>, key: Option<&str>) -> Result<()> {
    match secret {
        None => Ok(()),
        Some(expected) if key == Some(expected) => Ok(()),
        Some(_) => Err(PipelineError::Validation(
            "invalid or missing key".to_string(),
        )),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(status_check))
        .route("/api/import/batch", post(import_batch))
        .route("/api/import/create", post(import_create))
        .route("/api/import/backfill", post(import_backfill))
        .route("/api/connections/analyze", post(analyze_connections))
        .route("/api/mysteries/derive", post(derive_mysteries))
        .with_state(state)
}

/// Binds the operator API and serves it until shutdown.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn status_check() -> &'static str {
    "OK"
}

async fn import_batch(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    authorize(state.secret.as_deref(), query.key.as_deref())?;
    info!(target: TARGET_WEB_REQUEST, "Handling batch import request");

    let discovery = state.discovery.clone().ok_or_else(|| {
        PipelineError::Configuration("search API not configured".to_string())
    })?;

    let importer = Importer::new(
        state.db.clone(),
        state.summarizer.clone(),
        state.gazetteer.clone(),
    );
    let batch = BatchImporter::new(state.db, discovery, importer, BatchConfig::default());
    let stats = batch.run().await?;
    Ok(Json(serde_json::to_value(stats).map_err(PipelineError::from)?))
}

async fn import_create(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
    Json(item): Json<ImportItem>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    authorize(state.secret.as_deref(), query.key.as_deref())?;
    info!(target: TARGET_WEB_REQUEST, "Handling single import request for {}", item.url);

    let importer = Importer::new(state.db, state.summarizer, state.gazetteer);
    let article = importer.import_single(item).await?;
    Ok(Json(json!({
        "imported": true,
        "slug": article.slug,
        "title": article.title,
    })))
}

async fn import_backfill(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    authorize(state.secret.as_deref(), query.key.as_deref())?;
    info!(target: TARGET_WEB_REQUEST, "Handling location backfill request");

    let stats = run_location_backfill(&state.db, &state.gazetteer).await?;
    Ok(Json(serde_json::to_value(stats).map_err(PipelineError::from)?))
}

async fn analyze_connections(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    authorize(state.secret.as_deref(), query.key.as_deref())?;
    info!(target: TARGET_WEB_REQUEST, "Handling connection analysis request");

    let summarizer = state.summarizer.clone().ok_or_else(|| {
        PipelineError::Configuration("LLM not configured".to_string())
    })?;

    let analyzer = ConnectionAnalyzer::new(state.db, summarizer);
    let stats = analyzer.run().await?;
    Ok(Json(serde_json::to_value(stats).map_err(PipelineError::from)?))
}

async fn derive_mysteries(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> std::result::Result<Json<serde_json::Value>, ApiError> {
    authorize(state.secret.as_deref(), query.key.as_deref())?;
    info!(target: TARGET_WEB_REQUEST, "Handling mystery derivation request");

    let summarizer = state.summarizer.clone().ok_or_else(|| {
        PipelineError::Configuration("LLM not configured".to_string())
    })?;

    let deriver = MysteryDeriver::new(state.db, summarizer);
    let stats = deriver.run().await?;
    Ok(Json(serde_json::to_value(stats).map_err(PipelineError::from)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_open_when_no_secret() {
        assert!(authorize(None, None).is_ok());
        assert!(authorize(None, Some("anything")).is_ok());
    }

    #[test]
    fn test_authorize_requires_matching_key() {
        assert!(authorize(Some("s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(
            authorize(Some("s3cret"), Some("wrong")),
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            authorize(Some("s3cret"), None),
            Err(PipelineError::Validation(_))
        ));
    }
}
