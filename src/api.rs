use std::sync::Arc;

use serde_json::json;
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::ProviderIngestion;
use crate::metrics::Metrics;
use crate::news::{CreateNews, NewsService};

#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<ProviderIngestion>,
    pub news: Arc<NewsService>,
}

/// Public router. `/metrics` is mounted only when a recorder handle is supplied.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/admin/ingest/provider", post(admin_ingest_provider))
        .route("/admin/news", post(admin_create_news))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    }
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct IngestReq {
    query: String,
    top_k: i64,
}

async fn admin_ingest_provider(
    State(state): State<AppState>,
    body: Option<Json<IngestReq>>,
) -> Response {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    match state
        .ingestion
        .ingest_from_provider(&req.query, req.top_k)
        .await
    {
        Ok(report) => {
            tracing::info!(
                target: "api",
                accepted = report.accepted_ids.len(),
                skipped = report.skipped,
                "admin provider ingestion"
            );
            Json(json!({
                "ingested": report.accepted_ids.len(),
                "skipped": report.skipped,
                "ids": report.accepted_ids,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(target: "api", error = ?e, "admin provider ingestion failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

async fn admin_create_news(
    State(state): State<AppState>,
    Json(req): Json<CreateNews>,
) -> Response {
    match state.news.admin_create(req).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => {
            tracing::warn!(target: "api", error = ?e, "admin create news failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}
