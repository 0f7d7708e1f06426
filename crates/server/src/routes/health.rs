//! Health check endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Create the health router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Report process and database health.
///
/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = db::check_health(state.db()).await;

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
