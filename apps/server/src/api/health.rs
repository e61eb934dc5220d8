use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use super::extract::Json;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub database: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.db.health_check().await {
        "connected"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok",
        message: "API está funcionando",
        database,
    })
}
