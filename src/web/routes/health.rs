//! 健康检查

use crate::web::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub connected: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.client.is_connected().await;
    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: crate::VERSION.to_string(),
        database: state.client.db_type().to_string(),
        connected,
    })
}
