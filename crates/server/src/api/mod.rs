pub mod import;
pub mod music;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/music", get(music::list_music))
        .route("/music/:media_id", get(music::get_music))
        .route("/import", post(import::run_import))
        .route("/import/status", get(import::import_status))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
