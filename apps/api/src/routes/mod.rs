pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::plan::handlers;
use crate::plan::upload::MAX_BODY_BYTES;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route(
            "/api/generate-career-path",
            post(handlers::handle_generate_career_path),
        )
        .route(
            "/api/generate-career-path/upload",
            post(handlers::handle_generate_from_upload)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route(
            "/api/export-career-path",
            post(handlers::handle_export_career_path),
        )
        .fallback(not_found)
        .with_state(state)
}
