use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
/// Liveness check.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
