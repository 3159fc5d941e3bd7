use axum::Json;
use serde_json::{json, Value};

/// GET /health — liveness probe (§6).
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}
