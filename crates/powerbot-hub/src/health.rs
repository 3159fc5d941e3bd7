use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::hub::Hub;

/// GET /health — returns the current peer count (§6).
pub async fn health_handler(State(hub): State<Arc<Hub>>) -> Json<Value> {
    Json(json!({ "ok": true, "peers": hub.peer_count() }))
}
