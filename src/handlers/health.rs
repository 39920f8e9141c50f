use axum::response::Json;
use serde_json::{json, Value};

/// Liveness only; the gateway is never contacted.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}
