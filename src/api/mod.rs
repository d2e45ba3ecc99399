pub mod age;
pub mod flash;

use axum::response::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Standard success envelope for the JSON view-model endpoints.
pub fn ok_json<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}
