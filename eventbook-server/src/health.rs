use axum::{extract::State, routing::get, Json};
use eventbook_core::Database;
use serde_json::{json, Value};

use crate::{errors::ServerResult, Router, ServerContext};

/// Liveness of the server and its backing stores. The cache being down is
/// reported but not fatal, reads fall back to the database.
async fn health(State(context): State<ServerContext>) -> ServerResult<Json<Value>> {
    context.eventbook.database.ping().await?;

    let cache = match context.eventbook.cache.ping().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Ok(Json(json!({
        "status": "ok",
        "database": "up",
        "cache": cache,
    })))
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}
