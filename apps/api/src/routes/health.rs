use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET /health
/// Liveness plus the vector store's status. The service stays "ok" while the
/// store is down so orchestrators don't restart it for an upstream outage.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let vector_store = match state.store.stats().await {
        Ok(stats) => json!({
            "status": stats.status,
            "collection": stats.collection_name,
            "vectors_count": stats.vectors_count,
        }),
        Err(e) => {
            warn!("Vector store health check failed: {e}");
            json!({ "status": "unavailable" })
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "jobmatch-api",
        "embedding_dimension": state.config.embedding.dimension,
        "vector_store": vector_store,
    }))
}
