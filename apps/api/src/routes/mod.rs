pub mod health;
pub mod jobs;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::ingestion::handlers::handle_ingest;
use crate::matching::handlers::handle_match;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching
        .route("/api/v1/jobs/match", post(handle_match))
        // Corpus
        .route("/api/v1/jobs/ingest", post(handle_ingest))
        .route("/api/v1/jobs/stats", get(jobs::handle_stats))
        .route("/api/v1/jobs", get(jobs::handle_list_jobs))
        .route("/api/v1/jobs/:job_id", get(jobs::handle_get_job))
        .route(
            "/api/v1/jobs/:job_id/vector",
            delete(jobs::handle_delete_vector),
        )
        .with_state(state)
}
