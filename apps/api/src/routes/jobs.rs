use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::state::AppState;
use crate::vector_store::{vector_id_for, CorpusStats};

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub source: Option<String>,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    if params.skip < 0 {
        return Err(AppError::Validation("skip must not be negative".into()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&params.limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let jobs = state
        .jobs
        .list_jobs(params.skip, params.limit, params.source.as_deref())
        .await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRow>, AppError> {
    let job = state
        .jobs
        .find_by_job_id(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:job_id/vector
/// Removes the job from the index; its row stays and the next ingestion
/// that sees it embeds it again.
pub async fn handle_delete_vector(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let job = state
        .jobs
        .find_by_job_id(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let vector_id = job.vector_id.unwrap_or_else(|| vector_id_for(&job.job_id));
    let removed = state.store.delete(vector_id).await?;
    state.jobs.clear_vector_id(&job_id).await?;
    info!("Deleted vector for job {job_id} (present: {removed})");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<CorpusStats>, AppError> {
    Ok(Json(state.store.stats().await?))
}
