use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::filters::MatchFilters;
use crate::matching::{MatchResult, ResumeProfile, DEFAULT_TOP_K, MAX_TOP_K};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub resume_id: Uuid,
    /// When present, the resume must belong to this user and results carry
    /// the user's bookmark and application flags.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(flatten)]
    pub filters: MatchFilters,
}

fn default_top_k() -> i64 {
    DEFAULT_TOP_K as i64
}

/// POST /api/v1/jobs/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    if !(1..=MAX_TOP_K as i64).contains(&req.top_k) {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }
    let filters = req.filters.validated()?;

    let document = state
        .documents
        .find_document(req.resume_id)
        .await?
        .filter(|doc| req.user_id.map_or(true, |user| doc.user_id == user))
        .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", req.resume_id)))?;
    let text = document
        .extracted_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            AppError::Validation(format!("Resume {} has no extracted text", req.resume_id))
        })?;

    info!("Job match request: resume {} top_k {}", req.resume_id, req.top_k);
    let profile = ResumeProfile {
        resume_id: Some(document.id),
        text,
        skills: None,
    };
    let mut results = state
        .ranking
        .rank(&profile, req.top_k as usize, &filters)
        .await?;

    if let Some(user_id) = req.user_id {
        let job_ids: Vec<String> = results.iter().map(|r| r.job_id.clone()).collect();
        let flags = state.jobs.job_flags(user_id, &job_ids).await?;
        for result in &mut results {
            if let Some(f) = flags.get(&result.job_id) {
                result.is_bookmarked = f.is_bookmarked;
                result.is_applied = f.is_applied;
            }
        }
    }

    Ok(Json(results))
}
