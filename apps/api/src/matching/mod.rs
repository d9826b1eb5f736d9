//! Ranking Engine: resume to ranked and explained job matches.
//!
//! embed resume -> oversampled vector search -> skill overlap -> blend ->
//! hard filters -> sort -> truncate. Each step depends on the previous one,
//! so a single request runs them strictly in sequence.

pub mod filters;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::embeddings::EmbeddingProvider;
use crate::errors::AppError;
use crate::matching::filters::MatchFilters;
use crate::skills::{normalize_skill, SkillExtractor, SkillSet};
use crate::vector_store::{CorpusStore, JobPayload, ScoredPoint, StoreError};

// ────────────────────────────────────────────────────────────────────────────
// Scoring constants
// ────────────────────────────────────────────────────────────────────────────

/// Weight of the semantic (vector) score in the combined score.
pub const W_VECTOR: f64 = 0.7;
/// Weight of the skill-overlap score in the combined score.
pub const W_SKILL: f64 = 0.3;
/// Candidates fetched per requested result, so post-hoc filters still
/// leave enough to fill `top_k`.
pub const OVERSAMPLE_FACTOR: usize = 3;
pub const DEFAULT_TOP_K: usize = 10;
/// Hard ceiling on results per request, whatever the caller asks for.
pub const MAX_TOP_K: usize = 50;

const EXCERPT_CHARS: usize = 500;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Matching input derived from an uploaded resume.
#[derive(Debug, Clone)]
pub struct ResumeProfile {
    pub resume_id: Option<Uuid>,
    pub text: String,
    /// Pre-extracted skills. Extracted from `text` when absent.
    pub skills: Option<SkillSet>,
}

impl ResumeProfile {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            resume_id: None,
            text: text.into(),
            skills: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    /// First 500 characters of the posting.
    pub description: String,
    pub tags: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub vector_score: f64,
    pub skill_score: f64,
    pub combined_score: f64,
    pub fit_percentage: u32,
    pub matched_skills: Vec<String>,
    pub gap_skills: Vec<String>,
    pub is_bookmarked: bool,
    pub is_applied: bool,
}

pub struct RankingEngine {
    embeddings: Arc<EmbeddingProvider>,
    store: Arc<dyn CorpusStore>,
    skills: Arc<SkillExtractor>,
    search_timeout: Duration,
}

impl RankingEngine {
    pub fn new(
        embeddings: Arc<EmbeddingProvider>,
        store: Arc<dyn CorpusStore>,
        skills: Arc<SkillExtractor>,
        search_timeout: Duration,
    ) -> Self {
        Self {
            embeddings,
            store,
            skills,
            search_timeout,
        }
    }

    /// Ranks the corpus against `resume`. At most `min(top_k, MAX_TOP_K)`
    /// results, best first. An empty corpus or a filter that rejects every
    /// candidate yields `Ok(vec![])`; embedding and store failures are errors.
    pub async fn rank(
        &self,
        resume: &ResumeProfile,
        top_k: usize,
        filters: &MatchFilters,
    ) -> Result<Vec<MatchResult>, AppError> {
        if resume.text.trim().is_empty() {
            return Err(AppError::Validation("Resume has no extracted text".into()));
        }
        let top_k = top_k.min(MAX_TOP_K);
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let resume_vector = self.embeddings.embed(&resume.text).await?;
        let resume_skills = match &resume.skills {
            Some(skills) => skills.clone(),
            None => self.skills.extract_skills(&resume.text),
        };
        debug!("Resume skills: {:?}", resume_skills);

        let candidates = self.search(&resume_vector, top_k * OVERSAMPLE_FACTOR, filters).await?;
        if candidates.is_empty() {
            info!(
                "No candidates returned from the corpus store for resume {}",
                resume_label(resume)
            );
            return Ok(Vec::new());
        }
        let candidate_count = candidates.len();

        let mut results: Vec<MatchResult> = candidates
            .into_iter()
            .filter(|c| filters.accepts(&c.payload))
            .map(|c| self.score(c, &resume_skills))
            .collect();
        sort_results(&mut results);
        results.truncate(top_k);

        info!(
            "Ranked {} of {} candidates for resume {} (top_k={top_k})",
            results.len(),
            candidate_count,
            resume_label(resume)
        );
        Ok(results)
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filters: &MatchFilters,
    ) -> Result<Vec<ScoredPoint>, AppError> {
        let corpus_filter = filters.corpus_filter();
        let search = self.store.search(vector, limit, &corpus_filter);
        let candidates = tokio::time::timeout(self.search_timeout, search)
            .await
            .map_err(|_| StoreError::Timeout)??;
        Ok(candidates)
    }

    fn score(&self, candidate: ScoredPoint, resume_skills: &SkillSet) -> MatchResult {
        let job_skills = self.job_skills(&candidate.payload);
        let overlap = skill_overlap(resume_skills, &job_skills);
        let vector_score = vector_score(candidate.score);
        let combined_score = round2(W_VECTOR * vector_score + W_SKILL * overlap.score);

        let payload = candidate.payload;
        MatchResult {
            description: excerpt(&payload.description, EXCERPT_CHARS),
            job_id: payload.job_id,
            title: payload.title,
            company: payload.company,
            location: payload.location,
            url: payload.url,
            tags: payload.tags,
            salary_min: payload.salary_min,
            salary_max: payload.salary_max,
            employment_type: payload.employment_type,
            experience_level: payload.experience_level,
            vector_score,
            skill_score: overlap.score,
            combined_score,
            fit_percentage: combined_score.round() as u32,
            matched_skills: overlap.matched,
            gap_skills: overlap.gaps,
            is_bookmarked: false,
            is_applied: false,
        }
    }

    /// Skills stored at ingestion, or extracted now for points that predate them.
    fn job_skills(&self, payload: &JobPayload) -> SkillSet {
        match &payload.skills {
            Some(stored) => stored
                .iter()
                .map(|s| normalize_skill(s))
                .filter(|s| !s.is_empty())
                .collect(),
            None => self
                .skills
                .extract_skills_with_tags(&payload.description, &payload.tags),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SkillOverlap {
    /// Percentage of the job's skills present in the resume.
    pub score: f64,
    pub matched: Vec<String>,
    pub gaps: Vec<String>,
}

/// `matched ∪ gaps` is exactly `job`; the two never intersect.
pub fn skill_overlap(resume: &SkillSet, job: &SkillSet) -> SkillOverlap {
    let matched: Vec<String> = job.intersection(resume).cloned().collect();
    let gaps: Vec<String> = job.difference(resume).cloned().collect();
    let score = round2(100.0 * matched.len() as f64 / job.len().max(1) as f64);
    SkillOverlap {
        score,
        matched,
        gaps,
    }
}

/// Cosine in [-1, 1] to a 0-100 percentage.
pub fn vector_score(cosine: f32) -> f64 {
    round2(((f64::from(cosine) + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0))
}

/// Combined score descending, then vector score descending, then `job_id`.
pub fn sort_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| b.vector_score.total_cmp(&a.vector_score))
            .then_with(|| a.job_id.cmp(&b.job_id))
    });
}

fn resume_label(resume: &ResumeProfile) -> String {
    resume
        .resume_id
        .map_or_else(|| "<inline>".to_string(), |id| id.to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
