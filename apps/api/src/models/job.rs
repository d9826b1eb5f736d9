use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::vector_store::JobPayload;

/// Row of the `jobs` table. `job_id` is the stable, source-qualified key;
/// `vector_id` points at the job's point in the corpus store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub job_id: String,
    pub source: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub url: String,
    pub tags: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing)]
    pub content_hash: String,
    pub vector_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A normalized posting, ready to be embedded and stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub job_id: String,
    pub source: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub url: String,
    pub tags: Vec<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub employment_type: Option<String>,
    pub experience_level: Option<String>,
    /// sha256 of the description; gates re-embedding.
    pub content_hash: String,
}

impl JobPosting {
    pub fn to_payload(&self, skills: Vec<String>) -> JobPayload {
        JobPayload {
            job_id: self.job_id.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
            tags: self.tags.clone(),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            employment_type: self.employment_type.clone(),
            experience_level: self.experience_level.clone(),
            skills: Some(skills),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// Per-user state of a job, from the bookmark and application tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFlags {
    pub is_bookmarked: bool,
    pub is_applied: bool,
}
