//! Job Corpus Store: one vector per job posting plus its metadata payload.
//!
//! `QdrantStore` talks to a Qdrant cluster over REST; `MemoryStore` is an exact
//! in-process index used when no cluster is configured and in tests. Both rank
//! by cosine similarity, descending, ties broken by `vector_id` ascending.

pub mod memory;
pub mod qdrant;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store unreachable: {0}")]
    Unavailable(String),

    #[error("vector store request timed out")]
    Timeout,

    #[error("vector store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("vector has dimension {actual}, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector store returned an unreadable response: {0}")]
    Decode(String),
}

/// Metadata stored next to each job vector. Everything the ranking engine
/// needs to score and display a job without a database round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub job_id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    /// Skill set extracted at ingestion. `None` for points written before
    /// skills were stored; the ranking engine extracts them on the fly.
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub content_hash: String,
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub vector_id: Uuid,
    pub vector: Vec<f32>,
    pub payload: JobPayload,
}

#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub vector_id: Uuid,
    /// Raw cosine similarity in [-1, 1].
    pub score: f32,
    pub payload: JobPayload,
}

/// Exact-match payload conditions a backend may apply natively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusFilter {
    pub experience_level: Option<String>,
    pub employment_type: Option<String>,
}

impl CorpusFilter {
    pub fn is_empty(&self) -> bool {
        self.experience_level.is_none() && self.employment_type.is_none()
    }

    pub fn matches(&self, payload: &JobPayload) -> bool {
        let level_ok = self
            .experience_level
            .as_deref()
            .map_or(true, |want| payload.experience_level.as_deref() == Some(want));
        let type_ok = self
            .employment_type
            .as_deref()
            .map_or(true, |want| payload.employment_type.as_deref() == Some(want));
        level_ok && type_ok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStats {
    pub collection_name: String,
    pub vectors_count: u64,
    pub status: String,
}

#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Creates the collection at `dimension` if missing. An existing collection
    /// of a different dimension is an error: the corpus must be rebuilt.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError>;

    /// Insert or overwrite. Upserting the same point twice is a no-op in effect.
    async fn upsert(&self, point: VectorPoint) -> Result<(), StoreError>;

    async fn upsert_batch(&self, points: Vec<VectorPoint>) -> Result<(), StoreError> {
        for point in points {
            self.upsert(point).await?;
        }
        Ok(())
    }

    /// Replaces the payload of an existing point, keeping its vector.
    async fn set_payload(&self, vector_id: Uuid, payload: JobPayload) -> Result<(), StoreError>;

    /// Up to `top_k` nearest neighbours, best first.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &CorpusFilter,
    ) -> Result<Vec<ScoredPoint>, StoreError>;

    /// Returns whether a point was removed.
    async fn delete(&self, vector_id: Uuid) -> Result<bool, StoreError>;

    async fn stats(&self) -> Result<CorpusStats, StoreError>;
}

/// Deterministic point id for a job, so re-ingestion always lands on the same point.
pub fn vector_id_for(job_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, job_id.as_bytes())
}

/// Descending score, then ascending `vector_id`.
pub fn compare_scored(a: &ScoredPoint, b: &ScoredPoint) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.vector_id.cmp(&b.vector_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(level: Option<&str>, kind: Option<&str>) -> JobPayload {
        JobPayload {
            job_id: "mock-1".into(),
            title: "Engineer".into(),
            company: "Acme".into(),
            description: String::new(),
            location: None,
            url: String::new(),
            source: "mock".into(),
            tags: vec![],
            salary_min: None,
            salary_max: None,
            employment_type: kind.map(String::from),
            experience_level: level.map(String::from),
            skills: None,
            content_hash: String::new(),
        }
    }

    #[test]
    fn test_vector_id_is_stable() {
        assert_eq!(vector_id_for("mock-abc"), vector_id_for("mock-abc"));
        assert_ne!(vector_id_for("mock-abc"), vector_id_for("mock-abd"));
    }

    #[test]
    fn test_corpus_filter_matches() {
        let filter = CorpusFilter {
            experience_level: Some("senior".into()),
            employment_type: None,
        };
        assert!(filter.matches(&payload(Some("senior"), Some("contract"))));
        assert!(!filter.matches(&payload(Some("mid"), None)));
        assert!(!filter.matches(&payload(None, None)));
        assert!(CorpusFilter::default().matches(&payload(None, None)));
    }

    #[test]
    fn test_compare_scored_tie_break() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let mut points = vec![
            ScoredPoint { vector_id: high, score: 0.5, payload: payload(None, None) },
            ScoredPoint { vector_id: low, score: 0.5, payload: payload(None, None) },
            ScoredPoint { vector_id: high, score: 0.9, payload: payload(None, None) },
        ];
        points.sort_by(compare_scored);
        assert_eq!(points[0].score, 0.9);
        assert_eq!(points[1].vector_id, low);
        assert_eq!(points[2].vector_id, high);
    }

    #[test]
    fn test_legacy_payload_without_skills_deserializes() {
        let json = r#"{"job_id": "x", "title": "t", "company": "c"}"#;
        let parsed: JobPayload = serde_json::from_str(json).unwrap();
        assert!(parsed.skills.is_none());
        assert!(parsed.tags.is_empty());
    }
}
