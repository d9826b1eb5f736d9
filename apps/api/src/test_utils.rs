//! In-memory fakes for the seam traits, shared by unit and router tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{Config, EmbeddingConfig, QdrantConfig};
use crate::embeddings::local::HashEmbedder;
use crate::embeddings::EmbeddingProvider;
use crate::ingestion::sources::{JobSource, SourceError};
use crate::ingestion::{IngestionPipeline, ReembedPolicy};
use crate::matching::RankingEngine;
use crate::models::document::DocumentRow;
use crate::models::job::{JobFlags, JobPosting, JobRow};
use crate::repository::{DocumentStore, JobRepository};
use crate::skills::SkillExtractor;
use crate::state::AppState;
use crate::vector_store::memory::MemoryStore;
use crate::vector_store::{
    vector_id_for, CorpusFilter, CorpusStats, CorpusStore, JobPayload, ScoredPoint, StoreError,
    VectorPoint,
};

pub fn make_payload(job_id: &str, description: &str) -> JobPayload {
    JobPayload {
        job_id: job_id.to_string(),
        title: format!("Engineer {job_id}"),
        company: "Acme".to_string(),
        description: description.to_string(),
        location: Some("Remote".to_string()),
        url: format!("https://example.com/{job_id}"),
        source: "test".to_string(),
        tags: Vec::new(),
        salary_min: None,
        salary_max: None,
        employment_type: Some("full-time".to_string()),
        experience_level: Some("mid".to_string()),
        skills: None,
        content_hash: String::new(),
    }
}

/// Upserts `payload` with the embedding of its description.
pub async fn seed_job(store: &MemoryStore, embedder: &HashEmbedder, payload: JobPayload) {
    store
        .upsert(VectorPoint {
            vector_id: vector_id_for(&payload.job_id),
            vector: embedder.embed_text(&payload.description),
            payload,
        })
        .await
        .unwrap();
}

// ────────────────────────────────────────────────────────────────────────────
// Repositories
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryJobRepository {
    rows: Mutex<BTreeMap<String, JobRow>>,
    flags: Mutex<HashMap<(Uuid, String), JobFlags>>,
}

impl MemoryJobRepository {
    pub fn by_title(&self, title: &str) -> Option<JobRow> {
        let rows = self.rows.lock().unwrap();
        rows.values().find(|r| r.title == title).cloned()
    }

    pub fn set_flags(&self, user_id: Uuid, job_id: &str, flags: JobFlags) {
        self.flags
            .lock()
            .unwrap()
            .insert((user_id, job_id.to_string()), flags);
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<JobRow>, sqlx::Error> {
        Ok(self.rows.lock().unwrap().get(job_id).cloned())
    }

    async fn upsert_job(
        &self,
        job: &JobPosting,
        skills: &[String],
        vector_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let (id, created_at) = rows
            .get(&job.job_id)
            .map(|r| (r.id, r.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));
        rows.insert(
            job.job_id.clone(),
            JobRow {
                id,
                job_id: job.job_id.clone(),
                source: job.source.clone(),
                title: job.title.clone(),
                company: job.company.clone(),
                description: job.description.clone(),
                location: job.location.clone(),
                url: job.url.clone(),
                tags: job.tags.clone(),
                salary_min: job.salary_min,
                salary_max: job.salary_max,
                employment_type: job.employment_type.clone(),
                experience_level: job.experience_level.clone(),
                skills: skills.to_vec(),
                content_hash: job.content_hash.clone(),
                vector_id: Some(vector_id),
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn list_jobs(
        &self,
        skip: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| source.map_or(true, |s| r.source == s))
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn clear_vector_id(&self, job_id: &str) -> Result<(), sqlx::Error> {
        if let Some(row) = self.rows.lock().unwrap().get_mut(job_id) {
            row.vector_id = None;
        }
        Ok(())
    }

    async fn job_flags(
        &self,
        user_id: Uuid,
        job_ids: &[String],
    ) -> Result<HashMap<String, JobFlags>, sqlx::Error> {
        let flags = self.flags.lock().unwrap();
        Ok(job_ids
            .iter()
            .filter_map(|id| {
                flags
                    .get(&(user_id, id.clone()))
                    .map(|f| (id.clone(), *f))
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<Uuid, DocumentRow>>,
}

impl MemoryDocumentStore {
    pub fn insert(&self, user_id: Uuid, text: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.documents.lock().unwrap().insert(
            id,
            DocumentRow {
                id,
                user_id,
                extracted_text: text.map(String::from),
            },
        );
        id
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_document(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
        Ok(self.documents.lock().unwrap().get(&id).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sources and stores
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same records on every fetch and counts fetches.
pub struct StaticSource {
    records: Vec<Value>,
    pub fetches: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl JobSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}

/// A store whose cluster is down (`hang: false`) or never answers (`hang: true`).
pub struct UnavailableStore {
    pub hang: bool,
}

impl UnavailableStore {
    async fn fail<T: Send>(&self) -> Result<T, StoreError> {
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl CorpusStore for UnavailableStore {
    async fn ensure_collection(&self, _dimension: usize) -> Result<(), StoreError> {
        self.fail().await
    }

    async fn upsert(&self, _point: VectorPoint) -> Result<(), StoreError> {
        self.fail().await
    }

    async fn set_payload(&self, _id: Uuid, _payload: JobPayload) -> Result<(), StoreError> {
        self.fail().await
    }

    async fn search(
        &self,
        _query: &[f32],
        _top_k: usize,
        _filter: &CorpusFilter,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        self.fail().await
    }

    async fn delete(&self, _vector_id: Uuid) -> Result<bool, StoreError> {
        self.fail().await
    }

    async fn stats(&self) -> Result<CorpusStats, StoreError> {
        self.fail().await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

pub const TEST_DIMENSION: usize = 64;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        redis_url: None,
        port: 0,
        rust_log: "debug".to_string(),
        qdrant: QdrantConfig {
            url: None,
            api_key: None,
            collection: "test_jobs".to_string(),
        },
        embedding: EmbeddingConfig {
            api_key: None,
            api_url: "http://localhost".to_string(),
            model: "test".to_string(),
            dimension: TEST_DIMENSION,
            timeout: Duration::from_secs(5),
        },
        vector_search_timeout: Duration::from_secs(5),
        reembed_policy: ReembedPolicy::OnContentChange,
        ingest_interval: None,
        job_feed_url: None,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub jobs: Arc<MemoryJobRepository>,
    pub documents: Arc<MemoryDocumentStore>,
}

/// Fully wired state over in-memory collaborators.
pub fn test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new(config.qdrant.collection.clone()));
    let jobs = Arc::new(MemoryJobRepository::default());
    let documents = Arc::new(MemoryDocumentStore::default());
    let embeddings = Arc::new(EmbeddingProvider::new(Arc::new(HashEmbedder::new(
        TEST_DIMENSION,
    ))));
    let skills = Arc::new(SkillExtractor::new().unwrap());

    let state = AppState {
        ranking: Arc::new(RankingEngine::new(
            embeddings.clone(),
            store.clone(),
            skills.clone(),
            config.vector_search_timeout,
        )),
        ingestion: Arc::new(IngestionPipeline::new(
            embeddings,
            store.clone(),
            jobs.clone(),
            skills,
            config.reembed_policy,
        )),
        store: store.clone(),
        jobs: jobs.clone(),
        documents: documents.clone(),
        config,
    };

    TestApp {
        state,
        store,
        jobs,
        documents,
    }
}
