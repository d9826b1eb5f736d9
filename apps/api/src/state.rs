use std::sync::Arc;

use crate::config::Config;
use crate::ingestion::IngestionPipeline;
use crate::matching::RankingEngine;
use crate::repository::{DocumentStore, JobRepository};
use crate::vector_store::CorpusStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator is constructed once in `main` and shared by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jobs: Arc<dyn JobRepository>,
    pub documents: Arc<dyn DocumentStore>,
    /// Vector index. `QdrantStore` when `QDRANT_URL` is set, otherwise `MemoryStore`.
    pub store: Arc<dyn CorpusStore>,
    pub ranking: Arc<RankingEngine>,
    pub ingestion: Arc<IngestionPipeline>,
}
