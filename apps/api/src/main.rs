mod config;
mod db;
mod embeddings;
mod errors;
mod ingestion;
mod matching;
mod models;
mod repository;
mod routes;
mod skills;
mod state;
mod vector_store;

#[cfg(test)]
mod test_utils;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embeddings::cache::RedisVectorCache;
use crate::embeddings::local::HashEmbedder;
use crate::embeddings::remote::RemoteEmbedder;
use crate::embeddings::{EmbeddingBackend, EmbeddingProvider};
use crate::ingestion::scheduler::spawn_periodic_ingest;
use crate::ingestion::sources::SourceKind;
use crate::ingestion::IngestionPipeline;
use crate::matching::RankingEngine;
use crate::repository::{PgDocumentStore, PgJobRepository};
use crate::routes::build_router;
use crate::skills::SkillExtractor;
use crate::state::AppState;
use crate::vector_store::memory::MemoryStore;
use crate::vector_store::qdrant::QdrantStore;
use crate::vector_store::CorpusStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    let embeddings = Arc::new(build_embedding_provider(&config)?);
    info!(
        "Embedding provider ready (backend: {}, dimension: {})",
        embeddings.active_backend(),
        embeddings.dimension()
    );

    let store = build_store(&config)?;
    if let Err(e) = store.ensure_collection(embeddings.dimension()).await {
        // A mismatched dimension would corrupt the index; an unreachable
        // store is retried by the first request that needs it.
        if matches!(e, vector_store::StoreError::DimensionMismatch { .. }) {
            return Err(e.into());
        }
        warn!("Vector store not ready at startup: {e}");
    }

    let skills = Arc::new(SkillExtractor::new()?);
    let jobs = Arc::new(PgJobRepository::new(db.clone()));
    let documents = Arc::new(PgDocumentStore::new(db));

    let ranking = Arc::new(RankingEngine::new(
        embeddings.clone(),
        store.clone(),
        skills.clone(),
        config.vector_search_timeout,
    ));
    let ingestion = Arc::new(IngestionPipeline::new(
        embeddings,
        store.clone(),
        jobs.clone(),
        skills,
        config.reembed_policy,
    ));

    if let Some(every) = config.ingest_interval {
        let source = SourceKind::default_for(config.job_feed_url.as_deref()).build()?;
        spawn_periodic_ingest(ingestion.clone(), source, every);
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        jobs,
        documents,
        store,
        ranking,
        ingestion,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the web client domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Local hashing embedder as fallback, the remote API as primary when a key
/// is configured, and the Redis cache when a Redis URL is configured.
fn build_embedding_provider(config: &Config) -> Result<EmbeddingProvider> {
    let cfg = &config.embedding;
    let fallback: Arc<dyn EmbeddingBackend> = Arc::new(HashEmbedder::new(cfg.dimension));
    let mut provider = EmbeddingProvider::new(fallback.clone());

    if let Some(api_key) = &cfg.api_key {
        let remote = RemoteEmbedder::new(
            api_key.clone(),
            &cfg.api_url,
            cfg.model.clone(),
            cfg.dimension,
            cfg.timeout,
        )?;
        provider = match provider.with_primary(Arc::new(remote)) {
            Ok(p) => p,
            Err(e) => {
                warn!("Remote embeddings disabled: {e}");
                EmbeddingProvider::new(fallback)
            }
        };
    } else {
        info!("EMBEDDING_API_KEY not set, using local embeddings only");
    }

    provider = provider.with_timeout(cfg.timeout);

    if let Some(url) = &config.redis_url {
        let client = redis::Client::open(url.as_str())?;
        provider = provider.with_cache(Arc::new(RedisVectorCache::new(client)));
        if cfg.api_key.is_some() {
            info!("Redis embedding cache enabled");
        }
    }

    Ok(provider)
}

fn build_store(config: &Config) -> Result<Arc<dyn CorpusStore>> {
    let collection = config.qdrant.collection.clone();
    Ok(match &config.qdrant.url {
        Some(url) => {
            info!("Using Qdrant at {url} (collection: {collection})");
            Arc::new(QdrantStore::new(
                url,
                config.qdrant.api_key.as_deref(),
                collection,
                config.vector_search_timeout,
            )?)
        }
        None => {
            warn!("QDRANT_URL not set, using the in-memory index (not persisted)");
            Arc::new(MemoryStore::new(collection))
        }
    })
}
