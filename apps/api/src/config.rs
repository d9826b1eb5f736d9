use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::ingestion::ReembedPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub vector_search_timeout: Duration,
    pub reembed_policy: ReembedPolicy,
    /// Periodic ingestion of the default source. Disabled when unset.
    pub ingest_interval: Option<Duration>,
    pub job_feed_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// When unset the in-process memory index is used instead.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Primary backend is only enabled when an API key is present.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    /// Canonical vector dimension for the lifetime of the corpus.
    pub dimension: usize,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let reembed_policy = match optional_env("REEMBED_POLICY").as_deref() {
            None | Some("on_change") => ReembedPolicy::OnContentChange,
            Some("always") => ReembedPolicy::Always,
            Some(other) => bail!("REEMBED_POLICY must be 'on_change' or 'always', got '{other}'"),
        };

        let dimension = parse_env("EMBEDDING_DIMENSION", 384usize)?;
        if dimension == 0 {
            bail!("EMBEDDING_DIMENSION must be greater than zero");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            qdrant: QdrantConfig {
                url: optional_env("QDRANT_URL"),
                api_key: optional_env("QDRANT_API_KEY"),
                collection: optional_env("QDRANT_COLLECTION")
                    .unwrap_or_else(|| "aligncv_jobs".to_string()),
            },
            embedding: EmbeddingConfig {
                api_key: optional_env("EMBEDDING_API_KEY"),
                api_url: optional_env("EMBEDDING_API_URL")
                    .unwrap_or_else(|| "https://api.mistral.ai/v1".to_string()),
                model: optional_env("EMBEDDING_MODEL")
                    .unwrap_or_else(|| "mistral-embed".to_string()),
                dimension,
                timeout: Duration::from_secs(parse_env("EMBEDDING_TIMEOUT_SECS", 20u64)?),
            },
            vector_search_timeout: Duration::from_secs(parse_env(
                "VECTOR_SEARCH_TIMEOUT_SECS",
                15u64,
            )?),
            reembed_policy,
            ingest_interval: optional_env("INGEST_INTERVAL_SECS")
                .map(|v| {
                    v.parse::<u64>()
                        .context("INGEST_INTERVAL_SECS must be a number of seconds")
                })
                .transpose()?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            job_feed_url: optional_env("JOB_FEED_URL"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
