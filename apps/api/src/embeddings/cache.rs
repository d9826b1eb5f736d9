//! Cross-request embedding cache.
//!
//! Only vectors produced by the primary backend are cached, keyed by that
//! backend's name (the model) so a model switch or a fallback answer never
//! shadows a real embedding. Best effort: connection or decode failures are
//! logged and treated as a miss.

use async_trait::async_trait;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use tracing::warn;

const CACHE_TTL_SECS: u64 = 60 * 60 * 24 * 7;

#[async_trait]
pub trait VectorCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<f32>>;
    async fn put(&self, key: &str, vector: &[f32]);
}

/// Redis-backed cache with a seven day TTL.
#[derive(Clone)]
pub struct RedisVectorCache {
    client: redis::Client,
}

impl RedisVectorCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VectorCache for RedisVectorCache {
    async fn get(&self, key: &str) -> Option<Vec<f32>> {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Embedding cache unavailable: {e}");
                return None;
            }
        };
        let raw: Option<String> = match conn.get(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!("Embedding cache read failed: {e}");
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str::<Vec<f32>>(&s).ok())
    }

    async fn put(&self, key: &str, vector: &[f32]) {
        let Ok(encoded) = serde_json::to_string(vector) else {
            return;
        };
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Embedding cache unavailable: {e}");
                return;
            }
        };
        let result: redis::RedisResult<()> = conn.set_ex(key, encoded, CACHE_TTL_SECS).await;
        if let Err(e) = result {
            warn!("Embedding cache write failed: {e}");
        }
    }
}

/// `emb:{backend}:{dimension}:{sha256(text)}`
pub fn cache_key(backend: &str, dimension: usize, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("emb:{backend}:{dimension}:{}", hex::encode(digest))
}
