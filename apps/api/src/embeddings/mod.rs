//! Embedding Provider: text to fixed-dimension vectors.
//!
//! A primary backend (remote API) is attempted first; any failure of it,
//! timeouts included, falls back to the local `HashEmbedder`.
//! Fallback failures are fatal since there is no further degradation path.
//!
//! The provider is constructed once in `main` and shared via `Arc`. Its
//! dimension is the canonical corpus dimension: a primary backend of any other
//! dimension is refused at construction time.

pub mod cache;
pub mod local;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::embeddings::cache::{cache_key, VectorCache};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("embedding backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("embedding backend '{backend}' timed out after {timeout:?}")]
    Timeout { backend: String, timeout: Duration },

    #[error("embedding backend '{backend}' returned dimension {actual}, expected {expected}")]
    DimensionMismatch {
        backend: String,
        expected: usize,
        actual: usize,
    },

    #[error("embedding backend '{backend}' returned {actual} vectors for {expected} inputs")]
    CountMismatch {
        backend: String,
        expected: usize,
        actual: usize,
    },
}

impl EmbeddingError {
    /// Conditions under which the primary backend is abandoned for the fallback.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(self, EmbeddingError::EmptyInput)
    }
}

/// A single embedding model. Implementations must always return vectors of
/// `dimension()` length, one per input, in input order.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

pub struct EmbeddingProvider {
    primary: Option<Arc<dyn EmbeddingBackend>>,
    fallback: Arc<dyn EmbeddingBackend>,
    timeout: Duration,
    cache: Option<Arc<dyn VectorCache>>,
}

/// Vectors plus whether the primary backend produced them.
struct Computed {
    vectors: Vec<Vec<f32>>,
    from_primary: bool,
}

impl EmbeddingProvider {
    /// The fallback backend's dimension becomes the canonical dimension.
    pub fn new(fallback: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            primary: None,
            fallback,
            timeout: Duration::from_secs(20),
            cache: None,
        }
    }

    /// Installs a primary backend. Refused when its dimension differs from the
    /// canonical one, since mixing dimensions corrupts the index.
    pub fn with_primary(
        mut self,
        primary: Arc<dyn EmbeddingBackend>,
    ) -> Result<Self, EmbeddingError> {
        if primary.dimension() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                backend: primary.name().to_string(),
                expected: self.dimension(),
                actual: primary.dimension(),
            });
        }
        self.primary = Some(primary);
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only consulted while a primary backend is installed.
    pub fn with_cache(mut self, cache: Arc<dyn VectorCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn dimension(&self) -> usize {
        self.fallback.dimension()
    }

    /// Name of the backend that is tried first.
    pub fn active_backend(&self) -> &str {
        self.primary
            .as_ref()
            .map(|p| p.name())
            .unwrap_or_else(|| self.fallback.name())
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| EmbeddingError::CountMismatch {
            backend: self.active_backend().to_string(),
            expected: 1,
            actual: 0,
        })
    }

    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::EmptyInput);
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (Some(cache), Some(primary)) = (&self.cache, &self.primary) else {
            return Ok(self.compute(texts).await?.vectors);
        };

        let dimension = self.dimension();
        let keys: Vec<String> = texts
            .iter()
            .map(|t| cache_key(primary.name(), dimension, t))
            .collect();
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        for key in &keys {
            results.push(cache.get(key).await.filter(|v| v.len() == dimension));
        }

        let missing: Vec<usize> = (0..texts.len()).filter(|i| results[*i].is_none()).collect();
        if missing.is_empty() {
            debug!("All {} embeddings served from cache", texts.len());
            return Ok(results.into_iter().flatten().collect());
        }

        let to_compute: Vec<String> = missing.iter().map(|i| texts[*i].clone()).collect();
        let computed = self.compute(&to_compute).await?;
        let cacheable = computed.from_primary;
        for (idx, vector) in missing.into_iter().zip(computed.vectors) {
            if cacheable {
                cache.put(&keys[idx], &vector).await;
            }
            results[idx] = Some(vector);
        }

        Ok(results.into_iter().flatten().collect())
    }

    async fn compute(&self, texts: &[String]) -> Result<Computed, EmbeddingError> {
        if let Some(primary) = &self.primary {
            match self.try_primary(primary.as_ref(), texts).await {
                Ok(vectors) => {
                    return Ok(Computed {
                        vectors,
                        from_primary: true,
                    });
                }
                Err(e) if e.triggers_fallback() => {
                    warn!(
                        "Primary embedding backend failed, using fallback '{}': {e}",
                        self.fallback.name()
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let vectors = self.fallback.embed_batch(texts).await?;
        check_shape(self.fallback.name(), texts.len(), self.dimension(), &vectors)?;
        Ok(Computed {
            vectors,
            from_primary: false,
        })
    }

    async fn try_primary(
        &self,
        primary: &dyn EmbeddingBackend,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let vectors = tokio::time::timeout(self.timeout, primary.embed_batch(texts))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                backend: primary.name().to_string(),
                timeout: self.timeout,
            })??;
        check_shape(primary.name(), texts.len(), self.dimension(), &vectors)?;
        Ok(vectors)
    }
}

fn check_shape(
    backend: &str,
    expected_count: usize,
    dimension: usize,
    vectors: &[Vec<f32>],
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::CountMismatch {
            backend: backend.to_string(),
            expected: expected_count,
            actual: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            backend: backend.to_string(),
            expected: dimension,
            actual: bad.len(),
        });
    }
    Ok(())
}

/// Cosine similarity in [-1, 1]. Zero vectors and mismatched lengths score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::embeddings::local::HashEmbedder;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend that always fails, counting how often it was asked.
    pub struct FailingBackend {
        pub calls: AtomicUsize,
        pub dimension: usize,
    }

    impl FailingBackend {
        pub fn new(dimension: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                dimension,
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EmbeddingError::Backend {
                backend: "failing".to_string(),
                message: "quota exceeded".to_string(),
            })
        }
    }

    /// Backend that never answers within any reasonable timeout.
    struct HangingBackend;

    #[async_trait]
    impl EmbeddingBackend for HangingBackend {
        fn name(&self) -> &str {
            "hanging"
        }

        fn dimension(&self) -> usize {
            64
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    /// Claims the right dimension but returns something else.
    struct LyingBackend;

    #[async_trait]
    impl EmbeddingBackend for LyingBackend {
        fn name(&self) -> &str {
            "lying"
        }

        fn dimension(&self) -> usize {
            64
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0; 1024]).collect())
        }
    }

    /// Encodes each text as a vector filled with its length and records what
    /// it was asked to embed.
    struct LengthBackend {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingBackend for LengthBackend {
        fn name(&self) -> &str {
            "length-model"
        }

        fn dimension(&self) -> usize {
            64
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.seen.lock().unwrap().extend(texts.iter().cloned());
            Ok(texts.iter().map(|t| vec![t.len() as f32; 64]).collect())
        }
    }

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, Vec<f32>>>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl VectorCache for MapCache {
        async fn get(&self, key: &str) -> Option<Vec<f32>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn put(&self, key: &str, vector: &[f32]) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), vector.to_vec());
        }
    }

    fn provider(dim: usize) -> EmbeddingProvider {
        EmbeddingProvider::new(Arc::new(HashEmbedder::new(dim)))
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_backend_call() {
        let primary = Arc::new(FailingBackend::new(64));
        let provider = provider(64).with_primary(primary.clone()).unwrap();

        let err = provider.embed("   ").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_local() {
        let primary = Arc::new(FailingBackend::new(64));
        let provider = provider(64).with_primary(primary.clone()).unwrap();

        let vector = provider.embed("rust engineer").await.unwrap();
        assert_eq!(vector.len(), 64);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(vector, HashEmbedder::new(64).embed_text("rust engineer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_timeout_falls_back() {
        let provider = provider(64)
            .with_primary(Arc::new(HangingBackend))
            .unwrap()
            .with_timeout(Duration::from_secs(10));

        let vectors = provider
            .embed_many(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[tokio::test]
    async fn test_wrong_dimension_response_falls_back() {
        let provider = provider(64).with_primary(Arc::new(LyingBackend)).unwrap();
        let vector = provider.embed("kubernetes").await.unwrap();
        assert_eq!(vector.len(), 64);
    }

    #[test]
    fn test_primary_with_other_dimension_is_refused() {
        let result = provider(384).with_primary(Arc::new(FailingBackend::new(1024)));
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 384,
                actual: 1024,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fallback_failure_is_fatal() {
        let provider = EmbeddingProvider::new(Arc::new(FailingBackend::new(8)));
        let err = provider.embed("python").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Backend { .. }));
    }

    #[tokio::test]
    async fn test_embed_many_empty_list() {
        let vectors = provider(16).embed_many(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hits_and_misses_keep_input_order() {
        let primary = Arc::new(LengthBackend {
            seen: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(MapCache::default());
        cache.put(&cache_key("length-model", 64, "bb"), &[7.0; 64]).await;
        let provider = provider(64)
            .with_primary(primary.clone())
            .unwrap()
            .with_cache(cache.clone());

        let texts = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        let vectors = provider.embed_many(&texts).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0; 64], vec![7.0; 64], vec![3.0; 64]]);
        assert_eq!(*primary.seen.lock().unwrap(), vec!["a".to_string(), "ccc".to_string()]);
        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[&cache_key("length-model", 64, "ccc")], vec![3.0; 64]);
    }

    #[tokio::test]
    async fn test_cache_ignores_entries_of_wrong_dimension() {
        let primary = Arc::new(LengthBackend {
            seen: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(MapCache::default());
        cache.put(&cache_key("length-model", 64, "abcd"), &[9.0; 8]).await;
        let provider = provider(64)
            .with_primary(primary.clone())
            .unwrap()
            .with_cache(cache);

        assert_eq!(provider.embed("abcd").await.unwrap(), vec![4.0; 64]);
        assert_eq!(primary.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_vectors_are_not_cached() {
        let primary = Arc::new(FailingBackend::new(64));
        let cache = Arc::new(MapCache::default());
        let provider = provider(64)
            .with_primary(primary.clone())
            .unwrap()
            .with_cache(cache.clone());

        let vector = provider.embed("rust engineer").await.unwrap();
        assert_eq!(vector, HashEmbedder::new(64).embed_text("rust engineer"));
        assert!(cache.entries.lock().unwrap().is_empty());

        // The primary is asked again next time instead of a cached fallback.
        provider.embed("rust engineer").await.unwrap();
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_unused_without_primary() {
        let cache = Arc::new(MapCache::default());
        let provider = provider(64).with_cache(cache.clone());

        provider.embed("python").await.unwrap();
        assert_eq!(cache.reads.load(Ordering::SeqCst), 0);
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
