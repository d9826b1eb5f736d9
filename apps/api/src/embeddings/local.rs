//! Hash embeddings, the deterministic local fallback model.
//!
//! Signed feature hashing of unigrams and bigrams with FNV-1a, L2-normalised.
//! No model files, no network, identical output on every machine, so texts
//! sharing vocabulary land close together in cosine space.

use async_trait::async_trait;

use crate::embeddings::{EmbeddingBackend, EmbeddingError};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const BIGRAM_WEIGHT: f32 = 0.5;

pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add_feature(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let feature = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, feature.as_bytes(), BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let idx = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
        vector[idx] += sign * weight;
    }
}

#[async_trait]
impl EmbeddingBackend for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Lower-cased alphanumeric runs; `+` and `#` are kept so `c++` and `c#` survive.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed_text("Senior Rust engineer, distributed systems");
        let b = embedder.embed_text("Senior Rust engineer, distributed systems");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_dimension_and_unit_norm() {
        let embedder = HashEmbedder::new(128);
        let v = embedder.embed_text("python fastapi docker");
        assert_eq!(v.len(), 128);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_tokens_gives_zero_vector() {
        let v = HashEmbedder::new(32).embed_text("!!! ---");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::default();
        let resume = embedder.embed_text("python fastapi postgresql docker backend apis");
        let backend_job = embedder.embed_text("backend engineer python fastapi postgresql");
        let design_job = embedder.embed_text("graphic designer photoshop illustrator branding");

        assert!(
            cosine_similarity(&resume, &backend_job) > cosine_similarity(&resume, &design_job)
        );
    }

    #[test]
    fn test_tokenize_keeps_language_symbols() {
        assert_eq!(tokenize("C++ and C#!"), vec!["c++", "and", "c#"]);
    }

    #[tokio::test]
    async fn test_backend_batch_matches_single() {
        let embedder = HashEmbedder::new(64);
        let batch = embedder
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(batch[1], embedder.embed_text("two"));
    }
}
