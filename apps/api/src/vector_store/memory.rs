//! Exact brute-force cosine index held in process memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::embeddings::cosine_similarity;
use crate::vector_store::{
    compare_scored, CorpusFilter, CorpusStats, CorpusStore, JobPayload, ScoredPoint, StoreError,
    VectorPoint,
};

#[derive(Default)]
struct Collection {
    dimension: Option<usize>,
    points: BTreeMap<Uuid, (Vec<f32>, JobPayload)>,
}

pub struct MemoryStore {
    name: String,
    inner: RwLock<Collection>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Collection::default()),
        }
    }
}

#[async_trait]
impl CorpusStore for MemoryStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.dimension {
            Some(existing) if existing != dimension => Err(StoreError::DimensionMismatch {
                expected: existing,
                actual: dimension,
            }),
            Some(_) => Ok(()),
            None => {
                info!("Creating in-memory collection '{}' ({dimension}-dim)", self.name);
                inner.dimension = Some(dimension);
                Ok(())
            }
        }
    }

    async fn upsert(&self, point: VectorPoint) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let expected = *inner.dimension.get_or_insert(point.vector.len());
        if point.vector.len() != expected {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: point.vector.len(),
            });
        }
        inner
            .points
            .insert(point.vector_id, (point.vector, point.payload));
        Ok(())
    }

    async fn set_payload(&self, vector_id: Uuid, payload: JobPayload) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.points.get_mut(&vector_id) {
            Some(entry) => {
                entry.1 = payload;
                Ok(())
            }
            None => Err(StoreError::Rejected {
                status: 404,
                message: format!("point {vector_id} not found"),
            }),
        }
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &CorpusFilter,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let inner = self.inner.read().await;
        if let Some(expected) = inner.dimension {
            if query.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<ScoredPoint> = inner
            .points
            .iter()
            .filter(|(_, (_, payload))| filter.matches(payload))
            .map(|(id, (vector, payload))| ScoredPoint {
                vector_id: *id,
                score: cosine_similarity(query, vector),
                payload: payload.clone(),
            })
            .collect();

        scored.sort_by(compare_scored);
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete(&self, vector_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.points.remove(&vector_id).is_some())
    }

    async fn stats(&self) -> Result<CorpusStats, StoreError> {
        let inner = self.inner.read().await;
        Ok(CorpusStats {
            collection_name: self.name.clone(),
            vectors_count: inner.points.len() as u64,
            status: "green".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_payload;
    use crate::vector_store::vector_id_for;

    fn point(job_id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            vector_id: vector_id_for(job_id),
            vector,
            payload: make_payload(job_id, "Python, AWS"),
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = MemoryStore::new("jobs");
        store.ensure_collection(2).await.unwrap();
        store.upsert(point("far", vec![-1.0, 0.0])).await.unwrap();
        store.upsert(point("near", vec![1.0, 0.1])).await.unwrap();
        store.upsert(point("mid", vec![0.0, 1.0])).await.unwrap();

        let results = store
            .search(&[1.0, 0.0], 10, &CorpusFilter::default())
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.payload.job_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[tokio::test]
    async fn test_top_k_is_soft_cap() {
        let store = MemoryStore::new("jobs");
        store.upsert(point("a", vec![1.0, 0.0])).await.unwrap();
        let results = store
            .search(&[1.0, 0.0], 5, &CorpusFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new("jobs");
        store.upsert(point("a", vec![1.0, 0.0])).await.unwrap();
        store.upsert(point("a", vec![1.0, 0.0])).await.unwrap();
        assert_eq!(store.stats().await.unwrap().vectors_count, 1);
    }

    #[tokio::test]
    async fn test_dimension_is_pinned() {
        let store = MemoryStore::new("jobs");
        store.ensure_collection(2).await.unwrap();
        let err = store.upsert(point("a", vec![1.0, 0.0, 0.0])).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3 }));
        assert!(store.ensure_collection(3).await.is_err());
    }

    #[tokio::test]
    async fn test_native_filter_applied() {
        let store = MemoryStore::new("jobs");
        let mut senior = point("senior", vec![1.0, 0.0]);
        senior.payload.experience_level = Some("senior".into());
        store.upsert(senior).await.unwrap();
        store.upsert(point("other", vec![1.0, 0.0])).await.unwrap();

        let filter = CorpusFilter {
            experience_level: Some("senior".into()),
            employment_type: None,
        };
        let results = store.search(&[1.0, 0.0], 10, &filter).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload.job_id, "senior");
    }

    #[tokio::test]
    async fn test_set_payload_and_delete() {
        let store = MemoryStore::new("jobs");
        store.upsert(point("a", vec![1.0, 0.0])).await.unwrap();

        let mut updated = make_payload("a", "Rust");
        updated.title = "Staff Engineer".into();
        store.set_payload(vector_id_for("a"), updated).await.unwrap();
        let results = store
            .search(&[1.0, 0.0], 1, &CorpusFilter::default())
            .await
            .unwrap();
        assert_eq!(results[0].payload.title, "Staff Engineer");

        assert!(store.delete(vector_id_for("a")).await.unwrap());
        assert!(!store.delete(vector_id_for("a")).await.unwrap());
        assert!(store
            .set_payload(vector_id_for("a"), make_payload("a", ""))
            .await
            .is_err());
    }
}
