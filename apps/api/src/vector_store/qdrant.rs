//! Qdrant over its REST API. One collection, cosine distance, UUID point ids.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::vector_store::{
    compare_scored, vector_id_for, CorpusFilter, CorpusStats, CorpusStore, JobPayload,
    ScoredPoint, StoreError, VectorPoint,
};

/// Connection failures and timeouts get this many extra attempts.
const MAX_RETRIES: usize = 1;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub struct QdrantStore {
    client: Client,
    base_url: String,
    collection: String,
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: Uuid,
    vector: &'a [f32],
    payload: &'a JobPayload,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    status: String,
    #[serde(default)]
    points_count: Option<u64>,
    #[serde(default)]
    vectors_count: Option<u64>,
    #[serde(default)]
    config: Option<Value>,
}

impl CollectionInfo {
    fn vector_size(&self) -> Option<usize> {
        self.config
            .as_ref()?
            .pointer("/params/vectors/size")?
            .as_u64()
            .map(|s| s as usize)
    }
}

#[derive(Deserialize)]
struct SearchPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<JobPayload>,
}

#[derive(Deserialize)]
struct OperationResult {
    #[serde(default)]
    status: String,
}

impl QdrantStore {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        collection: String,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key.trim())
                .map_err(|e| StoreError::Unavailable(format!("invalid Qdrant API key: {e}")))?;
            headers.insert("api-key", value);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            collection,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, self.collection, path)
    }

    /// Sends the request, retrying connection failures and timeouts. Non-2xx
    /// responses are not retried.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, StoreError> {
        let mut attempt = 0usize;
        loop {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!("Qdrant request failed ({e}), retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) if e.is_timeout() => return Err(StoreError::Timeout),
                Err(e) => return Err(StoreError::Unavailable(e.to_string())),
            }
        }
    }

    async fn read<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: QdrantResponse<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(parsed.result)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, StoreError> {
        let url = self.url("");
        let response = self.send(|| self.client.get(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read(response).await.map(Some)
    }
}

#[async_trait]
impl CorpusStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        if let Some(info) = self.collection_info().await? {
            return match info.vector_size() {
                Some(size) if size != dimension => Err(StoreError::DimensionMismatch {
                    expected: size,
                    actual: dimension,
                }),
                _ => {
                    debug!("Qdrant collection '{}' already exists", self.collection);
                    Ok(())
                }
            };
        }

        let url = self.url("");
        let body = json!({ "vectors": { "size": dimension, "distance": "Cosine" } });
        let response = self.send(|| self.client.put(&url).json(&body)).await?;
        Self::read::<Value>(response).await?;
        info!(
            "Created Qdrant collection '{}' ({dimension}-dim, cosine)",
            self.collection
        );
        Ok(())
    }

    async fn upsert(&self, point: VectorPoint) -> Result<(), StoreError> {
        self.upsert_batch(vec![point]).await
    }

    async fn upsert_batch(&self, points: Vec<VectorPoint>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let url = self.url("/points?wait=true");
        let body: Vec<PointStruct> = points
            .iter()
            .map(|p| PointStruct {
                id: p.vector_id,
                vector: &p.vector,
                payload: &p.payload,
            })
            .collect();
        let body = json!({ "points": body });

        let response = self.send(|| self.client.put(&url).json(&body)).await?;
        let result: OperationResult = Self::read(response).await?;
        debug!("Upserted {} points ({})", points.len(), result.status);
        Ok(())
    }

    async fn set_payload(&self, vector_id: Uuid, payload: JobPayload) -> Result<(), StoreError> {
        // PUT overwrites the whole payload; POST would merge keys.
        let url = self.url("/points/payload?wait=true");
        let body = json!({ "payload": payload, "points": [vector_id] });
        let response = self.send(|| self.client.put(&url).json(&body)).await?;
        Self::read::<OperationResult>(response).await?;
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: &CorpusFilter,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let url = self.url("/points/search");
        let mut body = json!({
            "vector": query,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(filter) = filter_body(filter) {
            body["filter"] = filter;
        }

        let response = self.send(|| self.client.post(&url).json(&body)).await?;
        let hits: Vec<SearchPoint> = Self::read(response).await?;

        let mut scored: Vec<ScoredPoint> = hits
            .into_iter()
            .filter_map(|hit| {
                let Some(payload) = hit.payload else {
                    warn!("Skipping Qdrant point {} without payload", hit.id);
                    return None;
                };
                let vector_id = point_id(&hit.id).unwrap_or_else(|| vector_id_for(&payload.job_id));
                Some(ScoredPoint {
                    vector_id,
                    score: hit.score,
                    payload,
                })
            })
            .collect();
        scored.sort_by(compare_scored);
        Ok(scored)
    }

    /// Qdrant acknowledges deletes of absent points, so presence is checked first.
    async fn delete(&self, vector_id: Uuid) -> Result<bool, StoreError> {
        let point_url = self.url(&format!("/points/{vector_id}"));
        let response = self.send(|| self.client.get(&point_url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Point {vector_id} not in '{}', nothing to delete", self.collection);
            return Ok(false);
        }
        Self::read::<Value>(response).await?;

        let url = self.url("/points/delete?wait=true");
        let body = json!({ "points": [vector_id] });
        let response = self.send(|| self.client.post(&url).json(&body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::read::<OperationResult>(response).await?;
        Ok(true)
    }

    async fn stats(&self) -> Result<CorpusStats, StoreError> {
        let info = self
            .collection_info()
            .await?
            .ok_or_else(|| StoreError::Rejected {
                status: 404,
                message: format!("collection '{}' does not exist", self.collection),
            })?;
        Ok(CorpusStats {
            collection_name: self.collection.clone(),
            vectors_count: info.points_count.or(info.vectors_count).unwrap_or(0),
            status: info.status,
        })
    }
}

fn filter_body(filter: &CorpusFilter) -> Option<Value> {
    if filter.is_empty() {
        return None;
    }
    let conditions: Vec<Value> = [
        ("experience_level", &filter.experience_level),
        ("employment_type", &filter.employment_type),
    ]
    .into_iter()
    .filter_map(|(key, value)| {
        value
            .as_ref()
            .map(|v| json!({ "key": key, "match": { "value": v } }))
    })
    .collect();
    Some(json!({ "must": conditions }))
}

fn point_id(id: &Value) -> Option<Uuid> {
    id.as_str().and_then(|s| Uuid::parse_str(s).ok())
}
