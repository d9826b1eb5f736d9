use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::embeddings::EmbeddingProvider;
use crate::errors::AppError;
use crate::ingestion::normalize::normalize;
use crate::ingestion::sources::JobSource;
use crate::models::job::JobPosting;
use crate::repository::JobRepository;
use crate::skills::SkillExtractor;
use crate::vector_store::{vector_id_for, CorpusStore, VectorPoint};

/// Texts per `embed_many` call.
pub const EMBED_BATCH_SIZE: usize = 32;
/// Embedding batches allowed in flight at once.
pub const MAX_EMBED_BATCHES_IN_FLIGHT: usize = 5;

/// When an already-known job gets a fresh embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReembedPolicy {
    /// Only when the description's content hash changed.
    #[default]
    OnContentChange,
    Always,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    /// Raw records received from the source.
    pub total_ingested: usize,
    pub new_jobs: usize,
    /// Existing jobs whose metadata was refreshed, re-embedded or not.
    pub updated_jobs: usize,
    pub embeddings_created: usize,
    /// Existing jobs whose description was unchanged, so no embedding call was made.
    pub skipped_unchanged: usize,
    /// Records that could not be normalised, embedded, or stored.
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    New,
    Changed,
    Unchanged,
}

struct Staged {
    posting: JobPosting,
    skills: Vec<String>,
    disposition: Disposition,
}

pub struct IngestionPipeline {
    embeddings: Arc<EmbeddingProvider>,
    store: Arc<dyn CorpusStore>,
    jobs: Arc<dyn JobRepository>,
    skills: Arc<SkillExtractor>,
    policy: ReembedPolicy,
}

impl IngestionPipeline {
    pub fn new(
        embeddings: Arc<EmbeddingProvider>,
        store: Arc<dyn CorpusStore>,
        jobs: Arc<dyn JobRepository>,
        skills: Arc<SkillExtractor>,
        policy: ReembedPolicy,
    ) -> Self {
        Self {
            embeddings,
            store,
            jobs,
            skills,
            policy,
        }
    }

    /// Pulls one batch from `source` into the corpus. Individual records that
    /// fail are counted in `failed`; only source and store-level failures
    /// abort the run.
    pub async fn ingest(&self, source: &dyn JobSource) -> Result<IngestReport, AppError> {
        self.store
            .ensure_collection(self.embeddings.dimension())
            .await?;

        let records = source.fetch().await?;
        let mut report = IngestReport {
            source: source.name().to_string(),
            total_ingested: records.len(),
            ..Default::default()
        };
        info!(
            "Ingesting {} records from source '{}'",
            records.len(),
            source.name()
        );

        // Last occurrence of a job_id wins, first occurrence keeps its position.
        let mut postings: Vec<JobPosting> = Vec::with_capacity(records.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, record) in records.into_iter().enumerate() {
            match normalize(source.name(), record) {
                Ok(posting) => match positions.get(&posting.job_id) {
                    Some(&pos) => {
                        debug!("Duplicate job_id {} in batch, keeping latest", posting.job_id);
                        postings[pos] = posting;
                    }
                    None => {
                        positions.insert(posting.job_id.clone(), postings.len());
                        postings.push(posting);
                    }
                },
                Err(e) => {
                    warn!("Skipping record {idx} from '{}': {e}", source.name());
                    report.failed += 1;
                }
            }
        }

        let mut to_embed: Vec<Staged> = Vec::new();
        let mut unchanged: Vec<Staged> = Vec::new();
        for posting in postings {
            let existing = match self.jobs.find_by_job_id(&posting.job_id).await {
                Ok(existing) => existing,
                Err(e) => {
                    warn!("Lookup of job {} failed: {e}", posting.job_id);
                    report.failed += 1;
                    continue;
                }
            };
            let disposition = match existing {
                None => Disposition::New,
                Some(row)
                    if self.policy == ReembedPolicy::Always
                        || row.vector_id.is_none()
                        || row.content_hash != posting.content_hash =>
                {
                    Disposition::Changed
                }
                Some(_) => Disposition::Unchanged,
            };
            let skills = self
                .skills
                .extract_skills_with_tags(&posting.description, &posting.tags)
                .into_iter()
                .collect();
            let staged = Staged {
                posting,
                skills,
                disposition,
            };
            if disposition == Disposition::Unchanged {
                unchanged.push(staged);
            } else {
                to_embed.push(staged);
            }
        }

        // A point missing from the store (e.g. a fresh in-memory index) is
        // re-embedded rather than counted as failed.
        for mut staged in unchanged {
            let vector_id = vector_id_for(&staged.posting.job_id);
            let payload = staged.posting.to_payload(staged.skills.clone());
            match self.store.set_payload(vector_id, payload).await {
                Ok(()) => {
                    report.skipped_unchanged += 1;
                    self.record(&staged, &mut report).await;
                }
                Err(e) => {
                    debug!(
                        "Payload refresh for job {} failed ({e}), re-embedding",
                        staged.posting.job_id
                    );
                    staged.disposition = Disposition::Changed;
                    to_embed.push(staged);
                }
            }
        }

        let texts: Vec<String> = to_embed
            .iter()
            .map(|s| s.posting.description.clone())
            .collect();
        let vectors = self.embed_all(texts).await;

        let mut ready: Vec<(Staged, Vec<f32>)> = Vec::with_capacity(to_embed.len());
        for (staged, vector) in to_embed.into_iter().zip(vectors) {
            match vector {
                Some(vector) => ready.push((staged, vector)),
                None => report.failed += 1,
            }
        }

        while !ready.is_empty() {
            let take = ready.len().min(EMBED_BATCH_SIZE);
            let (batch, points): (Vec<Staged>, Vec<VectorPoint>) = ready
                .drain(..take)
                .map(|(staged, vector)| {
                    let point = VectorPoint {
                        vector_id: vector_id_for(&staged.posting.job_id),
                        vector,
                        payload: staged.posting.to_payload(staged.skills.clone()),
                    };
                    (staged, point)
                })
                .unzip();

            if let Err(e) = self.store.upsert_batch(points).await {
                warn!("Vector upsert of {} jobs failed: {e}", batch.len());
                report.failed += batch.len();
                continue;
            }
            report.embeddings_created += batch.len();
            for staged in batch {
                self.record(&staged, &mut report).await;
            }
        }

        info!(
            "Ingestion from '{}' done: {} new, {} updated, {} embedded, {} unchanged, {} failed",
            report.source,
            report.new_jobs,
            report.updated_jobs,
            report.embeddings_created,
            report.skipped_unchanged,
            report.failed
        );
        Ok(report)
    }

    async fn record(&self, staged: &Staged, report: &mut IngestReport) {
        let vector_id = vector_id_for(&staged.posting.job_id);
        match self
            .jobs
            .upsert_job(&staged.posting, &staged.skills, vector_id)
            .await
        {
            Ok(()) if staged.disposition == Disposition::New => report.new_jobs += 1,
            Ok(()) => report.updated_jobs += 1,
            Err(e) => {
                warn!("Saving job {} failed: {e}", staged.posting.job_id);
                report.failed += 1;
            }
        }
    }

    /// Embeds `texts` in batches with bounded concurrency. A failed batch
    /// leaves `None` for each of its texts.
    async fn embed_all(&self, texts: Vec<String>) -> Vec<Option<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let semaphore = Arc::new(Semaphore::new(MAX_EMBED_BATCHES_IN_FLIGHT));
        let mut tasks = JoinSet::new();

        for (batch_no, chunk) in texts.chunks(EMBED_BATCH_SIZE).enumerate() {
            let chunk = chunk.to_vec();
            let embeddings = Arc::clone(&self.embeddings);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (batch_no, embeddings.embed_many(&chunk).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((batch_no, Ok(vectors))) => {
                    let offset = batch_no * EMBED_BATCH_SIZE;
                    for (i, vector) in vectors.into_iter().enumerate() {
                        results[offset + i] = Some(vector);
                    }
                }
                Ok((batch_no, Err(e))) => warn!("Embedding batch {batch_no} failed: {e}"),
                Err(e) => warn!("Embedding task aborted: {e}"),
            }
        }
        results
    }
}
