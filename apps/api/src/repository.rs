//! Relational side of the corpus: the `jobs` table, read-only lookups into
//! the document, bookmark, and application tables.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::DocumentRow;
use crate::models::job::{JobFlags, JobPosting, JobRow};

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<JobRow>, sqlx::Error>;

    /// Insert or refresh metadata for `job.job_id`.
    async fn upsert_job(
        &self,
        job: &JobPosting,
        skills: &[String],
        vector_id: Uuid,
    ) -> Result<(), sqlx::Error>;

    async fn list_jobs(
        &self,
        skip: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<JobRow>, sqlx::Error>;

    /// Detaches a job from its vector. The next ingestion re-embeds it.
    async fn clear_vector_id(&self, job_id: &str) -> Result<(), sqlx::Error>;

    /// Bookmark and application flags for `user_id`, keyed by `job_id`.
    /// Jobs without either are absent from the map.
    async fn job_flags(
        &self,
        user_id: Uuid,
        job_ids: &[String],
    ) -> Result<HashMap<String, JobFlags>, sqlx::Error>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_document(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM jobs WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert_job(
        &self,
        job: &JobPosting,
        skills: &[String],
        vector_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (job_id, source, title, company, description, location, url, tags,
                 salary_min, salary_max, employment_type, experience_level, skills,
                 content_hash, vector_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (job_id) DO UPDATE SET
                source = EXCLUDED.source,
                title = EXCLUDED.title,
                company = EXCLUDED.company,
                description = EXCLUDED.description,
                location = EXCLUDED.location,
                url = EXCLUDED.url,
                tags = EXCLUDED.tags,
                salary_min = EXCLUDED.salary_min,
                salary_max = EXCLUDED.salary_max,
                employment_type = EXCLUDED.employment_type,
                experience_level = EXCLUDED.experience_level,
                skills = EXCLUDED.skills,
                content_hash = EXCLUDED.content_hash,
                vector_id = EXCLUDED.vector_id,
                updated_at = now()
            "#,
        )
        .bind(&job.job_id)
        .bind(&job.source)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.url)
        .bind(&job.tags)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.employment_type)
        .bind(&job.experience_level)
        .bind(skills)
        .bind(&job.content_hash)
        .bind(vector_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_jobs(
        &self,
        skip: i64,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE ($1::text IS NULL OR source = $1)
            ORDER BY created_at DESC, job_id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(source)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn clear_vector_id(&self, job_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET vector_id = NULL, updated_at = now() WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn job_flags(
        &self,
        user_id: Uuid,
        job_ids: &[String],
    ) -> Result<HashMap<String, JobFlags>, sqlx::Error> {
        if job_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(String, bool, bool)> = sqlx::query_as(
            r#"
            SELECT j.job_id,
                   EXISTS (SELECT 1 FROM job_bookmarks b
                           WHERE b.job_id = j.id AND b.user_id = $1) AS is_bookmarked,
                   EXISTS (SELECT 1 FROM job_applications a
                           WHERE a.job_id = j.id AND a.user_id = $1) AS is_applied
            FROM jobs j
            WHERE j.job_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter(|(_, bookmarked, applied)| *bookmarked || *applied)
            .map(|(job_id, is_bookmarked, is_applied)| {
                (
                    job_id,
                    JobFlags {
                        is_bookmarked,
                        is_applied,
                    },
                )
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_document(&self, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
        sqlx::query_as("SELECT id, user_id, extracted_text FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}
