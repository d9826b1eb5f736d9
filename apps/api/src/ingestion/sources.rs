//! Job sources. A source yields a finite batch of raw records; normalisation
//! and deduplication happen in the pipeline, so sources stay dumb.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::errors::AppError;

/// Entries taken from a single feed fetch.
pub const MAX_FEED_ENTRIES: usize = 50;

const FEED_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source request failed: {0}")]
    Request(String),

    #[error("source responded with status {0}")]
    Status(u16),

    #[error("source returned an unexpected document: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Qualifies every `job_id` this source produces.
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<Vec<Value>, SourceError>;
}

/// Source selector accepted by the ingest endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Mock,
    Feed { url: String },
}

impl SourceKind {
    /// `feed` is only available when a feed URL is configured.
    pub fn parse(name: &str, feed_url: Option<&str>) -> Result<Self, AppError> {
        match name.trim().to_lowercase().as_str() {
            "mock" => Ok(SourceKind::Mock),
            "feed" => feed_url
                .map(|url| SourceKind::Feed {
                    url: url.to_string(),
                })
                .ok_or_else(|| AppError::Validation("JOB_FEED_URL is not configured".into())),
            other => Err(AppError::Validation(format!(
                "Unknown source '{other}', expected 'mock' or 'feed'"
            ))),
        }
    }

    /// The feed when configured, otherwise the mock postings.
    pub fn default_for(feed_url: Option<&str>) -> Self {
        match feed_url {
            Some(url) => SourceKind::Feed {
                url: url.to_string(),
            },
            None => SourceKind::Mock,
        }
    }

    pub fn build(self) -> Result<Box<dyn JobSource>, SourceError> {
        Ok(match self {
            SourceKind::Mock => Box::new(MockJobSource),
            SourceKind::Feed { url } => Box::new(JsonFeedSource::new(url)?),
        })
    }
}

/// Reads a JSON array of postings (or `{"jobs": [...]}`) over HTTP.
pub struct JsonFeedSource {
    client: Client,
    url: String,
}

impl JsonFeedSource {
    pub fn new(url: String) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl JobSource for JsonFeedSource {
    fn name(&self) -> &str {
        "feed"
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        info!("Fetching job feed: {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }
        let document: Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        let entries = feed_entries(document)?;
        info!("Fetched {} entries from job feed", entries.len());
        Ok(entries)
    }
}

fn feed_entries(document: Value) -> Result<Vec<Value>, SourceError> {
    let entries = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("jobs").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => return Err(SourceError::Malformed("no 'jobs' array".into())),
        },
        _ => return Err(SourceError::Malformed("expected an array of postings".into())),
    };
    Ok(entries.into_iter().take(MAX_FEED_ENTRIES).collect())
}

/// Ten fixed postings covering the common role families. Used for local
/// development and as the default periodic source.
pub struct MockJobSource;

#[async_trait]
impl JobSource for MockJobSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self) -> Result<Vec<Value>, SourceError> {
        Ok(mock_postings())
    }
}

fn mock_postings() -> Vec<Value> {
    vec![
        json!({
            "title": "Senior Software Engineer",
            "company": "TechCorp",
            "description": "Senior engineer for our API platform. Requirements: 5+ years of Python, FastAPI, PostgreSQL and AWS. You will build scalable APIs, mentor junior developers and work alongside our ML systems. Docker and Kubernetes experience preferred.",
            "url": "https://example.com/jobs/1",
            "location": "San Francisco, CA",
            "tags": ["Python", "FastAPI", "PostgreSQL", "AWS", "Docker"],
            "salary_min": 150000,
            "salary_max": 200000,
            "employment_type": "full-time",
            "experience_level": "senior"
        }),
        json!({
            "title": "Machine Learning Engineer",
            "company": "AI Innovations",
            "description": "Join the ML team shipping production models. Requirements: TensorFlow or PyTorch, Python and cloud infrastructure. Work spans NLP, computer vision and recommendation systems, with transformers and LLMs trained on distributed clusters.",
            "url": "https://example.com/jobs/2",
            "location": "Remote",
            "tags": ["Machine Learning", "Python", "TensorFlow", "PyTorch", "NLP"],
            "salary_min": 180000,
            "salary_max": 250000,
            "employment_type": "full-time",
            "experience_level": "senior"
        }),
        json!({
            "title": "Backend Developer",
            "company": "StartupXYZ",
            "description": "Backend developer for our core platform. Requirements: 3+ years with Node.js or Python, REST APIs and SQL databases. You will own microservices, API design and query optimisation. Redis, message queues and CI/CD a plus.",
            "url": "https://example.com/jobs/3",
            "location": "New York, NY",
            "tags": ["Python", "Node.js", "REST API", "SQL", "Redis"],
            "salary_min": 120000,
            "salary_max": 160000,
            "employment_type": "full-time",
            "experience_level": "mid"
        }),
        json!({
            "title": "Data Scientist",
            "company": "DataCo",
            "description": "Data scientist to turn large datasets into product decisions. Requirements: Python, SQL, statistics and machine learning. Daily tools include pandas, scikit-learn and Tableau. Build predictive models and user behaviour dashboards.",
            "url": "https://example.com/jobs/4",
            "location": "Boston, MA",
            "tags": ["Python", "SQL", "Machine Learning", "Statistics", "Pandas"],
            "salary_min": 130000,
            "salary_max": 180000,
            "employment_type": "full-time",
            "experience_level": "mid"
        }),
        json!({
            "title": "Full Stack Developer",
            "company": "WebDev Inc",
            "description": "Full stack developer for customer-facing web applications. Requirements: React, TypeScript, Node.js, PostgreSQL and AWS or GCP. Build responsive UIs and RESTful APIs and deploy them to the cloud. Next.js and GraphQL preferred.",
            "url": "https://example.com/jobs/5",
            "location": "Austin, TX",
            "tags": ["React", "TypeScript", "Node.js", "PostgreSQL", "AWS"],
            "salary_min": 110000,
            "salary_max": 150000,
            "employment_type": "full-time",
            "experience_level": "mid"
        }),
        json!({
            "title": "DevOps Engineer",
            "company": "CloudOps",
            "description": "DevOps engineer owning infrastructure and CI/CD. Requirements: Kubernetes, Docker, Terraform, AWS or Azure, and Python or Bash scripting. Automate deployments, run Prometheus and Grafana monitoring, and drive our GitOps rollout.",
            "url": "https://example.com/jobs/6",
            "location": "Seattle, WA",
            "tags": ["Kubernetes", "Docker", "Terraform", "AWS", "Python"],
            "salary_min": 140000,
            "salary_max": 190000,
            "employment_type": "full-time",
            "experience_level": "senior"
        }),
        json!({
            "title": "AI Research Scientist",
            "company": "Research Labs",
            "description": "Researcher working on novel learning algorithms. Requirements: PhD in CS or ML, publications at top venues, deep learning expertise. Research areas include LLMs, multimodal models and reinforcement learning, using PyTorch and JAX.",
            "url": "https://example.com/jobs/7",
            "location": "Palo Alto, CA",
            "tags": ["Deep Learning", "PyTorch", "Research", "NLP"],
            "salary_min": 200000,
            "salary_max": 300000,
            "employment_type": "full-time",
            "experience_level": "lead"
        }),
        json!({
            "title": "Frontend Developer",
            "company": "UX First",
            "description": "Frontend developer for fast, accessible web apps. Requirements: React, Vue or Angular, TypeScript, CSS and SASS, REST APIs. Build component libraries, tune web performance and own accessibility across the design system.",
            "url": "https://example.com/jobs/8",
            "location": "Los Angeles, CA",
            "tags": ["React", "TypeScript", "CSS", "REST API", "UI/UX"],
            "salary_min": 100000,
            "salary_max": 140000,
            "employment_type": "contract",
            "experience_level": "mid"
        }),
        json!({
            "title": "Database Administrator",
            "company": "Data Solutions",
            "description": "DBA for a fleet of production databases. Requirements: PostgreSQL, MySQL, performance tuning, backup and recovery. Monitor query performance, design schemas and run replication. Database security and capacity planning experience expected.",
            "url": "https://example.com/jobs/9",
            "location": "Chicago, IL",
            "tags": ["PostgreSQL", "MySQL", "SQL"],
            "salary_min": 110000,
            "salary_max": 150000,
            "employment_type": "full-time",
            "experience_level": "mid"
        }),
        json!({
            "title": "Software Engineering Intern",
            "company": "BigTech",
            "description": "Summer internship for computer science students. Requirements: Python or Java, data structures and algorithms. Ship real projects with mentorship from senior engineers. No prior industry experience required.",
            "url": "https://example.com/jobs/10",
            "location": "Mountain View, CA",
            "tags": ["Python", "Java"],
            "salary_min": 40000,
            "salary_max": 60000,
            "employment_type": "internship",
            "experience_level": "entry"
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::normalize::normalize;

    #[tokio::test]
    async fn test_mock_postings_normalize() {
        let records = MockJobSource.fetch().await.unwrap();
        assert_eq!(records.len(), 10);
        let jobs: Vec<_> = records
            .into_iter()
            .map(|r| normalize("mock", r).unwrap())
            .collect();
        let mut ids: Vec<&str> = jobs.iter().map(|j| j.job_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_feed_entries_shapes() {
        let array = json!([{"title": "a"}, {"title": "b"}]);
        assert_eq!(feed_entries(array).unwrap().len(), 2);

        let wrapped = json!({"jobs": [{"title": "a"}]});
        assert_eq!(feed_entries(wrapped).unwrap().len(), 1);

        assert!(feed_entries(json!({"items": 3})).is_err());
        assert!(feed_entries(json!("nope")).is_err());
    }

    #[test]
    fn test_feed_entries_capped() {
        let many = Value::Array((0..80).map(|i| json!({ "id": i })).collect());
        assert_eq!(feed_entries(many).unwrap().len(), MAX_FEED_ENTRIES);
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(SourceKind::parse("Mock", None).unwrap(), SourceKind::Mock);
        assert_eq!(
            SourceKind::parse("feed", Some("http://feed")).unwrap(),
            SourceKind::Feed {
                url: "http://feed".into()
            }
        );
        assert!(matches!(
            SourceKind::parse("feed", None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            SourceKind::parse("linkedin", None),
            Err(AppError::Validation(_))
        ));
        assert_eq!(SourceKind::default_for(None), SourceKind::Mock);
    }
}
