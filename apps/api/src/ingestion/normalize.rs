//! Raw source records to `JobPosting`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::job::JobPosting;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record is not a valid posting: {0}")]
    Malformed(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("salary must not be negative")]
    NegativeSalary,
}

/// Lenient view of a source record. Common aliases from job boards and RSS
/// bridges (`link`, `summary`, `company_name`) are accepted.
#[derive(Debug, Deserialize)]
struct RawPosting {
    #[serde(default, alias = "external_id")]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "company_name")]
    company: Option<String>,
    #[serde(default, alias = "summary")]
    description: Option<String>,
    #[serde(default, alias = "link")]
    url: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    salary_min: Option<i64>,
    #[serde(default)]
    salary_max: Option<i64>,
    #[serde(default)]
    employment_type: Option<String>,
    #[serde(default)]
    experience_level: Option<String>,
}

pub fn normalize(source: &str, record: Value) -> Result<JobPosting, NormalizeError> {
    let raw: RawPosting =
        serde_json::from_value(record).map_err(|e| NormalizeError::Malformed(e.to_string()))?;

    let mut title = non_empty(raw.title).ok_or(NormalizeError::MissingField("title"))?;
    let mut company = non_empty(raw.company);
    // Feeds without a company field often use "Title - Company".
    if company.is_none() {
        if let Some((t, c)) = title.split_once(" - ") {
            let (t, c) = (t.trim().to_string(), c.trim().to_string());
            if !t.is_empty() && !c.is_empty() {
                title = t;
                company = Some(c);
            }
        }
    }
    let company = company.ok_or(NormalizeError::MissingField("company"))?;

    let description = non_empty(raw.description.map(|d| clean_description(&d)))
        .ok_or(NormalizeError::MissingField("description"))?;
    let url = non_empty(raw.url).unwrap_or_default();

    let (salary_min, salary_max) = match (raw.salary_min, raw.salary_max) {
        (Some(min), _) if min < 0 => return Err(NormalizeError::NegativeSalary),
        (_, Some(max)) if max < 0 => return Err(NormalizeError::NegativeSalary),
        (Some(min), Some(max)) if min > max => (Some(max), Some(min)),
        pair => pair,
    };

    let external_id = raw.id.as_ref().and_then(|id| match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut tags: Vec<String> = Vec::new();
    for tag in raw.tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    Ok(JobPosting {
        job_id: derive_job_id(source, external_id.as_deref(), &title, &company, &url),
        source: source.to_string(),
        content_hash: content_hash(&description),
        title,
        company,
        description,
        location: non_empty(raw.location),
        url,
        tags,
        salary_min,
        salary_max,
        employment_type: raw.employment_type.as_deref().and_then(normalize_employment_type),
        experience_level: raw.experience_level.as_deref().and_then(normalize_experience_level),
    })
}

/// Source-qualified stable id: the source's own id when it has one,
/// otherwise a hash of company, title, and url.
pub fn derive_job_id(
    source: &str,
    external_id: Option<&str>,
    title: &str,
    company: &str,
    url: &str,
) -> String {
    let key = match external_id {
        Some(id) => format!("{source}:{id}"),
        None => format!("{source}:{company}:{title}:{url}"),
    };
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    format!("{source}-{}", &digest[..16])
}

pub fn content_hash(description: &str) -> String {
    hex::encode(Sha256::digest(description.as_bytes()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Strips markup and collapses runs of whitespace within each line.
fn clean_description(raw: &str) -> String {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    let stripped = match TAGS.get_or_init(|| Regex::new(r"<[^>]+>").ok()) {
        Some(re) => re.replace_all(raw, " ").into_owned(),
        None => raw.to_string(),
    };
    stripped
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_employment_type(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase().replace(['_', ' '], "-");
    let canonical = match lowered.as_str() {
        "" => return None,
        "fulltime" | "full-time" | "permanent" => "full-time",
        "parttime" | "part-time" => "part-time",
        "contractor" | "contract" | "freelance" => "contract",
        "intern" | "internship" => "internship",
        "temp" | "temporary" => "temporary",
        other => other,
    };
    Some(canonical.to_string())
}

fn normalize_experience_level(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase().replace(['_', ' '], "-");
    let canonical = match lowered.as_str() {
        "" => return None,
        "entry" | "entry-level" | "junior" | "graduate" => "entry",
        "mid" | "mid-level" | "intermediate" => "mid",
        "senior" | "senior-level" | "sr" => "senior",
        "lead" | "principal" | "staff" => "lead",
        other => other,
    };
    Some(canonical.to_string())
}
