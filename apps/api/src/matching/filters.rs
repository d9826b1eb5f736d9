use serde::Deserialize;

use crate::errors::AppError;
use crate::vector_store::{CorpusFilter, JobPayload};

pub const EXPERIENCE_LEVELS: &[&str] = &["entry", "mid", "senior", "lead"];
pub const EMPLOYMENT_TYPES: &[&str] =
    &["full-time", "part-time", "contract", "internship", "temporary"];

/// Hard filters applied to candidates after retrieval.
///
/// Jobs without salary data never pass a `min_salary` filter, and jobs
/// without a location never pass a `location` filter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchFilters {
    #[serde(default)]
    pub min_salary: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
}

impl MatchFilters {
    /// Trims and lower-cases, drops blanks, rejects unknown enum values.
    pub fn validated(self) -> Result<Self, AppError> {
        if let Some(min) = self.min_salary {
            if min < 0 {
                return Err(AppError::Validation("min_salary must not be negative".into()));
            }
        }
        Ok(Self {
            min_salary: self.min_salary,
            location: blank_to_none(self.location),
            experience_level: known_value(
                "experience_level",
                self.experience_level,
                EXPERIENCE_LEVELS,
            )?,
            employment_type: known_value(
                "employment_type",
                self.employment_type,
                EMPLOYMENT_TYPES,
            )?,
        })
    }

    /// The exact-match part, pushed down to the store.
    pub fn corpus_filter(&self) -> CorpusFilter {
        CorpusFilter {
            experience_level: self.experience_level.clone(),
            employment_type: self.employment_type.clone(),
        }
    }

    pub fn accepts(&self, payload: &JobPayload) -> bool {
        if let Some(min) = self.min_salary {
            if payload.salary_max.map_or(true, |max| max < min) {
                return false;
            }
        }
        if let Some(wanted) = &self.location {
            let wanted = wanted.to_lowercase();
            let matches = payload
                .location
                .as_deref()
                .is_some_and(|loc| loc.to_lowercase().contains(&wanted));
            if !matches {
                return false;
            }
        }
        self.corpus_filter().matches(payload)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn known_value(
    field: &str,
    value: Option<String>,
    allowed: &[&str],
) -> Result<Option<String>, AppError> {
    let Some(value) = blank_to_none(value).map(|v| v.to_lowercase()) else {
        return Ok(None);
    };
    if allowed.contains(&value.as_str()) {
        Ok(Some(value))
    } else {
        Err(AppError::Validation(format!(
            "Unknown {field} '{value}', expected one of: {}",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_payload;

    #[test]
    fn test_validated_normalizes() {
        let filters = MatchFilters {
            min_salary: None,
            location: Some("  ".into()),
            experience_level: Some(" Senior ".into()),
            employment_type: Some("FULL-TIME".into()),
        }
        .validated()
        .unwrap();
        assert_eq!(filters.location, None);
        assert_eq!(filters.experience_level.as_deref(), Some("senior"));
        assert_eq!(filters.employment_type.as_deref(), Some("full-time"));
    }

    #[test]
    fn test_unknown_values_rejected() {
        let bad_level = MatchFilters {
            experience_level: Some("wizard".into()),
            ..Default::default()
        };
        assert!(matches!(bad_level.validated(), Err(AppError::Validation(_))));

        let bad_salary = MatchFilters {
            min_salary: Some(-5),
            ..Default::default()
        };
        assert!(matches!(bad_salary.validated(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_min_salary_excludes_missing_salary() {
        let filters = MatchFilters {
            min_salary: Some(100_000),
            ..Default::default()
        };
        let mut job = make_payload("a", "Python");
        assert!(!filters.accepts(&job));
        job.salary_max = Some(99_999);
        assert!(!filters.accepts(&job));
        job.salary_max = Some(100_000);
        assert!(filters.accepts(&job));
    }

    #[test]
    fn test_location_substring_case_insensitive() {
        let filters = MatchFilters {
            location: Some("francisco".into()),
            ..Default::default()
        };
        let mut job = make_payload("a", "Python");
        job.location = Some("San Francisco, CA".into());
        assert!(filters.accepts(&job));
        job.location = Some("Remote".into());
        assert!(!filters.accepts(&job));
        job.location = None;
        assert!(!filters.accepts(&job));
    }

    #[test]
    fn test_exact_match_fields() {
        let filters = MatchFilters {
            employment_type: Some("contract".into()),
            ..Default::default()
        };
        let mut job = make_payload("a", "Python");
        job.employment_type = Some("full-time".into());
        assert!(!filters.accepts(&job));
        job.employment_type = Some("contract".into());
        assert!(filters.accepts(&job));
    }
}
