//! Field-level checks shared by the input types.
//!
//! Each check returns the first violation it finds; callers stop at the first
//! error.

use std::sync::OnceLock;

use regex::Regex;

use super::error::ValidationError;

fn pattern_matches(pattern: &'static OnceLock<Option<Regex>>, source: &str, value: &str) -> bool {
    pattern
        .get_or_init(|| Regex::new(source).ok())
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

static AGENT_ID: OnceLock<Option<Regex>> = OnceLock::new();
static AGENT_NAME: OnceLock<Option<Regex>> = OnceLock::new();

/// Agent ids are `agt_` followed by 6-12 ASCII alphanumerics.
pub fn validate_agent_id(agent_id: &str) -> Result<(), ValidationError> {
    if pattern_matches(&AGENT_ID, r"^agt_[a-zA-Z0-9]{6,12}$", agent_id) {
        Ok(())
    } else {
        Err(ValidationError::AgentId(agent_id.to_string()))
    }
}

pub fn validate_agent_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name, 3, 100)?;
    if !pattern_matches(&AGENT_NAME, r"^[a-zA-Z0-9][a-zA-Z0-9\-_ ]*$", name) {
        return Err(ValidationError::Format {
            field: "name",
            reason: "must start with an alphanumeric character and contain only \
                     alphanumerics, hyphens, underscores or spaces"
                .to_string(),
        });
    }
    Ok(())
}

pub fn validate_capabilities(capabilities: &[String]) -> Result<(), ValidationError> {
    check_count("capabilities", capabilities.len(), 1, 20)?;
    for capability in capabilities {
        check_length("capability", capability, 2, 50)?;
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    check_count("tags", tags.len(), 0, 10)
}

pub fn validate_source_url(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::Format {
            field: "source_url",
            reason: "must be an http:// or https:// URL".to_string(),
        })
    }
}

/// Length in characters (not bytes) within `[min, max]`.
pub fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Optional text no longer than `max` characters.
pub fn check_max_length(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) => check_length(field, v, 0, max),
        None => Ok(()),
    }
}

pub fn check_count(
    field: &'static str,
    actual: usize,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if actual < min || actual > max {
        return Err(ValidationError::Count {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Finite value within `[min, max]`. NaN is always rejected.
pub fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Non-negative finite amount (costs, payments, spend limits).
pub fn check_amount(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) => check_range(field, v, 0.0, f64::MAX),
        None => Ok(()),
    }
}
