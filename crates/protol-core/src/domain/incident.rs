//! Incident reports.

use chrono::{DateTime, Utc};
use protol_state::{IncidentRecord, IncidentStatus, IncidentType, Severity};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::validation::{check_amount, check_length, validate_source_url};

/// A failure report filed against an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    pub agent_id: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub evidence_url: Option<String>,
    pub financial_impact_usd: Option<f64>,
    pub users_affected: Option<u64>,
}

impl NewIncident {
    pub fn new(
        agent_id: impl Into<String>,
        incident_type: IncidentType,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            incident_type,
            severity,
            title: title.into(),
            description: description.into(),
            evidence_url: None,
            financial_impact_usd: None,
            users_affected: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("title", &self.title, 5, 255)?;
        check_length("description", &self.description, 10, 2000)?;
        if let Some(url) = &self.evidence_url {
            validate_source_url(url).map_err(|_| ValidationError::Format {
                field: "evidence_url",
                reason: "must be an http:// or https:// URL".to_string(),
            })?;
        }
        check_amount("financial_impact_usd", self.financial_impact_usd)?;
        Ok(())
    }

    /// New incidents are open and unverified.
    pub fn into_record(
        self,
        incident_id: String,
        reported_by: String,
        now: DateTime<Utc>,
    ) -> IncidentRecord {
        IncidentRecord {
            incident_id,
            agent_id: self.agent_id,
            reported_by,
            incident_type: self.incident_type,
            severity: self.severity,
            title: self.title,
            description: self.description,
            evidence_url: self.evidence_url,
            financial_impact_usd: self.financial_impact_usd,
            users_affected: self.users_affected,
            status: IncidentStatus::Open,
            verified: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> NewIncident {
        NewIncident::new(
            "agt_abcdef12",
            IncidentType::DataLeak,
            Severity::High,
            "Leaked API key",
            "Echoed a secret key back into a public channel",
        )
    }

    #[test]
    fn title_and_description_lengths() {
        assert!(report().validate().is_ok());

        let mut short_title = report();
        short_title.title = "Bad".to_string();
        assert!(matches!(
            short_title.validate(),
            Err(ValidationError::Length { field: "title", .. })
        ));

        let mut short_description = report();
        short_description.description = "too short".to_string();
        assert!(matches!(
            short_description.validate(),
            Err(ValidationError::Length { field: "description", .. })
        ));
    }

    #[test]
    fn record_starts_open() {
        let record = report().into_record("inc_1".into(), "owner_local".into(), Utc::now());
        assert_eq!(record.status, IncidentStatus::Open);
        assert!(!record.verified);
        assert_eq!(record.severity, Severity::High);
    }
}
