//! Action recording inputs and listing filters.

use chrono::{DateTime, Utc};
use protol_state::{ActionRecord, ActionStatus, ActionType, CommissionerType, Environment, ErrorType};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::validation::{check_amount, check_max_length, check_range};

/// Caller-supplied fields of a new action.
///
/// `started_at` / `completed_at` default to the recording time. When
/// `duration_ms` is missing it is derived from the two timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    #[serde(default)]
    pub action_type: ActionType,
    #[serde(default)]
    pub status: ActionStatus,
    pub task_category: Option<String>,
    pub description: Option<String>,
    pub commissioned_by: Option<String>,
    pub commissioner_type: Option<CommissionerType>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub cost_usd: Option<f64>,
    pub payment_usd: Option<f64>,
    pub self_reported_confidence: Option<f64>,
    pub error_type: Option<ErrorType>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    pub input_hash: Option<String>,
    pub output_hash: Option<String>,
    pub input_size_bytes: Option<u64>,
    pub output_size_bytes: Option<u64>,
}

impl NewAction {
    pub fn new(status: ActionStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = Some(cost_usd);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.self_reported_confidence = Some(confidence);
        self
    }

    pub fn with_task_category(mut self, category: impl Into<String>) -> Self {
        self.task_category = Some(category.into());
        self
    }

    pub fn with_hashes(mut self, input_hash: Option<String>, output_hash: Option<String>) -> Self {
        self.input_hash = input_hash;
        self.output_hash = output_hash;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(confidence) = self.self_reported_confidence {
            check_range("self_reported_confidence", confidence, 0.0, 1.0)?;
        }
        check_amount("cost_usd", self.cost_usd)?;
        check_amount("payment_usd", self.payment_usd)?;
        check_max_length("description", self.description.as_deref(), 500)?;
        check_max_length("error_message", self.error_message.as_deref(), 500)?;
        Ok(())
    }

    pub fn into_record(self, action_id: String, agent_id: String, now: DateTime<Utc>) -> ActionRecord {
        let started_at = self.started_at.unwrap_or(now);
        let completed_at = self.completed_at.unwrap_or(now);
        let duration_ms = self.duration_ms.or_else(|| {
            u64::try_from((completed_at - started_at).num_milliseconds()).ok()
        });

        ActionRecord {
            action_id,
            agent_id,
            action_type: self.action_type,
            task_category: self.task_category,
            description: self.description,
            commissioned_by: self.commissioned_by,
            commissioner_type: self.commissioner_type,
            status: self.status,
            started_at,
            completed_at: Some(completed_at),
            duration_ms,
            cost_usd: self.cost_usd,
            payment_usd: self.payment_usd,
            self_reported_confidence: self.self_reported_confidence,
            commissioner_rating: None,
            commissioner_feedback: None,
            error_type: self.error_type,
            error_message: self.error_message,
            verified: false,
            environment: self.environment,
            recorded_at: now,
            input_hash: self.input_hash,
            output_hash: self.output_hash,
            input_size_bytes: self.input_size_bytes,
            output_size_bytes: self.output_size_bytes,
        }
    }
}

/// Commissioner rating for a recorded action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRating {
    pub rating: u8,
    pub feedback: Option<String>,
}

impl ActionRating {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("rating", f64::from(self.rating), 1.0, 5.0)?;
        check_max_length("feedback", self.feedback.as_deref(), 500)
    }
}

/// Filters for listing an agent's actions, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFilter {
    pub status: Option<ActionStatus>,
    pub task_category: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ActionFilter {
    fn default() -> Self {
        Self {
            status: None,
            task_category: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl ActionFilter {
    pub fn apply(&self, actions: Vec<ActionRecord>) -> Vec<ActionRecord> {
        actions
            .into_iter()
            .filter(|a| self.status.map(|s| a.status == s).unwrap_or(true))
            .filter(|a| match &self.task_category {
                Some(category) => a.task_category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}
