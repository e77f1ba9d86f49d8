//! Non-blocking action recording for agent hot paths.
//!
//! [`ActionRecorder::record`] hands the write to a background task and waits
//! at most `record_timeout` for it. On timeout or failure the caller gets a
//! stub [`ActionRecord`] and carries on; a timed-out write keeps running and
//! still lands.
//!
//! [`PendingAction`] times one unit of work and fingerprints its payloads:
//!
//! ```ignore
//! let pending = PendingAction::start().with_input(&request);
//! let output = run_task(&request).await?;
//! recorder.record(agent_id, pending.success(&output)).await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use protol_state::{ActionRecord, ActionStatus, ErrorType};
use serde_json::Value;

use crate::domain::{hash_payload, payload_size, NewAction};
use crate::engine::ReputationEngine;
use crate::metrics::METRICS;
use crate::obs;

/// Action id carried by stub records.
pub const PENDING_ACTION_ID: &str = "act_pending";

#[derive(Clone)]
pub struct ActionRecorder {
    engine: Arc<ReputationEngine>,
    timeout: Duration,
}

impl ActionRecorder {
    /// Recorder using the engine's configured `record_timeout`.
    pub fn new(engine: Arc<ReputationEngine>) -> Self {
        let timeout = engine.config().record_timeout;
        Self { engine, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record `action` without ever failing the caller.
    pub async fn record(&self, agent_id: &str, action: NewAction) -> ActionRecord {
        let engine = Arc::clone(&self.engine);
        let owned_id = agent_id.to_string();
        let submitted = action.clone();

        let write = tokio::spawn(async move { engine.record_action(&owned_id, submitted).await });

        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(Ok(stored))) => stored,
            Ok(Ok(Err(err))) => self.fallback(agent_id, action, &err),
            Ok(Err(join_err)) => self.fallback(agent_id, action, &join_err),
            Err(_) => {
                let reason = format!("no response within {}ms", self.timeout.as_millis());
                self.fallback(agent_id, action, &reason)
            }
        }
    }

    fn fallback(
        &self,
        agent_id: &str,
        action: NewAction,
        reason: &dyn std::fmt::Display,
    ) -> ActionRecord {
        METRICS.inc_record_fallbacks();
        obs::emit_record_fallback(agent_id, reason);
        action.into_record(PENDING_ACTION_ID.to_string(), agent_id.to_string(), Utc::now())
    }
}

/// A unit of work being timed.
#[derive(Debug, Clone)]
pub struct PendingAction {
    started_at: DateTime<Utc>,
    input_hash: Option<String>,
    input_size_bytes: Option<u64>,
    task_category: Option<String>,
    cost_usd: Option<f64>,
}

impl PendingAction {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            input_hash: None,
            input_size_bytes: None,
            task_category: None,
            cost_usd: None,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Fingerprint the task input.
    pub fn with_input(mut self, input: &Value) -> Self {
        self.input_hash = Some(hash_payload(input));
        self.input_size_bytes = Some(payload_size(input));
        self
    }

    pub fn with_task_category(mut self, category: impl Into<String>) -> Self {
        self.task_category = Some(category.into());
        self
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = Some(cost_usd);
        self
    }

    pub fn success(self, output: &Value) -> NewAction {
        self.finish(ActionStatus::Success, Some(output))
    }

    pub fn partial(self, output: &Value) -> NewAction {
        self.finish(ActionStatus::Partial, Some(output))
    }

    pub fn fail(self, error_type: ErrorType, message: impl Into<String>) -> NewAction {
        let mut action = self.finish(ActionStatus::Failed, None);
        action.error_type = Some(error_type);
        action.error_message = Some(message.into());
        action
    }

    fn finish(self, status: ActionStatus, output: Option<&Value>) -> NewAction {
        let completed_at = Utc::now();
        let duration_ms = u64::try_from((completed_at - self.started_at).num_milliseconds()).ok();

        NewAction {
            status,
            task_category: self.task_category,
            started_at: Some(self.started_at),
            completed_at: Some(completed_at),
            duration_ms,
            cost_usd: self.cost_usd,
            input_hash: self.input_hash,
            input_size_bytes: self.input_size_bytes,
            output_hash: output.map(hash_payload),
            output_size_bytes: output.map(payload_size),
            ..NewAction::new(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_fingerprints_both_payloads() {
        let action = PendingAction::start()
            .with_input(&json!({"q": "rust"}))
            .with_task_category("search")
            .success(&json!("done"));

        assert_eq!(action.status, ActionStatus::Success);
        assert_eq!(action.input_hash, Some(hash_payload(&json!({"q": "rust"}))));
        assert_eq!(action.output_hash, Some(hash_payload(&json!("done"))));
        assert_eq!(action.output_size_bytes, Some(4));
        assert_eq!(action.task_category.as_deref(), Some("search"));
        assert!(action.duration_ms.is_some());
        assert!(action.validate().is_ok());
    }

    #[test]
    fn fail_carries_error_details_without_output() {
        let action = PendingAction::start().fail(ErrorType::Timeout, "upstream slow");

        assert_eq!(action.status, ActionStatus::Failed);
        assert_eq!(action.error_type, Some(ErrorType::Timeout));
        assert_eq!(action.error_message.as_deref(), Some("upstream slow"));
        assert!(action.output_hash.is_none());
        assert!(action.input_hash.is_none());
    }
}
