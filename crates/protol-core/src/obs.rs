//! Structured observability hooks for the reputation engine.
//!
//! - `agent_span`: agent-scoped span, attached to engine futures with
//!   `tracing::Instrument`
//! - `emit_*`: one function per lifecycle event
//!
//! Events are emitted at `info!` (fallbacks at `warn!`) with an `event` field
//! naming the lifecycle step.

use protol_state::{ActionStatus, Severity, Trend, TrustTier};
use tracing::info;

/// Span tagging every log line of one agent operation with the agent id.
pub fn agent_span(agent_id: &str, operation: &'static str) -> tracing::Span {
    tracing::info_span!("protol.agent", agent_id = %agent_id, operation = operation)
}

pub fn emit_agent_registered(agent_id: &str, category: &str) {
    info!(event = "agent.registered", agent_id = %agent_id, category = %category);
}

pub fn emit_action_recorded(agent_id: &str, action_id: &str, status: ActionStatus) {
    info!(
        event = "action.recorded",
        agent_id = %agent_id,
        action_id = %action_id,
        status = %status,
    );
}

pub fn emit_incident_reported(agent_id: &str, incident_id: &str, severity: Severity) {
    info!(
        event = "incident.reported",
        agent_id = %agent_id,
        incident_id = %incident_id,
        severity = %severity,
    );
}

/// Emit event: a fresh snapshot replaced the previous one.
pub fn emit_reputation_recomputed(
    agent_id: &str,
    overall_score: f64,
    trust_tier: TrustTier,
    trend: Trend,
    total_actions: u64,
) {
    info!(
        event = "reputation.recomputed",
        agent_id = %agent_id,
        overall_score = overall_score,
        trust_tier = %trust_tier,
        trend = %trend,
        total_actions = total_actions,
    );
}

/// Emit event: a record call degraded to the stub response (warning level).
pub fn emit_record_fallback(agent_id: &str, reason: &dyn std::fmt::Display) {
    tracing::warn!(event = "action.record_fallback", agent_id = %agent_id, reason = %reason);
}
