//! Record definitions persisted by every [`AgentStore`](crate::AgentStore) backend
//!
//! Records:
//! - `AgentRecord`: agent profile with its current reputation snapshot and stats
//! - `ActionRecord`: one unit of work logged by an agent
//! - `IncidentRecord`: a reported failure, scored by severity
//! - `ReputationHistoryEntry`: one persisted recompute result
//!
//! The closed vocabularies (category, status, severity, tier, ...) are plain
//! enums with a stable lowercase wire form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string did not name any variant of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}', must be one of: {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire form of the variant.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $label,
                        value: other.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Market segment an agent competes in; agents sharing a category are peers.
    AgentCategory, "category" {
        Research => "research",
        Coding => "coding",
        Writing => "writing",
        DataAnalysis => "data_analysis",
        CustomerSupport => "customer_support",
        Sales => "sales",
        Marketing => "marketing",
        Finance => "finance",
        Legal => "legal",
        Healthcare => "healthcare",
        Education => "education",
        Devops => "devops",
        Security => "security",
        General => "general",
    }
}

wire_enum! {
    AutonomyLevel, "autonomy_level" {
        Assisted => "assisted",
        Semi => "semi",
        Autonomous => "autonomous",
    }
}

wire_enum! {
    ActionType, "action_type" {
        TaskExecution => "task_execution",
        AgentHire => "agent_hire",
        ApiCall => "api_call",
        DataAccess => "data_access",
        Communication => "communication",
        Decision => "decision",
    }
}

wire_enum! {
    /// Outcome of an action. `Success` and `Partial` count as successful.
    ActionStatus, "status" {
        Running => "running",
        Success => "success",
        Partial => "partial",
        Failed => "failed",
        Timeout => "timeout",
        Error => "error",
    }
}

wire_enum! {
    ErrorType, "error_type" {
        Timeout => "timeout",
        Hallucination => "hallucination",
        ApiFailure => "api_failure",
        InputInvalid => "input_invalid",
        OutputInvalid => "output_invalid",
        SafetyViolation => "safety_violation",
        RateLimit => "rate_limit",
        AuthFailure => "auth_failure",
        Unknown => "unknown",
    }
}

wire_enum! {
    CommissionerType, "commissioner_type" {
        Agent => "agent",
        Human => "human",
    }
}

wire_enum! {
    Environment, "environment" {
        Production => "production",
        Staging => "staging",
        Development => "development",
        Test => "test",
    }
}

wire_enum! {
    IncidentType, "incident_type" {
        DataLeak => "data_leak",
        Hallucination => "hallucination",
        UnauthorizedAction => "unauthorized_action",
        FinancialError => "financial_error",
        Downtime => "downtime",
        SafetyViolation => "safety_violation",
        PromptInjection => "prompt_injection",
        PerformanceDegradation => "performance_degradation",
    }
}

wire_enum! {
    /// Incident severity, ordered from least to most severe.
    Severity, "severity" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

wire_enum! {
    IncidentStatus, "incident_status" {
        Open => "open",
        Investigating => "investigating",
        Resolved => "resolved",
        Dismissed => "dismissed",
    }
}

wire_enum! {
    /// Categorical trust label derived from the overall score, ordered low to high.
    TrustTier, "trust_tier" {
        Unverified => "Unverified",
        Bronze => "Bronze",
        Silver => "Silver",
        Gold => "Gold",
        Platinum => "Platinum",
    }
}

wire_enum! {
    Trend, "trend" {
        Improving => "improving",
        Stable => "stable",
        Declining => "declining",
    }
}

wire_enum! {
    AgentStatus, "agent_status" {
        Active => "active",
        Suspended => "suspended",
    }
}

wire_enum! {
    VerificationStatus, "verification" {
        Unverified => "unverified",
        Verified => "verified",
    }
}

impl Default for AgentCategory {
    fn default() -> Self {
        AgentCategory::General
    }
}

impl Default for AutonomyLevel {
    fn default() -> Self {
        AutonomyLevel::Semi
    }
}

impl Default for ActionType {
    fn default() -> Self {
        ActionType::TaskExecution
    }
}

impl Default for ActionStatus {
    fn default() -> Self {
        ActionStatus::Success
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Production
    }
}

impl ActionStatus {
    /// Whether the status counts toward the success rate.
    pub fn is_successful(&self) -> bool {
        matches!(self, ActionStatus::Success | ActionStatus::Partial)
    }
}

impl Severity {
    /// Penalty weight applied by the safety dimension.
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 7,
            Severity::Critical => 15,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub owner_id: String,
    pub display_name: String,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentArchitecture {
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub framework: Option<String>,
    pub hosting: Option<String>,
}

/// Per-dimension scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReputationBreakdown {
    pub reliability: f64,
    pub safety: f64,
    pub consistency: f64,
    pub efficiency: f64,
    pub transparency: f64,
}

/// Reputation state as of the most recent recompute.
///
/// A recompute builds a fresh snapshot and swaps it in whole; snapshots are
/// never edited field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub overall_score: f64,
    pub trust_tier: TrustTier,
    pub breakdown: ReputationBreakdown,
    pub trend: Trend,
    pub last_computed: DateTime<Utc>,
}

/// Aggregate activity counters kept beside the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total_actions: u64,
    /// Percentage of actions with a successful status, `0.0` when there are none.
    pub success_rate: f64,
    pub avg_rating: Option<f64>,
    pub total_earnings_usd: f64,
    pub active_since: DateTime<Utc>,
    pub last_active: Option<DateTime<Utc>>,
    pub incidents: u64,
}

impl AgentStats {
    /// Zeroed stats for an agent registered at `active_since`.
    pub fn empty(active_since: DateTime<Utc>) -> Self {
        Self {
            total_actions: 0,
            success_rate: 0.0,
            avg_rating: None,
            total_earnings_usd: 0.0,
            active_since,
            last_active: None,
            incidents: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: String,
    pub name: String,
    pub slug: String,
    pub owner: Owner,
    pub architecture: AgentArchitecture,
    pub capabilities: Vec<String>,
    pub category: AgentCategory,
    pub autonomy_level: AutonomyLevel,
    pub reputation: ReputationSnapshot,
    pub stats: AgentStats,
    pub status: AgentStatus,
    pub verification: VerificationStatus,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub max_spend_per_task: Option<f64>,
    pub can_hire_agents: bool,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A logged unit of work.
///
/// Immutable once appended, except for the commissioner rating and feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: String,
    pub agent_id: String,
    pub action_type: ActionType,
    pub task_category: Option<String>,
    pub description: Option<String>,
    pub commissioned_by: Option<String>,
    pub commissioner_type: Option<CommissionerType>,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub cost_usd: Option<f64>,
    pub payment_usd: Option<f64>,
    pub self_reported_confidence: Option<f64>,
    pub commissioner_rating: Option<u8>,
    pub commissioner_feedback: Option<String>,
    pub error_type: Option<ErrorType>,
    pub error_message: Option<String>,
    pub verified: bool,
    pub environment: Environment,
    pub recorded_at: DateTime<Utc>,
    pub input_hash: Option<String>,
    pub output_hash: Option<String>,
    pub input_size_bytes: Option<u64>,
    pub output_size_bytes: Option<u64>,
}

impl ActionRecord {
    pub fn is_successful(&self) -> bool {
        self.status.is_successful()
    }

    /// Cost of a successful action, if one was reported.
    pub fn successful_cost(&self) -> Option<f64> {
        if self.is_successful() {
            self.cost_usd
        } else {
            None
        }
    }

    /// How many provenance fields are set: output hash, input hash, confidence.
    pub fn provenance_signals(&self) -> u32 {
        [
            self.output_hash.is_some(),
            self.input_hash.is_some(),
            self.self_reported_confidence.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count() as u32
    }

    /// Completion time, falling back to the start time for unfinished work.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.started_at)
    }
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_id: String,
    pub agent_id: String,
    pub reported_by: String,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub evidence_url: Option<String>,
    pub financial_impact_usd: Option<f64>,
    pub users_affected: Option<u64>,
    pub status: IncidentStatus,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One persisted recompute result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationHistoryEntry {
    pub overall_score: f64,
    pub breakdown: ReputationBreakdown,
    pub trust_tier: TrustTier,
    /// Number of actions the agent had when this entry was computed.
    pub actions_in_window: u64,
    pub computed_at: DateTime<Utc>,
}

impl ReputationHistoryEntry {
    pub fn from_snapshot(snapshot: &ReputationSnapshot, total_actions: u64) -> Self {
        Self {
            overall_score: snapshot.overall_score,
            breakdown: snapshot.breakdown,
            trust_tier: snapshot.trust_tier,
            actions_in_window: total_actions,
            computed_at: snapshot.last_computed,
        }
    }
}
