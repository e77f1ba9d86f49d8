//! Protol Core Library
//!
//! Reputation scoring engine for autonomous agents: registration, action
//! and incident recording, five-dimension scoring, history and discovery.

pub mod config;
pub mod domain;
pub mod engine;
pub mod metrics;
pub mod obs;
pub mod recorder;
pub mod scoring;
pub mod telemetry;

pub use config::EngineConfig;

pub use domain::{
    canonical_json, hash_bytes, hash_payload, payload_size, slugify, validate_agent_id,
    ActionFilter, ActionRating, AgentUpdate, EcosystemStats, LeaderboardEntry, NewAction,
    NewAgent, NewIncident, ProtolError, Result, SearchPage, SearchQuery, SortBy, ValidationError,
};

pub use engine::{generate_id, ReputationEngine, DEFAULT_LEADERBOARD_LIMIT};
pub use metrics::METRICS;
pub use recorder::{ActionRecorder, PendingAction, PENDING_ACTION_ID};
pub use scoring::{compute_snapshot, compute_stats, tier_for_score, trend_for, ScoringInput};
pub use telemetry::init_tracing;

pub use protol_state::{
    ActionRecord, ActionStatus, ActionType, AgentCategory, AgentRecord, AgentStats, AgentStore,
    AutonomyLevel, ErrorType, IncidentRecord, IncidentType, MemoryAgentStore,
    ReputationBreakdown, ReputationHistoryEntry, ReputationSnapshot, Severity,
    SurrealAgentStore, Trend, TrustTier,
};
