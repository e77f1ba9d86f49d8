//! Protol-State: record store for the Protol reputation engine
//!
//! Persists agent profiles, the actions and incidents scored against them,
//! and the history of reputation recomputes.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: durable, ordered records and atomic snapshot replacement.
//!
//! ## Key Components
//!
//! - `AgentStore`: the async storage contract the engine depends on
//! - `MemoryAgentStore`: process-local implementation
//! - `SurrealAgentStore`: SurrealDB implementation (embedded or remote)
//! - `StoreConfig`: remote connection settings, loadable from the environment

mod error;
mod handle;
pub mod memory;
pub mod migrations;
pub mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{
    connect_from_env, connect_remote, connect_url, StoreConfig, DEFAULT_DATABASE,
    DEFAULT_LOCAL_PATH, DEFAULT_NAMESPACE,
};
pub use memory::MemoryAgentStore;
pub use schema::{
    ActionRecord, ActionStatus, ActionType, AgentArchitecture, AgentCategory, AgentRecord,
    AgentStats, AgentStatus, AutonomyLevel, CommissionerType, Environment, ErrorType,
    IncidentRecord, IncidentStatus, IncidentType, Owner, ParseEnumError, ReputationBreakdown,
    ReputationHistoryEntry, ReputationSnapshot, Severity, Trend, TrustTier, VerificationStatus,
};
pub use storage_traits::{AgentStore, StorageResult};
pub use surreal_store::SurrealAgentStore;

/// Result type for protol-state connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
