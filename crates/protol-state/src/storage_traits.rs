//! Storage contract for Protol
//!
//! `AgentStore` is the single capability the reputation engine depends on.
//! Two backends satisfy it:
//! - `MemoryAgentStore`: process-local maps, for embedded use and tests
//! - `SurrealAgentStore`: SurrealDB, embedded (`mem://`, `surrealkv://`) or
//!   remote over WebSocket
//!
//! The trait is async and backend-agnostic; callers hold it behind an `Arc`.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{
    ActionRecord, AgentCategory, AgentRecord, AgentStats, IncidentRecord, ReputationHistoryEntry,
    ReputationSnapshot,
};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Persistence for agents and the records scored against them.
///
/// Guarantees:
/// - Agents are never deleted.
/// - `get_actions` / `get_incidents` return records in the order they were
///   appended.
/// - `put_reputation` replaces the snapshot and stats together; readers never
///   observe one without the other.
/// - `update_agent` replaces descriptive fields only. The stored reputation
///   and stats survive an update untouched.
/// - Every per-agent read or write on an unknown id fails with
///   `StorageError::AgentNotFound`.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Insert a freshly registered agent. Fails with `DuplicateAgent` if the id is taken.
    async fn create_agent(&self, agent: AgentRecord) -> StorageResult<AgentRecord>;

    /// Fetch an agent profile by id.
    async fn get_agent(&self, agent_id: &str) -> StorageResult<AgentRecord>;

    /// Replace an agent's descriptive fields, returning the stored result.
    async fn update_agent(&self, agent: AgentRecord) -> StorageResult<AgentRecord>;

    /// Atomically swap in a new reputation snapshot and stats for an agent.
    async fn put_reputation(
        &self,
        agent_id: &str,
        reputation: ReputationSnapshot,
        stats: AgentStats,
    ) -> StorageResult<()>;

    /// List agents in registration order, optionally restricted to one category.
    async fn list_agents(&self, category: Option<AgentCategory>)
        -> StorageResult<Vec<AgentRecord>>;

    /// Append an action to its agent's history.
    async fn append_action(&self, action: ActionRecord) -> StorageResult<ActionRecord>;

    /// All actions recorded for an agent, oldest first.
    async fn get_actions(&self, agent_id: &str) -> StorageResult<Vec<ActionRecord>>;

    /// Attach a commissioner rating and optional feedback to a recorded action.
    async fn rate_action(
        &self,
        agent_id: &str,
        action_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) -> StorageResult<ActionRecord>;

    /// Append an incident to its agent's history.
    async fn append_incident(&self, incident: IncidentRecord) -> StorageResult<IncidentRecord>;

    /// All incidents reported against an agent, oldest first.
    async fn get_incidents(&self, agent_id: &str) -> StorageResult<Vec<IncidentRecord>>;

    /// Persist one history entry, keeping at most `retain` entries for the agent.
    async fn append_history(
        &self,
        agent_id: &str,
        entry: ReputationHistoryEntry,
        retain: usize,
    ) -> StorageResult<()>;

    /// Persisted history entries for an agent, newest first.
    async fn get_history(&self, agent_id: &str) -> StorageResult<Vec<ReputationHistoryEntry>>;

    /// Agents sharing `category`; the baseline set for efficiency scoring.
    async fn list_peers(&self, category: AgentCategory) -> StorageResult<Vec<AgentRecord>> {
        self.list_agents(Some(category)).await
    }
}
