//! Error types for protol-state

use thiserror::Error;

/// Errors raised while connecting to or preparing a backing database
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}

/// Errors surfaced through the [`AgentStore`](crate::AgentStore) contract
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("agent not found: {agent_id}")]
    AgentNotFound { agent_id: String },

    #[error("action {action_id} not found for agent {agent_id}")]
    ActionNotFound { agent_id: String, action_id: String },

    #[error("agent already exists: {agent_id}")]
    DuplicateAgent { agent_id: String },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Whether this error reports a missing agent or action.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::AgentNotFound { .. } | StorageError::ActionNotFound { .. }
        )
    }
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}
