//! Domain-level error taxonomy for Protol.

use protol_state::{ParseEnumError, StorageError};

/// Input rejected before it reaches the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be {min}-{max} characters, got {actual}")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{field} must contain {min}-{max} items, got {actual}")]
    Count {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} has an invalid format: {reason}")]
    Format { field: &'static str, reason: String },

    #[error("invalid agent id '{0}': expected 'agt_' followed by 6-12 alphanumeric characters")]
    AgentId(String),

    #[error(transparent)]
    Enum(#[from] ParseEnumError),
}

/// Protol domain errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtolError {
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("action {action_id} not found for agent {agent_id}")]
    ActionNotFound { agent_id: String, action_id: String },

    #[error("agent already exists: {0}")]
    AgentExists(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ProtolError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProtolError::AgentNotFound(_) | ProtolError::ActionNotFound { .. }
        )
    }
}

impl From<StorageError> for ProtolError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AgentNotFound { agent_id } => ProtolError::AgentNotFound(agent_id),
            StorageError::ActionNotFound {
                agent_id,
                action_id,
            } => ProtolError::ActionNotFound {
                agent_id,
                action_id,
            },
            StorageError::DuplicateAgent { agent_id } => ProtolError::AgentExists(agent_id),
            other => ProtolError::Storage(other.to_string()),
        }
    }
}

/// Result type for Protol domain operations.
pub type Result<T> = std::result::Result<T, ProtolError>;
