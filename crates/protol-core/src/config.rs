//! Engine configuration.

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_OWNER_ID: &str = "owner_local";
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_RECORD_TIMEOUT: Duration = Duration::from_millis(5000);

/// Settings for a [`ReputationEngine`](crate::ReputationEngine) and its
/// [`ActionRecorder`](crate::ActionRecorder).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Owner stamped on registered agents and filed incidents.
    pub owner_id: String,
    /// Display name for the owner block.
    pub owner_display_name: String,
    /// History entries kept per agent. `0` disables history persistence.
    pub history_limit: usize,
    /// How long the recorder waits before answering with a stub.
    pub record_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            owner_id: DEFAULT_OWNER_ID.to_string(),
            owner_display_name: "Local User".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            record_timeout: DEFAULT_RECORD_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Create from environment variables
    ///
    /// Reads:
    /// - PROTOL_OWNER_ID (default: "owner_local")
    /// - PROTOL_OWNER_NAME (default: "Local User")
    /// - PROTOL_HISTORY_LIMIT (default: 1000)
    /// - PROTOL_RECORD_TIMEOUT_MS (default: 5000)
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        EngineConfig {
            owner_id: std::env::var("PROTOL_OWNER_ID").unwrap_or(defaults.owner_id),
            owner_display_name: std::env::var("PROTOL_OWNER_NAME")
                .unwrap_or(defaults.owner_display_name),
            history_limit: parse_env("PROTOL_HISTORY_LIMIT").unwrap_or(defaults.history_limit),
            record_timeout: parse_env("PROTOL_RECORD_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.record_timeout),
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_record_timeout(mut self, timeout: Duration) -> Self {
        self.record_timeout = timeout;
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.owner_id, "owner_local");
        assert_eq!(config.history_limit, 1000);
        assert_eq!(config.record_timeout, Duration::from_secs(5));
    }

    #[test]
    fn builders_override() {
        let config = EngineConfig::default()
            .with_owner("owner_acme")
            .with_history_limit(0)
            .with_record_timeout(Duration::from_millis(250));
        assert_eq!(config.owner_id, "owner_acme");
        assert_eq!(config.history_limit, 0);
        assert_eq!(config.record_timeout, Duration::from_millis(250));
    }
}
