//! Discovery queries: search, leaderboard, ecosystem totals.

use std::collections::BTreeMap;
use std::str::FromStr;

use protol_state::{AgentCategory, AgentRecord, Owner, TrustTier};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Sort order for agent search, always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Reputation,
    Actions,
    Newest,
}

impl FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reputation" => Ok(SortBy::Reputation),
            "actions" => Ok(SortBy::Actions),
            "newest" => Ok(SortBy::Newest),
            other => Err(ValidationError::Format {
                field: "sort_by",
                reason: format!("'{other}' is not one of: reputation, actions, newest"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub category: Option<AgentCategory>,
    pub min_reputation: Option<f64>,
    pub trust_tier: Option<TrustTier>,
    pub model_provider: Option<String>,
    /// Matches agents holding any of these capabilities.
    pub capabilities: Vec<String>,
    pub sort_by: SortBy,
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            category: None,
            min_reputation: None,
            trust_tier: None,
            model_provider: None,
            capabilities: Vec::new(),
            sort_by: SortBy::Reputation,
            page: 1,
            per_page: 20,
        }
    }
}

impl SearchQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::OutOfRange {
                field: "page",
                min: 1.0,
                max: f64::MAX,
                value: 0.0,
            });
        }
        if self.per_page == 0 {
            return Err(ValidationError::OutOfRange {
                field: "per_page",
                min: 1.0,
                max: f64::MAX,
                value: 0.0,
            });
        }
        Ok(())
    }

    pub fn matches(&self, agent: &AgentRecord) -> bool {
        if let Some(category) = self.category {
            if agent.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_reputation {
            if agent.reputation.overall_score < min {
                return false;
            }
        }
        if let Some(tier) = self.trust_tier {
            if agent.reputation.trust_tier != tier {
                return false;
            }
        }
        if let Some(provider) = &self.model_provider {
            if agent.architecture.model_provider.as_deref() != Some(provider.as_str()) {
                return false;
            }
        }
        if !self.capabilities.is_empty()
            && !self
                .capabilities
                .iter()
                .any(|c| agent.capabilities.contains(c))
        {
            return false;
        }
        true
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub agents: Vec<AgentRecord>,
    /// Matches across all pages.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub agent_id: String,
    pub name: String,
    pub category: AgentCategory,
    pub reputation_score: f64,
    pub trust_tier: TrustTier,
    pub total_actions: u64,
    pub owner: Owner,
}

/// Totals across every registered agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcosystemStats {
    pub total_agents: u64,
    pub total_actions: u64,
    pub total_incidents: u64,
    /// Mean overall score, `0.0` with no agents.
    pub avg_reputation: f64,
    pub agents_by_category: BTreeMap<AgentCategory, u64>,
    pub agents_by_tier: BTreeMap<TrustTier, u64>,
    pub actions_last_24h: u64,
    pub actions_last_7d: u64,
}
