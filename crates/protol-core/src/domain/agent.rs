//! Agent registration and profile updates.

use chrono::{DateTime, Utc};
use protol_state::{
    AgentArchitecture, AgentCategory, AgentRecord, AgentStats, AgentStatus, AutonomyLevel, Owner,
    VerificationStatus,
};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::validation::{
    check_amount, check_max_length, validate_agent_name, validate_capabilities,
    validate_source_url, validate_tags,
};
use crate::scoring;

/// Everything needed to register a new agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAgent {
    pub name: String,
    pub category: AgentCategory,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub architecture: AgentArchitecture,
    pub source_url: Option<String>,
    #[serde(default)]
    pub autonomy_level: AutonomyLevel,
    pub max_spend_per_task: Option<f64>,
    #[serde(default)]
    pub can_hire_agents: bool,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NewAgent {
    pub fn new(
        name: impl Into<String>,
        category: AgentCategory,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            capabilities,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_agent_name(&self.name)?;
        validate_capabilities(&self.capabilities)?;
        if let Some(url) = &self.source_url {
            validate_source_url(url)?;
        }
        check_amount("max_spend_per_task", self.max_spend_per_task)?;
        check_max_length("description", self.description.as_deref(), 500)?;
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    /// Build the stored profile: default reputation, zeroed stats.
    pub fn into_record(self, agent_id: String, owner: Owner, now: DateTime<Utc>) -> AgentRecord {
        AgentRecord {
            slug: slugify(&self.name),
            agent_id,
            name: self.name,
            owner,
            architecture: self.architecture,
            capabilities: self.capabilities,
            category: self.category,
            autonomy_level: self.autonomy_level,
            reputation: scoring::default_snapshot(now),
            stats: AgentStats::empty(now),
            status: AgentStatus::Active,
            verification: VerificationStatus::Unverified,
            description: self.description,
            tags: self.tags,
            max_spend_per_task: self.max_spend_per_task,
            can_hire_agents: self.can_hire_agents,
            source_url: self.source_url,
            created_at: now,
        }
    }
}

/// Lowercase, spaces replaced with hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Partial update of an agent's descriptive fields. `None` leaves a field as is.
///
/// Reputation and stats are not reachable from here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub category: Option<AgentCategory>,
    pub capabilities: Option<Vec<String>>,
    pub autonomy_level: Option<AutonomyLevel>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source_url: Option<String>,
    pub model_provider: Option<String>,
    pub model_name: Option<String>,
    pub framework: Option<String>,
    pub hosting: Option<String>,
    pub max_spend_per_task: Option<f64>,
    pub can_hire_agents: Option<bool>,
}

impl AgentUpdate {
    pub fn is_empty(&self) -> bool {
        *self == AgentUpdate::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_agent_name(name)?;
        }
        if let Some(capabilities) = &self.capabilities {
            validate_capabilities(capabilities)?;
        }
        if let Some(url) = &self.source_url {
            validate_source_url(url)?;
        }
        check_amount("max_spend_per_task", self.max_spend_per_task)?;
        check_max_length("description", self.description.as_deref(), 500)?;
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    /// Apply the set fields to `agent`. The slug is left untouched so links stay stable.
    pub fn apply(self, agent: &mut AgentRecord) {
        if let Some(name) = self.name {
            agent.name = name;
        }
        if let Some(category) = self.category {
            agent.category = category;
        }
        if let Some(capabilities) = self.capabilities {
            agent.capabilities = capabilities;
        }
        if let Some(level) = self.autonomy_level {
            agent.autonomy_level = level;
        }
        if let Some(description) = self.description {
            agent.description = Some(description);
        }
        if let Some(tags) = self.tags {
            agent.tags = Some(tags);
        }
        if let Some(url) = self.source_url {
            agent.source_url = Some(url);
        }
        if let Some(provider) = self.model_provider {
            agent.architecture.model_provider = Some(provider);
        }
        if let Some(model) = self.model_name {
            agent.architecture.model_name = Some(model);
        }
        if let Some(framework) = self.framework {
            agent.architecture.framework = Some(framework);
        }
        if let Some(hosting) = self.hosting {
            agent.architecture.hosting = Some(hosting);
        }
        if let Some(limit) = self.max_spend_per_task {
            agent.max_spend_per_task = Some(limit);
        }
        if let Some(can_hire) = self.can_hire_agents {
            agent.can_hire_agents = can_hire;
        }
    }
}
