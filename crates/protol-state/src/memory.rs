//! In-memory `AgentStore`
//!
//! Keeps every record in process-local maps behind one `RwLock`, so each
//! trait call observes and mutates a consistent state. Nothing survives the
//! process.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::*;
use crate::storage_traits::*;

#[derive(Debug, Default)]
struct MemoryState {
    agents: HashMap<String, AgentRecord>,
    /// Agent ids in registration order.
    order: Vec<String>,
    actions: HashMap<String, Vec<ActionRecord>>,
    incidents: HashMap<String, Vec<IncidentRecord>>,
    /// Newest last.
    history: HashMap<String, Vec<ReputationHistoryEntry>>,
}

impl MemoryState {
    fn require_agent(&self, agent_id: &str) -> StorageResult<()> {
        if self.agents.contains_key(agent_id) {
            Ok(())
        } else {
            Err(StorageError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
        }
    }
}

/// Process-local store backed by `HashMap`s.
#[derive(Debug, Default)]
pub struct MemoryAgentStore {
    state: RwLock<MemoryState>,
}

impl MemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AgentStore for MemoryAgentStore {
    async fn create_agent(&self, agent: AgentRecord) -> StorageResult<AgentRecord> {
        let mut state = self.write()?;
        if state.agents.contains_key(&agent.agent_id) {
            return Err(StorageError::DuplicateAgent {
                agent_id: agent.agent_id,
            });
        }
        state.order.push(agent.agent_id.clone());
        state.agents.insert(agent.agent_id.clone(), agent.clone());
        Ok(agent)
    }

    async fn get_agent(&self, agent_id: &str) -> StorageResult<AgentRecord> {
        let state = self.read()?;
        state
            .agents
            .get(agent_id)
            .cloned()
            .ok_or_else(|| StorageError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    async fn update_agent(&self, mut agent: AgentRecord) -> StorageResult<AgentRecord> {
        let mut state = self.write()?;
        let stored = state
            .agents
            .get_mut(&agent.agent_id)
            .ok_or_else(|| StorageError::AgentNotFound {
                agent_id: agent.agent_id.clone(),
            })?;
        agent.reputation = stored.reputation.clone();
        agent.stats = stored.stats.clone();
        *stored = agent.clone();
        Ok(agent)
    }

    async fn put_reputation(
        &self,
        agent_id: &str,
        reputation: ReputationSnapshot,
        stats: AgentStats,
    ) -> StorageResult<()> {
        let mut state = self.write()?;
        let stored = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| StorageError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;
        stored.reputation = reputation;
        stored.stats = stats;
        Ok(())
    }

    async fn list_agents(
        &self,
        category: Option<AgentCategory>,
    ) -> StorageResult<Vec<AgentRecord>> {
        let state = self.read()?;
        let agents = state
            .order
            .iter()
            .filter_map(|id| state.agents.get(id))
            .filter(|a| category.map(|c| a.category == c).unwrap_or(true))
            .cloned()
            .collect();
        Ok(agents)
    }

    async fn append_action(&self, action: ActionRecord) -> StorageResult<ActionRecord> {
        let mut state = self.write()?;
        state.require_agent(&action.agent_id)?;
        state
            .actions
            .entry(action.agent_id.clone())
            .or_default()
            .push(action.clone());
        Ok(action)
    }

    async fn get_actions(&self, agent_id: &str) -> StorageResult<Vec<ActionRecord>> {
        let state = self.read()?;
        state.require_agent(agent_id)?;
        Ok(state.actions.get(agent_id).cloned().unwrap_or_default())
    }

    async fn rate_action(
        &self,
        agent_id: &str,
        action_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) -> StorageResult<ActionRecord> {
        let mut state = self.write()?;
        state.require_agent(agent_id)?;
        let action = state
            .actions
            .get_mut(agent_id)
            .and_then(|actions| actions.iter_mut().find(|a| a.action_id == action_id))
            .ok_or_else(|| StorageError::ActionNotFound {
                agent_id: agent_id.to_string(),
                action_id: action_id.to_string(),
            })?;
        action.commissioner_rating = Some(rating);
        action.commissioner_feedback = feedback;
        Ok(action.clone())
    }

    async fn append_incident(&self, incident: IncidentRecord) -> StorageResult<IncidentRecord> {
        let mut state = self.write()?;
        state.require_agent(&incident.agent_id)?;
        state
            .incidents
            .entry(incident.agent_id.clone())
            .or_default()
            .push(incident.clone());
        Ok(incident)
    }

    async fn get_incidents(&self, agent_id: &str) -> StorageResult<Vec<IncidentRecord>> {
        let state = self.read()?;
        state.require_agent(agent_id)?;
        Ok(state.incidents.get(agent_id).cloned().unwrap_or_default())
    }

    async fn append_history(
        &self,
        agent_id: &str,
        entry: ReputationHistoryEntry,
        retain: usize,
    ) -> StorageResult<()> {
        let mut state = self.write()?;
        state.require_agent(agent_id)?;
        let history = state.history.entry(agent_id.to_string()).or_default();
        history.push(entry);
        if history.len() > retain {
            let excess = history.len() - retain;
            history.drain(..excess);
        }
        Ok(())
    }

    async fn get_history(&self, agent_id: &str) -> StorageResult<Vec<ReputationHistoryEntry>> {
        let state = self.read()?;
        state.require_agent(agent_id)?;
        let mut history = state.history.get(agent_id).cloned().unwrap_or_default();
        history.reverse(); // newest first
        Ok(history)
    }
}
