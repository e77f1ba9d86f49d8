//! The reputation engine.
//!
//! Owns the write path (register, record, rate, report) and the read path
//! (profile, reputation, history, listings, discovery) over an injected
//! [`AgentStore`].
//!
//! Writes that touch one agent's records run under that agent's async lock:
//! append, recompute and snapshot swap never interleave for the same agent.
//! Different agents proceed in parallel. The efficiency peer scan reads
//! other agents' actions without taking their locks, so a peer's in-flight
//! append may or may not be visible.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use protol_state::{
    ActionRecord, AgentCategory, AgentRecord, AgentStore, IncidentRecord, Owner,
    ReputationHistoryEntry, ReputationSnapshot,
};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, instrument, Instrument};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{
    ActionFilter, ActionRating, AgentUpdate, EcosystemStats, LeaderboardEntry, NewAction,
    NewAgent, NewIncident, Result, SearchPage, SearchQuery, SortBy,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::scoring::{self, efficiency, ScoringInput};

/// Default number of leaderboard entries.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 20;

/// `prefix` followed by eight random lowercase hex characters.
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &suffix[..8])
}

type LockTable = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

pub struct ReputationEngine {
    store: Arc<dyn AgentStore>,
    config: EngineConfig,
    agent_locks: LockTable,
}

/// Holds one agent's write lock. On drop the table entry is removed once
/// nobody else holds or waits on it, so the table only tracks agents with
/// writes in flight.
struct AgentLockGuard<'a> {
    table: &'a LockTable,
    agent_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AgentLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self
            .table
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if locks
            .get(&self.agent_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.agent_id);
        }
    }
}

impl ReputationEngine {
    pub fn new(store: Arc<dyn AgentStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            agent_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn lock_agent(&self, agent_id: &str) -> AgentLockGuard<'_> {
        // Declared before the lock handle so a cancelled wait still prunes.
        let mut held = AgentLockGuard {
            table: &self.agent_locks,
            agent_id: agent_id.to_string(),
            guard: None,
        };
        let lock = {
            let mut locks = self
                .agent_locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(agent_id.to_string()).or_default())
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Number of agents with a lock entry.
    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.agent_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn owner(&self) -> Owner {
        Owner {
            owner_id: self.config.owner_id.clone(),
            display_name: self.config.owner_display_name.clone(),
            verified: false,
        }
    }

    // -----------------------------------------------------------------------
    // Agents
    // -----------------------------------------------------------------------

    /// Register a new agent with the default reputation snapshot.
    #[instrument(skip(self, agent), fields(name = %agent.name))]
    pub async fn register_agent(&self, agent: NewAgent) -> Result<AgentRecord> {
        agent.validate()?;

        let record = agent.into_record(generate_id("agt_"), self.owner(), Utc::now());
        let created = self.store.create_agent(record).await?;

        obs::emit_agent_registered(&created.agent_id, created.category.as_str());
        Ok(created)
    }

    /// Patch descriptive fields. Reputation and stats are left alone; a
    /// category change takes effect as a peer set on the next recompute.
    pub async fn update_agent(&self, agent_id: &str, update: AgentUpdate) -> Result<AgentRecord> {
        update.validate()?;

        let _guard = self.lock_agent(agent_id).await;

        async {
            let mut agent = self.store.get_agent(agent_id).await?;
            update.apply(&mut agent);
            Ok(self.store.update_agent(agent).await?)
        }
        .instrument(obs::agent_span(agent_id, "update_agent"))
        .await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord> {
        Ok(self.store.get_agent(agent_id).await?)
    }

    pub async fn list_agents(&self, category: Option<AgentCategory>) -> Result<Vec<AgentRecord>> {
        Ok(self.store.list_agents(category).await?)
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Append an action and recompute the agent's reputation before returning.
    pub async fn record_action(&self, agent_id: &str, action: NewAction) -> Result<ActionRecord> {
        action.validate()?;

        let _guard = self.lock_agent(agent_id).await;

        async {
            let record = action.into_record(generate_id("act_"), agent_id.to_string(), Utc::now());
            let stored = self.store.append_action(record).await?;
            METRICS.inc_actions_recorded();
            obs::emit_action_recorded(agent_id, &stored.action_id, stored.status);

            self.recompute_locked(agent_id).await?;
            Ok(stored)
        }
        .instrument(obs::agent_span(agent_id, "record_action"))
        .await
    }

    /// File an incident and recompute the agent's reputation before returning.
    pub async fn report_incident(&self, incident: NewIncident) -> Result<IncidentRecord> {
        incident.validate()?;

        let agent_id = incident.agent_id.clone();
        let _guard = self.lock_agent(&agent_id).await;

        async {
            let record =
                incident.into_record(generate_id("inc_"), self.config.owner_id.clone(), Utc::now());
            let stored = self.store.append_incident(record).await?;
            METRICS.inc_incidents_reported();
            obs::emit_incident_reported(&agent_id, &stored.incident_id, stored.severity);

            self.recompute_locked(&agent_id).await?;
            Ok(stored)
        }
        .instrument(obs::agent_span(&agent_id, "report_incident"))
        .await
    }

    /// Attach a commissioner rating. Refreshes stats (`avg_rating`); the
    /// reputation snapshot is left as is.
    pub async fn rate_action(
        &self,
        agent_id: &str,
        action_id: &str,
        rating: ActionRating,
    ) -> Result<ActionRecord> {
        rating.validate()?;

        let _guard = self.lock_agent(agent_id).await;

        async {
            let rated = self
                .store
                .rate_action(agent_id, action_id, rating.rating, rating.feedback)
                .await?;

            let agent = self.store.get_agent(agent_id).await?;
            let actions = self.store.get_actions(agent_id).await?;
            let incidents = self.store.get_incidents(agent_id).await?;
            let stats = scoring::compute_stats(&actions, &incidents, agent.stats.active_since);
            self.store
                .put_reputation(agent_id, agent.reputation, stats)
                .await?;

            debug!(action_id, rating = rated.commissioner_rating, "action rated");
            Ok(rated)
        }
        .instrument(obs::agent_span(agent_id, "rate_action"))
        .await
    }

    /// Full recompute. Caller must hold the agent's lock.
    async fn recompute_locked(&self, agent_id: &str) -> Result<ReputationSnapshot> {
        let agent = self.store.get_agent(agent_id).await?;
        let actions = self.store.get_actions(agent_id).await?;
        let incidents = self.store.get_incidents(agent_id).await?;

        // The peer scan is only worth doing when the agent has costed work.
        let peers = if efficiency::mean_successful_cost(&actions).is_some() {
            self.peer_actions(&agent).await?
        } else {
            Vec::new()
        };

        let now = Utc::now();
        let snapshot = scoring::compute_snapshot(
            ScoringInput {
                actions: &actions,
                incidents: &incidents,
                peers: &peers,
                previous_overall: agent.reputation.overall_score,
            },
            now,
        );
        let stats = scoring::compute_stats(&actions, &incidents, agent.stats.active_since);
        let total_actions = stats.total_actions;

        self.store
            .put_reputation(agent_id, snapshot.clone(), stats)
            .await?;

        if self.config.history_limit > 0 {
            let entry = ReputationHistoryEntry::from_snapshot(&snapshot, total_actions);
            self.store
                .append_history(agent_id, entry, self.config.history_limit)
                .await?;
        }

        METRICS.inc_recomputes();
        obs::emit_reputation_recomputed(
            agent_id,
            snapshot.overall_score,
            snapshot.trust_tier,
            snapshot.trend,
            total_actions,
        );
        Ok(snapshot)
    }

    /// Action sets of every other agent in `agent`'s category.
    async fn peer_actions(&self, agent: &AgentRecord) -> Result<Vec<Vec<ActionRecord>>> {
        let peers = self.store.list_peers(agent.category).await?;
        let fetches = peers
            .iter()
            .filter(|peer| peer.agent_id != agent.agent_id)
            .map(|peer| self.store.get_actions(&peer.agent_id));
        let peer_actions = try_join_all(fetches).await?;
        debug!(peers = peer_actions.len(), category = %agent.category, "peer scan");
        Ok(peer_actions)
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    /// Current snapshot. Never recomputes.
    pub async fn get_reputation(&self, agent_id: &str) -> Result<ReputationSnapshot> {
        Ok(self.store.get_agent(agent_id).await?.reputation)
    }

    /// Persisted snapshots computed within the last `window_days`, newest
    /// first. Falls back to a single entry built from the current snapshot
    /// when nothing persisted falls inside the window.
    #[instrument(skip(self))]
    pub async fn reputation_history(
        &self,
        agent_id: &str,
        window_days: u32,
    ) -> Result<Vec<ReputationHistoryEntry>> {
        let agent = self.store.get_agent(agent_id).await?;
        let cutoff = Utc::now()
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let history: Vec<ReputationHistoryEntry> = self
            .store
            .get_history(agent_id)
            .await?
            .into_iter()
            .filter(|entry| entry.computed_at >= cutoff)
            .collect();

        if history.is_empty() {
            return Ok(vec![ReputationHistoryEntry::from_snapshot(
                &agent.reputation,
                agent.stats.total_actions,
            )]);
        }
        Ok(history)
    }

    pub async fn list_actions(
        &self,
        agent_id: &str,
        filter: &ActionFilter,
    ) -> Result<Vec<ActionRecord>> {
        let actions = self.store.get_actions(agent_id).await?;
        Ok(filter.apply(actions))
    }

    pub async fn list_incidents(&self, agent_id: &str) -> Result<Vec<IncidentRecord>> {
        Ok(self.store.get_incidents(agent_id).await?)
    }

    /// Agents of the same category; the efficiency baseline.
    pub async fn list_peers(&self, category: AgentCategory) -> Result<Vec<AgentRecord>> {
        Ok(self.store.list_peers(category).await?)
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    #[instrument(skip(self, query))]
    pub async fn search_agents(&self, query: &SearchQuery) -> Result<SearchPage> {
        query.validate()?;

        let mut agents: Vec<AgentRecord> = self
            .store
            .list_agents(query.category)
            .await?
            .into_iter()
            .filter(|agent| query.matches(agent))
            .collect();

        match query.sort_by {
            SortBy::Reputation => agents.sort_by(|a, b| {
                b.reputation
                    .overall_score
                    .total_cmp(&a.reputation.overall_score)
            }),
            SortBy::Actions => agents.sort_by(|a, b| b.stats.total_actions.cmp(&a.stats.total_actions)),
            SortBy::Newest => agents.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        let total = agents.len();
        let start = (query.page - 1).saturating_mul(query.per_page);
        let end = start.saturating_add(query.per_page);
        let page: Vec<AgentRecord> = agents
            .into_iter()
            .skip(start)
            .take(query.per_page)
            .collect();

        Ok(SearchPage {
            agents: page,
            total,
            page: query.page,
            per_page: query.per_page,
            has_more: end < total,
        })
    }

    /// Top agents by overall score, optionally within one category.
    pub async fn leaderboard(
        &self,
        category: Option<AgentCategory>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let mut agents = self.store.list_agents(category).await?;
        agents.sort_by(|a, b| {
            b.reputation
                .overall_score
                .total_cmp(&a.reputation.overall_score)
        });

        Ok(agents
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, agent)| LeaderboardEntry {
                rank: i + 1,
                agent_id: agent.agent_id,
                name: agent.name,
                category: agent.category,
                reputation_score: agent.reputation.overall_score,
                trust_tier: agent.reputation.trust_tier,
                total_actions: agent.stats.total_actions,
                owner: agent.owner,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn ecosystem_stats(&self) -> Result<EcosystemStats> {
        let agents = self.store.list_agents(None).await?;

        let action_sets =
            try_join_all(agents.iter().map(|a| self.store.get_actions(&a.agent_id))).await?;
        let incident_sets =
            try_join_all(agents.iter().map(|a| self.store.get_incidents(&a.agent_id))).await?;

        let now = Utc::now();
        let day_ago = now - Duration::hours(24);
        let week_ago = now - Duration::days(7);
        let actions = || action_sets.iter().flatten();

        let mut agents_by_category = BTreeMap::new();
        let mut agents_by_tier = BTreeMap::new();
        for agent in &agents {
            *agents_by_category.entry(agent.category).or_insert(0u64) += 1;
            *agents_by_tier
                .entry(agent.reputation.trust_tier)
                .or_insert(0u64) += 1;
        }

        let avg_reputation = if agents.is_empty() {
            0.0
        } else {
            agents
                .iter()
                .map(|a| a.reputation.overall_score)
                .sum::<f64>()
                / agents.len() as f64
        };

        Ok(EcosystemStats {
            total_agents: agents.len() as u64,
            total_actions: actions().count() as u64,
            total_incidents: incident_sets.iter().map(Vec::len).sum::<usize>() as u64,
            avg_reputation,
            agents_by_category,
            agents_by_tier,
            actions_last_24h: actions().filter(|a| a.recorded_at >= day_ago).count() as u64,
            actions_last_7d: actions().filter(|a| a.recorded_at >= week_ago).count() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid_agent_ids() {
        for _ in 0..50 {
            let id = generate_id("agt_");
            assert!(crate::domain::validate_agent_id(&id).is_ok(), "bad id {id}");
        }
        assert!(generate_id("act_").starts_with("act_"));
    }

    fn engine() -> ReputationEngine {
        ReputationEngine::new(
            Arc::new(protol_state::MemoryAgentStore::new()),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn unknown_ids_leave_no_lock_entries() {
        let engine = engine();

        for i in 0..200 {
            let err = engine
                .record_action(
                    &format!("agt_miss{i:04}"),
                    NewAction::new(protol_state::ActionStatus::Success),
                )
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        assert_eq!(engine.tracked_locks(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lock_entries_are_released_after_concurrent_writes() {
        let engine = Arc::new(engine());
        let agent = engine
            .register_agent(NewAgent::new(
                "Locked Agent",
                AgentCategory::General,
                vec!["search".to_string()],
            ))
            .await
            .unwrap();

        let writes = (0..16).map(|_| {
            let engine = Arc::clone(&engine);
            let agent_id = agent.agent_id.clone();
            tokio::spawn(async move {
                engine
                    .record_action(&agent_id, NewAction::new(protol_state::ActionStatus::Success))
                    .await
            })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        assert_eq!(engine.tracked_locks(), 0);
        let stored = engine.get_agent(&agent.agent_id).await.unwrap();
        assert_eq!(stored.stats.total_actions, 16);
    }
}
