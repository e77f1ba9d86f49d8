//! SurrealDB-backed `AgentStore`
//!
//! Each table row wraps the full record under one field (`profile`,
//! `record`, `entry`) next to the flat columns the queries filter and sort
//! on. Ordering uses a per-store monotonic `seq`, so appends stay ordered even
//! when two land within the same clock tick.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::handle::{self, StoreConfig};
use crate::schema::*;
use crate::storage_traits::*;

/// Serializes chrono timestamps as native SurrealDB datetimes.
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbAgent {
    agent_id: String,
    category: String,
    seq: i64,
    #[serde(with = "surreal_datetime")]
    created_at: DateTime<Utc>,
    profile: AgentRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbAction {
    agent_id: String,
    action_id: String,
    seq: i64,
    record: ActionRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbIncident {
    agent_id: String,
    incident_id: String,
    seq: i64,
    record: IncidentRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbHistory {
    agent_id: String,
    seq: i64,
    #[serde(with = "surreal_datetime")]
    computed_at: DateTime<Utc>,
    entry: ReputationHistoryEntry,
}

#[derive(Debug, Deserialize)]
struct SeqRow {
    seq: i64,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    agent_id: String,
}

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// SurrealDB-backed implementation of [`AgentStore`].
pub struct SurrealAgentStore {
    db: Surreal<Any>,
    last_seq: AtomicI64,
}

impl SurrealAgentStore {
    fn from_db(db: Surreal<Any>) -> Self {
        Self {
            db,
            last_seq: AtomicI64::new(0),
        }
    }

    /// Create an in-memory instance, mainly for tests.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = handle::connect_url("mem://").await?;
        info!("SurrealAgentStore connected (in-memory)");
        Ok(Self::from_db(db))
    }

    /// Connect to any SurrealDB URL (`mem://`, `surrealkv://path`, `ws://host`).
    pub async fn connect_url(url: &str) -> crate::Result<Self> {
        let db = handle::connect_url(url).await?;
        info!("SurrealAgentStore connected ({})", url);
        Ok(Self::from_db(db))
    }

    /// Connect to an authenticated remote instance.
    pub async fn connect(config: &StoreConfig) -> crate::Result<Self> {
        let db = handle::connect_remote(config).await?;
        info!("SurrealAgentStore connected (remote {})", config.endpoint);
        Ok(Self::from_db(db))
    }

    /// Create from environment variables.
    ///
    /// Uses the chain documented on [`handle::connect_from_env`].
    pub async fn from_env() -> crate::Result<Self> {
        let db = handle::connect_from_env().await?;
        Ok(Self::from_db(db))
    }

    // -- private helpers -----------------------------------------------------

    /// Strictly increasing sequence number, seeded from the wall clock so
    /// that values keep growing across process restarts.
    fn next_seq(&self) -> i64 {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
        let prev = match self
            .last_seq
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(last.saturating_add(1).max(now))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        prev.saturating_add(1).max(now)
    }

    async fn fetch_agent(&self, agent_id: &str) -> StorageResult<DbAgent> {
        let id_owned = agent_id.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM agents WHERE agent_id = $id")
            .bind(("id", id_owned))
            .await
            .map_err(backend)?;

        let rows: Vec<DbAgent> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    async fn require_agent(&self, agent_id: &str) -> StorageResult<()> {
        let id_owned = agent_id.to_string();
        let mut res = self
            .db
            .query("SELECT agent_id FROM agents WHERE agent_id = $id")
            .bind(("id", id_owned))
            .await
            .map_err(backend)?;

        let rows: Vec<IdRow> = res.take(0).map_err(backend)?;
        if rows.is_empty() {
            return Err(StorageError::AgentNotFound {
                agent_id: agent_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AgentStore for SurrealAgentStore {
    #[instrument(skip(self, agent), fields(agent_id = %agent.agent_id))]
    async fn create_agent(&self, agent: AgentRecord) -> StorageResult<AgentRecord> {
        let row = DbAgent {
            agent_id: agent.agent_id.clone(),
            category: agent.category.as_str().to_string(),
            seq: self.next_seq(),
            created_at: agent.created_at,
            profile: agent.clone(),
        };

        // `idx_agent_id` is UNIQUE, so a racing insert of the same id fails here.
        let created: std::result::Result<Option<DbAgent>, surrealdb::Error> =
            self.db.create("agents").content(row).await;
        if let Err(err) = created {
            if self.require_agent(&agent.agent_id).await.is_ok() {
                return Err(StorageError::DuplicateAgent {
                    agent_id: agent.agent_id,
                });
            }
            return Err(backend(err));
        }

        debug!("agent stored");
        Ok(agent)
    }

    #[instrument(skip(self))]
    async fn get_agent(&self, agent_id: &str) -> StorageResult<AgentRecord> {
        Ok(self.fetch_agent(agent_id).await?.profile)
    }

    #[instrument(skip(self, agent), fields(agent_id = %agent.agent_id))]
    async fn update_agent(&self, mut agent: AgentRecord) -> StorageResult<AgentRecord> {
        let stored = self.fetch_agent(&agent.agent_id).await?;
        agent.reputation = stored.profile.reputation;
        agent.stats = stored.profile.stats;

        self.db
            .query("UPDATE agents SET profile = $profile, category = $category WHERE agent_id = $id")
            .bind(("profile", agent.clone()))
            .bind(("category", agent.category.as_str().to_string()))
            .bind(("id", agent.agent_id.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(agent)
    }

    #[instrument(skip(self, reputation, stats))]
    async fn put_reputation(
        &self,
        agent_id: &str,
        reputation: ReputationSnapshot,
        stats: AgentStats,
    ) -> StorageResult<()> {
        self.require_agent(agent_id).await?;

        // Single statement: snapshot and stats land together.
        self.db
            .query("UPDATE agents SET profile.reputation = $reputation, profile.stats = $stats WHERE agent_id = $id")
            .bind(("reputation", reputation))
            .bind(("stats", stats))
            .bind(("id", agent_id.to_string()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_agents(
        &self,
        category: Option<AgentCategory>,
    ) -> StorageResult<Vec<AgentRecord>> {
        let rows: Vec<DbAgent> = match category {
            Some(category) => {
                let mut res = self
                    .db
                    .query("SELECT * FROM agents WHERE category = $category ORDER BY seq ASC")
                    .bind(("category", category.as_str().to_string()))
                    .await
                    .map_err(backend)?;
                res.take(0).map_err(backend)?
            }
            None => {
                let mut res = self
                    .db
                    .query("SELECT * FROM agents ORDER BY seq ASC")
                    .await
                    .map_err(backend)?;
                res.take(0).map_err(backend)?
            }
        };

        Ok(rows.into_iter().map(|row| row.profile).collect())
    }

    #[instrument(skip(self, action), fields(agent_id = %action.agent_id, action_id = %action.action_id))]
    async fn append_action(&self, action: ActionRecord) -> StorageResult<ActionRecord> {
        self.require_agent(&action.agent_id).await?;

        let row = DbAction {
            agent_id: action.agent_id.clone(),
            action_id: action.action_id.clone(),
            seq: self.next_seq(),
            record: action.clone(),
        };

        let _created: Option<DbAction> = self
            .db
            .create("actions")
            .content(row)
            .await
            .map_err(backend)?;

        Ok(action)
    }

    #[instrument(skip(self))]
    async fn get_actions(&self, agent_id: &str) -> StorageResult<Vec<ActionRecord>> {
        self.require_agent(agent_id).await?;

        let mut res = self
            .db
            .query("SELECT * FROM actions WHERE agent_id = $id ORDER BY seq ASC")
            .bind(("id", agent_id.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbAction> = res.take(0).map_err(backend)?;
        debug!(count = rows.len(), "actions loaded");
        Ok(rows.into_iter().map(|row| row.record).collect())
    }

    #[instrument(skip(self, feedback))]
    async fn rate_action(
        &self,
        agent_id: &str,
        action_id: &str,
        rating: u8,
        feedback: Option<String>,
    ) -> StorageResult<ActionRecord> {
        self.require_agent(agent_id).await?;

        let mut res = self
            .db
            .query(
                "UPDATE actions SET record.commissioner_rating = $rating, \
                 record.commissioner_feedback = $feedback \
                 WHERE agent_id = $agent AND action_id = $action RETURN AFTER",
            )
            .bind(("rating", rating))
            .bind(("feedback", feedback))
            .bind(("agent", agent_id.to_string()))
            .bind(("action", action_id.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbAction> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .map(|row| row.record)
            .ok_or_else(|| StorageError::ActionNotFound {
                agent_id: agent_id.to_string(),
                action_id: action_id.to_string(),
            })
    }

    #[instrument(skip(self, incident), fields(agent_id = %incident.agent_id, incident_id = %incident.incident_id))]
    async fn append_incident(&self, incident: IncidentRecord) -> StorageResult<IncidentRecord> {
        self.require_agent(&incident.agent_id).await?;

        let row = DbIncident {
            agent_id: incident.agent_id.clone(),
            incident_id: incident.incident_id.clone(),
            seq: self.next_seq(),
            record: incident.clone(),
        };

        let _created: Option<DbIncident> = self
            .db
            .create("incidents")
            .content(row)
            .await
            .map_err(backend)?;

        Ok(incident)
    }

    #[instrument(skip(self))]
    async fn get_incidents(&self, agent_id: &str) -> StorageResult<Vec<IncidentRecord>> {
        self.require_agent(agent_id).await?;

        let mut res = self
            .db
            .query("SELECT * FROM incidents WHERE agent_id = $id ORDER BY seq ASC")
            .bind(("id", agent_id.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbIncident> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(|row| row.record).collect())
    }

    #[instrument(skip(self, entry))]
    async fn append_history(
        &self,
        agent_id: &str,
        entry: ReputationHistoryEntry,
        retain: usize,
    ) -> StorageResult<()> {
        self.require_agent(agent_id).await?;

        let row = DbHistory {
            agent_id: agent_id.to_string(),
            seq: self.next_seq(),
            computed_at: entry.computed_at,
            entry,
        };

        let _created: Option<DbHistory> = self
            .db
            .create("reputation_history")
            .content(row)
            .await
            .map_err(backend)?;

        let mut res = self
            .db
            .query("SELECT seq FROM reputation_history WHERE agent_id = $id ORDER BY seq DESC")
            .bind(("id", agent_id.to_string()))
            .await
            .map_err(backend)?;
        let seqs: Vec<SeqRow> = res.take(0).map_err(backend)?;

        if let Some(cutoff) = seqs.get(retain) {
            debug!(retain, total = seqs.len(), "pruning reputation history");
            self.db
                .query("DELETE reputation_history WHERE agent_id = $id AND seq <= $cutoff")
                .bind(("id", agent_id.to_string()))
                .bind(("cutoff", cutoff.seq))
                .await
                .map_err(backend)?
                .check()
                .map_err(backend)?;
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_history(&self, agent_id: &str) -> StorageResult<Vec<ReputationHistoryEntry>> {
        self.require_agent(agent_id).await?;

        let mut res = self
            .db
            .query("SELECT * FROM reputation_history WHERE agent_id = $id ORDER BY seq DESC")
            .bind(("id", agent_id.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbHistory> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(|row| row.entry).collect())
    }
}
