//! SurrealDB schema initialization
//!
//! Defines the four Protol tables and their indexes. Safe to run on every
//! connection: `DEFINE ... IF NOT EXISTS` makes each statement idempotent.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all Protol tables in SurrealDB
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Protol SurrealDB schema");

    init_agents_table(db).await?;
    init_actions_table(db).await?;
    init_incidents_table(db).await?;
    init_history_table(db).await?;

    info!("Protol schema initialization complete");
    Ok(())
}

/// Initialize `agents` table
///
/// Schema:
/// ```text
/// TABLE agents {
///   agent_id:   STRING (unique)
///   category:   STRING (indexed, peer lookup)
///   seq:        INT (registration order)
///   created_at: DATETIME
///   profile:    OBJECT (full AgentRecord)
/// }
/// ```
async fn init_agents_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing agents table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS agents AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_agent_id ON TABLE agents COLUMNS agent_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_agent_category ON TABLE agents COLUMNS category;
        DEFINE INDEX IF NOT EXISTS idx_agent_seq ON TABLE agents COLUMNS seq;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ agents table initialized");
    Ok(())
}

/// Initialize `actions` table
///
/// Schema:
/// ```text
/// TABLE actions {
///   agent_id:  STRING (indexed)
///   action_id: STRING
///   seq:       INT (append order within the agent)
///   record:    OBJECT (full ActionRecord)
/// }
/// ```
///
/// Only `record.commissioner_rating` / `record.commissioner_feedback` are
/// ever updated after insert.
async fn init_actions_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing actions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS actions AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_action_agent_action ON TABLE actions COLUMNS agent_id, action_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_action_agent_seq ON TABLE actions COLUMNS agent_id, seq;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ actions table initialized");
    Ok(())
}

/// Initialize `incidents` table (append-only)
async fn init_incidents_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing incidents table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS incidents AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_incident_agent_seq ON TABLE incidents COLUMNS agent_id, seq;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ incidents table initialized");
    Ok(())
}

/// Initialize `reputation_history` table
///
/// Rows beyond the per-agent retention limit are pruned on append.
async fn init_history_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing reputation_history table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS reputation_history AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update NONE
                FOR delete FULL;

        DEFINE INDEX IF NOT EXISTS idx_history_agent_seq ON TABLE reputation_history COLUMNS agent_id, seq;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ reputation_history table initialized");
    Ok(())
}
