//! Protol CLI
//!
//! The `protol` command drives the reputation engine against the configured
//! store (SurrealDB cloud, `SURREALDB_URL`, or a local surrealkv directory).
//!
//! ## Commands
//!
//! - `register` / `update` / `show`: manage agent profiles
//! - `log-action` / `rate` / `report-incident`: feed the scorer
//! - `reputation` / `history` / `actions` / `incidents`: inspect one agent
//! - `search` / `leaderboard` / `stats`: discovery across agents

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, Level};

use protol_core::{
    hash_payload, payload_size, validate_agent_id, ActionFilter, ActionRating, ActionStatus,
    ActionType, AgentCategory, AgentUpdate, AutonomyLevel, EngineConfig, ErrorType,
    IncidentType, NewAction, NewAgent, NewIncident, ReputationEngine, SearchQuery, Severity,
    SortBy, TrustTier, DEFAULT_LEADERBOARD_LIMIT,
};
use protol_state::{AgentArchitecture, CommissionerType, Environment, SurrealAgentStore};

#[derive(Parser)]
#[command(name = "protol")]
#[command(author = "Protol Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trust and reputation scoring for autonomous agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print command results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "PROTOL_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new agent
    Register {
        /// Display name (3-100 characters)
        name: String,

        #[arg(short, long, default_value = "general")]
        category: AgentCategory,

        /// Capability tag; repeat for several
        #[arg(long = "capability", required = true)]
        capabilities: Vec<String>,

        #[arg(long, default_value = "semi")]
        autonomy: AutonomyLevel,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Update an agent's profile; reputation is untouched
    Update {
        agent_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        category: Option<AgentCategory>,

        /// Replaces the capability list
        #[arg(long = "capability")]
        capabilities: Vec<String>,

        #[arg(long)]
        autonomy: Option<AutonomyLevel>,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Record an action and recompute the agent's reputation
    LogAction(LogActionArgs),

    /// Rate a recorded action (1-5)
    Rate {
        agent_id: String,
        action_id: String,

        #[arg(short, long)]
        rating: u8,

        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Report an incident against an agent
    ReportIncident {
        agent_id: String,

        #[arg(long = "type")]
        incident_type: IncidentType,

        #[arg(short, long)]
        severity: Severity,

        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(long)]
        evidence_url: Option<String>,

        #[arg(long)]
        financial_impact: Option<f64>,

        #[arg(long)]
        users_affected: Option<u64>,
    },

    /// Show an agent profile
    Show { agent_id: String },

    /// Show an agent's current reputation snapshot
    Reputation { agent_id: String },

    /// Show reputation history, newest first
    History {
        agent_id: String,

        /// Window in days
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// List an agent's actions, oldest first
    Actions {
        agent_id: String,

        #[arg(short, long)]
        status: Option<ActionStatus>,

        #[arg(long)]
        task_category: Option<String>,

        #[arg(short, long, default_value = "50")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// List incidents reported against an agent
    Incidents { agent_id: String },

    /// Search agents
    Search {
        #[arg(short, long)]
        category: Option<AgentCategory>,

        #[arg(long)]
        min_reputation: Option<f64>,

        #[arg(long)]
        tier: Option<TrustTier>,

        #[arg(long)]
        model_provider: Option<String>,

        /// Match agents holding any of these capabilities
        #[arg(long = "capability")]
        capabilities: Vec<String>,

        #[arg(long, default_value = "reputation")]
        sort_by: SortBy,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "20")]
        per_page: usize,
    },

    /// Top agents by overall score
    Leaderboard {
        #[arg(short, long)]
        category: Option<AgentCategory>,

        #[arg(short, long, default_value_t = DEFAULT_LEADERBOARD_LIMIT)]
        limit: usize,
    },

    /// Ecosystem-wide totals
    Stats,
}

/// Optional profile fields shared by `register` and `update`.
#[derive(Args, Default)]
struct ProfileArgs {
    #[arg(long)]
    description: Option<String>,

    /// Tag; repeat for several
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long)]
    source_url: Option<String>,

    #[arg(long)]
    model_provider: Option<String>,

    #[arg(long)]
    model_name: Option<String>,

    #[arg(long)]
    framework: Option<String>,

    #[arg(long)]
    hosting: Option<String>,

    #[arg(long)]
    max_spend: Option<f64>,

    #[arg(long)]
    can_hire: Option<bool>,
}

#[derive(Args, Default)]
struct LogActionArgs {
    agent_id: String,

    #[arg(short, long, default_value = "success")]
    status: ActionStatus,

    #[arg(long, default_value = "task_execution")]
    action_type: ActionType,

    #[arg(long)]
    task_category: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    commissioned_by: Option<String>,

    #[arg(long)]
    commissioner_type: Option<CommissionerType>,

    #[arg(long)]
    duration_ms: Option<u64>,

    #[arg(long)]
    cost: Option<f64>,

    #[arg(long)]
    payment: Option<f64>,

    /// Self-reported confidence in [0, 1]
    #[arg(long)]
    confidence: Option<f64>,

    #[arg(long)]
    error_type: Option<ErrorType>,

    #[arg(long)]
    error_message: Option<String>,

    #[arg(long, default_value = "production")]
    environment: Environment,

    /// Task input (JSON, or plain text); only its digest and size are stored
    #[arg(long)]
    input: Option<String>,

    /// Task output (JSON, or plain text); only its digest and size are stored
    #[arg(long)]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    protol_core::init_tracing(cli.log_json, level);

    // Initialize database connection
    let store = SurrealAgentStore::from_env()
        .await
        .context("Failed to connect to Protol database")?;
    let engine = ReputationEngine::new(Arc::new(store), EngineConfig::from_env());
    let json = cli.json;

    match cli.command {
        Commands::Register {
            name,
            category,
            capabilities,
            autonomy,
            profile,
        } => cmd_register(&engine, name, category, capabilities, autonomy, profile, json).await,
        Commands::Update {
            agent_id,
            name,
            category,
            capabilities,
            autonomy,
            profile,
        } => {
            let update = build_update(name, category, capabilities, autonomy, profile);
            cmd_update(&engine, &agent_id, update, json).await
        }
        Commands::LogAction(args) => cmd_log_action(&engine, args, json).await,
        Commands::Rate {
            agent_id,
            action_id,
            rating,
            feedback,
        } => cmd_rate(&engine, &agent_id, &action_id, rating, feedback, json).await,
        Commands::ReportIncident {
            agent_id,
            incident_type,
            severity,
            title,
            description,
            evidence_url,
            financial_impact,
            users_affected,
        } => {
            check_agent_id(&agent_id)?;
            let incident = NewIncident {
                evidence_url,
                financial_impact_usd: financial_impact,
                users_affected,
                ..NewIncident::new(agent_id, incident_type, severity, title, description)
            };
            cmd_report_incident(&engine, incident, json).await
        }
        Commands::Show { agent_id } => cmd_show(&engine, &agent_id, json).await,
        Commands::Reputation { agent_id } => cmd_reputation(&engine, &agent_id, json).await,
        Commands::History { agent_id, days } => cmd_history(&engine, &agent_id, days, json).await,
        Commands::Actions {
            agent_id,
            status,
            task_category,
            limit,
            offset,
        } => {
            let filter = ActionFilter {
                status,
                task_category,
                limit,
                offset,
            };
            cmd_actions(&engine, &agent_id, &filter, json).await
        }
        Commands::Incidents { agent_id } => cmd_incidents(&engine, &agent_id, json).await,
        Commands::Search {
            category,
            min_reputation,
            tier,
            model_provider,
            capabilities,
            sort_by,
            page,
            per_page,
        } => {
            let query = SearchQuery {
                category,
                min_reputation,
                trust_tier: tier,
                model_provider,
                capabilities,
                sort_by,
                page,
                per_page,
            };
            cmd_search(&engine, &query, json).await
        }
        Commands::Leaderboard { category, limit } => {
            cmd_leaderboard(&engine, category, limit, json).await
        }
        Commands::Stats => cmd_stats(&engine, json).await,
    }
}

fn check_agent_id(agent_id: &str) -> Result<()> {
    validate_agent_id(agent_id).with_context(|| format!("Invalid agent id '{}'", agent_id))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `raw` as JSON, falling back to a plain string payload.
fn parse_payload(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn build_update(
    name: Option<String>,
    category: Option<AgentCategory>,
    capabilities: Vec<String>,
    autonomy: Option<AutonomyLevel>,
    profile: ProfileArgs,
) -> AgentUpdate {
    AgentUpdate {
        name,
        category,
        capabilities: (!capabilities.is_empty()).then_some(capabilities),
        autonomy_level: autonomy,
        description: profile.description,
        tags: (!profile.tags.is_empty()).then_some(profile.tags),
        source_url: profile.source_url,
        model_provider: profile.model_provider,
        model_name: profile.model_name,
        framework: profile.framework,
        hosting: profile.hosting,
        max_spend_per_task: profile.max_spend,
        can_hire_agents: profile.can_hire,
    }
}

fn build_action(args: LogActionArgs) -> NewAction {
    let input = args.input.as_deref().map(parse_payload);
    let output = args.output.as_deref().map(parse_payload);

    NewAction {
        action_type: args.action_type,
        status: args.status,
        task_category: args.task_category,
        description: args.description,
        commissioned_by: args.commissioned_by,
        commissioner_type: args.commissioner_type,
        duration_ms: args.duration_ms,
        cost_usd: args.cost,
        payment_usd: args.payment,
        self_reported_confidence: args.confidence,
        error_type: args.error_type,
        error_message: args.error_message,
        environment: args.environment,
        input_hash: input.as_ref().map(hash_payload),
        output_hash: output.as_ref().map(hash_payload),
        input_size_bytes: input.as_ref().map(payload_size),
        output_size_bytes: output.as_ref().map(payload_size),
        ..NewAction::default()
    }
}

// ========== Agent Commands ==========

/// Register a new agent
async fn cmd_register(
    engine: &ReputationEngine,
    name: String,
    category: AgentCategory,
    capabilities: Vec<String>,
    autonomy: AutonomyLevel,
    profile: ProfileArgs,
    json: bool,
) -> Result<()> {
    let agent = NewAgent {
        architecture: AgentArchitecture {
            model_provider: profile.model_provider,
            model_name: profile.model_name,
            framework: profile.framework,
            hosting: profile.hosting,
        },
        autonomy_level: autonomy,
        source_url: profile.source_url,
        max_spend_per_task: profile.max_spend,
        can_hire_agents: profile.can_hire.unwrap_or(false),
        description: profile.description,
        tags: (!profile.tags.is_empty()).then_some(profile.tags),
        ..NewAgent::new(name, category, capabilities)
    };

    let record = engine
        .register_agent(agent)
        .await
        .context("Failed to register agent")?;

    if json {
        return print_json(&record);
    }
    println!("Registered {} ({})", record.name, record.agent_id);
    println!("  Category: {}", record.category);
    println!(
        "  Reputation: {:.2} [{}]",
        record.reputation.overall_score, record.reputation.trust_tier
    );
    Ok(())
}

/// Update an agent profile
async fn cmd_update(
    engine: &ReputationEngine,
    agent_id: &str,
    update: AgentUpdate,
    json: bool,
) -> Result<()> {
    check_agent_id(agent_id)?;
    if update.is_empty() {
        bail!("Nothing to update: pass at least one field");
    }

    let record = engine
        .update_agent(agent_id, update)
        .await
        .context(format!("Failed to update agent '{}'", agent_id))?;

    if json {
        return print_json(&record);
    }
    println!("Updated {} ({})", record.name, record.agent_id);
    Ok(())
}

/// Show an agent profile
async fn cmd_show(engine: &ReputationEngine, agent_id: &str, json: bool) -> Result<()> {
    check_agent_id(agent_id)?;
    let agent = engine.get_agent(agent_id).await?;

    if json {
        return print_json(&agent);
    }
    println!("{} ({})", agent.name, agent.agent_id);
    println!("Owner:        {}", agent.owner.display_name);
    println!("Category:     {}", agent.category);
    println!("Autonomy:     {}", agent.autonomy_level);
    println!("Capabilities: {}", agent.capabilities.join(", "));
    if let Some(description) = &agent.description {
        println!("Description:  {}", description);
    }
    println!(
        "Reputation:   {:.2} [{}] {}",
        agent.reputation.overall_score, agent.reputation.trust_tier, agent.reputation.trend
    );
    println!(
        "Actions:      {} ({:.1}% success)",
        agent.stats.total_actions, agent.stats.success_rate
    );
    if let Some(rating) = agent.stats.avg_rating {
        println!("Avg rating:   {:.2}", rating);
    }
    println!("Incidents:    {}", agent.stats.incidents);
    println!(
        "Registered:   {}",
        agent.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

// ========== Recording Commands ==========

/// Record an action
async fn cmd_log_action(engine: &ReputationEngine, args: LogActionArgs, json: bool) -> Result<()> {
    check_agent_id(&args.agent_id)?;
    let agent_id = args.agent_id.clone();
    let action = build_action(args);

    let record = engine
        .record_action(&agent_id, action)
        .await
        .context("Failed to record action")?;
    let reputation = engine.get_reputation(&agent_id).await?;
    debug!(action_id = %record.action_id, "action logged");

    if json {
        return print_json(&serde_json::json!({
            "action": record,
            "reputation": reputation,
        }));
    }
    println!("Recorded {} [{}]", record.action_id, record.status);
    println!(
        "Reputation now {:.2} [{}] {}",
        reputation.overall_score, reputation.trust_tier, reputation.trend
    );
    Ok(())
}

/// Rate a recorded action
async fn cmd_rate(
    engine: &ReputationEngine,
    agent_id: &str,
    action_id: &str,
    rating: u8,
    feedback: Option<String>,
    json: bool,
) -> Result<()> {
    check_agent_id(agent_id)?;
    let record = engine
        .rate_action(agent_id, action_id, ActionRating { rating, feedback })
        .await
        .context(format!("Failed to rate action '{}'", action_id))?;

    if json {
        return print_json(&record);
    }
    println!("Rated {} {}/5", record.action_id, rating);
    Ok(())
}

/// Report an incident
async fn cmd_report_incident(
    engine: &ReputationEngine,
    incident: NewIncident,
    json: bool,
) -> Result<()> {
    let agent_id = incident.agent_id.clone();
    let record = engine
        .report_incident(incident)
        .await
        .context("Failed to report incident")?;
    let reputation = engine.get_reputation(&agent_id).await?;

    if json {
        return print_json(&serde_json::json!({
            "incident": record,
            "reputation": reputation,
        }));
    }
    println!(
        "Reported {} [{} / {}]",
        record.incident_id, record.incident_type, record.severity
    );
    println!(
        "Reputation now {:.2} [{}] {}",
        reputation.overall_score, reputation.trust_tier, reputation.trend
    );
    Ok(())
}

// ========== Inspection Commands ==========

/// Show the current reputation snapshot
async fn cmd_reputation(engine: &ReputationEngine, agent_id: &str, json: bool) -> Result<()> {
    check_agent_id(agent_id)?;
    let rep = engine.get_reputation(agent_id).await?;

    if json {
        return print_json(&rep);
    }
    println!(
        "Overall:      {:.2} [{}] {}",
        rep.overall_score, rep.trust_tier, rep.trend
    );
    println!("Reliability:  {:.2}", rep.breakdown.reliability);
    println!("Safety:       {:.2}", rep.breakdown.safety);
    println!("Consistency:  {:.2}", rep.breakdown.consistency);
    println!("Efficiency:   {:.2}", rep.breakdown.efficiency);
    println!("Transparency: {:.2}", rep.breakdown.transparency);
    println!(
        "Computed:     {}",
        rep.last_computed.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

/// Show reputation history
async fn cmd_history(
    engine: &ReputationEngine,
    agent_id: &str,
    days: u32,
    json: bool,
) -> Result<()> {
    check_agent_id(agent_id)?;
    let history = engine.reputation_history(agent_id, days).await?;

    if json {
        return print_json(&history);
    }
    for entry in history {
        println!(
            "{} {:>6.2} {:<10} actions={}",
            entry.computed_at.to_rfc3339(),
            entry.overall_score,
            entry.trust_tier,
            entry.actions_in_window
        );
    }
    Ok(())
}

/// List actions
async fn cmd_actions(
    engine: &ReputationEngine,
    agent_id: &str,
    filter: &ActionFilter,
    json: bool,
) -> Result<()> {
    check_agent_id(agent_id)?;
    let actions = engine.list_actions(agent_id, filter).await?;

    if json {
        return print_json(&actions);
    }
    if actions.is_empty() {
        println!("No actions found for {}", agent_id);
        return Ok(());
    }
    for action in actions {
        let cost = action
            .cost_usd
            .map(|c| format!("${:.4}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {} {:<8} {:>10} {}",
            action.action_id,
            action.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            action.status,
            cost,
            action.task_category.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// List incidents
async fn cmd_incidents(engine: &ReputationEngine, agent_id: &str, json: bool) -> Result<()> {
    check_agent_id(agent_id)?;
    let incidents = engine.list_incidents(agent_id).await?;

    if json {
        return print_json(&incidents);
    }
    if incidents.is_empty() {
        println!("No incidents reported for {}", agent_id);
        return Ok(());
    }
    for incident in incidents {
        println!(
            "{} {} {:<8} {:<10} {}",
            incident.incident_id,
            incident.created_at.format("%Y-%m-%d %H:%M:%S"),
            incident.severity,
            incident.status,
            incident.title
        );
    }
    Ok(())
}

// ========== Discovery Commands ==========

/// Search agents
async fn cmd_search(engine: &ReputationEngine, query: &SearchQuery, json: bool) -> Result<()> {
    let page = engine.search_agents(query).await?;

    if json {
        return print_json(&page);
    }
    println!(
        "{} match(es), page {} ({} per page)",
        page.total, page.page, page.per_page
    );
    for agent in &page.agents {
        println!(
            "  {} {:<30} {:>6.2} [{}]",
            agent.agent_id, agent.name, agent.reputation.overall_score, agent.reputation.trust_tier
        );
    }
    if page.has_more {
        println!("More results: --page {}", page.page + 1);
    }
    Ok(())
}

/// Show the leaderboard
async fn cmd_leaderboard(
    engine: &ReputationEngine,
    category: Option<AgentCategory>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let board = engine.leaderboard(category, limit).await?;

    if json {
        return print_json(&board);
    }
    if board.is_empty() {
        println!("No agents registered");
        return Ok(());
    }
    for entry in board {
        println!(
            "{:>3}. {:<30} {:>6.2} [{}] {} actions",
            entry.rank, entry.name, entry.reputation_score, entry.trust_tier, entry.total_actions
        );
    }
    Ok(())
}

/// Show ecosystem totals
async fn cmd_stats(engine: &ReputationEngine, json: bool) -> Result<()> {
    let stats = engine.ecosystem_stats().await?;

    if json {
        return print_json(&stats);
    }
    println!("Agents:         {}", stats.total_agents);
    println!("Actions:        {}", stats.total_actions);
    println!("Incidents:      {}", stats.total_incidents);
    println!("Avg reputation: {:.2}", stats.avg_reputation);
    println!("Actions (24h):  {}", stats.actions_last_24h);
    println!("Actions (7d):   {}", stats.actions_last_7d);
    for (tier, count) in &stats.agents_by_tier {
        println!("  {:<10} {}", tier, count);
    }
    Ok(())
}
