//! Engine operations: registration, updates, ratings, listings, history and
//! discovery, against both store backends where it matters.

use std::sync::Arc;

use protol_core::{
    ActionFilter, ActionRating, ActionStatus, AgentCategory, AgentUpdate, EngineConfig,
    IncidentType, MemoryAgentStore, NewAction, NewAgent, NewIncident, ProtolError,
    ReputationEngine, SearchQuery, Severity, SortBy, SurrealAgentStore, TrustTier,
    ValidationError, DEFAULT_LEADERBOARD_LIMIT,
};

fn engine() -> ReputationEngine {
    ReputationEngine::new(Arc::new(MemoryAgentStore::new()), EngineConfig::default())
}

fn new_agent(name: &str, category: AgentCategory) -> NewAgent {
    NewAgent::new(name, category, vec!["search".to_string()])
}

async fn register(engine: &ReputationEngine, name: &str, category: AgentCategory) -> String {
    engine
        .register_agent(new_agent(name, category))
        .await
        .unwrap()
        .agent_id
}

#[tokio::test]
async fn register_assigns_id_owner_and_slug() {
    let engine = ReputationEngine::new(
        Arc::new(MemoryAgentStore::new()),
        EngineConfig::default().with_owner("owner_acme"),
    );

    let agent = engine
        .register_agent(new_agent("Deep Search Agent", AgentCategory::Research))
        .await
        .unwrap();

    assert!(agent.agent_id.starts_with("agt_"));
    assert!(protol_core::validate_agent_id(&agent.agent_id).is_ok());
    assert_eq!(agent.slug, "deep-search-agent");
    assert_eq!(agent.owner.owner_id, "owner_acme");
    assert!(!agent.owner.verified);
    assert_eq!(agent.stats.total_actions, 0);

    let fetched = engine.get_agent(&agent.agent_id).await.unwrap();
    assert_eq!(fetched, agent);
}

#[tokio::test]
async fn register_rejects_invalid_profiles() {
    let engine = engine();

    let err = engine
        .register_agent(new_agent("ab", AgentCategory::Research))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtolError::Validation(ValidationError::Length { field: "name", .. })
    ));

    let err = engine
        .register_agent(NewAgent::new("No Skills", AgentCategory::Research, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtolError::Validation(ValidationError::Count {
            field: "capabilities",
            ..
        })
    ));

    assert!(engine.list_agents(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_agent_is_not_found_everywhere() {
    let engine = engine();
    let missing = "agt_missing1";

    assert!(engine.get_agent(missing).await.unwrap_err().is_not_found());
    assert!(engine.get_reputation(missing).await.unwrap_err().is_not_found());
    assert!(engine
        .record_action(missing, NewAction::new(ActionStatus::Success))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .report_incident(NewIncident::new(
            missing,
            IncidentType::Downtime,
            Severity::Low,
            "Down for a bit",
            "Service returned 503 for ten minutes.",
        ))
        .await
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .reputation_history(missing, 30)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(engine
        .list_actions(missing, &ActionFilter::default())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn invalid_action_is_rejected_before_storage() {
    let engine = engine();
    let id = register(&engine, "Careful Agent", AgentCategory::Coding).await;

    let err = engine
        .record_action(&id, NewAction::new(ActionStatus::Success).with_confidence(1.5))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtolError::Validation(_)));

    let agent = engine.get_agent(&id).await.unwrap();
    assert_eq!(agent.stats.total_actions, 0);
    assert_eq!(agent.reputation.overall_score, 50.0);
}

#[tokio::test]
async fn update_changes_profile_but_not_reputation() {
    let engine = engine();
    let id = register(&engine, "Mutable Agent", AgentCategory::Research).await;
    engine
        .record_action(&id, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();
    let before = engine.get_agent(&id).await.unwrap();

    let updated = engine
        .update_agent(
            &id,
            AgentUpdate {
                description: Some("Finds papers".to_string()),
                model_provider: Some("anthropic".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description.as_deref(), Some("Finds papers"));
    assert_eq!(updated.architecture.model_provider.as_deref(), Some("anthropic"));
    assert_eq!(updated.reputation, before.reputation);
    assert_eq!(updated.stats, before.stats);
    assert_eq!(updated.slug, before.slug);
}

#[tokio::test]
async fn rating_updates_average_but_not_snapshot() {
    let engine = engine();
    let id = register(&engine, "Rated Agent", AgentCategory::Writing).await;
    let first = engine
        .record_action(&id, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();
    let second = engine
        .record_action(&id, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();
    let snapshot = engine.get_reputation(&id).await.unwrap();

    engine
        .rate_action(
            &id,
            &first.action_id,
            ActionRating {
                rating: 5,
                feedback: Some("great".to_string()),
            },
        )
        .await
        .unwrap();
    let rated = engine
        .rate_action(
            &id,
            &second.action_id,
            ActionRating {
                rating: 2,
                feedback: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(rated.commissioner_rating, Some(2));

    let agent = engine.get_agent(&id).await.unwrap();
    assert_eq!(agent.stats.avg_rating, Some(3.5));
    assert_eq!(agent.reputation, snapshot);

    let err = engine
        .rate_action(
            &id,
            "act_nothere",
            ActionRating {
                rating: 3,
                feedback: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProtolError::ActionNotFound { .. }));

    let err = engine
        .rate_action(
            &id,
            &first.action_id,
            ActionRating {
                rating: 6,
                feedback: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProtolError::Validation(_)));
}

#[tokio::test]
async fn list_actions_filters_and_pages_in_record_order() {
    let engine = engine();
    let id = register(&engine, "Busy Agent", AgentCategory::DataAnalysis).await;

    for i in 0..6 {
        let status = if i % 3 == 0 {
            ActionStatus::Failed
        } else {
            ActionStatus::Success
        };
        engine
            .record_action(&id, NewAction::new(status).with_task_category("etl"))
            .await
            .unwrap();
    }

    let all = engine
        .list_actions(&id, &ActionFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 6);
    assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

    let failed = engine
        .list_actions(
            &id,
            &ActionFilter {
                status: Some(ActionStatus::Failed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].action_id, all[0].action_id);

    let paged = engine
        .list_actions(
            &id,
            &ActionFilter {
                limit: 2,
                offset: 4,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.len(), 2);
    assert_eq!(paged[0].action_id, all[4].action_id);
}

#[tokio::test]
async fn incidents_are_listed_and_counted() {
    let engine = engine();
    let id = register(&engine, "Flagged Agent", AgentCategory::Finance).await;

    let incident = engine
        .report_incident(NewIncident::new(
            &id,
            IncidentType::FinancialError,
            Severity::High,
            "Double charge",
            "Charged the customer twice for one invoice.",
        ))
        .await
        .unwrap();
    assert!(incident.incident_id.starts_with("inc_"));
    assert_eq!(incident.reported_by, EngineConfig::default().owner_id);

    let incidents = engine.list_incidents(&id).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(engine.get_agent(&id).await.unwrap().stats.incidents, 1);

    let err = engine
        .report_incident(NewIncident::new(
            &id,
            IncidentType::Downtime,
            Severity::Low,
            "Hm",
            "too short title",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtolError::Validation(_)));
}

#[tokio::test]
async fn history_grows_per_recompute_newest_first() {
    let engine = engine();
    let id = register(&engine, "Historic Agent", AgentCategory::Research).await;

    let fallback = engine.reputation_history(&id, 30).await.unwrap();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].overall_score, 50.0);

    for _ in 0..3 {
        engine
            .record_action(&id, NewAction::new(ActionStatus::Success))
            .await
            .unwrap();
    }

    let history = engine.reputation_history(&id, 30).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].computed_at >= w[1].computed_at));
    assert_eq!(history[0].actions_in_window, 3);
    assert_eq!(
        history[0].overall_score,
        engine.get_reputation(&id).await.unwrap().overall_score
    );
}

#[tokio::test]
async fn history_window_saturates_for_huge_windows() {
    let engine = engine();
    let id = register(&engine, "Ancient Agent", AgentCategory::Research).await;

    let fallback = engine.reputation_history(&id, u32::MAX).await.unwrap();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].overall_score, 50.0);

    engine
        .record_action(&id, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();
    let history = engine.reputation_history(&id, u32::MAX).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].overall_score, 59.0);
    assert_eq!(history[0].actions_in_window, 1);
}

#[tokio::test]
async fn history_is_bounded_by_config() {
    let engine = ReputationEngine::new(
        Arc::new(MemoryAgentStore::new()),
        EngineConfig::default().with_history_limit(2),
    );
    let id = register(&engine, "Bounded Agent", AgentCategory::Research).await;
    for _ in 0..5 {
        engine
            .record_action(&id, NewAction::new(ActionStatus::Success))
            .await
            .unwrap();
    }

    let history = engine.reputation_history(&id, 30).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].actions_in_window, 5);
    assert_eq!(history[1].actions_in_window, 4);
}

#[tokio::test]
async fn disabled_history_falls_back_to_current_snapshot() {
    let engine = ReputationEngine::new(
        Arc::new(MemoryAgentStore::new()),
        EngineConfig::default().with_history_limit(0),
    );
    let id = register(&engine, "Forgetful Agent", AgentCategory::Research).await;
    engine
        .record_action(&id, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();

    let history = engine.reputation_history(&id, 7).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].overall_score, 59.0);
    assert_eq!(history[0].actions_in_window, 1);
}

#[tokio::test]
async fn search_filters_sorts_and_pages() {
    let engine = engine();
    let low = register(&engine, "Low Coder", AgentCategory::Coding).await;
    let high = register(&engine, "High Coder", AgentCategory::Coding).await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let writer = register(&engine, "Some Writer", AgentCategory::Writing).await;

    engine
        .record_action(&low, NewAction::new(ActionStatus::Failed))
        .await
        .unwrap();
    for _ in 0..3 {
        engine
            .record_action(&high, NewAction::new(ActionStatus::Success))
            .await
            .unwrap();
    }

    let coders = engine
        .search_agents(&SearchQuery {
            category: Some(AgentCategory::Coding),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(coders.total, 2);
    assert_eq!(coders.agents[0].agent_id, high);
    assert_eq!(coders.agents[1].agent_id, low);
    assert!(!coders.has_more);

    let by_actions = engine
        .search_agents(&SearchQuery {
            sort_by: SortBy::Actions,
            per_page: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_actions.total, 3);
    assert_eq!(by_actions.agents.len(), 1);
    assert_eq!(by_actions.agents[0].agent_id, high);
    assert!(by_actions.has_more);

    let newest = engine
        .search_agents(&SearchQuery {
            sort_by: SortBy::Newest,
            page: 1,
            per_page: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(newest.agents[0].agent_id, writer);

    let above_bronze = engine
        .search_agents(&SearchQuery {
            min_reputation: Some(58.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(above_bronze.total, 1);
    assert_eq!(above_bronze.agents[0].agent_id, high);

    let past_end = engine
        .search_agents(&SearchQuery {
            page: 5,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(past_end.agents.is_empty());
    assert_eq!(past_end.total, 3);

    assert!(engine
        .search_agents(&SearchQuery {
            page: 0,
            ..Default::default()
        })
        .await
        .is_err());
}

#[tokio::test]
async fn search_matches_capabilities_and_tier() {
    let engine = engine();
    let mut coder = new_agent("Rust Helper", AgentCategory::Coding);
    coder.capabilities = vec!["rust".to_string(), "review".to_string()];
    let coder = engine.register_agent(coder).await.unwrap();
    register(&engine, "Plain Agent", AgentCategory::Coding).await;

    let page = engine
        .search_agents(&SearchQuery {
            capabilities: vec!["review".to_string(), "deploy".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.agents[0].agent_id, coder.agent_id);

    let unverified = engine
        .search_agents(&SearchQuery {
            trust_tier: Some(TrustTier::Unverified),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(unverified.total, 2);
}

#[tokio::test]
async fn leaderboard_ranks_by_score() {
    let engine = engine();
    let first = register(&engine, "Top Agent", AgentCategory::Research).await;
    let second = register(&engine, "Mid Agent", AgentCategory::Research).await;
    let other = register(&engine, "Other Agent", AgentCategory::Sales).await;

    for _ in 0..4 {
        engine
            .record_action(&first, NewAction::new(ActionStatus::Success))
            .await
            .unwrap();
    }
    engine
        .record_action(&second, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();

    let board = engine
        .leaderboard(Some(AgentCategory::Research), DEFAULT_LEADERBOARD_LIMIT)
        .await
        .unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].agent_id, first);
    assert_eq!(board[1].rank, 2);
    assert_eq!(board[1].agent_id, second);
    assert!(board[0].reputation_score >= board[1].reputation_score);

    let top_one = engine.leaderboard(None, 1).await.unwrap();
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].agent_id, first);
    assert!(board.iter().all(|e| e.agent_id != other));
}

#[tokio::test]
async fn peers_follow_category_changes() {
    let engine = engine();
    let a = register(&engine, "Peer One", AgentCategory::Research).await;
    let b = register(&engine, "Peer Two", AgentCategory::Research).await;

    let peers = engine.list_peers(AgentCategory::Research).await.unwrap();
    assert_eq!(peers.len(), 2);

    engine
        .update_agent(
            &b,
            AgentUpdate {
                category: Some(AgentCategory::Coding),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let research = engine.list_peers(AgentCategory::Research).await.unwrap();
    assert_eq!(research.len(), 1);
    assert_eq!(research[0].agent_id, a);
    assert_eq!(engine.list_peers(AgentCategory::Coding).await.unwrap().len(), 1);
}

#[tokio::test]
async fn ecosystem_stats_totals() {
    let engine = engine();
    let empty = engine.ecosystem_stats().await.unwrap();
    assert_eq!(empty.total_agents, 0);
    assert_eq!(empty.avg_reputation, 0.0);

    let a = register(&engine, "Alpha Agent", AgentCategory::Research).await;
    let b = register(&engine, "Beta Agent", AgentCategory::Coding).await;
    engine
        .record_action(&a, NewAction::new(ActionStatus::Success))
        .await
        .unwrap();
    engine
        .record_action(&b, NewAction::new(ActionStatus::Failed))
        .await
        .unwrap();
    engine
        .report_incident(NewIncident::new(
            &b,
            IncidentType::Downtime,
            Severity::Medium,
            "Outage window",
            "Unavailable for most of the afternoon.",
        ))
        .await
        .unwrap();

    let stats = engine.ecosystem_stats().await.unwrap();
    assert_eq!(stats.total_agents, 2);
    assert_eq!(stats.total_actions, 2);
    assert_eq!(stats.total_incidents, 1);
    assert_eq!(stats.actions_last_24h, 2);
    assert_eq!(stats.actions_last_7d, 2);
    assert_eq!(stats.agents_by_category.get(&AgentCategory::Research), Some(&1));
    assert_eq!(stats.agents_by_category.get(&AgentCategory::Coding), Some(&1));
    assert_eq!(
        stats.agents_by_tier.values().sum::<u64>(),
        stats.total_agents
    );

    let a_score = engine.get_reputation(&a).await.unwrap().overall_score;
    let b_score = engine.get_reputation(&b).await.unwrap().overall_score;
    assert!((stats.avg_reputation - (a_score + b_score) / 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn surreal_backend_drives_full_lifecycle() {
    let store = SurrealAgentStore::in_memory().await.unwrap();
    let engine = ReputationEngine::new(Arc::new(store), EngineConfig::default());

    let id = register(&engine, "Durable Agent", AgentCategory::Research).await;
    let action = engine
        .record_action(
            &id,
            NewAction::new(ActionStatus::Success)
                .with_confidence(0.9)
                .with_cost(0.05),
        )
        .await
        .unwrap();
    engine
        .rate_action(
            &id,
            &action.action_id,
            ActionRating {
                rating: 4,
                feedback: None,
            },
        )
        .await
        .unwrap();
    engine
        .report_incident(NewIncident::new(
            &id,
            IncidentType::Hallucination,
            Severity::Low,
            "Minor slip",
            "Misquoted a figure in the summary.",
        ))
        .await
        .unwrap();

    let agent = engine.get_agent(&id).await.unwrap();
    assert_eq!(agent.stats.total_actions, 1);
    assert_eq!(agent.stats.incidents, 1);
    assert_eq!(agent.stats.avg_rating, Some(4.0));
    assert_eq!(agent.reputation.breakdown.safety, 90.0);

    let history = engine.reputation_history(&id, 30).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].overall_score, agent.reputation.overall_score);
}
