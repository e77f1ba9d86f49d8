//! Aggregate activity counters derived from an agent's full record set.

use chrono::{DateTime, Utc};
use protol_state::{ActionRecord, AgentStats, IncidentRecord};

/// Rebuild stats from scratch. `active_since` is carried over from registration.
pub fn compute_stats(
    actions: &[ActionRecord],
    incidents: &[IncidentRecord],
    active_since: DateTime<Utc>,
) -> AgentStats {
    let total = actions.len();
    let successes = actions.iter().filter(|a| a.is_successful()).count();
    let ratings: Vec<f64> = actions
        .iter()
        .filter_map(|a| a.commissioner_rating)
        .map(f64::from)
        .collect();

    AgentStats {
        total_actions: total as u64,
        success_rate: if total > 0 {
            successes as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        avg_rating: if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        },
        total_earnings_usd: actions.iter().filter_map(|a| a.payment_usd).sum(),
        active_since,
        last_active: actions.last().map(|a| a.last_activity()),
        incidents: incidents.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{action, incident};
    use protol_state::{ActionStatus, Severity};

    #[test]
    fn empty_history() {
        let since = Utc::now();
        let stats = compute_stats(&[], &[incident(Severity::Low)], since);
        assert_eq!(stats.total_actions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_rating, None);
        assert_eq!(stats.last_active, None);
        assert_eq!(stats.incidents, 1);
        assert_eq!(stats.active_since, since);
    }

    #[test]
    fn rates_ratings_and_earnings() {
        let mut first = action(ActionStatus::Success);
        first.commissioner_rating = Some(5);
        first.payment_usd = Some(2.5);
        let mut second = action(ActionStatus::Partial);
        second.commissioner_rating = Some(2);
        let mut third = action(ActionStatus::Error);
        third.payment_usd = Some(1.0);

        let stats = compute_stats(&[first, second, third.clone()], &[], Utc::now());
        assert_eq!(stats.total_actions, 3);
        assert!((stats.success_rate - 66.666_666).abs() < 1e-4);
        assert_eq!(stats.avg_rating, Some(3.5));
        assert_eq!(stats.total_earnings_usd, 3.5);
        assert_eq!(stats.last_active, third.completed_at);
    }
}
