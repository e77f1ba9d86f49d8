//! Efficiency: mean cost of successful work relative to category peers.
//!
//! Symmetric around the peer mean: matching it scores 50, half of it scores
//! 75, double it scores 0.

use protol_state::ActionRecord;

use super::{clamp_score, NEUTRAL};

/// Mean cost over successful or partial actions that reported one.
pub fn mean_successful_cost(actions: &[ActionRecord]) -> Option<f64> {
    let costs: Vec<f64> = actions.iter().filter_map(|a| a.successful_cost()).collect();
    if costs.is_empty() {
        None
    } else {
        Some(costs.iter().sum::<f64>() / costs.len() as f64)
    }
}

/// Score `agent_actions` against the action sets of the other agents in its
/// category. Peers without costed successful work are ignored.
pub fn score<'a, I>(agent_actions: &[ActionRecord], peers: I) -> f64
where
    I: IntoIterator<Item = &'a [ActionRecord]>,
{
    let Some(agent_avg) = mean_successful_cost(agent_actions) else {
        return NEUTRAL;
    };

    let peer_means: Vec<f64> = peers
        .into_iter()
        .filter_map(mean_successful_cost)
        .collect();
    if peer_means.is_empty() {
        return NEUTRAL;
    }

    let category_avg = peer_means.iter().sum::<f64>() / peer_means.len() as f64;
    if category_avg == 0.0 {
        return NEUTRAL;
    }

    clamp_score(NEUTRAL + NEUTRAL * (1.0 - agent_avg / category_avg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::action_with;
    use protol_state::ActionStatus;

    fn costed(costs: &[f64]) -> Vec<ActionRecord> {
        costs
            .iter()
            .map(|c| action_with(ActionStatus::Success, Some(*c), None))
            .collect()
    }

    #[test]
    fn no_costs_or_no_peers_is_neutral() {
        let peer = costed(&[0.5]);
        assert_eq!(score(&[], [peer.as_slice()]), 50.0);
        assert_eq!(score(&costed(&[0.5]), std::iter::empty()), 50.0);

        let uncosted_peer = vec![action_with(ActionStatus::Success, None, None)];
        assert_eq!(score(&costed(&[0.5]), [uncosted_peer.as_slice()]), 50.0);
    }

    #[test]
    fn free_peers_are_neutral() {
        let peer = costed(&[0.0, 0.0]);
        assert_eq!(score(&costed(&[0.3]), [peer.as_slice()]), 50.0);
    }

    #[test]
    fn cheaper_agent_beats_pricier_peer() {
        let cheap = costed(&[0.01]);
        let pricey = costed(&[1.00]);

        let cheap_score = score(&cheap, [pricey.as_slice()]);
        let pricey_score = score(&pricey, [cheap.as_slice()]);
        assert!(cheap_score > 50.0, "cheap scored {cheap_score}");
        assert!(pricey_score < 50.0, "pricey scored {pricey_score}");
        assert!((cheap_score - 99.5).abs() < 1e-9);
        assert_eq!(pricey_score, 0.0);
    }

    #[test]
    fn only_successful_costs_count() {
        let mut agent = costed(&[0.10]);
        agent.push(action_with(ActionStatus::Failed, Some(5.0), None));
        let peer = costed(&[0.10]);
        assert_eq!(score(&agent, [peer.as_slice()]), 50.0);
    }

    #[test]
    fn category_average_is_mean_of_peer_means() {
        // peer means 0.2 and 0.6 -> category average 0.4
        let a = costed(&[0.1, 0.3]);
        let b = costed(&[0.6]);
        let agent = costed(&[0.2]);
        let s = score(&agent, [a.as_slice(), b.as_slice()]);
        assert!((s - 75.0).abs() < 1e-9);
    }
}
