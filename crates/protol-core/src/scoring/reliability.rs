//! Reliability: observed success rate, shrunk toward a neutral prior of 50
//! while the sample is small.

use protol_state::ActionRecord;

use super::{clamp_score, NEUTRAL};

/// Sample size at which the observed rate is fully trusted.
const FULL_CONFIDENCE_ACTIONS: f64 = 100.0;

/// Blend weight for the observed rate: `min(1, sqrt(n) / 10)`.
pub fn confidence_weight(total: usize) -> f64 {
    ((total as f64).sqrt() / FULL_CONFIDENCE_ACTIONS.sqrt()).min(1.0)
}

pub fn score(actions: &[ActionRecord]) -> f64 {
    let total = actions.len();
    if total == 0 {
        return NEUTRAL;
    }

    let successes = actions.iter().filter(|a| a.is_successful()).count();
    let raw_rate = successes as f64 / total as f64 * 100.0;
    let weight = confidence_weight(total);

    clamp_score(NEUTRAL * (1.0 - weight) + raw_rate * weight)
}
