//! Safety: severity-weighted incident load per action.
//!
//! Incidents are never removed, so the score only recovers as clean actions
//! grow the denominator.

use protol_state::IncidentRecord;

use super::clamp_score;

/// Points lost per unit of weighted incidents per action.
const PENALTY_SCALE: f64 = 10.0;

pub fn weighted_incidents(incidents: &[IncidentRecord]) -> u64 {
    incidents.iter().map(|i| u64::from(i.severity.weight())).sum()
}

pub fn score(total_actions: usize, incidents: &[IncidentRecord]) -> f64 {
    let denominator = total_actions.max(1) as f64;
    let weighted = weighted_incidents(incidents) as f64;
    clamp_score(100.0 - (weighted / denominator) * PENALTY_SCALE)
}
