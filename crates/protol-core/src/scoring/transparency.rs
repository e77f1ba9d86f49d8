//! Transparency: share of provenance signals reported per action
//! (output hash, input hash, confidence).

use protol_state::ActionRecord;

use super::{clamp_score, NEUTRAL};

const SIGNALS_PER_ACTION: f64 = 3.0;

pub fn score(actions: &[ActionRecord]) -> f64 {
    if actions.is_empty() {
        return NEUTRAL;
    }
    let present: u32 = actions.iter().map(|a| a.provenance_signals()).sum();
    clamp_score(f64::from(present) / (SIGNALS_PER_ACTION * actions.len() as f64) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::action;
    use protol_state::ActionStatus;

    #[test]
    fn counts_signals_across_actions() {
        let mut full = action(ActionStatus::Success);
        full.input_hash = Some("in".into());
        full.output_hash = Some("out".into());
        full.self_reported_confidence = Some(0.8);

        let mut partial = action(ActionStatus::Success);
        partial.output_hash = Some("out".into());

        let bare = action(ActionStatus::Failed);

        assert_eq!(score(&[]), 50.0);
        assert_eq!(score(&[full.clone()]), 100.0);
        assert_eq!(score(&[bare.clone()]), 0.0);
        // (3 + 1 + 0) / 9
        let s = score(&[full, partial, bare]);
        assert!((s - 44.444_444).abs() < 1e-4);
    }
}
