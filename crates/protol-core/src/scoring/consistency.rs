//! Consistency: how stable an agent's self-reported confidence is.

use protol_state::ActionRecord;

use super::{clamp_score, NEUTRAL};

/// Sample standard deviation (n - 1). `None` below two values.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// `100 - 200 * stddev` over reported confidences; neutral below two reports.
pub fn score(actions: &[ActionRecord]) -> f64 {
    let confidences: Vec<f64> = actions
        .iter()
        .filter_map(|a| a.self_reported_confidence)
        .collect();

    match sample_stddev(&confidences) {
        Some(stddev) => clamp_score((100.0 - stddev * 200.0).max(0.0)),
        None => NEUTRAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::action_with;
    use protol_state::ActionStatus;

    fn with_confidences(values: &[f64]) -> Vec<ActionRecord> {
        values
            .iter()
            .map(|c| action_with(ActionStatus::Success, None, Some(*c)))
            .collect()
    }

    #[test]
    fn fewer_than_two_reports_is_neutral() {
        assert_eq!(score(&[]), 50.0);
        assert_eq!(score(&with_confidences(&[0.9])), 50.0);

        let mut mixed = with_confidences(&[0.9]);
        mixed.push(action_with(ActionStatus::Success, None, None));
        assert_eq!(score(&mixed), 50.0);
    }

    #[test]
    fn constant_confidence_is_perfect() {
        assert_eq!(score(&with_confidences(&[0.7, 0.7, 0.7])), 100.0);
    }

    #[test]
    fn wide_spread_floors_at_zero() {
        // stddev of [0, 1] is ~0.707
        assert_eq!(score(&with_confidences(&[0.0, 1.0])), 0.0);
    }

    #[test]
    fn uses_sample_stddev() {
        let stddev = sample_stddev(&[0.4, 0.6]).unwrap();
        assert!((stddev - 0.141_421_356).abs() < 1e-6);
        let expected = 100.0 - stddev * 200.0;
        assert!((score(&with_confidences(&[0.4, 0.6])) - expected).abs() < 1e-9);
    }
}
