//! Reputation scoring.
//!
//! Five independent dimension scorers feed a weighted aggregate:
//!
//! | dimension    | weight | input                               |
//! |--------------|--------|-------------------------------------|
//! | reliability  | 0.30   | action statuses                     |
//! | safety       | 0.25   | incident severities / action volume |
//! | consistency  | 0.20   | self-reported confidence spread     |
//! | efficiency   | 0.15   | mean cost vs. category peers        |
//! | transparency | 0.10   | provenance fields per action        |
//!
//! Everything here is pure and total: no I/O, no failure modes. Every score
//! is clamped to `[0, 100]` and rounded to two decimals in the snapshot.

pub mod consistency;
pub mod efficiency;
pub mod reliability;
pub mod safety;
pub mod stats;
pub mod transparency;

use chrono::{DateTime, Utc};
use protol_state::{
    ActionRecord, IncidentRecord, ReputationBreakdown, ReputationSnapshot, Trend, TrustTier,
};

pub use stats::compute_stats;

/// Score assigned when a dimension has no signal.
pub const NEUTRAL: f64 = 50.0;

pub const RELIABILITY_WEIGHT: f64 = 0.30;
pub const SAFETY_WEIGHT: f64 = 0.25;
pub const CONSISTENCY_WEIGHT: f64 = 0.20;
pub const EFFICIENCY_WEIGHT: f64 = 0.15;
pub const TRANSPARENCY_WEIGHT: f64 = 0.10;

/// Minimum change in overall score, either way, that counts as a trend.
pub const TREND_THRESHOLD: f64 = 2.0;

/// Clamp into `[0, 100]`. NaN (e.g. from overflowing cost averages) maps to neutral.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tier thresholds, checked high to low.
pub fn tier_for_score(score: f64) -> TrustTier {
    if score >= 90.0 {
        TrustTier::Platinum
    } else if score >= 75.0 {
        TrustTier::Gold
    } else if score >= 60.0 {
        TrustTier::Silver
    } else if score >= 40.0 {
        TrustTier::Bronze
    } else {
        TrustTier::Unverified
    }
}

pub fn trend_for(previous: f64, current: f64) -> Trend {
    if current > previous + TREND_THRESHOLD {
        Trend::Improving
    } else if current < previous - TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Weighted sum of the five dimensions, clamped.
pub fn aggregate(breakdown: &ReputationBreakdown) -> f64 {
    clamp_score(
        breakdown.reliability * RELIABILITY_WEIGHT
            + breakdown.safety * SAFETY_WEIGHT
            + breakdown.consistency * CONSISTENCY_WEIGHT
            + breakdown.efficiency * EFFICIENCY_WEIGHT
            + breakdown.transparency * TRANSPARENCY_WEIGHT,
    )
}

/// Snapshot for an agent with no recorded actions.
///
/// Safety starts at 100; every other dimension starts neutral.
pub fn default_snapshot(now: DateTime<Utc>) -> ReputationSnapshot {
    ReputationSnapshot {
        overall_score: NEUTRAL,
        trust_tier: TrustTier::Unverified,
        breakdown: ReputationBreakdown {
            reliability: NEUTRAL,
            safety: 100.0,
            consistency: NEUTRAL,
            efficiency: NEUTRAL,
            transparency: NEUTRAL,
        },
        trend: Trend::Stable,
        last_computed: now,
    }
}

/// Everything one recompute reads.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub actions: &'a [ActionRecord],
    pub incidents: &'a [IncidentRecord],
    /// Action sets of the other agents in the same category.
    pub peers: &'a [Vec<ActionRecord>],
    /// Overall score of the snapshot being replaced.
    pub previous_overall: f64,
}

/// Build a fresh snapshot.
///
/// Zero actions always yields [`default_snapshot`], incidents or not.
pub fn compute_snapshot(input: ScoringInput<'_>, now: DateTime<Utc>) -> ReputationSnapshot {
    if input.actions.is_empty() {
        return default_snapshot(now);
    }

    let breakdown = ReputationBreakdown {
        reliability: reliability::score(input.actions),
        safety: safety::score(input.actions.len(), input.incidents),
        consistency: consistency::score(input.actions),
        efficiency: efficiency::score(input.actions, input.peers.iter().map(Vec::as_slice)),
        transparency: transparency::score(input.actions),
    };
    snapshot_from(&breakdown, input.previous_overall, now)
}

/// Tier and trend are classified from the unrounded overall; only the
/// stored scores are rounded.
fn snapshot_from(
    breakdown: &ReputationBreakdown,
    previous_overall: f64,
    now: DateTime<Utc>,
) -> ReputationSnapshot {
    let overall = aggregate(breakdown);

    ReputationSnapshot {
        overall_score: round2(overall),
        trust_tier: tier_for_score(overall),
        breakdown: ReputationBreakdown {
            reliability: round2(breakdown.reliability),
            safety: round2(breakdown.safety),
            consistency: round2(breakdown.consistency),
            efficiency: round2(breakdown.efficiency),
            transparency: round2(breakdown.transparency),
        },
        trend: trend_for(previous_overall, overall),
        last_computed: now,
    }
}
