//! Severity assessment: rule-table severity, cost and repair time
//!
//! Overall severity is the highest level implied by any matched damage.
//! Cost and score carry bounded random jitter standing in for a predictive
//! model; the random source is always supplied by the caller.
use claimsight_core::{
    CostRange, OverallSeverity, PartMatch, SeverityLevel, SeverityResult, Taxonomy,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Multiplicative jitter applied to the rule-table estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterBounds {
    /// Factor range for the low cost bound
    pub low: (f64, f64),
    /// Factor range for the high cost bound
    pub high: (f64, f64),
    /// Maximum amount subtracted from the severity score
    pub score_drop: f64,
}

impl JitterBounds {
    pub const fn none() -> Self {
        Self {
            low: (1.0, 1.0),
            high: (1.0, 1.0),
            score_drop: 0.0,
        }
    }

    /// Finite, non-negative and ordered factor ranges plus a finite
    /// non-negative score drop
    pub fn is_valid(&self) -> bool {
        let range_ok =
            |(lo, hi): (f64, f64)| lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo <= hi;
        range_ok(self.low)
            && range_ok(self.high)
            && self.score_drop.is_finite()
            && self.score_drop >= 0.0
    }
}

impl Default for JitterBounds {
    fn default() -> Self {
        Self {
            low: (0.9, 1.1),
            high: (1.0, 1.2),
            score_drop: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeverityStage {
    taxonomy: Arc<Taxonomy>,
    jitter: JitterBounds,
}

impl SeverityStage {
    pub fn new(taxonomy: Arc<Taxonomy>, jitter: JitterBounds) -> Self {
        Self { taxonomy, jitter }
    }

    pub fn jitter(&self) -> JitterBounds {
        self.jitter
    }

    /// Highest level across matches; `None` for an empty match set
    pub fn overall_level(&self, matches: &[PartMatch]) -> Option<SeverityLevel> {
        matches
            .iter()
            .map(|m| self.taxonomy.severity_for(&m.damage_type))
            .max()
    }

    pub fn run<R: Rng + ?Sized>(&self, matches: &[PartMatch], rng: &mut R) -> SeverityResult {
        let start = Instant::now();

        let Some(level) = self.overall_level(matches) else {
            return SeverityResult::no_damage(start.elapsed().as_millis() as u64);
        };

        let rule = self.taxonomy.rule_for(level);
        let low = scale(rule.cost_range.low(), sample(rng, self.jitter.low));
        let high = scale(rule.cost_range.high(), sample(rng, self.jitter.high)).max(low);

        let drop = sample(rng, (0.0, self.jitter.score_drop));
        let score = ((f64::from(level.rank()) * 2.5 - drop) * 10.0).round() / 10.0;

        let elapsed = start.elapsed().as_millis() as u64;
        tracing::info!(
            severity = %level,
            matches = matches.len(),
            elapsed_ms = elapsed,
            "severity assessment complete"
        );

        SeverityResult {
            overall_severity: OverallSeverity::from(level),
            severity_score: score as f32,
            repair_category: level.repair_category(),
            estimated_cost_range: CostRange(low, high),
            repair_time_days: rule.repair_days,
            processing_time_ms: elapsed,
        }
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if lo < hi {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}

fn scale(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor) as u32
}
