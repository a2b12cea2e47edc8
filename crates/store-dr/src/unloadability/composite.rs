use super::domain::{RiskClass, SubScores};
use super::policy::{ClassificationPolicy, ScoreWeights};
use super::scores::LimitReading;

/// Weighted sum of the sub-scores with the weights taken as literal coefficients.
pub fn weighted_sum(weights: &ScoreWeights, scores: &SubScores) -> f64 {
    weights.w_time * scores.time
        + weights.w_energy * scores.energy
        + weights.w_risk * scores.risk
        + weights.w_open * scores.open
        + weights.w_dload * scores.dload
        + weights.w_defrost * scores.defrost
}

/// `(weighted_sum, unloadability_score)` for one cabinet.
pub fn composite(weights: &ScoreWeights, scores: &SubScores, multiplier: f64) -> (f64, f64) {
    let sum = weighted_sum(weights, scores);
    (sum, multiplier * sum)
}

/// Safety bucket plus the names of any limits already reached.
pub(crate) fn classify(
    risk: f64,
    readings: &[LimitReading],
    policy: &ClassificationPolicy,
) -> (RiskClass, Vec<String>) {
    let breached: Vec<String> = readings
        .iter()
        .filter(|reading| reading.is_breached())
        .map(|reading| reading.name.to_string())
        .collect();

    let class = if !breached.is_empty() || risk <= 0.0 {
        RiskClass::Ineligible
    } else if risk < policy.caution_band {
        RiskClass::EligibleWithCaution
    } else {
        RiskClass::Eligible
    };

    (class, breached)
}
