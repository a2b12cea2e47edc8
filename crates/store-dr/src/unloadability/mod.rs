//! Demand-response unloadability engine.
//!
//! Turns a snapshot of cabinet telemetry plus a store policy into a shed order: every
//! cabinet gets six bounded sub-scores, a weighted composite, a safety classification,
//! and a position in a total, deterministic ranking. Scoring is pure and runs in
//! parallel across cabinets; ranking is one sort after all scores are in.

pub mod composite;
pub mod domain;
pub mod import;
pub mod policy;
pub mod ranker;
pub mod router;
pub mod scores;
pub mod validate;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{Local, SubsecRound};
use rayon::prelude::*;
use tracing::{debug, info};

pub use domain::{
    BusinessHours, CabinetId, CabinetSnapshot, CabinetType, EvaluationRequest,
    EvaluationResponse, Ranking, RiskClass, ScoredCabinet, SheddingTargets, SubScores,
};
pub use import::{cabinet_template, write_cabinet_csv, CabinetCsvImporter, CabinetImportError};
pub use policy::{
    CabinetThresholds, ClassificationPolicy, DefrostPolicy, OccupancyPolicy, PolicyConfig,
    PolicyError, PolicySource, PolicyStore, ScoreWeights, DEFAULT_POLICY_YAML,
};
pub use router::unloadability_router;
pub use validate::{validate_cabinets, EvaluationError, InputError, ValidatedCabinets};

/// Score a single cabinet. The cabinet's type must have a threshold table.
fn score_cabinet(
    snapshot: &CabinetSnapshot,
    thresholds: &CabinetThresholds,
    hours: BusinessHours,
    policy: &PolicyConfig,
) -> ScoredCabinet {
    let readings = scores::limit_readings(snapshot, thresholds);
    let (sub_scores, multiplier) =
        scores::sub_scores(snapshot, &readings, thresholds, hours, policy);
    let (weighted_sum, unloadability_score) =
        composite::composite(&policy.weights, &sub_scores, multiplier);
    let (classification, breached_limits) =
        composite::classify(sub_scores.risk, &readings, &policy.classification);

    let silent: Vec<&str> = readings
        .iter()
        .filter(|reading| reading.value.is_none())
        .map(|reading| reading.name)
        .collect();
    if !silent.is_empty() {
        debug!(cabinet_id = %snapshot.cabinet_id, ?silent, "scoring with conservative fallbacks");
    }
    debug!(
        cabinet_id = %snapshot.cabinet_id,
        score = unloadability_score,
        class = classification.label(),
        "cabinet scored"
    );

    ScoredCabinet {
        snapshot: snapshot.clone(),
        sub_scores,
        weighted_sum,
        penalty_multiplier: multiplier,
        unloadability_score,
        classification,
        breached_limits,
        rank: 0,
    }
}

/// Rank validated cabinets, safest-to-shed first, under the policy they were validated
/// against. Never mutates its inputs.
pub fn rank(cabinets: &ValidatedCabinets<'_>, hours: BusinessHours) -> Ranking {
    let policy = cabinets.policy();
    let scored: Vec<ScoredCabinet> = cabinets
        .entries()
        .par_iter()
        .map(|(snapshot, thresholds)| score_cabinet(snapshot, thresholds, hours, policy))
        .collect();

    let ranking = ranker::rank_scored(scored);
    info!(
        cabinets = ranking.cabinets.len(),
        sheddable = ranking.eligible_count(),
        business_hours = hours.flag(),
        "cabinets ranked"
    );
    ranking
}

/// Validates requests against a shared, read-only policy and ranks them.
#[derive(Debug, Clone)]
pub struct UnloadabilityEngine {
    policy: Arc<PolicyConfig>,
}

impl UnloadabilityEngine {
    pub fn new(policy: PolicyConfig) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn rank(
        &self,
        cabinets: Vec<CabinetSnapshot>,
        business_hours_flag: u8,
    ) -> Result<Ranking, EvaluationError> {
        let hours = validate::business_hours(business_hours_flag)?;
        let validated = validate_cabinets(cabinets, &self.policy)?;
        Ok(rank(&validated, hours))
    }

    /// Full request/response cycle in the wire shape used by the store console.
    pub fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResponse, EvaluationError> {
        let EvaluationRequest {
            store_id,
            timestamp,
            business_hours_flag,
            cabinets,
        } = request;

        let evaluated_at = timestamp.unwrap_or_else(|| Local::now().fixed_offset().trunc_subsecs(0));
        let ranking = self.rank(cabinets, business_hours_flag)?;

        Ok(EvaluationResponse {
            store_id,
            evaluated_at,
            targets: SheddingTargets::default(),
            cabinets: ranking.cabinets,
            ranked_cabinet_ids: ranking.ranked_cabinet_ids,
        })
    }
}
