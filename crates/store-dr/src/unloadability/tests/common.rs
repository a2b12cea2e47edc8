use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::unloadability::domain::{CabinetSnapshot, CabinetType, EvaluationRequest};
use crate::unloadability::policy::{PolicyConfig, ScoreWeights};
use crate::unloadability::{unloadability_router, UnloadabilityEngine};

pub(super) fn policy() -> PolicyConfig {
    PolicyConfig::standard()
}

pub(super) fn equal_weight_policy() -> PolicyConfig {
    let mut policy = policy();
    policy.weights = ScoreWeights::uniform(1.0);
    policy
}

/// Fully instrumented refrigerator sitting comfortably inside every limit.
pub(super) fn refrigerator(id: &str, air_return_c: f64) -> CabinetSnapshot {
    let mut snapshot = CabinetSnapshot::new(id, CabinetType::Refrigerator);
    snapshot.air_supply_c = Some(air_return_c - 3.0);
    snapshot.air_return_c = Some(air_return_c);
    snapshot.prod_t_milk_c = Some(2.0);
    snapshot.prod_t_mw_chill_c = Some(3.0);
    snapshot.time_since_defrost_min = 90;
    snapshot
}

pub(super) fn freezer(id: &str, air_return_c: f64) -> CabinetSnapshot {
    let mut snapshot = CabinetSnapshot::new(id, CabinetType::Freezer);
    snapshot.air_supply_c = Some(air_return_c - 4.0);
    snapshot.air_return_c = Some(air_return_c);
    snapshot.prod_t_mw_freeze_c = Some(-20.0);
    snapshot.time_since_defrost_min = 90;
    snapshot
}

pub(super) fn engine_with(policy: PolicyConfig) -> UnloadabilityEngine {
    UnloadabilityEngine::new(policy)
}

pub(super) fn engine() -> UnloadabilityEngine {
    engine_with(policy())
}

pub(super) fn request(cabinets: Vec<CabinetSnapshot>) -> EvaluationRequest {
    EvaluationRequest {
        store_id: "S001".to_string(),
        timestamp: None,
        business_hours_flag: 1,
        cabinets,
    }
}

pub(super) fn router() -> axum::Router {
    unloadability_router(Arc::new(engine()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
