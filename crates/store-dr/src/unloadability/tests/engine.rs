use super::common::*;
use std::sync::Arc;

use crate::unloadability::domain::{BusinessHours, CabinetSnapshot, CabinetType, RiskClass};
use crate::unloadability::{
    rank, validate_cabinets, EvaluationError, InputError, PolicyError, UnloadabilityEngine,
};

#[test]
fn engine_scores_refrigerator_example_as_eligible() {
    let engine = engine_with(equal_weight_policy());
    let mut cabinet = CabinetSnapshot::new("R-01", CabinetType::Refrigerator);
    cabinet.air_return_c = Some(4.0);

    let ranking = engine.rank(vec![cabinet], 1).expect("ranks");

    let scored = &ranking.cabinets[0];
    assert_eq!(scored.classification, RiskClass::Eligible);
    assert!(scored.unloadability_score > 0.0);
    assert!(scored.unloadability_score < engine.policy().weights.total());
    assert_eq!(scored.rank, 1);
}

#[test]
fn engine_ranks_warm_freezer_after_every_eligible_cabinet() {
    let engine = engine();
    let mut warm = freezer("F-01", -10.0);
    warm.air_supply_c = Some(-30.0);

    // A barely-eligible, defrosting refrigerator scores far lower than the warm freezer.
    let mut weak = refrigerator("R-09", 6.5);
    weak.defrost_status = 1;
    weak.time_since_defrost_min = 0;

    let ranking = engine
        .rank(vec![warm, weak, refrigerator("R-01", 3.0)], 1)
        .expect("ranks");

    let last = ranking.cabinets.last().expect("cabinets ranked");
    assert_eq!(last.cabinet_id().as_str(), "F-01");
    assert_eq!(last.classification, RiskClass::Ineligible);
    assert_eq!(last.breached_limits, vec!["air_return_c_max".to_string()]);
    assert!(ranking.cabinets[..2]
        .iter()
        .all(|cabinet| cabinet.classification.is_sheddable()));
    assert!(ranking.cabinets[..2]
        .iter()
        .any(|cabinet| cabinet.unloadability_score < last.unloadability_score));
}

#[test]
fn air_return_at_limit_is_ineligible_regardless_of_other_fields() {
    let engine = engine();
    let mut at_limit = refrigerator("R-01", 7.0);
    at_limit.air_supply_c = Some(-10.0);
    at_limit.time_since_defrost_min = 10_000;

    let ranking = engine.rank(vec![at_limit], 0).expect("ranks");

    assert_eq!(ranking.cabinets[0].classification, RiskClass::Ineligible);
    assert_eq!(ranking.cabinets[0].sub_scores.risk, 0.0);
}

#[test]
fn identical_cabinets_tie_and_order_by_id() {
    let engine = engine();
    let cabinets = vec![
        refrigerator("R-03", 4.0),
        refrigerator("R-01", 4.0),
        refrigerator("R-02", 4.0),
    ];

    let ranking = engine.rank(cabinets, 1).expect("ranks");

    let ids: Vec<&str> = ranking
        .ranked_cabinet_ids
        .iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(ids, vec!["R-01", "R-02", "R-03"]);
    let first = ranking.cabinets[0].unloadability_score;
    assert!(ranking
        .cabinets
        .iter()
        .all(|cabinet| cabinet.unloadability_score == first));
}

#[test]
fn standard_weights_produce_expected_composite() {
    let engine = engine();

    let ranking = engine.rank(vec![refrigerator("R-01", 4.0)], 1).expect("ranks");

    let scored = &ranking.cabinets[0];
    assert!((scored.sub_scores.time - 0.2).abs() < 1e-9);
    assert!((scored.sub_scores.energy - 0.5).abs() < 1e-9);
    assert!((scored.sub_scores.risk - 0.6).abs() < 1e-9);
    assert_eq!(scored.sub_scores.open, 0.3);
    assert_eq!(scored.sub_scores.dload, 1.0);
    assert_eq!(scored.sub_scores.defrost, 1.0);
    assert!((scored.unloadability_score - 0.48).abs() < 1e-9);
}

#[test]
fn opening_the_store_never_raises_a_score() {
    let engine = engine();
    let cabinets = vec![
        refrigerator("R-01", 4.0),
        refrigerator("R-02", 6.9),
        freezer("F-01", -19.0),
        CabinetSnapshot::new("F-02", CabinetType::Freezer),
    ];

    let closed = engine.rank(cabinets.clone(), 0).expect("closed ranks");
    let open = engine.rank(cabinets, 1).expect("open ranks");

    for cabinet in &open.cabinets {
        let before = closed
            .cabinets
            .iter()
            .find(|candidate| candidate.cabinet_id() == cabinet.cabinet_id())
            .expect("same cabinet set");
        assert!(cabinet.unloadability_score <= before.unloadability_score);
    }
}

#[test]
fn active_defrost_applies_penalty_factor_exactly() {
    let mut policy = policy();
    policy.weights.w_defrost = 0.0;
    policy.weights.w_dload = 0.0;
    let engine = engine_with(policy);
    let idle = refrigerator("R-01", 4.0);
    let mut defrosting = idle.clone();
    defrosting.defrost_status = 1;

    let idle_score = engine.rank(vec![idle], 1).expect("ranks").cabinets[0].unloadability_score;
    let defrost_scored = engine.rank(vec![defrosting], 1).expect("ranks").cabinets[0].clone();

    assert_eq!(defrost_scored.penalty_multiplier, 0.8);
    assert_eq!(defrost_scored.unloadability_score, 0.8 * idle_score);
}

#[test]
fn active_defrost_lowers_defrost_sub_score_before_the_multiplier() {
    let engine = engine();
    let idle = refrigerator("R-01", 4.0);
    let mut defrosting = idle.clone();
    defrosting.defrost_status = 1;

    let idle = engine.rank(vec![idle], 1).expect("ranks").cabinets[0].clone();
    let hot = engine.rank(vec![defrosting], 1).expect("ranks").cabinets[0].clone();

    let weights = engine.policy().weights;
    let expected_gap = weights.w_defrost * (1.0 - engine.policy().defrost.active_subscore)
        + weights.w_dload * (idle.sub_scores.dload - hot.sub_scores.dload);
    assert_eq!(hot.sub_scores.dload, 0.0);
    assert!((idle.weighted_sum - hot.weighted_sum - expected_gap).abs() < 1e-12);
    assert_eq!(hot.unloadability_score, 0.8 * hot.weighted_sum);
}

#[test]
fn defrosting_cabinets_ignore_elapsed_time_since_last_defrost() {
    let engine = engine();
    let mut fresh = refrigerator("R-01", 4.0);
    fresh.defrost_status = 1;
    fresh.time_since_defrost_min = 0;
    let mut stale = refrigerator("R-02", 4.0);
    stale.defrost_status = 1;
    stale.time_since_defrost_min = 600;

    let ranking = engine.rank(vec![stale, fresh], 1).expect("ranks");

    let [first, second] = &ranking.cabinets[..] else {
        panic!("expected two cabinets");
    };
    assert_eq!(first.cabinet_id().as_str(), "R-01");
    assert_eq!(first.sub_scores.dload, 0.0);
    assert_eq!(second.sub_scores.dload, 0.0);
    assert_eq!(first.unloadability_score, second.unloadability_score);
}

#[test]
fn validated_cabinets_rank_under_the_policy_that_accepted_them() {
    let policy = policy();
    let validated = validate_cabinets(
        vec![refrigerator("R-01", 4.0), freezer("F-01", -19.0)],
        &policy,
    )
    .expect("valid input");

    let ranking = rank(&validated, BusinessHours::Open);

    assert_eq!(ranking.cabinets.len(), validated.len());
    let mut ids: Vec<&str> = ranking
        .ranked_cabinet_ids
        .iter()
        .map(|id| id.as_str())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["F-01", "R-01"]);
}

#[test]
fn silent_probes_fall_back_without_failing() {
    let engine = engine();
    let ranking = engine
        .rank(
            vec![
                CabinetSnapshot::new("R-01", CabinetType::Refrigerator),
                CabinetSnapshot::new("F-01", CabinetType::Freezer),
            ],
            0,
        )
        .expect("ranks");

    for cabinet in &ranking.cabinets {
        assert_eq!(cabinet.sub_scores.time, 0.0);
        assert_eq!(cabinet.sub_scores.energy, 0.5);
        assert_eq!(cabinet.sub_scores.risk, 0.5);
        assert!(cabinet.breached_limits.is_empty());
    }
}

#[test]
fn ranking_is_idempotent() {
    let engine = engine();
    let cabinets = vec![
        freezer("F-01", -17.5),
        refrigerator("R-02", 5.0),
        refrigerator("R-01", 5.0),
        freezer("F-02", -14.0),
    ];

    let first = engine.rank(cabinets.clone(), 1).expect("ranks");
    let second = engine.rank(cabinets, 1).expect("ranks");

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serializes"),
        serde_json::to_string(&second).expect("serializes")
    );
}

#[test]
fn inputs_are_rejected_before_scoring() {
    let engine = engine();

    let duplicate = engine.rank(
        vec![refrigerator("R-01", 4.0), refrigerator("R-01", 5.0)],
        1,
    );
    assert!(matches!(
        duplicate,
        Err(EvaluationError::Input(InputError::DuplicateCabinetId(_)))
    ));

    let bad_flag = engine.rank(vec![refrigerator("R-01", 4.0)], 2);
    assert!(matches!(
        bad_flag,
        Err(EvaluationError::Input(InputError::InvalidBusinessHours(2)))
    ));

    let mut fridge_only = policy();
    fridge_only.thresholds.remove(&CabinetType::Freezer);
    let missing = engine_with(fridge_only).rank(vec![freezer("F-01", -20.0)], 1);
    assert!(matches!(
        missing,
        Err(EvaluationError::Policy(PolicyError::MissingThresholds(
            CabinetType::Freezer
        )))
    ));
}

#[test]
fn evaluate_wraps_ranking_in_console_response() {
    let engine = engine();

    let response = engine
        .evaluate(request(vec![freezer("F-01", -19.0), refrigerator("R-01", 4.0)]))
        .expect("evaluates");

    assert_eq!(response.store_id, "S001");
    assert!(response.targets.kw_reduction_goal.is_none());
    let ordered: Vec<_> = response
        .cabinets
        .iter()
        .map(|cabinet| cabinet.cabinet_id().clone())
        .collect();
    assert_eq!(ordered, response.ranked_cabinet_ids);
}

#[test]
fn shared_policy_serves_concurrent_callers() {
    let engine = Arc::new(engine());
    let cabinets = vec![refrigerator("R-01", 4.0), freezer("F-01", -18.0)];
    let expected = engine.rank(cabinets.clone(), 1).expect("ranks");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine: Arc<UnloadabilityEngine> = Arc::clone(&engine);
            let cabinets = cabinets.clone();
            std::thread::spawn(move || engine.rank(cabinets, 1).expect("ranks"))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("thread joins"), expected);
    }
}
