use std::cmp::Ordering;

use super::domain::{Ranking, ScoredCabinet};

/// Shed order: safety bucket, then higher score first, then cabinet id ascending.
pub fn shed_order(a: &ScoredCabinet, b: &ScoredCabinet) -> Ordering {
    a.classification
        .cmp(&b.classification)
        .then_with(|| b.unloadability_score.total_cmp(&a.unloadability_score))
        .then_with(|| a.cabinet_id().cmp(b.cabinet_id()))
}

/// Sorts every scored cabinet into shed order and stamps 1-based ranks.
pub fn rank_scored(mut cabinets: Vec<ScoredCabinet>) -> Ranking {
    cabinets.sort_by(shed_order);

    for (position, cabinet) in cabinets.iter_mut().enumerate() {
        cabinet.rank = position + 1;
    }

    let ranked_cabinet_ids = cabinets
        .iter()
        .map(|cabinet| cabinet.cabinet_id().clone())
        .collect();

    Ranking {
        cabinets,
        ranked_cabinet_ids,
    }
}
