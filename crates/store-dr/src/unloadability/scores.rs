//! Sub-score calculators. Every function returns a value in `[0, 1]`, where 1 is
//! "most shed-friendly" and 0 is "must not be shed".

use super::domain::{BusinessHours, CabinetSnapshot, CabinetType, SubScores};
use super::policy::{CabinetThresholds, PolicyConfig};

/// Risk sub-score assumed for a limit whose probe is silent.
pub const NEUTRAL_RISK: f64 = 0.5;

/// A temperature limit that applies to a cabinet, paired with the matching probe value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LimitReading {
    pub name: &'static str,
    pub limit: f64,
    pub value: Option<f64>,
}

impl LimitReading {
    /// Degrees of headroom below the limit; negative or zero once breached.
    fn margin_c(&self) -> Option<f64> {
        self.value.map(|value| self.limit - value)
    }

    pub fn is_breached(&self) -> bool {
        self.value.map(|value| value >= self.limit).unwrap_or(false)
    }
}

pub(crate) fn limit_readings(
    snapshot: &CabinetSnapshot,
    thresholds: &CabinetThresholds,
) -> Vec<LimitReading> {
    let mut readings = vec![LimitReading {
        name: "air_return_c_max",
        limit: thresholds.air_return_c_max,
        value: snapshot.air_return_c,
    }];

    let surfaces = match snapshot.cabinet_type {
        CabinetType::Refrigerator => [
            ("milk_surface_c_max", thresholds.milk_surface_c_max, snapshot.prod_t_milk_c),
            (
                "chill_mw_surface_c_max",
                thresholds.chill_mw_surface_c_max,
                snapshot.prod_t_mw_chill_c,
            ),
        ]
        .to_vec(),
        CabinetType::Freezer => [(
            "mw_freeze_surface_c_max",
            thresholds.mw_freeze_surface_c_max,
            snapshot.prod_t_mw_freeze_c,
        )]
        .to_vec(),
    };

    readings.extend(surfaces.into_iter().filter_map(|(name, limit, value)| {
        limit.map(|limit| LimitReading { name, limit, value })
    }));
    readings
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Minutes until the first limit would be reached at the maximum allowed warming rate,
/// relative to the configured horizon. A silent probe counts as no headroom.
pub fn time_margin(readings: &[LimitReading], thresholds: &CabinetThresholds, horizon_min: f64) -> f64 {
    readings
        .iter()
        .map(|reading| match reading.margin_c() {
            Some(margin) => unit(margin / thresholds.rise_c_per_min_max / horizon_min),
            None => 0.0,
        })
        .fold(1.0, f64::min)
}

/// Shed savings potential from the supply-to-return air delta.
pub fn energy(snapshot: &CabinetSnapshot, thresholds: &CabinetThresholds) -> f64 {
    match (snapshot.air_supply_c, snapshot.air_return_c) {
        (Some(supply), Some(ret)) => unit((ret - supply) / thresholds.nominal_delta_c),
        _ => unit(thresholds.energy_baseline),
    }
}

/// Proximity to the nearest limit, normalized by the type's safety band.
pub fn risk(readings: &[LimitReading], thresholds: &CabinetThresholds) -> f64 {
    readings
        .iter()
        .map(|reading| {
            if reading.is_breached() {
                return 0.0;
            }
            match reading.margin_c() {
                Some(margin) => unit(margin / thresholds.safety_band_c),
                None => NEUTRAL_RISK,
            }
        })
        .fold(1.0, f64::min)
}

pub fn occupancy(hours: BusinessHours, policy: &PolicyConfig) -> f64 {
    match hours {
        BusinessHours::Open => policy.occupancy.open_score,
        BusinessHours::Closed => policy.occupancy.closed_score,
    }
}

/// Ramps from 0 at the end of defrost to 1 at twice the grace period. While a defrost is
/// running the elapsed time is stale, so the cabinet counts as freshly defrosted.
pub fn defrost_load(snapshot: &CabinetSnapshot, policy: &PolicyConfig) -> f64 {
    if snapshot.is_defrosting() {
        return 0.0;
    }
    let grace = f64::from(policy.defrost.grace_min);
    if grace == 0.0 {
        return 1.0;
    }
    unit(snapshot.time_since_defrost_min as f64 / (2.0 * grace))
}

/// Returns `(sub_score, composite_multiplier)`.
pub fn defrost_penalty(snapshot: &CabinetSnapshot, policy: &PolicyConfig) -> (f64, f64) {
    if snapshot.is_defrosting() {
        (policy.defrost.active_subscore, policy.defrost.penalty_factor)
    } else {
        (1.0, 1.0)
    }
}

/// All six sub-scores plus the defrost multiplier for one cabinet.
pub(crate) fn sub_scores(
    snapshot: &CabinetSnapshot,
    readings: &[LimitReading],
    thresholds: &CabinetThresholds,
    hours: BusinessHours,
    policy: &PolicyConfig,
) -> (SubScores, f64) {
    let (defrost, multiplier) = defrost_penalty(snapshot, policy);
    let scores = SubScores {
        time: time_margin(readings, thresholds, policy.classification.time_horizon_min),
        energy: energy(snapshot, thresholds),
        risk: risk(readings, thresholds),
        open: occupancy(hours, policy),
        dload: defrost_load(snapshot, policy),
        defrost,
    };
    (scores, multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fridge() -> CabinetSnapshot {
        let mut snapshot = CabinetSnapshot::new("R-01", CabinetType::Refrigerator);
        snapshot.air_supply_c = Some(1.0);
        snapshot.air_return_c = Some(4.0);
        snapshot.prod_t_milk_c = Some(3.0);
        snapshot.prod_t_mw_chill_c = Some(5.0);
        snapshot.time_since_defrost_min = 60;
        snapshot
    }

    fn fridge_limits(policy: &PolicyConfig) -> &CabinetThresholds {
        policy
            .thresholds_for(CabinetType::Refrigerator)
            .expect("refrigerator table")
    }

    #[test]
    fn refrigerator_exposes_air_and_both_surface_limits() {
        let policy = PolicyConfig::standard();
        let readings = limit_readings(&fridge(), fridge_limits(&policy));
        let names: Vec<_> = readings.iter().map(|reading| reading.name).collect();
        assert_eq!(
            names,
            vec!["air_return_c_max", "milk_surface_c_max", "chill_mw_surface_c_max"]
        );
    }

    #[test]
    fn time_margin_uses_tightest_limit() {
        let policy = PolicyConfig::standard();
        let limits = fridge_limits(&policy);
        let readings = limit_readings(&fridge(), limits);

        // Milk: 3C headroom at 0.5C/min is 6 minutes of a 30 minute horizon.
        let score = time_margin(&readings, limits, 30.0);

        assert!((score - 0.2).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn time_margin_is_zero_when_a_probe_is_silent() {
        let policy = PolicyConfig::standard();
        let limits = fridge_limits(&policy);
        let mut snapshot = fridge();
        snapshot.prod_t_milk_c = None;

        let readings = limit_readings(&snapshot, limits);

        assert_eq!(time_margin(&readings, limits, 30.0), 0.0);
    }

    #[test]
    fn freezer_margin_counts_degrees_below_negative_limit() {
        let policy = PolicyConfig::standard();
        let limits = policy
            .thresholds_for(CabinetType::Freezer)
            .expect("freezer table");
        let mut snapshot = CabinetSnapshot::new("F-01", CabinetType::Freezer);
        snapshot.air_return_c = Some(-21.0);
        snapshot.prod_t_mw_freeze_c = Some(-18.0);

        let readings = limit_readings(&snapshot, limits);

        // Both probes sit 6C under their limits: 15 minutes at 0.4C/min.
        assert!((time_margin(&readings, limits, 30.0) - 0.5).abs() < 1e-9);
        assert!((risk(&readings, limits) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn energy_scales_with_delta_and_falls_back_to_baseline() {
        let policy = PolicyConfig::standard();
        let limits = fridge_limits(&policy);

        assert!((energy(&fridge(), limits) - 0.5).abs() < 1e-9);

        let mut wide = fridge();
        wide.air_supply_c = Some(-5.0);
        assert_eq!(energy(&wide, limits), 1.0);

        let mut silent = fridge();
        silent.air_supply_c = None;
        assert_eq!(energy(&silent, limits), limits.energy_baseline);
    }

    #[test]
    fn risk_drops_to_zero_on_breach_and_equality() {
        let policy = PolicyConfig::standard();
        let limits = fridge_limits(&policy);
        let mut snapshot = fridge();
        snapshot.air_return_c = Some(7.0);

        let readings = limit_readings(&snapshot, limits);

        assert!(readings[0].is_breached());
        assert_eq!(risk(&readings, limits), 0.0);
    }

    #[test]
    fn risk_is_neutral_for_silent_probe() {
        let policy = PolicyConfig::standard();
        let limits = fridge_limits(&policy);
        let mut snapshot = fridge();
        snapshot.air_return_c = Some(-10.0);
        snapshot.prod_t_milk_c = Some(-10.0);
        snapshot.prod_t_mw_chill_c = None;

        let readings = limit_readings(&snapshot, limits);

        assert_eq!(risk(&readings, limits), NEUTRAL_RISK);
    }

    #[test]
    fn occupancy_is_lower_while_trading() {
        let policy = PolicyConfig::standard();
        assert!(occupancy(BusinessHours::Open, &policy) < occupancy(BusinessHours::Closed, &policy));
    }

    #[test]
    fn defrost_load_ramps_through_grace_period() {
        let policy = PolicyConfig::standard();
        let mut snapshot = fridge();

        snapshot.time_since_defrost_min = 0;
        assert_eq!(defrost_load(&snapshot, &policy), 0.0);

        snapshot.time_since_defrost_min = 5;
        assert!((defrost_load(&snapshot, &policy) - 0.5).abs() < 1e-9);

        snapshot.time_since_defrost_min = 240;
        assert_eq!(defrost_load(&snapshot, &policy), 1.0);
    }

    #[test]
    fn zero_grace_means_fully_settled() {
        let mut policy = PolicyConfig::standard();
        policy.defrost.grace_min = 0;
        let mut snapshot = fridge();
        snapshot.time_since_defrost_min = 0;

        assert_eq!(defrost_load(&snapshot, &policy), 1.0);
    }

    #[test]
    fn active_defrost_uses_penalty_factor() {
        let policy = PolicyConfig::standard();
        let mut snapshot = fridge();

        assert_eq!(defrost_penalty(&snapshot, &policy), (1.0, 1.0));

        snapshot.defrost_status = 1;
        assert_eq!(defrost_penalty(&snapshot, &policy), (0.1, 0.8));
    }

    #[test]
    fn defrost_load_ignores_stale_elapsed_time_during_defrost() {
        let policy = PolicyConfig::standard();
        let mut fresh = fridge();
        fresh.defrost_status = 1;
        fresh.time_since_defrost_min = 0;
        let mut stale = fresh.clone();
        stale.time_since_defrost_min = 600;

        assert_eq!(defrost_load(&fresh, &policy), 0.0);
        assert_eq!(defrost_load(&stale, &policy), 0.0);

        let mut zero_grace = policy.clone();
        zero_grace.defrost.grace_min = 0;
        assert_eq!(defrost_load(&stale, &zero_grace), 0.0);
    }
}
