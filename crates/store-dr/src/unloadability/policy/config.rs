use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::CabinetType;
use super::PolicyError;

/// Validated, immutable scoring policy for one store.
///
/// Construct through [`PolicyConfig::from_yaml_str`](super::PolicyConfig::from_yaml_str) or
/// call [`PolicyConfig::validate`] after building one by hand; the engine assumes it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub thresholds: BTreeMap<CabinetType, CabinetThresholds>,
    pub defrost: DefrostPolicy,
    pub weights: ScoreWeights,
    #[serde(default)]
    pub classification: ClassificationPolicy,
    #[serde(default)]
    pub occupancy: OccupancyPolicy,
}

/// Per-type temperature limits. Surface limits only apply to the type that carries the probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CabinetThresholds {
    pub air_return_c_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milk_surface_c_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chill_mw_surface_c_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mw_freeze_surface_c_max: Option<f64>,
    pub rise_c_per_min_max: f64,
    /// Distance below a limit at which the risk sub-score saturates at 1.
    #[serde(default = "default_safety_band_c")]
    pub safety_band_c: f64,
    /// Supply-to-return delta that earns a full energy sub-score.
    #[serde(default = "default_nominal_delta_c")]
    pub nominal_delta_c: f64,
    /// Energy sub-score used when either air probe is silent.
    #[serde(default = "default_energy_baseline")]
    pub energy_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefrostPolicy {
    pub grace_min: u32,
    pub penalty_factor: f64,
    #[serde(default = "default_active_subscore")]
    pub active_subscore: f64,
}

/// Linear coefficients of the composite score. They are not renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreWeights {
    pub w_time: f64,
    pub w_energy: f64,
    pub w_risk: f64,
    pub w_open: f64,
    pub w_dload: f64,
    pub w_defrost: f64,
}

impl ScoreWeights {
    pub fn uniform(weight: f64) -> Self {
        Self {
            w_time: weight,
            w_energy: weight,
            w_risk: weight,
            w_open: weight,
            w_dload: weight,
            w_defrost: weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.named().iter().map(|(_, value)| value).sum()
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("w_time", self.w_time),
            ("w_energy", self.w_energy),
            ("w_risk", self.w_risk),
            ("w_open", self.w_open),
            ("w_dload", self.w_dload),
            ("w_defrost", self.w_defrost),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationPolicy {
    /// Risk sub-scores below this band are flagged `eligible_with_caution`.
    #[serde(default = "default_caution_band")]
    pub caution_band: f64,
    /// Minutes of headroom that earn a full time-margin sub-score.
    #[serde(default = "default_time_horizon_min")]
    pub time_horizon_min: f64,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            caution_band: default_caution_band(),
            time_horizon_min: default_time_horizon_min(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OccupancyPolicy {
    #[serde(default = "default_open_score")]
    pub open_score: f64,
    #[serde(default = "default_closed_score")]
    pub closed_score: f64,
}

impl Default for OccupancyPolicy {
    fn default() -> Self {
        Self {
            open_score: default_open_score(),
            closed_score: default_closed_score(),
        }
    }
}

fn default_safety_band_c() -> f64 {
    5.0
}

fn default_nominal_delta_c() -> f64 {
    6.0
}

fn default_energy_baseline() -> f64 {
    0.5
}

fn default_active_subscore() -> f64 {
    0.1
}

fn default_caution_band() -> f64 {
    0.4
}

fn default_time_horizon_min() -> f64 {
    30.0
}

fn default_open_score() -> f64 {
    0.3
}

fn default_closed_score() -> f64 {
    1.0
}

impl PolicyConfig {
    pub fn thresholds_for(&self, cabinet_type: CabinetType) -> Option<&CabinetThresholds> {
        self.thresholds.get(&cabinet_type)
    }

    /// Reject anything the engine would otherwise have to second-guess at scoring time.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.thresholds.is_empty() {
            return Err(PolicyError::NoThresholds);
        }

        for (cabinet_type, table) in &self.thresholds {
            table.validate(*cabinet_type)?;
        }

        for (name, value) in self.weights.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(PolicyError::InvalidWeight { name, value });
            }
        }

        let defrost = &self.defrost;
        unit_interval("defrost.penalty_factor", defrost.penalty_factor)?;
        unit_interval("defrost.active_subscore", defrost.active_subscore)?;

        unit_interval(
            "classification.caution_band",
            self.classification.caution_band,
        )?;
        positive(
            "classification.time_horizon_min",
            self.classification.time_horizon_min,
        )?;

        let occupancy = &self.occupancy;
        unit_interval("occupancy.open_score", occupancy.open_score)?;
        unit_interval("occupancy.closed_score", occupancy.closed_score)?;
        if occupancy.open_score > occupancy.closed_score {
            return Err(PolicyError::OccupancyInverted {
                open_score: occupancy.open_score,
                closed_score: occupancy.closed_score,
            });
        }

        Ok(())
    }
}

impl CabinetThresholds {
    /// Surface limits configured for this table, paired with their field names.
    fn surface_limits(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("milk_surface_c_max", self.milk_surface_c_max),
            ("chill_mw_surface_c_max", self.chill_mw_surface_c_max),
            ("mw_freeze_surface_c_max", self.mw_freeze_surface_c_max),
        ]
    }

    fn validate(&self, cabinet_type: CabinetType) -> Result<(), PolicyError> {
        let section = cabinet_type.label();

        finite(section, "air_return_c_max", self.air_return_c_max)?;
        for (field, limit) in self.surface_limits() {
            let Some(limit) = limit else { continue };
            if !applies_to(field, cabinet_type) {
                return Err(PolicyError::InapplicableThreshold {
                    cabinet_type,
                    field,
                });
            }
            finite(section, field, limit)?;
        }

        if !(self.rise_c_per_min_max.is_finite() && self.rise_c_per_min_max > 0.0) {
            return Err(PolicyError::InvalidThreshold {
                cabinet_type,
                field: "rise_c_per_min_max",
                value: self.rise_c_per_min_max,
            });
        }
        if !(self.safety_band_c.is_finite() && self.safety_band_c > 0.0) {
            return Err(PolicyError::InvalidThreshold {
                cabinet_type,
                field: "safety_band_c",
                value: self.safety_band_c,
            });
        }
        if !(self.nominal_delta_c.is_finite() && self.nominal_delta_c > 0.0) {
            return Err(PolicyError::InvalidThreshold {
                cabinet_type,
                field: "nominal_delta_c",
                value: self.nominal_delta_c,
            });
        }
        if !(0.0..=1.0).contains(&self.energy_baseline) {
            return Err(PolicyError::InvalidThreshold {
                cabinet_type,
                field: "energy_baseline",
                value: self.energy_baseline,
            });
        }

        Ok(())
    }
}

fn applies_to(field: &str, cabinet_type: CabinetType) -> bool {
    match field {
        "milk_surface_c_max" | "chill_mw_surface_c_max" => {
            cabinet_type == CabinetType::Refrigerator
        }
        "mw_freeze_surface_c_max" => cabinet_type == CabinetType::Freezer,
        _ => true,
    }
}

fn finite(section: &str, field: &'static str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PolicyError::NonFinite {
            section: section.to_string(),
            field,
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::OutOfRange { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PolicyError::OutOfRange { field, value })
    }
}
