mod config;
mod store;

pub use config::{
    CabinetThresholds, ClassificationPolicy, DefrostPolicy, OccupancyPolicy, PolicyConfig,
    ScoreWeights,
};
pub use store::{PolicySource, PolicyStore};

use super::domain::CabinetType;

/// Policy shipped with the store console; used when no `config.yaml` has been saved yet.
pub const DEFAULT_POLICY_YAML: &str = "\
thresholds:
  refrigerator:
    air_return_c_max: 7.0
    milk_surface_c_max: 6.0
    chill_mw_surface_c_max: 8.0
    rise_c_per_min_max: 0.5
  freezer:
    air_return_c_max: -15.0
    mw_freeze_surface_c_max: -12.0
    rise_c_per_min_max: 0.4
defrost:
  grace_min: 5
  penalty_factor: 0.8
weights:
  w_time: 0.35
  w_energy: 0.25
  w_risk: 0.20
  w_open: 0.05
  w_dload: 0.10
  w_defrost: 0.05
";

/// Configuration failures. Always raised before any cabinet is scored.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("policy YAML is malformed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("policy defines no threshold tables")]
    NoThresholds,
    #[error("no threshold table configured for cabinet type {0}")]
    MissingThresholds(CabinetType),
    #[error("{field} does not apply to {cabinet_type} cabinets")]
    InapplicableThreshold {
        cabinet_type: CabinetType,
        field: &'static str,
    },
    #[error("{cabinet_type}.{field} must be positive and finite (got {value})")]
    InvalidThreshold {
        cabinet_type: CabinetType,
        field: &'static str,
        value: f64,
    },
    #[error("{section}.{field} must be a finite temperature")]
    NonFinite { section: String, field: &'static str },
    #[error("weight {name} must be finite and non-negative (got {value})")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("{field} out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("occupancy.open_score {open_score} exceeds closed_score {closed_score}")]
    OccupancyInverted { open_score: f64, closed_score: f64 },
}

impl PolicyConfig {
    /// Parse and validate a YAML policy document.
    pub fn from_yaml_str(raw: &str) -> Result<Self, PolicyError> {
        let config: PolicyConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, PolicyError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The console's default policy; equal to parsing [`DEFAULT_POLICY_YAML`].
    pub fn standard() -> Self {
        let refrigerator = CabinetThresholds {
            air_return_c_max: 7.0,
            milk_surface_c_max: Some(6.0),
            chill_mw_surface_c_max: Some(8.0),
            mw_freeze_surface_c_max: None,
            rise_c_per_min_max: 0.5,
            safety_band_c: 5.0,
            nominal_delta_c: 6.0,
            energy_baseline: 0.5,
        };
        let freezer = CabinetThresholds {
            air_return_c_max: -15.0,
            milk_surface_c_max: None,
            chill_mw_surface_c_max: None,
            mw_freeze_surface_c_max: Some(-12.0),
            rise_c_per_min_max: 0.4,
            ..refrigerator.clone()
        };

        Self {
            thresholds: [
                (CabinetType::Refrigerator, refrigerator),
                (CabinetType::Freezer, freezer),
            ]
            .into_iter()
            .collect(),
            defrost: DefrostPolicy {
                grace_min: 5,
                penalty_factor: 0.8,
                active_subscore: 0.1,
            },
            weights: ScoreWeights {
                w_time: 0.35,
                w_energy: 0.25,
                w_risk: 0.20,
                w_open: 0.05,
                w_dload: 0.10,
                w_defrost: 0.05,
            },
            classification: ClassificationPolicy::default(),
            occupancy: OccupancyPolicy::default(),
        }
    }
}
