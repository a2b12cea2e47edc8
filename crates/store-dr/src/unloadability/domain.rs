use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a physical cabinet, unique within one evaluation request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CabinetId(pub String);

impl CabinetId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CabinetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CabinetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Declared cabinet type; selects the threshold table that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinetType {
    Refrigerator,
    Freezer,
}

impl CabinetType {
    pub const ALL: [CabinetType; 2] = [CabinetType::Refrigerator, CabinetType::Freezer];

    pub fn label(&self) -> &'static str {
        match self {
            CabinetType::Refrigerator => "refrigerator",
            CabinetType::Freezer => "freezer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "refrigerator" => Some(Self::Refrigerator),
            "freezer" => Some(Self::Freezer),
            _ => None,
        }
    }
}

impl fmt::Display for CabinetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One telemetry reading per physical cabinet, as supplied by the caller.
///
/// Temperatures are Celsius; `None` means the sensor is not reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinetSnapshot {
    pub cabinet_id: CabinetId,
    #[serde(rename = "type")]
    pub cabinet_type: CabinetType,
    #[serde(default)]
    pub air_supply_c: Option<f64>,
    #[serde(default)]
    pub air_return_c: Option<f64>,
    #[serde(default)]
    pub prod_t_mw_chill_c: Option<f64>,
    #[serde(default)]
    pub prod_t_milk_c: Option<f64>,
    #[serde(default)]
    pub prod_t_mw_freeze_c: Option<f64>,
    /// Wire flag: 0 = normal, 1 = actively defrosting.
    #[serde(default)]
    pub defrost_status: u8,
    #[serde(default)]
    pub time_since_defrost_min: i64,
}

impl CabinetSnapshot {
    pub fn new(cabinet_id: impl Into<String>, cabinet_type: CabinetType) -> Self {
        Self {
            cabinet_id: CabinetId(cabinet_id.into()),
            cabinet_type,
            air_supply_c: None,
            air_return_c: None,
            prod_t_mw_chill_c: None,
            prod_t_milk_c: None,
            prod_t_mw_freeze_c: None,
            defrost_status: 0,
            time_since_defrost_min: 0,
        }
    }

    pub fn is_defrosting(&self) -> bool {
        self.defrost_status == 1
    }
}

/// Store-wide trading state for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessHours {
    Closed,
    Open,
}

impl BusinessHours {
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            _ => None,
        }
    }

    pub fn flag(&self) -> u8 {
        match self {
            BusinessHours::Closed => 0,
            BusinessHours::Open => 1,
        }
    }
}

/// Safety bucket assigned to every scored cabinet. Declaration order is shed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    Eligible,
    EligibleWithCaution,
    Ineligible,
}

impl RiskClass {
    pub fn label(&self) -> &'static str {
        match self {
            RiskClass::Eligible => "eligible",
            RiskClass::EligibleWithCaution => "eligible_with_caution",
            RiskClass::Ineligible => "ineligible",
        }
    }

    pub fn is_sheddable(&self) -> bool {
        !matches!(self, RiskClass::Ineligible)
    }
}

/// Sub-scores in [0, 1]; 1 is most shed-friendly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub time: f64,
    pub energy: f64,
    pub risk: f64,
    pub open: f64,
    pub dload: f64,
    pub defrost: f64,
}

/// A cabinet annotated with its scores, classification and shed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCabinet {
    #[serde(flatten)]
    pub snapshot: CabinetSnapshot,
    pub sub_scores: SubScores,
    /// Weighted sum before the defrost multiplier.
    pub weighted_sum: f64,
    pub penalty_multiplier: f64,
    pub unloadability_score: f64,
    pub classification: RiskClass,
    pub breached_limits: Vec<String>,
    /// 1-based position in the shed order.
    pub rank: usize,
}

impl ScoredCabinet {
    pub fn cabinet_id(&self) -> &CabinetId {
        &self.snapshot.cabinet_id
    }
}

/// Ordered engine output: safest-to-shed first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub cabinets: Vec<ScoredCabinet>,
    pub ranked_cabinet_ids: Vec<CabinetId>,
}

impl Ranking {
    pub fn eligible_count(&self) -> usize {
        self.cabinets
            .iter()
            .filter(|cabinet| cabinet.classification.is_sheddable())
            .count()
    }
}

/// Request body accepted by the evaluate endpoint and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub store_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub business_hours_flag: u8,
    pub cabinets: Vec<CabinetSnapshot>,
}

/// Demand-response targets echoed back to callers; not yet populated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheddingTargets {
    pub kw_reduction_goal: Option<f64>,
}

/// Response body in the shape the legacy console expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    pub store_id: String,
    pub evaluated_at: DateTime<FixedOffset>,
    pub targets: SheddingTargets,
    pub cabinets: Vec<ScoredCabinet>,
    pub ranked_cabinet_ids: Vec<CabinetId>,
}
