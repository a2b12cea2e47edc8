use std::collections::HashSet;

use super::domain::{BusinessHours, CabinetId, CabinetSnapshot};
use super::policy::{CabinetThresholds, PolicyConfig, PolicyError};

/// Request-level input failures. Any one of them rejects the whole request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("cabinet at position {index} has an empty cabinet_id")]
    EmptyCabinetId { index: usize },
    #[error("cabinet_id {0} appears more than once")]
    DuplicateCabinetId(CabinetId),
    #[error("cabinet {cabinet_id}: time_since_defrost_min must be non-negative (got {value})")]
    NegativeTimeSinceDefrost { cabinet_id: CabinetId, value: i64 },
    #[error("cabinet {cabinet_id}: defrost_status must be 0 or 1 (got {value})")]
    InvalidDefrostStatus { cabinet_id: CabinetId, value: u8 },
    #[error("cabinet {cabinet_id}: {field} is not a finite temperature")]
    NonFiniteReading {
        cabinet_id: CabinetId,
        field: &'static str,
    },
    #[error("business_hours_flag must be 0 or 1 (got {0})")]
    InvalidBusinessHours(u8),
}

/// Either half of the caller contract can fail; neither is partially applied.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Cabinets that satisfied the caller contract, bound to the policy they were checked
/// against. Each cabinet carries the threshold table that scores it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCabinets<'p> {
    policy: &'p PolicyConfig,
    entries: Vec<(CabinetSnapshot, &'p CabinetThresholds)>,
}

impl<'p> ValidatedCabinets<'p> {
    pub fn policy(&self) -> &'p PolicyConfig {
        self.policy
    }

    pub fn iter(&self) -> impl Iterator<Item = &CabinetSnapshot> {
        self.entries.iter().map(|(snapshot, _)| snapshot)
    }

    pub(crate) fn entries(&self) -> &[(CabinetSnapshot, &'p CabinetThresholds)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn business_hours(flag: u8) -> Result<BusinessHours, InputError> {
    BusinessHours::from_flag(flag).ok_or(InputError::InvalidBusinessHours(flag))
}

/// Enforce unique ids, sane flags and a threshold table for every type present.
pub fn validate_cabinets(
    cabinets: Vec<CabinetSnapshot>,
    policy: &PolicyConfig,
) -> Result<ValidatedCabinets<'_>, EvaluationError> {
    let mut seen: HashSet<&CabinetId> = HashSet::with_capacity(cabinets.len());
    let mut tables = Vec::with_capacity(cabinets.len());

    for (index, cabinet) in cabinets.iter().enumerate() {
        let id = &cabinet.cabinet_id;
        if id.as_str().trim().is_empty() {
            return Err(InputError::EmptyCabinetId { index }.into());
        }
        if !seen.insert(id) {
            return Err(InputError::DuplicateCabinetId(id.clone()).into());
        }
        if cabinet.time_since_defrost_min < 0 {
            return Err(InputError::NegativeTimeSinceDefrost {
                cabinet_id: id.clone(),
                value: cabinet.time_since_defrost_min,
            }
            .into());
        }
        if cabinet.defrost_status > 1 {
            return Err(InputError::InvalidDefrostStatus {
                cabinet_id: id.clone(),
                value: cabinet.defrost_status,
            }
            .into());
        }
        for (field, reading) in [
            ("air_supply_c", cabinet.air_supply_c),
            ("air_return_c", cabinet.air_return_c),
            ("prod_t_mw_chill_c", cabinet.prod_t_mw_chill_c),
            ("prod_t_milk_c", cabinet.prod_t_milk_c),
            ("prod_t_mw_freeze_c", cabinet.prod_t_mw_freeze_c),
        ] {
            if reading.is_some_and(|value| !value.is_finite()) {
                return Err(InputError::NonFiniteReading {
                    cabinet_id: id.clone(),
                    field,
                }
                .into());
            }
        }
        let table = policy
            .thresholds_for(cabinet.cabinet_type)
            .ok_or(PolicyError::MissingThresholds(cabinet.cabinet_type))?;
        tables.push(table);
    }

    Ok(ValidatedCabinets {
        policy,
        entries: cabinets.into_iter().zip(tables).collect(),
    })
}
