use chrono::{DateTime, FixedOffset};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use store_dr::error::AppError;
use store_dr::unloadability::{BusinessHours, CabinetCsvImporter, CabinetSnapshot, PolicySource};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) policy_source: Arc<PolicySource>,
}

pub(crate) fn parse_business_hours(raw: &str) -> Result<u8, String> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .and_then(BusinessHours::from_flag)
        .map(|hours| hours.flag())
        .ok_or_else(|| format!("business hours flag must be 0 or 1 (got '{raw}')"))
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|err| format!("failed to parse '{raw}' as an ISO-8601 timestamp ({err})"))
}

/// Reads a cabinet table, choosing the format from the file extension.
pub(crate) fn load_cabinets(path: &Path) -> Result<Vec<CabinetSnapshot>, AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    } else {
        Ok(CabinetCsvImporter::from_path(path)?)
    }
}

pub(crate) fn describe_source(source: &PolicySource) -> String {
    match source {
        PolicySource::File(path) => path.display().to_string(),
        PolicySource::BuiltIn => "built-in".to_string(),
    }
}
