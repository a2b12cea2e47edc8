use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{CabinetId, CabinetSnapshot, CabinetType};

/// Column order shared by the console table, the template, and the importer.
pub const CABINET_COLUMNS: [&str; 9] = [
    "cabinet_id",
    "type",
    "air_supply_c",
    "air_return_c",
    "prod_t_mw_chill_c",
    "prod_t_milk_c",
    "prod_t_mw_freeze_c",
    "defrost_status",
    "time_since_defrost_min",
];

#[derive(Debug)]
pub enum CabinetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, message: String },
}

impl fmt::Display for CabinetImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CabinetImportError::Io(err) => write!(f, "failed to read cabinet table: {}", err),
            CabinetImportError::Csv(err) => write!(f, "invalid cabinet CSV data: {}", err),
            CabinetImportError::Row { line, message } => {
                write!(f, "cabinet table line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for CabinetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CabinetImportError::Io(err) => Some(err),
            CabinetImportError::Csv(err) => Some(err),
            CabinetImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for CabinetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CabinetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads the cabinet table exported from the store console.
pub struct CabinetCsvImporter;

impl CabinetCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CabinetSnapshot>, CabinetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows missing an id or a type are placeholders in the console table and are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CabinetSnapshot>, CabinetImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut record = csv::StringRecord::new();
        let mut cabinets = Vec::new();

        while csv_reader.read_record(&mut record)? {
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let row: CabinetRow = record.deserialize(Some(&headers))?;
            if let Some(snapshot) = row.into_snapshot(line)? {
                cabinets.push(snapshot);
            }
        }

        Ok(cabinets)
    }
}

#[derive(Debug, Deserialize)]
struct CabinetRow {
    #[serde(default, deserialize_with = "blank_as_none")]
    cabinet_id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    cabinet_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    air_supply_c: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    air_return_c: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    prod_t_mw_chill_c: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    prod_t_milk_c: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    prod_t_mw_freeze_c: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    defrost_status: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    time_since_defrost_min: Option<String>,
}

impl CabinetRow {
    fn into_snapshot(self, line: u64) -> Result<Option<CabinetSnapshot>, CabinetImportError> {
        let (Some(cabinet_id), Some(raw_type)) = (self.cabinet_id, self.cabinet_type) else {
            return Ok(None);
        };
        let row_error = |message: String| CabinetImportError::Row { line, message };

        let cabinet_type = CabinetType::parse(&raw_type)
            .ok_or_else(|| row_error(format!("unknown cabinet type '{raw_type}'")))?;

        let temperature = |field: &str, raw: Option<String>| -> Result<Option<f64>, CabinetImportError> {
            match raw {
                None => Ok(None),
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) if value.is_nan() => Ok(None),
                    Ok(value) if value.is_finite() => Ok(Some(value)),
                    _ => Err(row_error(format!("{field} '{raw}' is not a temperature"))),
                },
            }
        };
        let whole = |field: &str, raw: Option<String>| -> Result<i64, CabinetImportError> {
            let Some(raw) = raw else { return Ok(0) };
            match raw.parse::<f64>() {
                Ok(value) if value.is_nan() => Ok(0),
                Ok(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                    Ok(value as i64)
                }
                _ => Err(row_error(format!("{field} '{raw}' is not a whole number"))),
            }
        };

        let defrost_status = whole("defrost_status", self.defrost_status)?;
        let defrost_status = u8::try_from(defrost_status)
            .map_err(|_| row_error(format!("defrost_status {defrost_status} is out of range")))?;

        Ok(Some(CabinetSnapshot {
            cabinet_id: CabinetId(cabinet_id),
            cabinet_type,
            air_supply_c: temperature("air_supply_c", self.air_supply_c)?,
            air_return_c: temperature("air_return_c", self.air_return_c)?,
            prod_t_mw_chill_c: temperature("prod_t_mw_chill_c", self.prod_t_mw_chill_c)?,
            prod_t_milk_c: temperature("prod_t_milk_c", self.prod_t_milk_c)?,
            prod_t_mw_freeze_c: temperature("prod_t_mw_freeze_c", self.prod_t_mw_freeze_c)?,
            defrost_status,
            time_since_defrost_min: whole("time_since_defrost_min", self.time_since_defrost_min)?,
        }))
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| {
        let trimmed = value.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("nan")
    }))
}

/// Placeholder rows (`R-01..`, then `F-01..`) with silent probes and cleared flags.
pub fn cabinet_template(refrigerators: usize, freezers: usize) -> Vec<CabinetSnapshot> {
    let fridges = (1..=refrigerators)
        .map(|n| CabinetSnapshot::new(format!("R-{n:02}"), CabinetType::Refrigerator));
    let freezer_rows =
        (1..=freezers).map(|n| CabinetSnapshot::new(format!("F-{n:02}"), CabinetType::Freezer));
    fridges.chain(freezer_rows).collect()
}

pub fn write_cabinet_csv<W: Write>(
    writer: W,
    cabinets: &[CabinetSnapshot],
) -> Result<(), CabinetImportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CABINET_COLUMNS)?;
    for cabinet in cabinets {
        csv_writer.serialize(cabinet)?;
    }
    csv_writer.flush()?;
    Ok(())
}
