//! Loading athlete rows from JSON and CSV exports of the REST layer
//!
//! JSON files hold arrays shaped like the API responses. CSV files of daily
//! biometrics accept the common column-name variants wearables export.
//! Records for one athlete are keyed by date; a repeated date keeps the last
//! row seen. Both formats reject negative biometric readings and malformed
//! clock times.

use crate::aggregation::BiometricField;
use crate::error::{ImportError, MonitorError, Result};
use crate::models::{parse_clock_time, AthleteInputs, DailyBiometricRecord};
use chrono::{NaiveDate, NaiveTime};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(DataFormat::Json),
            "csv" => Ok(DataFormat::Csv),
            other => Err(ImportError::UnsupportedFormat {
                format: other.to_string(),
            }
            .into()),
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ImportError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(fs::read_to_string(path)?)
}

/// Read a JSON array of any row type
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = read_file(path)?;
    let rows: Vec<T> = serde_json::from_str(&content)?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a cohort file: a JSON array of per-athlete inputs
pub fn load_cohort(path: &Path) -> Result<Vec<AthleteInputs>> {
    let mut cohort: Vec<AthleteInputs> = load_json(path)?;
    for inputs in &mut cohort {
        inputs.records.iter().try_for_each(check_record)?;
        inputs.records = dedupe_by_date(std::mem::take(&mut inputs.records));
    }
    info!("Loaded cohort of {} athletes from {}", cohort.len(), path.display());
    Ok(cohort)
}

/// Read daily biometric records from JSON or CSV, keyed by unique date
pub fn load_records(path: &Path) -> Result<Vec<DailyBiometricRecord>> {
    let records = match DataFormat::from_path(path)? {
        DataFormat::Json => {
            let records: Vec<DailyBiometricRecord> = load_json(path)?;
            records.iter().try_for_each(check_record)?;
            records
        }
        DataFormat::Csv => BiometricCsvImporter::new().import_str(&read_file(path)?)?,
    };
    Ok(dedupe_by_date(records))
}

/// Reject a record carrying a negative biometric reading
pub fn check_record(record: &DailyBiometricRecord) -> Result<()> {
    match BiometricField::ALL
        .iter()
        .find(|field| field.extract(record).map_or(false, |v| v < 0.0))
    {
        Some(field) => Err(negative_value(record.date, &field.to_string())),
        None => Ok(()),
    }
}

/// Keep one record per date (the last seen), ordered by date
pub fn dedupe_by_date(records: Vec<DailyBiometricRecord>) -> Vec<DailyBiometricRecord> {
    let total = records.len();
    let mut by_date: BTreeMap<NaiveDate, DailyBiometricRecord> = BTreeMap::new();
    for record in records {
        by_date.insert(record.date, record);
    }

    if by_date.len() < total {
        warn!(
            "Dropped {} duplicate daily records",
            total - by_date.len()
        );
    }
    by_date.into_values().collect()
}

/// CSV importer with flexible column mapping
pub struct BiometricCsvImporter {
    column_mapping: HashMap<String, String>,
}

impl BiometricCsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(
            &mut column_mapping,
            "date",
            &["date", "day", "recorded_on", "record_date"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "resting_hr",
            &["resting_hr", "rhr", "resting_heart_rate", "resting_bpm"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "hrv",
            &["hrv", "hrv_ms", "rmssd", "night_hrv", "hrv_night"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sleep_hours",
            &["sleep_hours", "sleep", "sleep_duration", "total_sleep"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "deep_sleep_pct",
            &["deep_sleep_pct", "deep_sleep", "deep_pct"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "rem_sleep_pct",
            &["rem_sleep_pct", "rem_sleep", "rem_pct"],
        );
        Self::add_mapping(&mut column_mapping, "spo2", &["spo2", "sp_o2", "oxygen_saturation"]);
        Self::add_mapping(
            &mut column_mapping,
            "respiratory_rate",
            &["respiratory_rate", "resp_rate", "breathing_rate"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "body_temperature",
            &["body_temperature", "body_temp", "temperature", "temp"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "training_load_pct",
            &["training_load_pct", "training_load", "load", "load_pct"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sleep_onset",
            &["sleep_onset", "bedtime", "sleep_start", "onset"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "wake_time",
            &["wake_time", "wake", "wake_up", "sleep_end"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }

    fn parse_number(column: &str, value: &str, line: usize) -> Result<Option<f64>> {
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid_cell(column, value, line))
    }

    fn parse_clock(column: &str, value: &str, line: usize) -> Result<Option<NaiveTime>> {
        if value.is_empty() {
            return Ok(None);
        }
        parse_clock_time(value)
            .map(Some)
            .ok_or_else(|| invalid_cell(column, value, line))
    }

    /// Parse CSV text into records, rejecting negative readings
    pub fn import_str(&self, content: &str) -> Result<Vec<DailyBiometricRecord>> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        if !headers.iter().any(|h| h == "date") {
            return Err(ImportError::MissingData {
                field: "date".to_string(),
            }
            .into());
        }

        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row?;
            let line = index + 2;
            let mut date = None;
            let mut fields: HashMap<&str, &str> = HashMap::new();

            for (header, value) in headers.iter().zip(row.iter()) {
                if header == "date" {
                    date = Self::parse_date(value);
                } else {
                    fields.insert(header.as_str(), value);
                }
            }

            let date = date.ok_or_else(|| {
                parse_error(format!("line {}: missing or invalid date", line))
            })?;
            let mut record = DailyBiometricRecord::new(date);

            for (column, value) in fields {
                let number = || Self::parse_number(column, value, line);
                match column {
                    "resting_hr" => {
                        record.resting_hr = match number()? {
                            Some(v) if v < 0.0 => return Err(negative_value(date, column)),
                            other => other.map(|v| v.round().min(f64::from(u16::MAX)) as u16),
                        }
                    }
                    "hrv" => record.hrv = number()?,
                    "sleep_hours" => record.sleep_hours = number()?,
                    "deep_sleep_pct" => record.deep_sleep_pct = number()?,
                    "rem_sleep_pct" => record.rem_sleep_pct = number()?,
                    "spo2" => record.spo2 = number()?,
                    "respiratory_rate" => record.respiratory_rate = number()?,
                    "body_temperature" => record.body_temperature = number()?,
                    "training_load_pct" => record.training_load_pct = number()?,
                    "sleep_onset" => record.sleep_onset = Self::parse_clock(column, value, line)?,
                    "wake_time" => record.wake_time = Self::parse_clock(column, value, line)?,
                    _ => {}
                }
            }

            check_record(&record)?;
            records.push(record);
        }

        debug!("Parsed {} CSV rows", records.len());
        Ok(records)
    }
}

impl Default for BiometricCsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_error(reason: String) -> MonitorError {
    ImportError::ParseError {
        format: "CSV".to_string(),
        reason,
    }
    .into()
}

fn invalid_cell(column: &str, value: &str, line: usize) -> MonitorError {
    parse_error(format!("line {}: invalid {} value '{}'", line, column, value))
}

fn negative_value(date: NaiveDate, field: &str) -> MonitorError {
    MonitorError::Validation(format!("{} on {} is negative", field, date))
}
