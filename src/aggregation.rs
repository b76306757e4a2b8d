//! Rolling window statistics over daily biometric records
//!
//! Windows are counted in records, not calendar days: a 7-day window is the
//! last seven rows once sorted by date. Short histories use whatever rows
//! exist. An empty window yields zeros, and callers must treat a zero
//! baseline as "insufficient data" rather than a real reading.

use crate::models::DailyBiometricRecord;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Acute window length (records)
pub const SHORT_WINDOW: usize = 7;

/// Chronic window length (records)
pub const LONG_WINDOW: usize = 30;

/// Numeric signals that can be aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricField {
    RestingHr,
    Hrv,
    SleepHours,
    DeepSleepPct,
    RemSleepPct,
    Spo2,
    RespiratoryRate,
    BodyTemperature,
    TrainingLoadPct,
}

impl BiometricField {
    pub const ALL: [BiometricField; 9] = [
        BiometricField::RestingHr,
        BiometricField::Hrv,
        BiometricField::SleepHours,
        BiometricField::DeepSleepPct,
        BiometricField::RemSleepPct,
        BiometricField::Spo2,
        BiometricField::RespiratoryRate,
        BiometricField::BodyTemperature,
        BiometricField::TrainingLoadPct,
    ];

    /// Read this field from a record. Non-finite values count as absent.
    pub fn extract(&self, record: &DailyBiometricRecord) -> Option<f64> {
        let value = match self {
            BiometricField::RestingHr => record.resting_hr.map(f64::from),
            BiometricField::Hrv => record.hrv,
            BiometricField::SleepHours => record.sleep_hours,
            BiometricField::DeepSleepPct => record.deep_sleep_pct,
            BiometricField::RemSleepPct => record.rem_sleep_pct,
            BiometricField::Spo2 => record.spo2,
            BiometricField::RespiratoryRate => record.respiratory_rate,
            BiometricField::BodyTemperature => record.body_temperature,
            BiometricField::TrainingLoadPct => record.training_load_pct,
        };
        value.filter(|v| v.is_finite())
    }
}

impl fmt::Display for BiometricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BiometricField::RestingHr => "resting_hr",
            BiometricField::Hrv => "hrv",
            BiometricField::SleepHours => "sleep_hours",
            BiometricField::DeepSleepPct => "deep_sleep_pct",
            BiometricField::RemSleepPct => "rem_sleep_pct",
            BiometricField::Spo2 => "spo2",
            BiometricField::RespiratoryRate => "respiratory_rate",
            BiometricField::BodyTemperature => "body_temperature",
            BiometricField::TrainingLoadPct => "training_load_pct",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for BiometricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        BiometricField::ALL
            .iter()
            .copied()
            .find(|field| field.to_string() == normalized)
            .ok_or_else(|| format!("Unknown biometric field: {}", s))
    }
}

/// Mean and population standard deviation of one field over a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Number of records that carried the field
    pub count: usize,
}

impl WindowStats {
    pub const EMPTY: WindowStats = WindowStats {
        mean: 0.0,
        std_dev: 0.0,
        count: 0,
    };

    /// Statistics over raw values; empty input gives [`WindowStats::EMPTY`]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::EMPTY;
        }

        let mean = values.iter().mean();
        let std_dev = values.iter().population_std_dev();

        Self {
            mean,
            std_dev: if std_dev.is_finite() { std_dev } else { 0.0 },
            count: values.len(),
        }
    }

    /// A baseline exists only when data is present and strictly positive
    pub fn is_usable_baseline(&self) -> bool {
        self.count > 0 && self.mean > 0.0
    }
}

/// Records ordered by date, oldest first
pub fn sorted_by_date(records: &[DailyBiometricRecord]) -> Vec<&DailyBiometricRecord> {
    let mut sorted: Vec<&DailyBiometricRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);
    sorted
}

/// Most recent record by date
pub fn latest(records: &[DailyBiometricRecord]) -> Option<&DailyBiometricRecord> {
    records.iter().max_by_key(|r| r.date)
}

/// The trailing `window` records, oldest first.
///
/// With `exclude_latest` the most recent record is dropped first, giving the
/// baseline that "today" is compared against.
pub fn trailing_window(
    records: &[DailyBiometricRecord],
    window: usize,
    exclude_latest: bool,
) -> Vec<&DailyBiometricRecord> {
    let mut sorted = sorted_by_date(records);
    if exclude_latest {
        sorted.pop();
    }

    let start = sorted.len().saturating_sub(window);
    sorted.split_off(start)
}

/// Values of `field` present in the given records, in order
pub fn field_values<'a, I>(records: I, field: BiometricField) -> Vec<f64>
where
    I: IntoIterator<Item = &'a DailyBiometricRecord>,
{
    records
        .into_iter()
        .filter_map(|r| field.extract(r))
        .collect()
}

/// Mean and standard deviation of `field` over the trailing window
pub fn window_stats(
    records: &[DailyBiometricRecord],
    field: BiometricField,
    window: usize,
    exclude_latest: bool,
) -> WindowStats {
    let window_records = trailing_window(records, window, exclude_latest);
    WindowStats::from_values(&field_values(window_records, field))
}

/// Mean of `field` over the trailing window, 0 when there is no data
pub fn window_mean(
    records: &[DailyBiometricRecord],
    field: BiometricField,
    window: usize,
    exclude_latest: bool,
) -> f64 {
    window_stats(records, field, window, exclude_latest).mean
}

/// Summary of every field over one window
pub fn summarize_window(
    records: &[DailyBiometricRecord],
    window: usize,
) -> Vec<(BiometricField, WindowStats)> {
    let window_records = trailing_window(records, window, false);
    BiometricField::ALL
        .iter()
        .map(|&field| {
            let values = field_values(window_records.iter().copied(), field);
            (field, WindowStats::from_values(&values))
        })
        .collect()
}
