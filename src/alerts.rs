//! Acute biometric alerts
//!
//! Compares the latest record against the trailing baseline (the records
//! before it) and raises four independent flags. Any subset may fire at once.
//! A flag that needs a baseline stays down unless that baseline is strictly
//! positive, so gaps in wearable data never read as a drop or a spike.

use crate::aggregation::{self, BiometricField, SHORT_WINDOW};
use crate::models::DailyBiometricRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Baseline length in records, excluding the latest
    pub baseline_window: usize,

    /// Fractional HRV drop below baseline that raises an alert
    pub hrv_drop_ratio: f64,

    /// Resting HR rise above baseline that raises an alert (bpm)
    pub resting_hr_rise_bpm: f64,

    /// Fractional training-load increase above baseline that raises an alert
    pub load_spike_ratio: f64,

    /// Sleep below this is low regardless of baseline (hours)
    pub low_sleep_hours: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            baseline_window: SHORT_WINDOW,
            hrv_drop_ratio: 0.15,
            resting_hr_rise_bpm: 5.0,
            load_spike_ratio: 0.30,
            low_sleep_hours: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    HrvDrop,
    RestingHrRise,
    LoadSpike,
    LowSleep,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::HrvDrop => write!(f, "HRV drop"),
            AlertKind::RestingHrRise => write!(f, "Resting HR rise"),
            AlertKind::LoadSpike => write!(f, "Load spike"),
            AlertKind::LowSleep => write!(f, "Low sleep"),
        }
    }
}

/// Flags for the latest day plus the deltas that produced them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiometricAlerts {
    /// Date of the record the flags describe
    pub date: Option<NaiveDate>,

    pub hrv_drop: bool,
    pub resting_hr_rise: bool,
    pub load_spike: bool,
    pub low_sleep: bool,

    /// Fractional HRV drop vs baseline, when computable
    pub hrv_drop_ratio: Option<f64>,

    /// Resting HR change vs baseline (bpm), when computable
    pub resting_hr_delta: Option<f64>,

    /// Fractional training-load change vs baseline, when computable
    pub load_change_ratio: Option<f64>,
}

impl BiometricAlerts {
    pub fn active(&self) -> Vec<AlertKind> {
        [
            (self.hrv_drop, AlertKind::HrvDrop),
            (self.resting_hr_rise, AlertKind::RestingHrRise),
            (self.load_spike, AlertKind::LoadSpike),
            (self.low_sleep, AlertKind::LowSleep),
        ]
        .into_iter()
        .filter_map(|(raised, kind)| raised.then_some(kind))
        .collect()
    }

    pub fn any(&self) -> bool {
        self.hrv_drop || self.resting_hr_rise || self.load_spike || self.low_sleep
    }
}

pub struct AlertClassifier {
    config: AlertConfig,
}

impl AlertClassifier {
    pub fn new() -> Self {
        AlertClassifier {
            config: AlertConfig::default(),
        }
    }

    pub fn with_config(config: AlertConfig) -> Self {
        AlertClassifier { config }
    }

    /// Classify the latest record against its trailing baseline
    pub fn classify(&self, records: &[DailyBiometricRecord]) -> BiometricAlerts {
        let latest = match aggregation::latest(records) {
            Some(latest) => latest,
            None => return BiometricAlerts::default(),
        };

        let baseline = |field: BiometricField| {
            aggregation::window_stats(records, field, self.config.baseline_window, true)
        };

        let mut alerts = BiometricAlerts {
            date: Some(latest.date),
            ..BiometricAlerts::default()
        };

        let hrv_baseline = baseline(BiometricField::Hrv);
        if let Some(hrv) = BiometricField::Hrv.extract(latest) {
            if hrv_baseline.is_usable_baseline() {
                let ratio = (hrv_baseline.mean - hrv) / hrv_baseline.mean;
                alerts.hrv_drop_ratio = Some(ratio);
                alerts.hrv_drop = ratio >= self.config.hrv_drop_ratio;
            }
        }

        let hr_baseline = baseline(BiometricField::RestingHr);
        if let Some(hr) = BiometricField::RestingHr.extract(latest) {
            if hr_baseline.is_usable_baseline() {
                let delta = hr - hr_baseline.mean;
                alerts.resting_hr_delta = Some(delta);
                alerts.resting_hr_rise = delta >= self.config.resting_hr_rise_bpm;
            }
        }

        let load_baseline = baseline(BiometricField::TrainingLoadPct);
        if let Some(load) = BiometricField::TrainingLoadPct.extract(latest) {
            if load_baseline.is_usable_baseline() {
                let ratio = (load - load_baseline.mean) / load_baseline.mean;
                alerts.load_change_ratio = Some(ratio);
                alerts.load_spike = ratio >= self.config.load_spike_ratio;
            }
        }

        if let Some(sleep) = BiometricField::SleepHours.extract(latest) {
            alerts.low_sleep = sleep < self.config.low_sleep_hours;
        }

        alerts
    }
}

impl Default for AlertClassifier {
    fn default() -> Self {
        Self::new()
    }
}
