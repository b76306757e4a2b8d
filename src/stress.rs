//! Strain / stress index
//!
//! Combines how far resting heart rate sits above an expected value and how
//! far nightly HRV sits below an age-adjusted expectation into one score.
//!
//! ## Stress Scale
//! - 0-40: Low
//! - 40-60: Moderate
//! - 60+: High
//!
//! The raw index is unbounded above; display values are clamped to 0-100.
//! A missing signal contributes nothing, so a day with neither resting HR
//! nor HRV scores 0. Callers that need to tell "no data" apart from a
//! genuine zero must check the raw inputs, which [`StressCalculator::assess`]
//! does.

use crate::aggregation;
use crate::models::{DailyBiometricRecord, DerivedScore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Age assumed when an athlete has no date of birth on file
pub const DEFAULT_AGE: u32 = 25;

/// Stress index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Resting heart rate considered fully recovered (bpm)
    pub expected_resting_hr: f64,

    /// Expected HRV at age 0 (ms); declines linearly with age
    pub hrv_age_intercept: f64,

    /// Expected HRV decline per year of age (ms)
    pub hrv_age_slope: f64,

    /// Lower bound on the expected HRV (ms)
    pub hrv_floor: f64,

    /// Weight of the heart rate component
    pub hr_weight: f64,

    /// Weight of the HRV component
    pub hrv_weight: f64,

    /// Index at which stress becomes Moderate
    pub moderate_threshold: f64,

    /// Index at which stress becomes High
    pub high_threshold: f64,

    /// Day-over-day increase that counts as rising stress
    pub rising_delta: f64,
}

impl Default for StressConfig {
    fn default() -> Self {
        StressConfig {
            expected_resting_hr: 60.0,
            hrv_age_intercept: 85.0,
            hrv_age_slope: 0.6,
            hrv_floor: 20.0,
            hr_weight: 0.4,
            hrv_weight: 0.6,
            moderate_threshold: 40.0,
            high_threshold: 60.0,
            rising_delta: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressLevel::Low => write!(f, "Low"),
            StressLevel::Moderate => write!(f, "Moderate"),
            StressLevel::High => write!(f, "High"),
        }
    }
}

/// Stress reading for the latest day with data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressAssessment {
    pub date: NaiveDate,

    /// Unclamped index
    pub index: f64,

    pub level: StressLevel,

    /// Change from the previous day with data; `None` with fewer than two days
    pub delta: Option<f64>,

    /// Delta exceeded the configured rise
    pub rising: bool,

    pub score: DerivedScore,
}

/// Strain index with default configuration
pub fn strain_index(resting_hr: f64, hrv: f64, age: u32) -> f64 {
    StressCalculator::new().strain_index(resting_hr, hrv, age)
}

pub struct StressCalculator {
    config: StressConfig,
}

impl StressCalculator {
    pub fn new() -> Self {
        StressCalculator {
            config: StressConfig::default(),
        }
    }

    pub fn with_config(config: StressConfig) -> Self {
        StressCalculator { config }
    }

    /// Age-adjusted HRV expectation (ms)
    pub fn expected_hrv(&self, age: u32) -> f64 {
        (self.config.hrv_age_intercept - self.config.hrv_age_slope * f64::from(age))
            .max(self.config.hrv_floor)
    }

    /// Heart rate component: percent above expected resting HR
    fn hr_component(&self, resting_hr: f64) -> f64 {
        if resting_hr <= 0.0 || self.config.expected_resting_hr <= 0.0 {
            return 0.0;
        }
        ((resting_hr - self.config.expected_resting_hr) / self.config.expected_resting_hr * 100.0)
            .max(0.0)
    }

    /// HRV component: percent below the age-adjusted expectation
    fn hrv_component(&self, hrv: f64, age: u32) -> f64 {
        let expected = self.expected_hrv(age);
        if hrv <= 0.0 || expected <= 0.0 {
            return 0.0;
        }
        ((expected - hrv) / expected * 100.0).max(0.0)
    }

    pub fn strain_index(&self, resting_hr: f64, hrv: f64, age: u32) -> f64 {
        self.config.hr_weight * self.hr_component(resting_hr)
            + self.config.hrv_weight * self.hrv_component(hrv, age)
    }

    pub fn level(&self, index: f64) -> StressLevel {
        if index >= self.config.high_threshold {
            StressLevel::High
        } else if index >= self.config.moderate_threshold {
            StressLevel::Moderate
        } else {
            StressLevel::Low
        }
    }

    /// Index for each day that carries resting HR or HRV, oldest first
    pub fn daily_series(
        &self,
        records: &[DailyBiometricRecord],
        age: u32,
    ) -> Vec<(NaiveDate, f64)> {
        aggregation::sorted_by_date(records)
            .into_iter()
            .filter(|r| r.resting_hr.is_some() || r.hrv.is_some())
            .map(|r| {
                let hr = r.resting_hr.map(f64::from).unwrap_or(0.0);
                let hrv = r.hrv.unwrap_or(0.0);
                (r.date, self.strain_index(hr, hrv, age))
            })
            .collect()
    }

    /// Assess the latest day with data. `None` when no day has HR or HRV.
    pub fn assess(&self, records: &[DailyBiometricRecord], age: u32) -> Option<StressAssessment> {
        let series = self.daily_series(records, age);
        let &(date, index) = series.last()?;

        let delta = match series.len() {
            0 | 1 => None,
            n => Some(index - series[n - 2].1),
        };
        let rising = delta.map_or(false, |d| d >= self.config.rising_delta);
        let level = self.level(index);

        let mut factors = Vec::new();
        if let Some(latest) = aggregation::latest(records).filter(|r| r.date == date) {
            if let Some(hr) = latest.resting_hr {
                if self.hr_component(f64::from(hr)) > 0.0 {
                    factors.push(format!(
                        "Resting HR {} bpm exceeds expected {:.0} bpm",
                        hr, self.config.expected_resting_hr
                    ));
                }
            }
            if let Some(hrv) = latest.hrv {
                if self.hrv_component(hrv, age) > 0.0 {
                    factors.push(format!(
                        "HRV {:.0} ms under age-expected {:.0} ms",
                        hrv,
                        self.expected_hrv(age)
                    ));
                }
            }
        }
        if rising {
            factors.push("Stress rising from previous day".to_string());
        }

        Some(StressAssessment {
            date,
            index,
            level,
            delta,
            rising,
            score: DerivedScore::new(index, level, factors),
        })
    }
}

impl Default for StressCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(offset: i64, resting_hr: Option<u16>, hrv: Option<f64>) -> DailyBiometricRecord {
        DailyBiometricRecord {
            resting_hr,
            hrv,
            ..DailyBiometricRecord::new(
                NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + Duration::days(offset),
            )
        }
    }

    #[test]
    fn test_zero_inputs_score_zero() {
        assert_eq!(strain_index(0.0, 0.0, 30), 0.0);
    }

    #[test]
    fn test_recovered_athlete_scores_zero() {
        // at or below expected HR, above expected HRV
        assert_eq!(strain_index(55.0, 80.0, 25), 0.0);
    }

    #[test]
    fn test_strain_index_components() {
        let calc = StressCalculator::new();
        assert!((calc.expected_hrv(25) - 70.0).abs() < 1e-9);

        // HR 72: 20% above; HRV 35: 50% below 70
        let index = calc.strain_index(72.0, 35.0, 25);
        assert!((index - (0.4 * 20.0 + 0.6 * 50.0)).abs() < 1e-9);
        assert_eq!(calc.level(index), StressLevel::Low);
    }

    #[test]
    fn test_expected_hrv_floor() {
        let calc = StressCalculator::new();
        assert_eq!(calc.expected_hrv(120), 20.0);
    }

    #[test]
    fn test_level_cut_points() {
        let calc = StressCalculator::new();
        assert_eq!(calc.level(39.9), StressLevel::Low);
        assert_eq!(calc.level(40.0), StressLevel::Moderate);
        assert_eq!(calc.level(59.9), StressLevel::Moderate);
        assert_eq!(calc.level(60.0), StressLevel::High);
        assert_eq!(calc.level(140.0), StressLevel::High);
    }

    #[test]
    fn test_assess_without_data() {
        let calc = StressCalculator::new();
        assert!(calc.assess(&[record(0, None, None)], 25).is_none());
        assert!(calc.assess(&[], 25).is_none());
    }

    #[test]
    fn test_single_day_has_no_trend() {
        let calc = StressCalculator::new();
        let assessment = calc.assess(&[record(0, Some(80), Some(30.0))], 25).unwrap();
        assert_eq!(assessment.delta, None);
        assert!(!assessment.rising);
    }

    #[test]
    fn test_rising_stress() {
        let calc = StressCalculator::new();
        let records = vec![
            record(0, Some(55), Some(75.0)),
            record(1, None, None),
            record(2, Some(90), Some(21.0)),
        ];

        let assessment = calc.assess(&records, 25).unwrap();
        assert_eq!(assessment.date, records[2].date);
        assert_eq!(assessment.delta, Some(assessment.index));
        assert!(assessment.rising);
        assert_eq!(assessment.level, StressLevel::High);
        assert!(assessment.score.value <= 100.0);
        assert_eq!(assessment.score.level, "High");
        assert!(assessment
            .score
            .factors
            .iter()
            .any(|f| f.contains("rising")));
    }
}
