//! Recovery readiness
//!
//! Estimates how ready an athlete is to train from four inputs over the
//! acute window:
//!
//! - **Sleep debt**: hours owed below the nightly target, summed over the
//!   window. A night above target does not repay another night's debt.
//! - **HRV trend**: latest minus earliest HRV in the window. Needs two
//!   readings; with fewer the trend is 0.
//! - **Resting HR**: latest value, penalized above a reference rate.
//! - **Training load**: latest training-load percentage.
//!
//! More debt, a higher resting HR or a heavier load each lower readiness; a
//! rising HRV raises it. The result is clamped to 0-100.

use crate::aggregation::{self, BiometricField, SHORT_WINDOW};
use crate::models::{DailyBiometricRecord, DerivedScore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readiness coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Nightly sleep target (hours)
    pub sleep_target_hours: f64,

    /// Points lost per hour of accumulated sleep debt
    pub sleep_debt_weight: f64,

    /// Resting HR below which no penalty applies (bpm)
    pub resting_hr_reference: f64,

    /// Points lost per bpm above the reference
    pub resting_hr_weight: f64,

    /// Points lost per training-load percentage point
    pub training_load_weight: f64,

    /// Points gained per ms of HRV trend
    pub hrv_trend_weight: f64,

    /// Window length in records
    pub window: usize,

    /// Score at or above which the athlete is Ready
    pub ready_threshold: f64,

    /// Score at or above which readiness is Moderate
    pub moderate_threshold: f64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            sleep_target_hours: 8.0,
            sleep_debt_weight: 4.0,
            resting_hr_reference: 50.0,
            resting_hr_weight: 1.5,
            training_load_weight: 0.3,
            hrv_trend_weight: 0.5,
            window: SHORT_WINDOW,
            ready_threshold: 75.0,
            moderate_threshold: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessLevel {
    Ready,
    Moderate,
    Low,
}

impl fmt::Display for ReadinessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessLevel::Ready => write!(f, "Ready"),
            ReadinessLevel::Moderate => write!(f, "Moderate"),
            ReadinessLevel::Low => write!(f, "Low"),
        }
    }
}

impl ReadinessLevel {
    pub fn recommendation(&self) -> &'static str {
        match self {
            ReadinessLevel::Ready => "Cleared for full training load",
            ReadinessLevel::Moderate => "Train as planned but cap high-intensity volume",
            ReadinessLevel::Low => "Prioritize recovery; replace intensity with light work",
        }
    }
}

/// The scalar inputs to the readiness formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadinessInputs {
    pub sleep_debt_hours: f64,
    pub hrv_trend: f64,
    pub resting_hr: f64,
    pub training_load_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessAssessment {
    pub inputs: ReadinessInputs,
    pub level: ReadinessLevel,
    pub score: DerivedScore,
    pub recommendations: Vec<String>,
}

pub struct ReadinessCalculator {
    config: ReadinessConfig,
}

impl ReadinessCalculator {
    pub fn new() -> Self {
        ReadinessCalculator {
            config: ReadinessConfig::default(),
        }
    }

    pub fn with_config(config: ReadinessConfig) -> Self {
        ReadinessCalculator { config }
    }

    /// Hours owed below target across the window, each night floored at 0
    pub fn sleep_debt(&self, records: &[DailyBiometricRecord]) -> f64 {
        aggregation::trailing_window(records, self.config.window, false)
            .into_iter()
            .filter_map(|r| BiometricField::SleepHours.extract(r))
            .map(|hours| (self.config.sleep_target_hours - hours).max(0.0))
            .sum()
    }

    /// Latest minus earliest HRV in the window; 0 with fewer than two readings
    pub fn hrv_trend(&self, records: &[DailyBiometricRecord]) -> f64 {
        let window = aggregation::trailing_window(records, self.config.window, false);
        let values = aggregation::field_values(window, BiometricField::Hrv);

        match (values.first(), values.last()) {
            (Some(first), Some(last)) if values.len() >= 2 => last - first,
            _ => 0.0,
        }
    }

    /// Collect formula inputs; `None` for an empty record set
    pub fn inputs(&self, records: &[DailyBiometricRecord]) -> Option<ReadinessInputs> {
        let latest = aggregation::latest(records)?;

        Some(ReadinessInputs {
            sleep_debt_hours: self.sleep_debt(records),
            hrv_trend: self.hrv_trend(records),
            resting_hr: latest.resting_hr.map(f64::from).unwrap_or(0.0),
            training_load_pct: BiometricField::TrainingLoadPct
                .extract(latest)
                .unwrap_or(0.0),
        })
    }

    /// Readiness percentage from scalar inputs
    pub fn readiness(&self, inputs: &ReadinessInputs) -> f64 {
        let debt_penalty = self.config.sleep_debt_weight * inputs.sleep_debt_hours.max(0.0);
        let hr_penalty = if inputs.resting_hr > 0.0 {
            self.config.resting_hr_weight
                * (inputs.resting_hr - self.config.resting_hr_reference).max(0.0)
        } else {
            0.0
        };
        let load_penalty = self.config.training_load_weight * inputs.training_load_pct.max(0.0);
        let trend_bonus = self.config.hrv_trend_weight * inputs.hrv_trend;

        let score = 100.0 - debt_penalty - hr_penalty - load_penalty + trend_bonus;
        if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub fn level(&self, score: f64) -> ReadinessLevel {
        if score >= self.config.ready_threshold {
            ReadinessLevel::Ready
        } else if score >= self.config.moderate_threshold {
            ReadinessLevel::Moderate
        } else {
            ReadinessLevel::Low
        }
    }

    pub fn assess(&self, records: &[DailyBiometricRecord]) -> Option<ReadinessAssessment> {
        let inputs = self.inputs(records)?;
        let value = self.readiness(&inputs);
        let level = self.level(value);

        let mut factors = Vec::new();
        let mut recommendations = vec![level.recommendation().to_string()];

        if inputs.sleep_debt_hours > 0.0 {
            factors.push(format!(
                "{:.1} h sleep debt over last {} nights",
                inputs.sleep_debt_hours, self.config.window
            ));
        }
        if inputs.sleep_debt_hours >= self.config.sleep_target_hours {
            recommendations
                .push("Sleep debt exceeds a full night; schedule extra sleep".to_string());
        }
        if inputs.hrv_trend < 0.0 {
            factors.push(format!("HRV trending down {:.1} ms", -inputs.hrv_trend));
            recommendations.push("Monitor HRV over the next few mornings".to_string());
        } else if inputs.hrv_trend > 0.0 {
            factors.push(format!("HRV trending up {:.1} ms", inputs.hrv_trend));
        }
        if inputs.resting_hr > self.config.resting_hr_reference {
            factors.push(format!("Resting HR {:.0} bpm", inputs.resting_hr));
        }
        if inputs.training_load_pct > 0.0 {
            factors.push(format!("Training load {:.0}%", inputs.training_load_pct));
        }

        Some(ReadinessAssessment {
            inputs,
            level,
            score: DerivedScore::new(value, level, factors),
            recommendations,
        })
    }
}

impl Default for ReadinessCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn night(offset: i64, sleep: f64, hrv: Option<f64>) -> DailyBiometricRecord {
        DailyBiometricRecord {
            sleep_hours: Some(sleep),
            hrv,
            ..DailyBiometricRecord::new(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + Duration::days(offset),
            )
        }
    }

    #[test]
    fn test_sleep_debt_floors_each_night() {
        let calc = ReadinessCalculator::new();
        // 10h does not offset the 6h night
        let records = vec![night(0, 6.0, None), night(1, 10.0, None), night(2, 7.5, None)];
        assert!((calc.sleep_debt(&records) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_sleep_debt_window_is_trailing_week() {
        let calc = ReadinessCalculator::new();
        let mut records: Vec<_> = (0..7).map(|i| night(i, 8.0, None)).collect();
        records.insert(0, night(-1, 0.0, None));
        assert_eq!(calc.sleep_debt(&records), 0.0);
    }

    #[test]
    fn test_hrv_trend_requires_two_readings() {
        let calc = ReadinessCalculator::new();
        assert_eq!(calc.hrv_trend(&[night(0, 8.0, Some(60.0))]), 0.0);

        let records = vec![
            night(0, 8.0, Some(50.0)),
            night(1, 8.0, None),
            night(2, 8.0, Some(58.0)),
        ];
        assert!((calc.hrv_trend(&records) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_readiness_formula() {
        let calc = ReadinessCalculator::new();
        let inputs = ReadinessInputs {
            sleep_debt_hours: 3.0,
            hrv_trend: 4.0,
            resting_hr: 56.0,
            training_load_pct: 50.0,
        };
        // 100 - 12 - 9 - 15 + 2
        assert!((calc.readiness(&inputs) - 66.0).abs() < 1e-9);
        assert_eq!(calc.level(66.0), ReadinessLevel::Moderate);
    }

    #[test]
    fn test_readiness_is_clamped() {
        let calc = ReadinessCalculator::new();
        let exhausted = ReadinessInputs {
            sleep_debt_hours: 30.0,
            hrv_trend: -40.0,
            resting_hr: 90.0,
            training_load_pct: 100.0,
        };
        assert_eq!(calc.readiness(&exhausted), 0.0);

        let fresh = ReadinessInputs {
            sleep_debt_hours: 0.0,
            hrv_trend: 30.0,
            resting_hr: 45.0,
            training_load_pct: 0.0,
        };
        assert_eq!(calc.readiness(&fresh), 100.0);
    }

    #[test]
    fn test_missing_resting_hr_is_not_penalized() {
        let calc = ReadinessCalculator::new();
        let inputs = ReadinessInputs {
            sleep_debt_hours: 0.0,
            hrv_trend: 0.0,
            resting_hr: 0.0,
            training_load_pct: 0.0,
        };
        assert_eq!(calc.readiness(&inputs), 100.0);
    }

    #[test]
    fn test_assess_low_readiness() {
        let calc = ReadinessCalculator::new();
        let mut records: Vec<_> = (0..7)
            .map(|i| night(i, 5.0, Some(70.0 - i as f64 * 3.0)))
            .collect();
        if let Some(last) = records.last_mut() {
            last.resting_hr = Some(62);
            last.training_load_pct = Some(80.0);
        }

        let assessment = calc.assess(&records).unwrap();
        assert_eq!(assessment.inputs.sleep_debt_hours, 21.0);
        assert_eq!(assessment.level, ReadinessLevel::Low);
        assert_eq!(assessment.score.value, 0.0);
        assert!(assessment.recommendations.len() >= 2);
        assert!(calc.assess(&[]).is_none());
    }
}
