//! Per-day metric extractors: HRV status and resting heart rate status
//!
//! # Sports Science Background
//!
//! Nightly HRV and morning resting heart rate are the two cheapest signals of
//! autonomic recovery. Both are read relative to the athlete's own trailing
//! baseline rather than population norms:
//!
//! - **HRV** falling below baseline indicates sympathetic (stress) dominance.
//! - **Resting HR** rising above baseline indicates incomplete recovery,
//!   illness onset or accumulated fatigue.
//!
//! A status is only assigned when a strictly positive baseline exists;
//! otherwise the day reports `NoReading`.

use crate::aggregation::{self, BiometricField};
use crate::models::DailyBiometricRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HRV status categories based on comparison to personal baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrvStatus {
    /// HRV well below baseline, indicates poor recovery
    Poor,
    /// HRV moderately below baseline, indicates partial recovery
    Unbalanced,
    /// HRV within normal range of baseline, indicates good recovery
    Balanced,
    /// No valid HRV reading or baseline available
    NoReading,
}

impl fmt::Display for HrvStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HrvStatus::Poor => write!(f, "Poor"),
            HrvStatus::Unbalanced => write!(f, "Unbalanced"),
            HrvStatus::Balanced => write!(f, "Balanced"),
            HrvStatus::NoReading => write!(f, "No Reading"),
        }
    }
}

impl HrvStatus {
    /// Determine HRV status from a nightly value and baseline
    ///
    /// - Balanced: no more than 15% below baseline
    /// - Unbalanced: 15-30% below baseline
    /// - Poor: more than 30% below baseline
    pub fn from_hrv(hrv: f64, baseline: f64) -> Self {
        if baseline <= 0.0 || hrv <= 0.0 {
            return HrvStatus::NoReading;
        }

        let deviation_pct = ((hrv - baseline) / baseline) * 100.0;

        if deviation_pct >= -15.0 {
            HrvStatus::Balanced
        } else if deviation_pct >= -30.0 {
            HrvStatus::Unbalanced
        } else {
            HrvStatus::Poor
        }
    }
}

/// Resting heart rate status relative to personal baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestingHrStatus {
    /// Less than 3 bpm above baseline
    Normal,
    /// 3-7 bpm above baseline
    Elevated,
    /// 7 bpm or more above baseline
    High,
    NoReading,
}

impl fmt::Display for RestingHrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestingHrStatus::Normal => write!(f, "Normal"),
            RestingHrStatus::Elevated => write!(f, "Elevated"),
            RestingHrStatus::High => write!(f, "High"),
            RestingHrStatus::NoReading => write!(f, "No Reading"),
        }
    }
}

impl RestingHrStatus {
    pub fn from_resting_hr(resting_hr: f64, baseline: f64) -> Self {
        if baseline <= 0.0 || resting_hr <= 0.0 {
            return RestingHrStatus::NoReading;
        }

        let rise = resting_hr - baseline;
        if rise >= 7.0 {
            RestingHrStatus::High
        } else if rise >= 3.0 {
            RestingHrStatus::Elevated
        } else {
            RestingHrStatus::Normal
        }
    }
}

/// Extracted indicators for the most recent day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatus {
    pub date: NaiveDate,
    pub hrv: Option<f64>,
    pub hrv_baseline: f64,
    pub hrv_status: HrvStatus,
    pub resting_hr: Option<u16>,
    pub resting_hr_baseline: f64,
    pub resting_hr_status: RestingHrStatus,
}

/// Status of the latest record against the `baseline_window` records before it
pub fn daily_status(
    records: &[DailyBiometricRecord],
    baseline_window: usize,
) -> Option<DailyStatus> {
    let latest = aggregation::latest(records)?;

    let hrv_baseline =
        aggregation::window_mean(records, BiometricField::Hrv, baseline_window, true);
    let resting_hr_baseline =
        aggregation::window_mean(records, BiometricField::RestingHr, baseline_window, true);

    let hrv_status = latest
        .hrv
        .map(|hrv| HrvStatus::from_hrv(hrv, hrv_baseline))
        .unwrap_or(HrvStatus::NoReading);

    let resting_hr_status = latest
        .resting_hr
        .map(|hr| RestingHrStatus::from_resting_hr(f64::from(hr), resting_hr_baseline))
        .unwrap_or(RestingHrStatus::NoReading);

    Some(DailyStatus {
        date: latest.date,
        hrv: latest.hrv,
        hrv_baseline,
        hrv_status,
        resting_hr: latest.resting_hr,
        resting_hr_baseline,
        resting_hr_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::SHORT_WINDOW;
    use chrono::Duration;

    #[test]
    fn test_hrv_status_transitions() {
        let baseline = 50.0;

        let values_and_expected = vec![
            (50.0, HrvStatus::Balanced),
            (42.5, HrvStatus::Balanced),   // -15% (boundary)
            (42.4, HrvStatus::Unbalanced), // just below -15%
            (35.0, HrvStatus::Unbalanced), // -30% (boundary)
            (34.9, HrvStatus::Poor),
            (20.0, HrvStatus::Poor),
        ];

        for (hrv, expected_status) in values_and_expected {
            assert_eq!(
                HrvStatus::from_hrv(hrv, baseline),
                expected_status,
                "HRV {} should be {:?}",
                hrv,
                expected_status
            );
        }
    }

    #[test]
    fn test_zero_baseline_is_no_reading() {
        assert_eq!(HrvStatus::from_hrv(45.0, 0.0), HrvStatus::NoReading);
        assert_eq!(
            RestingHrStatus::from_resting_hr(60.0, 0.0),
            RestingHrStatus::NoReading
        );
    }

    #[test]
    fn test_resting_hr_status() {
        assert_eq!(RestingHrStatus::from_resting_hr(52.0, 50.0), RestingHrStatus::Normal);
        assert_eq!(RestingHrStatus::from_resting_hr(54.0, 50.0), RestingHrStatus::Elevated);
        assert_eq!(RestingHrStatus::from_resting_hr(57.0, 50.0), RestingHrStatus::High);
    }

    #[test]
    fn test_daily_status_uses_prior_week() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let mut records: Vec<DailyBiometricRecord> = (0..7)
            .map(|i| DailyBiometricRecord {
                hrv: Some(60.0),
                resting_hr: Some(50),
                ..DailyBiometricRecord::new(start + Duration::days(i))
            })
            .collect();
        records.push(DailyBiometricRecord {
            hrv: Some(39.0),
            resting_hr: Some(58),
            ..DailyBiometricRecord::new(start + Duration::days(7))
        });

        let status = daily_status(&records, SHORT_WINDOW).unwrap();
        assert_eq!(status.date, start + Duration::days(7));
        assert_eq!(status.hrv_baseline, 60.0);
        assert_eq!(status.hrv_status, HrvStatus::Poor);
        assert_eq!(status.resting_hr_status, RestingHrStatus::High);
    }

    #[test]
    fn test_daily_status_single_record() {
        let record = DailyBiometricRecord {
            hrv: Some(55.0),
            ..DailyBiometricRecord::new(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        };
        let status = daily_status(&[record], SHORT_WINDOW).unwrap();
        assert_eq!(status.hrv_status, HrvStatus::NoReading);
        assert!(daily_status(&[], SHORT_WINDOW).is_none());
    }

    #[test]
    fn test_daily_status_follows_baseline_window() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let records: Vec<DailyBiometricRecord> = [40.0, 40.0, 60.0, 60.0, 45.0]
            .iter()
            .enumerate()
            .map(|(i, hrv)| DailyBiometricRecord {
                hrv: Some(*hrv),
                ..DailyBiometricRecord::new(start + Duration::days(i as i64))
            })
            .collect();

        let short = daily_status(&records, 2).unwrap();
        assert_eq!(short.hrv_baseline, 60.0);
        assert_eq!(short.hrv_status, HrvStatus::Unbalanced);

        let long = daily_status(&records, 4).unwrap();
        assert_eq!(long.hrv_baseline, 50.0);
        assert_eq!(long.hrv_status, HrvStatus::Balanced);
    }
}
