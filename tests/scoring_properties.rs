use athlete_monitor::aggregation::{self, BiometricField, WindowStats};
use athlete_monitor::models::DailyBiometricRecord;
use athlete_monitor::readiness::{ReadinessCalculator, ReadinessInputs};
use athlete_monitor::{CircadianAnalyzer, RiskScorer, StressCalculator};
use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;

fn night() -> impl Strategy<Value = DailyBiometricRecord> {
    (
        prop::option::of(30u16..110),
        prop::option::of(0.0f64..200.0),
        prop::option::of(0.0f64..14.0),
        prop::option::of(0.0f64..60.0),
        prop::option::of(0u32..1440),
        prop::option::of(0u32..1440),
    )
        .prop_map(|(resting_hr, hrv, sleep_hours, deep_sleep_pct, onset, wake)| {
            let clock = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0);
            DailyBiometricRecord {
                resting_hr,
                hrv,
                sleep_hours,
                deep_sleep_pct,
                sleep_onset: onset.and_then(clock),
                wake_time: wake.and_then(clock),
                ..DailyBiometricRecord::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            }
        })
}

fn nights(max: usize) -> impl Strategy<Value = Vec<DailyBiometricRecord>> {
    prop::collection::vec(night(), 0..max).prop_map(|mut records| {
        for (i, record) in records.iter_mut().enumerate() {
            record.date += Duration::days(i as i64);
        }
        records
    })
}

proptest! {
    #[test]
    fn circadian_score_stays_in_range(records in nights(40)) {
        if let Some(score) = CircadianAnalyzer::new().score(&records) {
            prop_assert!((0.0..=100.0).contains(&score.score.value));
            prop_assert!(score.penalties.timing <= 30.0);
        } else {
            prop_assert!(records.is_empty());
        }
    }

    #[test]
    fn readiness_never_rises_with_more_sleep_debt(
        debt in 0.0f64..30.0,
        extra in 0.0f64..10.0,
        resting_hr in 0.0f64..120.0,
        hrv_trend in -40.0f64..40.0,
        load in 0.0f64..150.0,
    ) {
        let calculator = ReadinessCalculator::new();
        let base = ReadinessInputs {
            sleep_debt_hours: debt,
            hrv_trend,
            resting_hr,
            training_load_pct: load,
        };
        let worse = ReadinessInputs { sleep_debt_hours: debt + extra, ..base };

        let a = calculator.readiness(&base);
        let b = calculator.readiness(&worse);
        prop_assert!(b <= a);
        prop_assert!((0.0..=100.0).contains(&a));
    }

    #[test]
    fn readiness_never_rises_with_resting_hr(
        resting_hr in 1.0f64..120.0,
        extra in 0.0f64..40.0,
        debt in 0.0f64..20.0,
    ) {
        let calculator = ReadinessCalculator::new();
        let base = ReadinessInputs {
            sleep_debt_hours: debt,
            hrv_trend: 0.0,
            resting_hr,
            training_load_pct: 30.0,
        };
        let worse = ReadinessInputs { resting_hr: resting_hr + extra, ..base };

        prop_assert!(calculator.readiness(&worse) <= calculator.readiness(&base));
    }

    #[test]
    fn window_stats_are_finite(records in nights(60), window in 0usize..45) {
        for field in BiometricField::ALL {
            let stats = aggregation::window_stats(&records, field, window, false);
            prop_assert!(stats.mean.is_finite());
            prop_assert!(stats.std_dev >= 0.0);
            prop_assert!(stats.count <= window.min(records.len()));
            if window == 0 {
                prop_assert_eq!(stats, WindowStats::EMPTY);
            }
        }
    }

    #[test]
    fn stress_index_is_non_negative(records in nights(20), age in 15u32..70) {
        if let Some(stress) = StressCalculator::new().assess(&records, age) {
            prop_assert!(stress.index >= 0.0);
            prop_assert!((0.0..=100.0).contains(&stress.score.value));
        }
    }

    #[test]
    fn risk_score_is_non_negative(records in nights(20)) {
        let alerts = athlete_monitor::AlertClassifier::new().classify(&records);
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (score, factors) = RiskScorer::new().score(&[], &[], &alerts, as_of);
        prop_assert!(score >= 0.0);
        prop_assert_eq!(factors.len(), alerts.active().len());
    }
}

#[test]
fn empty_windows_return_zero() {
    let records: Vec<DailyBiometricRecord> = Vec::new();
    assert_eq!(aggregation::window_mean(&records, BiometricField::Hrv, 7, false), 0.0);
    assert_eq!(
        aggregation::window_stats(&records, BiometricField::SleepHours, 30, true),
        WindowStats::EMPTY
    );
    assert!(aggregation::summarize_window(&records, 7)
        .iter()
        .all(|(_, stats)| stats.count == 0));
}
