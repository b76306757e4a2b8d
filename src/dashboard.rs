//! Per-athlete derived-metrics report
//!
//! One call composes every scorer over an athlete's fetched rows. Nothing is
//! cached between calls; the report is recomputed from inputs each time.

use crate::aggregation::{self, BiometricField, WindowStats, LONG_WINDOW, SHORT_WINDOW};
use crate::alerts::{AlertClassifier, BiometricAlerts};
use crate::availability::{classify_availability, limiting_injury, AvailabilityState};
use crate::circadian::{ChronotypeAssessment, CircadianAnalyzer, CircadianScore};
use crate::config::ScoringConfig;
use crate::models::AthleteInputs;
use crate::readiness::{ReadinessAssessment, ReadinessCalculator};
use crate::recovery::{self, DailyStatus};
use crate::risk::{RiskFactor, RiskScorer};
use crate::stress::{StressAssessment, StressCalculator, DEFAULT_AGE};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Short and long window averages for the headline signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub field: BiometricField,
    pub short: WindowStats,
    pub long: WindowStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteDashboard {
    pub athlete_id: String,
    pub athlete_name: String,
    pub as_of: NaiveDate,
    /// Age used for the stress index
    pub age: u32,
    pub daily_status: Option<DailyStatus>,
    pub stress: Option<StressAssessment>,
    pub readiness: Option<ReadinessAssessment>,
    pub circadian: Option<CircadianScore>,
    pub chronotype: ChronotypeAssessment,
    pub alerts: BiometricAlerts,
    pub risk_score: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub availability: AvailabilityState,
    pub trends: Vec<TrendSummary>,
    pub recommendations: Vec<String>,
}

const TREND_FIELDS: [BiometricField; 4] = [
    BiometricField::Hrv,
    BiometricField::RestingHr,
    BiometricField::SleepHours,
    BiometricField::TrainingLoadPct,
];

impl AthleteDashboard {
    #[instrument(skip_all, fields(athlete_id = %inputs.athlete.id))]
    pub fn compute(inputs: &AthleteInputs, as_of: NaiveDate, config: &ScoringConfig) -> Self {
        let windowed = inputs.as_of(as_of);
        let inputs = &windowed;
        let records = &inputs.records;
        let age = inputs.athlete.age_on(as_of).unwrap_or(DEFAULT_AGE);

        let stress = StressCalculator::with_config(config.stress.clone()).assess(records, age);
        let readiness = ReadinessCalculator::with_config(config.readiness.clone()).assess(records);

        let circadian_analyzer = CircadianAnalyzer::with_config(config.circadian.clone());
        let circadian = circadian_analyzer.score(records);
        let chronotype =
            circadian_analyzer.classify_chronotype(&inputs.athlete.genetic_markers, records);

        let alerts = AlertClassifier::with_config(config.alerts.clone()).classify(records);
        let risk_scorer = RiskScorer::with_config(config.risk.clone(), config.alerts.clone());
        let (risk_score, risk_factors) =
            risk_scorer.score(&inputs.injuries, &inputs.notes, &alerts, as_of);

        let availability = classify_availability(&inputs.injuries);

        let trends = TREND_FIELDS
            .iter()
            .map(|&field| TrendSummary {
                field,
                short: aggregation::window_stats(records, field, SHORT_WINDOW, false),
                long: aggregation::window_stats(records, field, LONG_WINDOW, false),
            })
            .collect();

        let mut recommendations = Vec::new();
        if let Some(injury) = limiting_injury(&inputs.injuries) {
            recommendations.push(format!(
                "{}: {} (RTP stage {})",
                availability.description(),
                injury.diagnosis,
                injury.rtp_stage
            ));
        }
        if let Some(readiness) = &readiness {
            recommendations.extend(readiness.recommendations.iter().cloned());
        }
        for alert in alerts.active() {
            recommendations.push(format!("Review {} flagged on latest reading", alert));
        }

        debug!(
            record_count = records.len(),
            risk_score,
            availability = %availability,
            "Dashboard computed"
        );

        AthleteDashboard {
            athlete_id: inputs.athlete.id.clone(),
            athlete_name: inputs.athlete.name.clone(),
            as_of,
            age,
            daily_status: recovery::daily_status(records, config.alerts.baseline_window),
            stress,
            readiness,
            circadian,
            chronotype,
            alerts,
            risk_score,
            risk_factors,
            availability,
            trends,
            recommendations,
        }
    }
}
