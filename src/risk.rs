//! Weighted injury-risk score and cohort ranking
//!
//! The score is an unbounded sum of fixed weights: open-injury severity, HIA
//! and RTP stage, recent negative staff notes (capped), and the acute
//! biometric alerts. It has no status mapping of its own; staff rank a
//! cohort by raw score and review the top of the list.

use crate::alerts::{AlertClassifier, AlertConfig, BiometricAlerts};
use crate::availability::{classify_availability, AvailabilityState};
use crate::models::{AthleteInputs, AthleteNote, InjuryRecord, RtpStage, Severity};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Risk weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub head_impact: f64,
    pub severe: f64,
    pub moderate: f64,
    pub minor: f64,
    pub rtp_off_field: f64,
    pub rtp_modified: f64,
    pub rtp_non_contact: f64,
    pub rtp_contact: f64,
    pub negative_note: f64,
    /// Cap on the total from negative notes
    pub negative_note_cap: f64,
    /// Notes older than this many days are ignored
    pub note_window_days: i64,
    pub hrv_drop: f64,
    pub resting_hr_rise: f64,
    pub load_spike: f64,
    pub low_sleep: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            head_impact: 40.0,
            severe: 40.0,
            moderate: 20.0,
            minor: 10.0,
            rtp_off_field: 30.0,
            rtp_modified: 20.0,
            rtp_non_contact: 10.0,
            rtp_contact: 5.0,
            negative_note: 10.0,
            negative_note_cap: 20.0,
            note_window_days: 14,
            hrv_drop: 15.0,
            resting_hr_rise: 10.0,
            load_spike: 15.0,
            low_sleep: 10.0,
        }
    }
}

impl RiskWeights {
    pub fn severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Severe => self.severe,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
            Severity::Unspecified => 0.0,
        }
    }

    pub fn rtp_stage(&self, stage: RtpStage) -> f64 {
        match stage {
            RtpStage::OffField => self.rtp_off_field,
            RtpStage::Modified => self.rtp_modified,
            RtpStage::NonContact => self.rtp_non_contact,
            RtpStage::Contact => self.rtp_contact,
            RtpStage::Unspecified => 0.0,
        }
    }
}

/// One contribution to a risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub label: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub athlete_id: String,
    pub athlete_name: String,
    /// Raw, unbounded score
    pub score: f64,
    pub factors: Vec<RiskFactor>,
    pub alerts: BiometricAlerts,
    pub availability: AvailabilityState,
}

impl RiskAssessment {
    pub fn factor_labels(&self) -> Vec<String> {
        self.factors.iter().map(|f| f.label.clone()).collect()
    }
}

pub struct RiskScorer {
    weights: RiskWeights,
    alerts: AlertClassifier,
}

impl RiskScorer {
    pub fn new() -> Self {
        RiskScorer {
            weights: RiskWeights::default(),
            alerts: AlertClassifier::new(),
        }
    }

    pub fn with_config(weights: RiskWeights, alert_config: AlertConfig) -> Self {
        RiskScorer {
            weights,
            alerts: AlertClassifier::with_config(alert_config),
        }
    }

    /// Factors from open injuries
    pub fn injury_factors(&self, injuries: &[InjuryRecord]) -> Vec<RiskFactor> {
        let mut factors = Vec::new();

        for injury in injuries.iter().filter(|i| i.is_open()) {
            let name = if injury.diagnosis.is_empty() {
                "Injury"
            } else {
                injury.diagnosis.as_str()
            };

            if injury.is_head_impact() && self.weights.head_impact > 0.0 {
                factors.push(RiskFactor {
                    label: format!("{}: HIA/concussion", name),
                    points: self.weights.head_impact,
                });
            }

            let severity_points = self.weights.severity(injury.severity);
            if severity_points > 0.0 {
                factors.push(RiskFactor {
                    label: format!("{}: {} severity", name, injury.severity),
                    points: severity_points,
                });
            }

            let rtp_points = self.weights.rtp_stage(injury.rtp_stage);
            if rtp_points > 0.0 {
                factors.push(RiskFactor {
                    label: format!("{}: RTP {}", name, injury.rtp_stage),
                    points: rtp_points,
                });
            }
        }

        factors
    }

    /// Negative notes inside the trailing window, capped
    pub fn note_factor(&self, notes: &[AthleteNote], as_of: NaiveDate) -> Option<RiskFactor> {
        let window_start = as_of
            .checked_sub_signed(Duration::days(self.weights.note_window_days))
            .unwrap_or(NaiveDate::MIN);
        let count = notes
            .iter()
            .filter(|n| n.is_negative())
            .filter(|n| n.created_on >= window_start && n.created_on <= as_of)
            .count();

        if count == 0 {
            return None;
        }

        let points =
            (self.weights.negative_note * count as f64).min(self.weights.negative_note_cap);
        Some(RiskFactor {
            label: format!(
                "{} negative note(s) in last {} days",
                count, self.weights.note_window_days
            ),
            points,
        })
    }

    /// Factors from raised biometric alerts
    pub fn alert_factors(&self, alerts: &BiometricAlerts) -> Vec<RiskFactor> {
        let weighted = [
            (alerts.hrv_drop, "HRV drop", self.weights.hrv_drop),
            (alerts.resting_hr_rise, "Resting HR rise", self.weights.resting_hr_rise),
            (alerts.load_spike, "Load spike", self.weights.load_spike),
            (alerts.low_sleep, "Low sleep", self.weights.low_sleep),
        ];

        weighted
            .into_iter()
            .filter(|(raised, _, points)| *raised && *points > 0.0)
            .map(|(_, label, points)| RiskFactor {
                label: label.to_string(),
                points,
            })
            .collect()
    }

    /// Sum every contribution. No clamping.
    pub fn score(
        &self,
        injuries: &[InjuryRecord],
        notes: &[AthleteNote],
        alerts: &BiometricAlerts,
        as_of: NaiveDate,
    ) -> (f64, Vec<RiskFactor>) {
        let mut factors = self.injury_factors(injuries);
        factors.extend(self.note_factor(notes, as_of));
        factors.extend(self.alert_factors(alerts));

        let total = factors.iter().map(|f| f.points).sum();
        (total, factors)
    }

    /// Assess one athlete using only records dated on or before `as_of`
    pub fn assess(&self, inputs: &AthleteInputs, as_of: NaiveDate) -> RiskAssessment {
        let inputs = &inputs.as_of(as_of);
        let alerts = self.alerts.classify(&inputs.records);
        let (score, factors) = self.score(&inputs.injuries, &inputs.notes, &alerts, as_of);

        debug!(
            athlete_id = %inputs.athlete.id,
            score,
            factor_count = factors.len(),
            "Risk score computed"
        );

        RiskAssessment {
            athlete_id: inputs.athlete.id.clone(),
            athlete_name: inputs.athlete.name.clone(),
            score,
            factors,
            alerts,
            availability: classify_availability(&inputs.injuries),
        }
    }

    /// Score a cohort and return the `top_n` highest, ties broken by athlete id
    pub fn rank_cohort(
        &self,
        cohort: &[AthleteInputs],
        as_of: NaiveDate,
        top_n: usize,
    ) -> Vec<RiskAssessment> {
        let mut ranked: Vec<RiskAssessment> = cohort
            .par_iter()
            .map(|inputs| self.assess(inputs, as_of))
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.athlete_id.cmp(&b.athlete_id))
        });
        ranked.truncate(top_n);
        ranked
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Athlete, DailyBiometricRecord, InjuryStatus, NoteCategory};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 30).unwrap()
    }

    fn note(days_ago: i64, category: NoteCategory) -> AthleteNote {
        AthleteNote {
            athlete_id: "a1".to_string(),
            category,
            text: "Flat in training".to_string(),
            created_on: as_of() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_single_record_without_flags_scores_zero() {
        let mut inputs = AthleteInputs::new(Athlete::new("a1", "Jordan Reyes"));
        inputs.records.push(DailyBiometricRecord {
            hrv: Some(60.0),
            sleep_hours: Some(8.0),
            ..DailyBiometricRecord::new(as_of())
        });

        let assessment = RiskScorer::new().assess(&inputs, as_of());
        assert_eq!(assessment.score, 0.0);
        assert!(assessment.factors.is_empty());
        assert_eq!(assessment.availability, AvailabilityState::Healthy);
    }

    #[test]
    fn test_injury_weights_accumulate() {
        let injuries = vec![
            InjuryRecord {
                hia: true,
                severity: Severity::Moderate,
                rtp_stage: RtpStage::OffField,
                ..InjuryRecord::new("a1", "Concussion")
            },
            InjuryRecord {
                severity: Severity::Minor,
                rtp_stage: RtpStage::Contact,
                ..InjuryRecord::new("a1", "Ankle sprain")
            },
            InjuryRecord {
                severity: Severity::Severe,
                status: InjuryStatus::Closed,
                ..InjuryRecord::new("a1", "ACL")
            },
        ];

        let (score, factors) =
            RiskScorer::new().score(&injuries, &[], &BiometricAlerts::default(), as_of());
        // 40 + 20 + 30, then 10 + 5; the closed ACL is ignored
        assert_eq!(score, 105.0);
        assert_eq!(factors.len(), 5);
    }

    #[test]
    fn test_negative_notes_capped_and_windowed() {
        let scorer = RiskScorer::new();
        let notes = vec![
            note(1, NoteCategory::Negative),
            note(3, NoteCategory::Negative),
            note(5, NoteCategory::Negative),
            note(30, NoteCategory::Negative),
            note(2, NoteCategory::Positive),
        ];

        let factor = scorer.note_factor(&notes, as_of()).unwrap();
        assert_eq!(factor.points, 20.0);
        assert!(factor.label.starts_with("3 negative"));

        let one = scorer.note_factor(&notes[..1], as_of()).unwrap();
        assert_eq!(one.points, 10.0);
        assert!(scorer.note_factor(&notes[3..], as_of()).is_none());
    }

    #[test]
    fn test_huge_note_window_does_not_overflow() {
        let scorer = RiskScorer::with_config(
            RiskWeights {
                note_window_days: 1_000_000_000,
                ..RiskWeights::default()
            },
            AlertConfig::default(),
        );
        let factor = scorer.note_factor(&[note(400, NoteCategory::Negative)], as_of()).unwrap();
        assert_eq!(factor.points, 10.0);
    }

    #[test]
    fn test_assess_ignores_records_after_as_of() {
        let mut inputs = AthleteInputs::new(Athlete::new("a1", "Jordan Reyes"));
        inputs.records.push(DailyBiometricRecord {
            sleep_hours: Some(8.0),
            ..DailyBiometricRecord::new(as_of())
        });
        inputs.records.push(DailyBiometricRecord {
            sleep_hours: Some(4.0),
            ..DailyBiometricRecord::new(as_of() + Duration::days(9))
        });

        let assessment = RiskScorer::new().assess(&inputs, as_of());
        assert_eq!(assessment.alerts.date, Some(as_of()));
        assert_eq!(assessment.score, 0.0);

        let ranked = RiskScorer::new().rank_cohort(&[inputs], as_of(), 5);
        assert_eq!(ranked[0].score, 0.0);
    }

    #[test]
    fn test_alert_weights() {
        let alerts = BiometricAlerts {
            hrv_drop: true,
            resting_hr_rise: true,
            load_spike: true,
            low_sleep: true,
            ..BiometricAlerts::default()
        };
        let (score, _) = RiskScorer::new().score(&[], &[], &alerts, as_of());
        assert_eq!(score, 50.0);
    }

    #[test]
    fn test_score_is_not_clamped() {
        let injuries: Vec<InjuryRecord> = (0..3)
            .map(|_| InjuryRecord {
                concussion: true,
                severity: Severity::Severe,
                rtp_stage: RtpStage::OffField,
                ..InjuryRecord::new("a1", "Head knock")
            })
            .collect();
        let (score, _) =
            RiskScorer::new().score(&injuries, &[], &BiometricAlerts::default(), as_of());
        assert_eq!(score, 330.0);
    }

    #[test]
    fn test_rank_cohort_orders_and_truncates() {
        let mut cohort = Vec::new();
        for (id, severity) in [
            ("c", Severity::Minor),
            ("a", Severity::Severe),
            ("b", Severity::Minor),
            ("d", Severity::Unspecified),
        ] {
            let mut inputs = AthleteInputs::new(Athlete::new(id, id.to_uppercase()));
            inputs.injuries.push(InjuryRecord {
                severity,
                ..InjuryRecord::new(id, "Strain")
            });
            cohort.push(inputs);
        }

        let ranked = RiskScorer::new().rank_cohort(&cohort, as_of(), 3);
        let ids: Vec<&str> = ranked.iter().map(|r| r.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(ranked[0].availability, AvailabilityState::Out);
    }
}
