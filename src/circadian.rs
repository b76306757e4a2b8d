//! Circadian rhythm score and chronotype classification
//!
//! ## Rhythm score
//! Starts at 100 and subtracts four penalties:
//! - sleep timing irregularity (SD of onset and wake clock times, capped)
//! - average sleep below 7 hours
//! - average deep sleep below 20%
//! - average nightly HRV below 50 ms
//!
//! The result is clamped to 0-100. A signal absent from every record adds no
//! penalty.
//!
//! ## Chronotype
//! Genotype calls for circadian genes add signed weights to a running score
//! (positive leans Morning, negative leans Evening). Observed sleep timing
//! overrides genetics outright when it is decisive: very late onset means
//! Evening, very early onset with early waking means Morning. Otherwise the
//! sign of the genetic score decides.

use crate::aggregation::{self, BiometricField, WindowStats, LONG_WINDOW, SHORT_WINDOW};
use crate::models::{DailyBiometricRecord, DerivedScore, GeneticMarker};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

const MINUTES_PER_DAY: f64 = 1440.0;
const NOON_MINUTES: f64 = 720.0;

/// Circadian scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircadianConfig {
    /// Records used for the rhythm score
    pub score_window: usize,

    /// Records used for behavioral chronotype rules
    pub chronotype_window: usize,

    /// Minutes of timing SD per penalty point
    pub timing_minutes_per_point: f64,

    /// Maximum timing penalty
    pub timing_penalty_cap: f64,

    pub sleep_target_hours: f64,
    pub sleep_penalty_per_hour: f64,

    pub deep_sleep_target_pct: f64,
    pub deep_sleep_penalty_per_pct: f64,

    pub hrv_target_ms: f64,
    pub hrv_penalty_per_ms: f64,

    /// Average onset at or after this time means Evening (HH:MM)
    pub late_onset: String,

    /// Average onset at or before this time, with early wake, means Morning
    pub early_onset: String,

    /// Average wake at or before this time, with early onset, means Morning
    pub early_wake: String,
}

impl Default for CircadianConfig {
    fn default() -> Self {
        CircadianConfig {
            score_window: SHORT_WINDOW,
            chronotype_window: LONG_WINDOW,
            timing_minutes_per_point: 2.0,
            timing_penalty_cap: 30.0,
            sleep_target_hours: 7.0,
            sleep_penalty_per_hour: 5.0,
            deep_sleep_target_pct: 20.0,
            deep_sleep_penalty_per_pct: 2.0,
            hrv_target_ms: 50.0,
            hrv_penalty_per_ms: 0.5,
            late_onset: "01:00".to_string(),
            early_onset: "22:00".to_string(),
            early_wake: "06:00".to_string(),
        }
    }
}

/// Individual penalty contributions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CircadianPenalties {
    pub timing: f64,
    pub sleep_duration: f64,
    pub deep_sleep: f64,
    pub hrv: f64,
}

impl CircadianPenalties {
    pub fn total(&self) -> f64 {
        self.timing + self.sleep_duration + self.deep_sleep + self.hrv
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircadianScore {
    /// Mean of onset and wake SDs (minutes), when timing data exists
    pub timing_sd_minutes: Option<f64>,
    pub penalties: CircadianPenalties,
    pub score: DerivedScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chronotype {
    Morning,
    Intermediate,
    Evening,
}

impl fmt::Display for Chronotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chronotype::Morning => write!(f, "Morning Type"),
            Chronotype::Intermediate => write!(f, "Intermediate Type"),
            Chronotype::Evening => write!(f, "Evening Type"),
        }
    }
}

/// What decided the chronotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChronotypeBasis {
    Behavioral,
    Genetic,
    /// No markers scored and no decisive sleep timing
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronotypeAssessment {
    pub chronotype: Chronotype,
    pub basis: ChronotypeBasis,
    pub genetic_score: i32,
    /// Average onset as minutes after midnight of the previous day's evening,
    /// unwrapped so 00:30 reads as 1470
    pub avg_onset_minutes: Option<f64>,
    pub avg_wake_minutes: Option<f64>,
}

/// Onset minute-of-day, with early-morning onsets carried past midnight
fn onset_minutes(time: NaiveTime) -> f64 {
    let minutes = f64::from(time.hour() * 60 + time.minute());
    if minutes < NOON_MINUTES {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

fn wake_minutes(time: NaiveTime) -> f64 {
    f64::from(time.hour() * 60 + time.minute())
}

fn clock_minutes(value: &str) -> Option<f64> {
    crate::models::parse_clock_time(value).map(|t| f64::from(t.hour() * 60 + t.minute()))
}

/// Signed chronotype weight of one genotype call
///
/// | Gene | Call | Weight |
/// |------|------|--------|
/// | PER3 | 5/5 | +2 |
/// | PER3 | 4/5 | +1 |
/// | PER3 | 4/4 | -1 |
/// | CLOCK | TT | +1 |
/// | CLOCK | TC | -1 |
/// | CLOCK | CC | -2 |
/// | PER2 | GG | +1 |
/// | CRY1 | variant | -2 |
pub fn genetic_weight(marker: &GeneticMarker) -> i32 {
    let gene = marker.gene.trim().to_uppercase();
    let call: String = marker
        .genotype
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match (gene.as_str(), call.as_str()) {
        ("PER3", "5/5") => 2,
        ("PER3", "4/5") | ("PER3", "5/4") => 1,
        ("PER3", "4/4") => -1,
        ("CLOCK", "TT") => 1,
        ("CLOCK", "TC") | ("CLOCK", "CT") => -1,
        ("CLOCK", "CC") => -2,
        ("PER2", "GG") => 1,
        ("CRY1", "VARIANT") => -2,
        _ => 0,
    }
}

pub fn genetic_score(markers: &[GeneticMarker]) -> i32 {
    markers.iter().map(genetic_weight).sum()
}

pub struct CircadianAnalyzer {
    config: CircadianConfig,
}

impl CircadianAnalyzer {
    pub fn new() -> Self {
        CircadianAnalyzer {
            config: CircadianConfig::default(),
        }
    }

    pub fn with_config(config: CircadianConfig) -> Self {
        CircadianAnalyzer { config }
    }

    /// Mean of the onset and wake SDs (minutes) over the given records
    pub fn timing_sd_minutes(&self, records: &[&DailyBiometricRecord]) -> Option<f64> {
        let onsets: Vec<f64> = records
            .iter()
            .filter_map(|r| r.sleep_onset.map(onset_minutes))
            .collect();
        let wakes: Vec<f64> = records
            .iter()
            .filter_map(|r| r.wake_time.map(wake_minutes))
            .collect();

        let sds: Vec<f64> = [onsets, wakes]
            .iter()
            .filter(|values| !values.is_empty())
            .map(|values| WindowStats::from_values(values).std_dev)
            .collect();

        if sds.is_empty() {
            None
        } else {
            Some(sds.iter().sum::<f64>() / sds.len() as f64)
        }
    }

    /// Rhythm score over the trailing window; `None` for no records
    pub fn score(&self, records: &[DailyBiometricRecord]) -> Option<CircadianScore> {
        let window = aggregation::trailing_window(records, self.config.score_window, false);
        if window.is_empty() {
            return None;
        }

        let timing_sd_minutes = self.timing_sd_minutes(&window);
        let mean_of = |field: BiometricField| {
            let stats = WindowStats::from_values(&aggregation::field_values(
                window.iter().copied(),
                field,
            ));
            (stats.count > 0).then_some(stats.mean)
        };

        let penalties = CircadianPenalties {
            timing: timing_sd_minutes
                .map(|sd| {
                    (sd / self.config.timing_minutes_per_point).min(self.config.timing_penalty_cap)
                })
                .unwrap_or(0.0),
            sleep_duration: mean_of(BiometricField::SleepHours)
                .map(|avg| {
                    (self.config.sleep_target_hours - avg).max(0.0)
                        * self.config.sleep_penalty_per_hour
                })
                .unwrap_or(0.0),
            deep_sleep: mean_of(BiometricField::DeepSleepPct)
                .map(|avg| {
                    (self.config.deep_sleep_target_pct - avg).max(0.0)
                        * self.config.deep_sleep_penalty_per_pct
                })
                .unwrap_or(0.0),
            hrv: mean_of(BiometricField::Hrv)
                .map(|avg| {
                    (self.config.hrv_target_ms - avg).max(0.0) * self.config.hrv_penalty_per_ms
                })
                .unwrap_or(0.0),
        };

        let value = (100.0 - penalties.total()).clamp(0.0, 100.0);

        let mut factors = Vec::new();
        if penalties.timing > 0.0 {
            factors.push(format!(
                "Irregular sleep timing (-{:.1})",
                penalties.timing
            ));
        }
        if penalties.sleep_duration > 0.0 {
            factors.push(format!("Short sleep (-{:.1})", penalties.sleep_duration));
        }
        if penalties.deep_sleep > 0.0 {
            factors.push(format!("Low deep sleep (-{:.1})", penalties.deep_sleep));
        }
        if penalties.hrv > 0.0 {
            factors.push(format!("Low nightly HRV (-{:.1})", penalties.hrv));
        }

        Some(CircadianScore {
            timing_sd_minutes,
            penalties,
            score: DerivedScore::new(value, rhythm_label(value), factors),
        })
    }

    /// Classify chronotype. Behavioral rules take precedence over genetics.
    pub fn classify_chronotype(
        &self,
        markers: &[GeneticMarker],
        records: &[DailyBiometricRecord],
    ) -> ChronotypeAssessment {
        let genetic_score = genetic_score(markers);
        let window = aggregation::trailing_window(records, self.config.chronotype_window, false);

        let avg = |values: Vec<f64>| {
            let stats = WindowStats::from_values(&values);
            (stats.count > 0).then_some(stats.mean)
        };
        let avg_onset_minutes = avg(window
            .iter()
            .filter_map(|r| r.sleep_onset.map(onset_minutes))
            .collect());
        let avg_wake_minutes = avg(window
            .iter()
            .filter_map(|r| r.wake_time.map(wake_minutes))
            .collect());

        let late_onset = clock_minutes(&self.config.late_onset)
            .map(|m| if m < NOON_MINUTES { m + MINUTES_PER_DAY } else { m });
        let early_onset = clock_minutes(&self.config.early_onset)
            .map(|m| if m < NOON_MINUTES { m + MINUTES_PER_DAY } else { m });
        let early_wake = clock_minutes(&self.config.early_wake);

        let behavioral = match (avg_onset_minutes, avg_wake_minutes) {
            (Some(onset), _) if late_onset.map_or(false, |late| onset >= late) => {
                Some(Chronotype::Evening)
            }
            (Some(onset), Some(wake))
                if early_onset.map_or(false, |early| onset <= early)
                    && early_wake.map_or(false, |early| wake <= early) =>
            {
                Some(Chronotype::Morning)
            }
            _ => None,
        };

        let (chronotype, basis) = match behavioral {
            Some(chronotype) => (chronotype, ChronotypeBasis::Behavioral),
            None if genetic_score > 0 => (Chronotype::Morning, ChronotypeBasis::Genetic),
            None if genetic_score < 0 => (Chronotype::Evening, ChronotypeBasis::Genetic),
            None => (Chronotype::Intermediate, ChronotypeBasis::Default),
        };

        ChronotypeAssessment {
            chronotype,
            basis,
            genetic_score,
            avg_onset_minutes,
            avg_wake_minutes,
        }
    }
}

impl Default for CircadianAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn rhythm_label(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "Aligned",
        s if s >= 60.0 => "Mildly Disrupted",
        _ => "Disrupted",
    }
}
