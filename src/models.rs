//! Core data model: athletes, daily biometric rows, injuries and staff notes.
//!
//! These types mirror the rows served by the dashboard's REST layer. Every
//! numeric signal on [`DailyBiometricRecord`] is optional; a missing value is
//! excluded from aggregates rather than read as a bad reading.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Athlete identity plus the profile fields the scorers need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    /// Unique athlete identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Date of birth, used for the age-adjusted HRV expectation
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,

    /// Genotype calls for circadian genes, if a genetic profile exists
    #[serde(default)]
    pub genetic_markers: Vec<GeneticMarker>,
}

impl Athlete {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            date_of_birth: None,
            genetic_markers: Vec::new(),
        }
    }

    /// Age in whole years on the given date
    pub fn age_on(&self, date: NaiveDate) -> Option<u32> {
        let dob = self.date_of_birth?;
        let mut age = date.year() - dob.year();
        if (date.month(), date.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

/// A single genotype call, e.g. `PER3` / `5/5`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneticMarker {
    pub gene: String,
    pub genotype: String,
}

impl GeneticMarker {
    pub fn new(gene: impl Into<String>, genotype: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            genotype: genotype.into(),
        }
    }
}

/// One calendar day of wearable-derived signals for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBiometricRecord {
    /// Calendar day, unique per athlete
    pub date: NaiveDate,

    /// Resting heart rate (bpm)
    #[serde(default)]
    pub resting_hr: Option<u16>,

    /// Nightly heart-rate variability (ms)
    #[serde(default)]
    pub hrv: Option<f64>,

    /// Total sleep (hours)
    #[serde(default)]
    pub sleep_hours: Option<f64>,

    /// Deep sleep as a percentage of total sleep (0-100)
    #[serde(default)]
    pub deep_sleep_pct: Option<f64>,

    /// REM sleep as a percentage of total sleep (0-100)
    #[serde(default)]
    pub rem_sleep_pct: Option<f64>,

    /// Blood oxygen saturation (0-100)
    #[serde(default)]
    pub spo2: Option<f64>,

    /// Breaths per minute
    #[serde(default)]
    pub respiratory_rate: Option<f64>,

    /// Body temperature (°C)
    #[serde(default)]
    pub body_temperature: Option<f64>,

    /// Caller-supplied training intensity proxy (0-100)
    #[serde(default)]
    pub training_load_pct: Option<f64>,

    /// Clock time sleep began (HH:MM)
    #[serde(default, with = "clock_time")]
    pub sleep_onset: Option<NaiveTime>,

    /// Clock time of waking (HH:MM)
    #[serde(default, with = "clock_time")]
    pub wake_time: Option<NaiveTime>,
}

impl DailyBiometricRecord {
    /// Empty record for a day; fill signals with struct update syntax
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            resting_hr: None,
            hrv: None,
            sleep_hours: None,
            deep_sleep_pct: None,
            rem_sleep_pct: None,
            spo2: None,
            respiratory_rate: None,
            body_temperature: None,
            training_load_pct: None,
            sleep_onset: None,
            wake_time: None,
        }
    }
}

/// Injury severity as logged by the clinician
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    #[default]
    Unspecified,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "minor" => Severity::Minor,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            _ => Severity::Unspecified,
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Minor => write!(f, "Minor"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::Severe => write!(f, "Severe"),
            Severity::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Return-to-play stage, ordered from furthest to closest to full training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RtpStage {
    OffField,
    Modified,
    NonContact,
    Contact,
    #[default]
    Unspecified,
}

impl From<String> for RtpStage {
    fn from(value: String) -> Self {
        let normalized: String = value
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "offfield" => RtpStage::OffField,
            "modified" => RtpStage::Modified,
            "noncontact" => RtpStage::NonContact,
            "contact" => RtpStage::Contact,
            _ => RtpStage::Unspecified,
        }
    }
}

impl From<RtpStage> for String {
    fn from(value: RtpStage) -> Self {
        match value {
            RtpStage::OffField => "offfield",
            RtpStage::Modified => "modified",
            RtpStage::NonContact => "non-contact",
            RtpStage::Contact => "contact",
            RtpStage::Unspecified => "unspecified",
        }
        .to_string()
    }
}

impl fmt::Display for RtpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtpStage::OffField => write!(f, "Off-field"),
            RtpStage::Modified => write!(f, "Modified"),
            RtpStage::NonContact => write!(f, "Non-contact"),
            RtpStage::Contact => write!(f, "Contact"),
            RtpStage::Unspecified => write!(f, "Unspecified"),
        }
    }
}

/// Injury episode status. Anything other than an explicit close is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InjuryStatus {
    #[default]
    Open,
    Closed,
}

impl From<String> for InjuryStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "closed" | "resolved" => InjuryStatus::Closed,
            _ => InjuryStatus::Open,
        }
    }
}

impl From<InjuryStatus> for String {
    fn from(value: InjuryStatus) -> Self {
        match value {
            InjuryStatus::Open => "open",
            InjuryStatus::Closed => "closed",
        }
        .to_string()
    }
}

/// One injury episode for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    #[serde(default)]
    pub id: Option<String>,

    pub athlete_id: String,

    #[serde(default)]
    pub diagnosis: String,

    #[serde(default)]
    pub severity: Severity,

    /// Head-impact assessment flagged
    #[serde(default)]
    pub hia: bool,

    #[serde(default)]
    pub concussion: bool,

    #[serde(default)]
    pub rtp_stage: RtpStage,

    #[serde(default)]
    pub status: InjuryStatus,

    #[serde(default)]
    pub injury_date: Option<NaiveDate>,

    #[serde(default)]
    pub planned_return: Option<NaiveDate>,

    #[serde(default)]
    pub actual_return: Option<NaiveDate>,
}

impl InjuryRecord {
    pub fn new(athlete_id: impl Into<String>, diagnosis: impl Into<String>) -> Self {
        Self {
            id: None,
            athlete_id: athlete_id.into(),
            diagnosis: diagnosis.into(),
            severity: Severity::Unspecified,
            hia: false,
            concussion: false,
            rtp_stage: RtpStage::Unspecified,
            status: InjuryStatus::Open,
            injury_date: None,
            planned_return: None,
            actual_return: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == InjuryStatus::Open
    }

    /// HIA or concussion protocol applies
    pub fn is_head_impact(&self) -> bool {
        self.hia || self.concussion
    }
}

/// Staff note category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteCategory {
    Negative,
    Positive,
    Neutral,
    Other(String),
}

impl From<String> for NoteCategory {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "negative" => NoteCategory::Negative,
            "positive" => NoteCategory::Positive,
            "neutral" | "" => NoteCategory::Neutral,
            _ => NoteCategory::Other(value),
        }
    }
}

impl From<NoteCategory> for String {
    fn from(value: NoteCategory) -> Self {
        match value {
            NoteCategory::Negative => "Negative".to_string(),
            NoteCategory::Positive => "Positive".to_string(),
            NoteCategory::Neutral => "Neutral".to_string(),
            NoteCategory::Other(other) => other,
        }
    }
}

/// Free-text staff annotation; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteNote {
    pub athlete_id: String,
    pub category: NoteCategory,
    #[serde(default)]
    pub text: String,
    pub created_on: NaiveDate,
}

impl AthleteNote {
    pub fn is_negative(&self) -> bool {
        self.category == NoteCategory::Negative
    }
}

/// Ephemeral scorer output: a 0-100 value, its category and what drove it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedScore {
    pub value: f64,
    pub level: String,
    pub factors: Vec<String>,
}

impl DerivedScore {
    /// Build a score, clamping the value into 0-100
    pub fn new(value: f64, level: impl fmt::Display, factors: Vec<String>) -> Self {
        let value = if value.is_finite() {
            value.clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            value,
            level: level.to_string(),
            factors,
        }
    }
}

/// Everything fetched for one athlete: the unit the pipeline scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteInputs {
    pub athlete: Athlete,

    #[serde(default)]
    pub records: Vec<DailyBiometricRecord>,

    #[serde(default)]
    pub injuries: Vec<InjuryRecord>,

    #[serde(default)]
    pub notes: Vec<AthleteNote>,
}

impl AthleteInputs {
    pub fn new(athlete: Athlete) -> Self {
        Self {
            athlete,
            records: Vec::new(),
            injuries: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Copy of these inputs with records dated after `as_of` removed
    pub fn as_of(&self, as_of: NaiveDate) -> AthleteInputs {
        AthleteInputs {
            athlete: self.athlete.clone(),
            records: self
                .records
                .iter()
                .filter(|r| r.date <= as_of)
                .cloned()
                .collect(),
            injuries: self.injuries.clone(),
            notes: self.notes.clone(),
        }
    }
}

// HH:MM clock values on the wire, tolerant of a trailing seconds field
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_clock_time(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid clock time: {}", s))),
        }
    }
}

/// Parse an `HH:MM` (or `HH:MM:SS`) clock value
pub fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_on_birthday_boundary() {
        let mut athlete = Athlete::new("a1", "Sam Carter");
        athlete.date_of_birth = NaiveDate::from_ymd_opt(2000, 6, 15);

        let before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(athlete.age_on(before), Some(23));
        assert_eq!(athlete.age_on(on), Some(24));
    }

    #[test]
    fn test_injury_enums_parse_rest_strings() {
        let json = r#"{
            "athlete_id": "a1",
            "diagnosis": "Hamstring strain",
            "severity": "Moderate",
            "rtp_stage": "non-contact",
            "status": "open"
        }"#;

        let injury: InjuryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(injury.severity, Severity::Moderate);
        assert_eq!(injury.rtp_stage, RtpStage::NonContact);
        assert!(injury.is_open());
        assert!(!injury.is_head_impact());
    }

    #[test]
    fn test_as_of_drops_later_records() {
        let cutoff = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let mut inputs = AthleteInputs::new(Athlete::new("a1", "Sam Carter"));
        inputs.records.push(DailyBiometricRecord::new(cutoff));
        inputs.records.push(DailyBiometricRecord::new(cutoff.succ_opt().unwrap()));
        inputs.injuries.push(InjuryRecord::new("a1", "Ankle sprain"));

        let windowed = inputs.as_of(cutoff);
        assert_eq!(windowed.records.len(), 1);
        assert_eq!(windowed.records[0].date, cutoff);
        assert_eq!(windowed.injuries.len(), 1);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        assert_eq!(Severity::from("catastrophic".to_string()), Severity::Unspecified);
        assert_eq!(RtpStage::from("Off-Field".to_string()), RtpStage::OffField);
        assert_eq!(InjuryStatus::from("pending".to_string()), InjuryStatus::Open);
        assert_eq!(
            NoteCategory::from("Medical".to_string()),
            NoteCategory::Other("Medical".to_string())
        );
    }

    #[test]
    fn test_record_clock_times() {
        let json = r#"{
            "date": "2024-03-01",
            "resting_hr": 52,
            "hrv": 61.5,
            "sleep_onset": "23:15",
            "wake_time": "07:05:00"
        }"#;

        let record: DailyBiometricRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sleep_onset, NaiveTime::from_hms_opt(23, 15, 0));
        assert_eq!(record.wake_time, NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(record.sleep_hours, None);

        let out = serde_json::to_string(&record).unwrap();
        assert!(out.contains("\"sleep_onset\":\"23:15\""));
        assert!(out.contains("\"spo2\":null"));
    }

    #[test]
    fn test_derived_score_clamps() {
        assert_eq!(DerivedScore::new(130.0, "High", vec![]).value, 100.0);
        assert_eq!(DerivedScore::new(-4.0, "Low", vec![]).value, 0.0);
        assert_eq!(DerivedScore::new(f64::NAN, "Low", vec![]).value, 0.0);
    }
}
