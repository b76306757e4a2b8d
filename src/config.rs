//! Application and scoring configuration
//!
//! Every threshold and weight the scorers use lives in [`ScoringConfig`], so
//! staff can tune cut points in `config.toml` without touching logic. Missing
//! keys fall back to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::alerts::AlertConfig;
use crate::circadian::CircadianConfig;
use crate::error::{ConfigError, MonitorError, Result};
use crate::logging::LogConfig;
use crate::models::parse_clock_time;
use crate::readiness::ReadinessConfig;
use crate::risk::RiskWeights;
use crate::stress::StressConfig;

/// Longest negative-note window accepted, ten years
pub const MAX_NOTE_WINDOW_DAYS: i64 = 3650;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Scorer thresholds and weights
    pub scoring: ScoringConfig,

    /// Cohort report settings
    pub cohort: CohortSettings,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// Thresholds and weights for every scorer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub stress: StressConfig,
    pub readiness: ReadinessConfig,
    pub circadian: CircadianConfig,
    pub alerts: AlertConfig,
    pub risk: RiskWeights,
}

/// Cohort ranking defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortSettings {
    /// Athletes shown in a risk ranking
    pub top_n: usize,
}

impl Default for CohortSettings {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            metadata: ConfigMetadata::default(),
            scoring: ScoringConfig::default(),
            cohort: CohortSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, toml_content)?;

        Ok(())
    }

    /// Default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athlete-monitor")
            .join("config.toml")
    }

    /// Load from an explicit path, else the default path, else defaults.
    /// A file that exists but fails to parse or validate is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            debug!("No configuration at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from_file(&path)
    }

    /// Reject settings that would make the scorers meaningless
    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;

        if scoring.stress.moderate_threshold > scoring.stress.high_threshold {
            return Err(invalid(
                "scoring.stress.moderate_threshold",
                "must not exceed high_threshold",
            ));
        }
        if scoring.readiness.moderate_threshold > scoring.readiness.ready_threshold {
            return Err(invalid(
                "scoring.readiness.moderate_threshold",
                "must not exceed ready_threshold",
            ));
        }
        if scoring.circadian.timing_minutes_per_point <= 0.0 {
            return Err(invalid(
                "scoring.circadian.timing_minutes_per_point",
                "must be positive",
            ));
        }

        let windows = [
            ("scoring.readiness.window", scoring.readiness.window),
            ("scoring.circadian.score_window", scoring.circadian.score_window),
            ("scoring.circadian.chronotype_window", scoring.circadian.chronotype_window),
            ("scoring.alerts.baseline_window", scoring.alerts.baseline_window),
        ];
        if let Some((key, _)) = windows.iter().find(|(_, size)| *size == 0) {
            return Err(invalid(key, "must be at least 1"));
        }

        let clock_times = [
            ("scoring.circadian.late_onset", &scoring.circadian.late_onset),
            ("scoring.circadian.early_onset", &scoring.circadian.early_onset),
            ("scoring.circadian.early_wake", &scoring.circadian.early_wake),
        ];
        for (key, value) in clock_times {
            if parse_clock_time(value.trim()).is_none() {
                return Err(invalid(key, "must be an HH:MM clock time"));
            }
        }

        if !(0..=MAX_NOTE_WINDOW_DAYS).contains(&scoring.risk.note_window_days) {
            return Err(invalid(
                "scoring.risk.note_window_days",
                "must be between 0 and 3650",
            ));
        }

        Ok(())
    }

    /// Flattened `key = value` listing for display
    pub fn list_values(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(&self.scoring)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        let mut entries = Vec::new();
        flatten("scoring", &value, &mut entries);
        entries.push(("cohort.top_n".to_string(), self.cohort.top_n.to_string()));
        Ok(entries)
    }
}

fn invalid(key: &str, reason: &str) -> MonitorError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                flatten(&format!("{}.{}", prefix, key), nested, out);
            }
        }
        other => out.push((prefix.to_string(), other.to_string())),
    }
}
