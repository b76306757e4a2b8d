// Library interface for athlete-monitor modules
// Scorers are pure functions over fetched rows; import, export and config
// are the only fallible edges.

pub mod aggregation;
pub mod alerts;
pub mod availability;
pub mod circadian;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod readiness;
pub mod recovery;
pub mod risk;
pub mod stress;

// Re-export commonly used types for convenience
pub use models::*;
pub use aggregation::{BiometricField, WindowStats};
pub use alerts::{AlertClassifier, BiometricAlerts};
pub use availability::{classify_availability, AvailabilityState};
pub use circadian::{Chronotype, CircadianAnalyzer};
pub use config::{AppConfig, ScoringConfig};
pub use dashboard::AthleteDashboard;
pub use readiness::ReadinessCalculator;
pub use risk::{RiskAssessment, RiskScorer};
pub use stress::StressCalculator;
pub use error::{MonitorError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel, LogRotation};
