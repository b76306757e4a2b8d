//! Writing dashboard reports and cohort rankings

use crate::dashboard::AthleteDashboard;
use crate::error::{ExportError, Result};
use crate::risk::RiskAssessment;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Output formats for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(format!("Unsupported export format: {}", s)),
        }
    }
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Export any serializable data structure to pretty JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let output_path = output_path.as_ref();
    let json_data = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    let mut file = create(output_path)?;
    file.write_all(json_data.as_bytes())
        .map_err(|e| write_failed(output_path, e))?;

    info!("Wrote {}", output_path.display());
    Ok(())
}

#[derive(Serialize)]
struct RankingRow<'a> {
    rank: usize,
    athlete_id: &'a str,
    athlete_name: &'a str,
    score: f64,
    availability: String,
    alerts: String,
    factors: String,
}

/// One row per ranked athlete; factors and alerts joined with `; `
pub fn export_rankings_csv<P: AsRef<Path>>(
    rankings: &[RiskAssessment],
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let mut writer = csv::Writer::from_writer(create(output_path)?);

    for (index, assessment) in rankings.iter().enumerate() {
        let alerts: Vec<String> =
            assessment.alerts.active().iter().map(|a| a.to_string()).collect();
        writer
            .serialize(RankingRow {
                rank: index + 1,
                athlete_id: &assessment.athlete_id,
                athlete_name: &assessment.athlete_name,
                score: assessment.score,
                availability: assessment.availability.to_string(),
                alerts: alerts.join("; "),
                factors: assessment.factor_labels().join("; "),
            })
            .map_err(|e| ExportError::Serialization(e.to_string()))?;
    }

    writer.flush().map_err(|e| write_failed(output_path, e))?;
    info!("Wrote {} ranking rows to {}", rankings.len(), output_path.display());
    Ok(())
}

#[derive(Serialize)]
struct DashboardRow<'a> {
    athlete_id: &'a str,
    athlete_name: &'a str,
    as_of: String,
    stress_index: Option<f64>,
    stress_level: Option<String>,
    readiness: Option<f64>,
    readiness_level: Option<String>,
    circadian_score: Option<f64>,
    chronotype: String,
    risk_score: f64,
    availability: String,
}

/// Flat summary row per dashboard
pub fn export_dashboards_csv<P: AsRef<Path>>(
    dashboards: &[AthleteDashboard],
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let mut writer = csv::Writer::from_writer(create(output_path)?);

    for dashboard in dashboards {
        writer
            .serialize(DashboardRow {
                athlete_id: &dashboard.athlete_id,
                athlete_name: &dashboard.athlete_name,
                as_of: dashboard.as_of.to_string(),
                stress_index: dashboard.stress.as_ref().map(|s| s.index),
                stress_level: dashboard.stress.as_ref().map(|s| s.level.to_string()),
                readiness: dashboard.readiness.as_ref().map(|r| r.score.value),
                readiness_level: dashboard.readiness.as_ref().map(|r| r.level.to_string()),
                circadian_score: dashboard.circadian.as_ref().map(|c| c.score.value),
                chronotype: dashboard.chronotype.chronotype.to_string(),
                risk_score: dashboard.risk_score,
                availability: dashboard.availability.to_string(),
            })
            .map_err(|e| ExportError::Serialization(e.to_string()))?;
    }

    writer.flush().map_err(|e| write_failed(output_path, e))?;
    Ok(())
}

fn create(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
    }
    Ok(fs::File::create(path).map_err(|e| write_failed(path, e))?)
}

fn write_failed(path: &Path, err: std::io::Error) -> ExportError {
    ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
