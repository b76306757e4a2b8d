use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::Level;

use athlete_monitor::aggregation::{self, BiometricField};
use athlete_monitor::config::AppConfig;
use athlete_monitor::dashboard::AthleteDashboard;
use athlete_monitor::error::MonitorError;
use athlete_monitor::export::{self, ExportFormat};
use athlete_monitor::import;
use athlete_monitor::logging::{init_logging, LogLevel};
use athlete_monitor::risk::{RiskAssessment, RiskScorer};
use athlete_monitor::{classify_availability, AvailabilityState};

/// Athlete Monitor - derived wellness and risk metrics
///
/// Computes stress, readiness, circadian, acute-alert and injury-risk scores
/// from daily biometric rows, injuries and staff notes.
#[derive(Parser)]
#[command(name = "athlete-monitor")]
#[command(version)]
#[command(about = "Athlete wellness and injury-risk dashboard", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full dashboard for one athlete or the whole cohort
    Dashboard {
        /// Cohort file (JSON array of athlete inputs)
        #[arg(short, long)]
        cohort: PathBuf,

        /// Only this athlete ID
        #[arg(short, long)]
        athlete: Option<String>,

        /// Evaluation date (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Write the report to a JSON or CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file format (json, csv); inferred from the extension if omitted
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// Rank the cohort by injury-risk score
    Rank {
        /// Cohort file (JSON array of athlete inputs)
        #[arg(short, long)]
        cohort: PathBuf,

        /// Number of athletes to show (default from config)
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Evaluation date (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Write the ranking to a JSON or CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file format (json, csv); inferred from the extension if omitted
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// Show availability state for every athlete
    Availability {
        /// Cohort file (JSON array of athlete inputs)
        #[arg(short, long)]
        cohort: PathBuf,
    },

    /// Rolling window statistics over a file of daily records
    Stats {
        /// Daily records (JSON or CSV)
        #[arg(short, long)]
        records: PathBuf,

        /// Single field (e.g. hrv, resting_hr); all fields if omitted
        #[arg(short, long)]
        field: Option<String>,

        /// Window length in records
        #[arg(short, long, default_value = "7")]
        window: usize,
    },

    /// Configure application settings
    Config {
        /// List all configuration values
        #[arg(short, long)]
        list: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct RankRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Athlete")]
    name: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Status")]
    availability: String,
    #[tabled(rename = "Factors")]
    factors: String,
}

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std Dev")]
    std_dev: String,
    #[tabled(rename = "Count")]
    count: usize,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        report(&err);
        std::process::exit(1);
    }
}

/// Print the friendliest message available for a failure
fn report(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<MonitorError>()) {
        Some(monitor_err) => {
            if monitor_err.severity().to_tracing_level() == Level::WARN {
                tracing::warn!(error = %monitor_err, "Command failed");
            } else {
                tracing::error!(error = %monitor_err, "Command failed");
            }
            eprintln!("{} {}", "✗".red().bold(), monitor_err.user_message());
            if err.chain().count() > 1 {
                eprintln!("  {}", format!("{:#}", err).dimmed());
            }
        }
        None => eprintln!("{} {:#}", "✗".red().bold(), err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let (mut config, rejected) = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    init_logging(&config.logging).context("Failed to initialize logging")?;

    if let Some(err) = rejected {
        return Err(err).context("Rejected configuration file");
    }

    match cli.command {
        Commands::Dashboard {
            cohort,
            athlete,
            as_of,
            output,
            format,
        } => {
            let output = output.map(|path| resolve_output(path, format));
            run_dashboard(&config, &cohort, athlete.as_deref(), resolve_date(as_of), output)?
        }

        Commands::Rank {
            cohort,
            top,
            as_of,
            output,
            format,
        } => {
            let top_n = top.unwrap_or(config.cohort.top_n);
            let output = output.map(|path| resolve_output(path, format));
            run_rank(&config, &cohort, top_n, resolve_date(as_of), output)?
        }

        Commands::Availability { cohort } => run_availability(&cohort)?,

        Commands::Stats {
            records,
            field,
            window,
        } => run_stats(&records, field.as_deref(), window)?,

        Commands::Config { list, init } => {
            run_config(cli.config.as_deref(), &config, list, init)?
        }
    }

    Ok(())
}

fn resolve_date(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Explicit `--format` wins over the file extension
fn resolve_output(path: PathBuf, format: Option<ExportFormat>) -> (PathBuf, ExportFormat) {
    let format = format.unwrap_or_else(|| ExportFormat::from_path(&path));
    (path, format)
}

fn run_dashboard(
    config: &AppConfig,
    cohort_path: &Path,
    athlete: Option<&str>,
    as_of: NaiveDate,
    output: Option<(PathBuf, ExportFormat)>,
) -> Result<()> {
    let cohort = import::load_cohort(cohort_path)
        .with_context(|| format!("Failed to load cohort from {}", cohort_path.display()))?;

    let dashboards: Vec<AthleteDashboard> = cohort
        .iter()
        .filter(|inputs| athlete.map_or(true, |id| inputs.athlete.id == id))
        .map(|inputs| AthleteDashboard::compute(inputs, as_of, &config.scoring))
        .collect();

    if dashboards.is_empty() {
        bail!("No athlete matched {}", athlete.unwrap_or("the cohort file"));
    }

    if let Some((path, format)) = output {
        match format {
            ExportFormat::Json => export::export_json(&dashboards, &path)?,
            ExportFormat::Csv => export::export_dashboards_csv(&dashboards, &path)?,
        }
        println!("{} {}", "✓ Dashboard written to".green(), path.display());
        return Ok(());
    }

    for dashboard in &dashboards {
        print_dashboard(dashboard);
    }
    Ok(())
}

fn print_dashboard(dashboard: &AthleteDashboard) {
    println!(
        "{} {} ({})  as of {}",
        "▶".cyan(),
        dashboard.athlete_name.bold(),
        dashboard.athlete_id,
        dashboard.as_of
    );
    println!("  Availability: {}", colorize_availability(dashboard.availability));

    match &dashboard.stress {
        Some(stress) => {
            let trend = if stress.rising { " (rising)".red().to_string() } else { String::new() };
            println!("  Stress:       {:.0} {}{}", stress.index, stress.level, trend);
        }
        None => println!("  Stress:       {}", "no data".dimmed()),
    }
    match &dashboard.readiness {
        Some(readiness) => println!(
            "  Readiness:    {:.0} {}",
            readiness.score.value, readiness.level
        ),
        None => println!("  Readiness:    {}", "no data".dimmed()),
    }
    match &dashboard.circadian {
        Some(circadian) => println!(
            "  Circadian:    {:.0} {}",
            circadian.score.value, circadian.score.level
        ),
        None => println!("  Circadian:    {}", "no data".dimmed()),
    }
    println!(
        "  Chronotype:   {} ({:?})",
        dashboard.chronotype.chronotype, dashboard.chronotype.basis
    );
    println!("  Risk score:   {}", format!("{:.0}", dashboard.risk_score).bold());
    for factor in &dashboard.risk_factors {
        println!("    +{:<4.0} {}", factor.points, factor.label);
    }
    for recommendation in &dashboard.recommendations {
        println!("  {} {}", "•".yellow(), recommendation);
    }
    println!();
}

fn run_rank(
    config: &AppConfig,
    cohort_path: &Path,
    top_n: usize,
    as_of: NaiveDate,
    output: Option<(PathBuf, ExportFormat)>,
) -> Result<()> {
    let cohort = import::load_cohort(cohort_path)
        .with_context(|| format!("Failed to load cohort from {}", cohort_path.display()))?;

    let scorer =
        RiskScorer::with_config(config.scoring.risk.clone(), config.scoring.alerts.clone());
    let ranked: Vec<RiskAssessment> = scorer.rank_cohort(&cohort, as_of, top_n);

    if let Some((path, format)) = output {
        match format {
            ExportFormat::Json => export::export_json(&ranked, &path)?,
            ExportFormat::Csv => export::export_rankings_csv(&ranked, &path)?,
        }
        println!("{} {}", "✓ Ranking written to".green(), path.display());
        return Ok(());
    }

    println!(
        "{}",
        format!("Top {} of {} athletes by risk, as of {}", ranked.len(), cohort.len(), as_of)
            .bold()
    );
    let rows: Vec<RankRow> = ranked
        .iter()
        .enumerate()
        .map(|(index, assessment)| RankRow {
            rank: index + 1,
            name: assessment.athlete_name.clone(),
            score: format!("{:.0}", assessment.score),
            availability: assessment.availability.to_string(),
            factors: assessment.factor_labels().join(", "),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn run_availability(cohort_path: &Path) -> Result<()> {
    let cohort = import::load_cohort(cohort_path)
        .with_context(|| format!("Failed to load cohort from {}", cohort_path.display()))?;

    for inputs in &cohort {
        let state = classify_availability(&inputs.injuries);
        println!(
            "{:<24} {:<10} {}",
            inputs.athlete.name,
            colorize_availability(state),
            state.description().dimmed()
        );
    }
    Ok(())
}

fn run_stats(records_path: &Path, field: Option<&str>, window: usize) -> Result<()> {
    let records = import::load_records(records_path)
        .with_context(|| format!("Failed to load records from {}", records_path.display()))?;

    let summary = match field {
        Some(name) => {
            let field: BiometricField = name.parse().map_err(anyhow::Error::msg)?;
            vec![(field, aggregation::window_stats(&records, field, window, false))]
        }
        None => aggregation::summarize_window(&records, window),
    };

    println!(
        "{}",
        format!("Last {} of {} records", window.min(records.len()), records.len()).bold()
    );
    let rows: Vec<StatsRow> = summary
        .into_iter()
        .map(|(field, stats)| StatsRow {
            field: field.to_string(),
            mean: format!("{:.1}", stats.mean),
            std_dev: format!("{:.1}", stats.std_dev),
            count: stats.count,
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn run_config(path: Option<&Path>, config: &AppConfig, list: bool, init: bool) -> Result<()> {
    if init {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::default_config_path);
        if path.exists() {
            bail!("Configuration already exists at {}", path.display());
        }
        AppConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
    }

    if list || !init {
        for (key, value) in config.list_values()? {
            println!("{} = {}", key.cyan(), value);
        }
    }
    Ok(())
}

fn colorize_availability(state: AvailabilityState) -> ColoredString {
    match state {
        AvailabilityState::Healthy => state.to_string().green(),
        AvailabilityState::Modified => state.to_string().yellow(),
        AvailabilityState::Out => state.to_string().red().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athlete_monitor::error::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn test_format_flag_overrides_extension() {
        let cli = Cli::try_parse_from([
            "athlete-monitor",
            "rank",
            "--cohort",
            "cohort.json",
            "--output",
            "ranking.txt",
            "--format",
            "CSV",
        ])
        .unwrap();

        match cli.command {
            Commands::Rank { output, format, .. } => {
                let (path, format) = resolve_output(output.unwrap(), format);
                assert_eq!(path, PathBuf::from("ranking.txt"));
                assert_eq!(format, ExportFormat::Csv);
            }
            _ => panic!("expected rank command"),
        }

        let (_, format) = resolve_output(PathBuf::from("dashboard.csv"), None);
        assert_eq!(format, ExportFormat::Csv);
        assert!(Cli::try_parse_from([
            "athlete-monitor",
            "dashboard",
            "--cohort",
            "cohort.json",
            "--format",
            "xlsx",
        ])
        .is_err());
    }

    #[test]
    fn test_rejected_config_fails_the_command() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scoring.risk]\nnote_window_days = 1000000000\n").unwrap();

        let cli = Cli::try_parse_from([
            "athlete-monitor",
            "--config",
            path.to_str().unwrap(),
            "config",
            "--list",
        ])
        .unwrap();

        let err = run(cli).unwrap_err();
        let monitor_err = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<MonitorError>())
            .unwrap();
        assert!(matches!(
            monitor_err,
            MonitorError::Config(ConfigError::InvalidValue { key, .. })
                if key == "scoring.risk.note_window_days"
        ));
    }
}
