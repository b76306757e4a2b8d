use athlete_monitor::models::{
    Athlete, AthleteInputs, AthleteNote, DailyBiometricRecord, InjuryRecord, NoteCategory,
    RtpStage, Severity,
};
use athlete_monitor::{AthleteDashboard, CircadianAnalyzer, RiskScorer, ScoringConfig};
use chrono::{Duration, NaiveDate, NaiveTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmarks for the per-athlete scorers and cohort ranking
///
/// Dataset sizes follow a season: a week, a month, a quarter, a year of
/// daily rows, and squads up to a full academy.

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

fn create_record_series(days: usize) -> Vec<DailyBiometricRecord> {
    (0..days)
        .map(|i| {
            let wobble = (i % 5) as f64;
            DailyBiometricRecord {
                resting_hr: Some(50 + (i % 7) as u16),
                hrv: Some(55.0 + wobble * 3.0),
                sleep_hours: Some(6.5 + wobble * 0.4),
                deep_sleep_pct: Some(18.0 + wobble),
                training_load_pct: Some(40.0 + wobble * 8.0),
                sleep_onset: NaiveTime::from_hms_opt(22 + (i % 2) as u32, (i % 4) as u32 * 15, 0),
                wake_time: NaiveTime::from_hms_opt(6, (i % 3) as u32 * 20, 0),
                ..DailyBiometricRecord::new(as_of() - Duration::days((days - i) as i64))
            }
        })
        .collect()
}

fn create_cohort(size: usize) -> Vec<AthleteInputs> {
    (0..size)
        .map(|n| {
            let id = format!("athlete_{:04}", n);
            let mut inputs = AthleteInputs::new(Athlete::new(id.clone(), format!("Athlete {}", n)));
            inputs.records = create_record_series(30);
            if n % 4 == 0 {
                inputs.injuries.push(InjuryRecord {
                    severity: Severity::Moderate,
                    rtp_stage: RtpStage::NonContact,
                    ..InjuryRecord::new(id.clone(), "Hamstring strain")
                });
            }
            if n % 3 == 0 {
                inputs.notes.push(AthleteNote {
                    athlete_id: id,
                    category: NoteCategory::Negative,
                    text: "Low mood at check-in".to_string(),
                    created_on: as_of() - Duration::days(3),
                });
            }
            inputs
        })
        .collect()
}

fn bench_circadian_score(c: &mut Criterion) {
    let analyzer = CircadianAnalyzer::new();
    let mut group = c.benchmark_group("Circadian Score");

    for &days in &[7, 30, 90, 365] {
        let records = create_record_series(days);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("score", days), &records, |b, records| {
            b.iter(|| analyzer.score(black_box(records)));
        });
    }

    group.finish();
}

fn bench_dashboard(c: &mut Criterion) {
    let config = ScoringConfig::default();
    let mut group = c.benchmark_group("Dashboard");

    for &days in &[7, 30, 365] {
        let mut inputs = AthleteInputs::new(Athlete::new("bench", "Bench Athlete"));
        inputs.records = create_record_series(days);

        group.bench_with_input(BenchmarkId::new("compute", days), &inputs, |b, inputs| {
            b.iter(|| AthleteDashboard::compute(black_box(inputs), as_of(), &config));
        });
    }

    group.finish();
}

fn bench_cohort_ranking(c: &mut Criterion) {
    let scorer = RiskScorer::new();
    let mut group = c.benchmark_group("Cohort Ranking");

    for &size in &[10, 50, 200] {
        let cohort = create_cohort(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("rank_cohort", size), &cohort, |b, cohort| {
            b.iter(|| scorer.rank_cohort(black_box(cohort), as_of(), 10));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_circadian_score, bench_dashboard, bench_cohort_ranking);
criterion_main!(benches);
