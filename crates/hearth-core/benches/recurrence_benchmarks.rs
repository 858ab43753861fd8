use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hearth_core::generation::InstanceGenerator;
use hearth_core::models::{Frequency, Metadata, RecurringPattern};
use hearth_core::recurrence::{build_instance, occurrences_between, occurs_on};
use hearth_core::store::PatternStore;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

fn create_test_pattern(frequency: Frequency, interval: i32, by_day: Option<Vec<i32>>) -> RecurringPattern {
    let mut metadata = Metadata::new();
    metadata.insert("room".to_string(), serde_json::json!("kitchen"));
    RecurringPattern {
        id: Uuid::now_v7(),
        family_id: Uuid::now_v7(),
        title: "Benchmark Chore".to_string(),
        description: None,
        frequency,
        interval,
        by_day,
        start_time_hour: Some(18),
        start_time_minute: Some(30),
        duration_minutes: Some(20),
        start_date: anchor(),
        end_date: None,
        default_assignee_id: None,
        created_by_id: None,
        is_active: true,
        last_generated_until: None,
        metadata,
        created_at: anchor(),
        updated_at: anchor(),
    }
}

fn bench_occurs_on(c: &mut Criterion) {
    let anchor = anchor().date();
    let check = NaiveDate::from_ymd_opt(2027, 6, 15).unwrap();
    let weekdays = [0, 2, 4];
    let month_days = [1, 15, 28];

    let mut group = c.benchmark_group("occurs_on");
    group.bench_function("daily", |b| {
        b.iter(|| occurs_on(black_box(check), anchor, Frequency::Daily, 3, None))
    });
    group.bench_function("weekly_by_day", |b| {
        b.iter(|| occurs_on(black_box(check), anchor, Frequency::Weekly, 2, Some(&weekdays)))
    });
    group.bench_function("monthly_by_day", |b| {
        b.iter(|| occurs_on(black_box(check), anchor, Frequency::Monthly, 1, Some(&month_days)))
    });
    group.bench_function("yearly", |b| {
        b.iter(|| occurs_on(black_box(check), anchor, Frequency::Yearly, 1, None))
    });
    group.finish();
}

fn bench_occurrence_scan(c: &mut Criterion) {
    let pattern = create_test_pattern(Frequency::Weekly, 1, Some(vec![0, 2, 4]));
    let from = anchor().date();

    let mut group = c.benchmark_group("occurrence_scan");
    for days in [7, 30, 90, 365].iter() {
        let through = from + chrono::Duration::days(*days);
        group.bench_with_input(BenchmarkId::new("days", days), days, |b, _| {
            b.iter(|| occurrences_between(&pattern, black_box(from), black_box(through)).count())
        });
    }
    group.finish();
}

fn bench_build_instance(c: &mut Criterion) {
    let pattern = create_test_pattern(Frequency::Daily, 1, None);
    let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

    c.bench_function("build_instance", |b| {
        b.iter(|| build_instance(black_box(&pattern), black_box(date), anchor()))
    });
}

/// Throwaway store so the generator can be measured without a database.
struct CountingStore {
    pattern: Option<RecurringPattern>,
    inserted: usize,
}

#[async_trait::async_trait]
impl PatternStore for CountingStore {
    async fn find_pattern(&mut self, _id: Uuid) -> Result<Option<RecurringPattern>, hearth_core::error::CoreError> {
        Ok(self.pattern.clone())
    }
    async fn insert_pattern(&mut self, pattern: &RecurringPattern) -> Result<(), hearth_core::error::CoreError> {
        self.pattern = Some(pattern.clone());
        Ok(())
    }
    async fn save_pattern(&mut self, _pattern: &RecurringPattern) -> Result<bool, hearth_core::error::CoreError> {
        Ok(true)
    }
    async fn set_pattern_active(&mut self, _id: Uuid, _active: bool, _now: NaiveDateTime) -> Result<bool, hearth_core::error::CoreError> {
        Ok(true)
    }
    async fn set_generation_cursor(&mut self, _id: Uuid, _until: NaiveDateTime, _now: NaiveDateTime) -> Result<(), hearth_core::error::CoreError> {
        Ok(())
    }
    async fn delete_pattern(&mut self, _id: Uuid) -> Result<bool, hearth_core::error::CoreError> {
        Ok(true)
    }
    async fn instance_exists(&mut self, _pattern_id: Uuid, _date: NaiveDate) -> Result<bool, hearth_core::error::CoreError> {
        Ok(false)
    }
    async fn insert_instance(&mut self, _instance: &hearth_core::models::TaskInstance) -> Result<(), hearth_core::error::CoreError> {
        self.inserted += 1;
        Ok(())
    }
    async fn delete_open_instances_due_from(&mut self, _pattern_id: Uuid, _now: NaiveDateTime) -> Result<u64, hearth_core::error::CoreError> {
        Ok(0)
    }
}

fn bench_generation_run(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pattern = create_test_pattern(Frequency::Daily, 1, None);
    let generator = InstanceGenerator::default();
    let horizon = anchor() + chrono::Duration::days(365);

    c.bench_function("generation_run_365_days", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut store = CountingStore {
                    pattern: Some(pattern.clone()),
                    inserted: 0,
                };
                generator
                    .generate_with_limit(&mut store, pattern.id, black_box(horizon), 400, anchor())
                    .await
                    .unwrap()
                    .len()
            })
        })
    });
}

criterion_group!(
    benches,
    bench_occurs_on,
    bench_occurrence_scan,
    bench_build_instance,
    bench_generation_run
);
criterion_main!(benches);
