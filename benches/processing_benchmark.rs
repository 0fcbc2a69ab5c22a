use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use load_profile_processor::config::QualityConfig;
use load_profile_processor::models::{
    AuxSeries, AuxiliaryBundle, DailySample, DayKey, LocationYearTable,
};
use load_profile_processor::processors::{LoadProfileAggregator, QualityFilter};
use load_profile_processor::utils::constants::{MISSING_VALUES_SUBTABLE, SAMPLES_PER_DAY};
use std::collections::BTreeMap;

// One year of readings per location, with every tenth day incomplete
fn create_test_tables(locations: u32) -> Vec<(LocationYearTable, AuxSeries)> {
    (1..=locations)
        .map(|location| {
            let mut days = BTreeMap::new();
            for day in 1..=365u16 {
                let values: Vec<f64> = (0..SAMPLES_PER_DAY)
                    .map(|slot| {
                        if slot % 97 == 0 {
                            -8888.0
                        } else {
                            200.0 + (slot as f64).sin() * 50.0 + f64::from(day)
                        }
                    })
                    .collect();
                let sample = DailySample::from_values(&values).unwrap();
                days.insert(DayKey::new(location, 2021, day), sample);
            }

            let mut auxiliary = AuxiliaryBundle::new();
            auxiliary.insert(AuxSeries::with_values(
                MISSING_VALUES_SUBTABLE,
                (1..=365u16).map(|d| (d, if d % 10 == 0 { 40.0 } else { 1.0 })),
            ));
            let outages = AuxSeries::with_values("Outage Flag", (1..=365u16).map(|d| (d, 0.0)));

            let table = LocationYearTable {
                source: format!("{}_2021.xlsx", location),
                location,
                year: 2021,
                days,
                auxiliary,
            };
            (table, outages)
        })
        .collect()
}

fn benchmark_quality_filter(c: &mut Criterion) {
    let tables = create_test_tables(1);
    let filter = QualityFilter::new(QualityConfig::default());

    c.bench_function("quality_filter_year", |b| {
        b.iter(|| {
            let (table, outages) = &tables[0];
            let (cleaned, report) = filter.clean(table.clone(), outages).unwrap();
            black_box((cleaned.kept_count(), report.masked_days))
        })
    });
}

fn benchmark_filter_and_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_and_aggregate_by_locations");
    let filter = QualityFilter::new(QualityConfig::default());

    for &size in &[1u32, 10, 50] {
        group.bench_with_input(BenchmarkId::new("locations", size), &size, |b, &count| {
            let tables = create_test_tables(count);

            b.iter(|| {
                let mut aggregator = LoadProfileAggregator::new();
                for (table, outages) in &tables {
                    let (cleaned, _) = filter.clean(table.clone(), outages).unwrap();
                    aggregator.fold(&cleaned);
                }
                black_box(aggregator.finish().overall.column_count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_quality_filter, benchmark_filter_and_aggregate);
criterion_main!(benches);
