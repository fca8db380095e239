//! # Mapper Benchmarks
//!
//! Distance → interval → voice mapping, evaluated on every machine tick and
//! every scheduler cycle.
//!
//! Run: `cargo bench --bench mapper_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use haunt_orchestration::IntervalMapper;

fn bench_intervals(c: &mut Criterion) {
    let mut group = c.benchmark_group("intervals");
    let mapper = IntervalMapper::default();

    for distance in [15.0, 90.0, 300.0, f64::INFINITY] {
        group.bench_with_input(BenchmarkId::new("buzz", distance), &distance, |b, &d| {
            b.iter(|| black_box(mapper.buzz_interval(black_box(d))))
        });
        group.bench_with_input(BenchmarkId::new("thunder", distance), &distance, |b, &d| {
            b.iter(|| black_box(mapper.thunder_interval(black_box(d))))
        });
    }

    group.finish();
}

fn bench_voice(c: &mut Criterion) {
    let mut group = c.benchmark_group("voice");
    let mapper = IntervalMapper::default();

    group.bench_function("buzz_voice", |b| {
        b.iter(|| black_box(mapper.buzz_voice(black_box(1.3))))
    });

    // Sweep across the whole buzz range
    group.bench_function("buzz_sweep_100", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(mapper.buzz_voice(0.1 + f64::from(i) * 0.024));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_intervals, bench_voice);
criterion_main!(benches);
