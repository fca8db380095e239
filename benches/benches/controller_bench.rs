//! # Controller Benchmarks
//!
//! Hot path of one controller tick: window filtering, state machine update,
//! snapshot publication and event fan-out.
//!
//! Run: `cargo bench --bench controller_bench`

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use haunt_core::prelude::*;
use haunt_orchestration::{EventBus, HauntConfig, HauntEvent, ProximityStateMachine};
use haunt_ranging::{DistanceSample, DistanceWindow};

/// Rolling minimum over the default 10-sample window
fn bench_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");

    let mut window = DistanceWindow::new(10);
    let mut d = 0.0;

    group.bench_function("push_min", |b| {
        b.iter(|| {
            d = (d + 7.0) % 400.0;
            window.push(DistanceSample::from_raw(d, 400.0));
            black_box(window.min())
        })
    });

    group.finish();
}

fn bench_machine(c: &mut Criterion) {
    let mut group = c.benchmark_group("machine");
    let config = HauntConfig::default();

    group.bench_function("update_steady", |b| {
        let t0 = Instant::now();
        let mut machine = ProximityStateMachine::new(&config, t0);
        let mut now = t0;
        b.iter(|| {
            now += Duration::from_millis(100);
            black_box(machine.update(black_box(200.0), now))
        })
    });

    // Approach and retreat, crossing every threshold
    group.bench_function("update_cycle_100", |b| {
        b.iter(|| {
            let t0 = Instant::now();
            let mut machine = ProximityStateMachine::new(&config, t0);
            for i in 0..100u64 {
                let d = if i < 50 { 400.0 - i as f64 * 8.0 } else { f64::INFINITY };
                black_box(machine.update(d, t0 + Duration::from_millis(i * 100)));
            }
        })
    });

    group.finish();
}

fn bench_publication(c: &mut Criterion) {
    let mut group = c.benchmark_group("publication");
    let config = HauntConfig::default();
    let machine = ProximityStateMachine::new(&config, Instant::now());
    let snapshots = Latest::new(machine.snapshot());

    group.bench_function("publish_load", |b| {
        b.iter(|| {
            snapshots.publish(machine.snapshot());
            black_box(snapshots.load())
        })
    });

    let bus = EventBus::new();
    let sub = bus.subscribe();
    group.bench_function("emit_consume", |b| {
        b.iter(|| {
            bus.emit(HauntEvent::Emission {
                channel: SoundChannel::Buzz,
                interval_s: 1.0,
                voice: Voice::new(48, 45),
            });
            black_box(sub.try_recv())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_window, bench_machine, bench_publication);
criterion_main!(benches);
