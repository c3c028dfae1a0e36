use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dms::{DmsConfig, EyeMetrics, FatigueAnalyzer};

const STEP_MS: u64 = 33;

/// Analyzer with a locked baseline and a full 20 s window (~600 frames)
fn warmed_analyzer() -> (FatigueAnalyzer, u64) {
    let mut analyzer = FatigueAnalyzer::new(DmsConfig::default()).expect("default config");
    let mut t = 0;
    for i in 0..800u64 {
        let ear = if i % 25 < 2 { 0.10 } else { 0.30 };
        analyzer.analyze_eyes(Some(EyeMetrics::symmetric(ear)), t);
        t += STEP_MS;
    }
    (analyzer, t)
}

fn bench_analyze_full_window(c: &mut Criterion) {
    let (mut analyzer, mut t) = warmed_analyzer();

    c.bench_function("analyze_eyes_full_window", |b| {
        b.iter(|| {
            t += STEP_MS;
            analyzer.analyze_eyes(black_box(Some(EyeMetrics::symmetric(0.29))), black_box(t))
        })
    });
}

fn bench_window_snapshot(c: &mut Criterion) {
    let (analyzer, t) = warmed_analyzer();

    c.bench_function("window_snapshot", |b| {
        b.iter(|| analyzer.window_snapshot(black_box(t)))
    });
}

fn bench_reset(c: &mut Criterion) {
    c.bench_function("reset_after_full_window", |b| {
        b.iter_batched(
            || warmed_analyzer().0,
            |mut analyzer| analyzer.reset(),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_analyze_full_window, bench_window_snapshot, bench_reset);
criterion_main!(benches);
