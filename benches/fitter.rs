//! Benchmarks for the model fitter.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use marketplace_forecast::config::{EngineSettings, ForecastConfig, ModelKind};
use marketplace_forecast::core::{IsoWeek, Market, WeeklySeries};
use marketplace_forecast::models::ModelFitter;
use marketplace_forecast::promo::{PromoRegressor, PromoScores};

fn generate_weekly(n: usize) -> WeeklySeries {
    let start = IsoWeek::new(2022, 1).unwrap();
    WeeklySeries::from_pairs((0..n).map(|i| {
        let t = i as f64;
        let value = 5000.0
            + 12.0 * t
            + 300.0 * (2.0 * std::f64::consts::PI * t / 4.0).sin()
            + 80.0 * (t * 0.37).cos();
        (start.plus(i as u32), value)
    }))
    .unwrap()
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitter");
    let settings = EngineSettings::default();

    for size in [26, 52, 104] {
        let history = generate_weekly(size);

        for (name, model, seasonality) in [
            ("ARIMAX", ModelKind::Sarimax, false),
            ("SARIMAX", ModelKind::Sarimax, true),
            ("Prophet", ModelKind::Prophet, true),
        ] {
            let fitter = ModelFitter::new(ForecastConfig::new(model, seasonality, false), &settings);
            group.bench_with_input(BenchmarkId::new(name, size), &history, |b, h| {
                b.iter(|| fitter.forecast(black_box(h), None))
            });
        }
    }
    group.finish();
}

fn bench_promo(c: &mut Criterion) {
    let settings = EngineSettings::default();
    let history = generate_weekly(52);
    let scores: PromoScores = history
        .weeks()
        .iter()
        .step_by(5)
        .map(|w| (Market::Uk, *w, 4.0))
        .collect();
    let regressor = PromoRegressor::prepare(&scores, Market::Uk, &history, EngineSettings::HORIZON);
    let fitter = ModelFitter::new(ForecastConfig::new(ModelKind::Sarimax, true, true), &settings);

    c.bench_function("sarimax_with_promo_floor", |b| {
        b.iter(|| fitter.forecast(black_box(&history), Some(&regressor)))
    });
}

criterion_group!(benches, bench_models, bench_promo);
criterion_main!(benches);
