//! Training and inference benchmarks
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! Run with: cargo bench --bench training_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use trueno_grid::config::{BoostingConfig, ForestConfig, TrainingConfig};
use trueno_grid::engine::GridEngine;
use trueno_grid::model::{GradientBoosting, LinearRegression, RandomForest};
use trueno_grid::schema::compute_schema;
use trueno_grid::tabular::parse_table;
use trueno_grid::training::TrainingPipeline;

/// Sensor-like CSV with four numeric columns and a text column
fn create_test_csv(rows: usize) -> String {
    let mut csv = String::from("device,temp,humidity,wind,pressure\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "dev-{},{},{},{},{}\n",
            i % 8,
            15 + (i * 7) % 20,
            30 + (i * 11) % 40,
            (i * 13) % 9,
            1000 + (i * i) % 53
        ));
    }
    csv
}

#[allow(clippy::cast_precision_loss)]
fn create_test_matrix(rows: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((rows, 3), |(i, j)| ((i * (j + 3)) % 17) as f64);
    let y = x.column(0).mapv(|v| v * v) + x.column(1) - x.column(2).mapv(|v| 0.5 * v);
    (x, y)
}

/// Benchmark CSV parsing plus schema inference
fn bench_schema_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_inference");

    for size in [1_000, 10_000, 100_000].iter() {
        let csv = create_test_csv(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &csv, |b, csv| {
            b.iter(|| {
                let table = parse_table(black_box(csv.as_bytes())).unwrap();
                black_box(compute_schema(&table));
            });
        });
    }

    group.finish();
}

/// Benchmark each model on the same design matrix
fn bench_model_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_fit");
    group.sample_size(10);

    for size in [200, 1_000].iter() {
        let (x, y) = create_test_matrix(*size);

        group.bench_with_input(BenchmarkId::new("linear", size), size, |b, _| {
            b.iter(|| black_box(LinearRegression::fit(x.view(), y.view())));
        });
        group.bench_with_input(BenchmarkId::new("random_forest", size), size, |b, _| {
            b.iter(|| black_box(RandomForest::fit(x.view(), y.view(), &ForestConfig::default())));
        });
        group.bench_with_input(BenchmarkId::new("gradient_boosting", size), size, |b, _| {
            b.iter(|| {
                black_box(GradientBoosting::fit(
                    x.view(),
                    y.view(),
                    &BoostingConfig::default(),
                ))
            });
        });
    }

    group.finish();
}

/// Benchmark the full pipeline (frame assembly, three fits, scoring)
fn bench_training_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("training_pipeline");
    group.sample_size(10);

    let pipeline = TrainingPipeline::new(TrainingConfig::default());
    for size in [100, 1_000].iter() {
        let table = parse_table(create_test_csv(*size).as_bytes()).unwrap();
        let schema = compute_schema(&table);
        let records = table.into_records();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(pipeline.train(Some(&schema), &records).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark single-row prediction through the engine
fn bench_predict(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let engine = GridEngine::builder().build();
    runtime.block_on(async {
        engine
            .replace_dataset(create_test_csv(500).as_bytes())
            .await
            .unwrap();
        engine.train().await.unwrap();
    });

    let values = HashMap::from([
        ("temp".to_string(), 21.0),
        ("humidity".to_string(), 45.0),
        ("wind".to_string(), 3.0),
    ]);

    let mut group = c.benchmark_group("predict");
    for algorithm in ["linear", "random_forest", "gradient_boosting"] {
        group.bench_function(algorithm, |b| {
            b.to_async(&runtime)
                .iter(|| async { black_box(engine.predict(algorithm, &values).await.unwrap()) });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_schema_inference,
    bench_model_fit,
    bench_training_pipeline,
    bench_predict
);
criterion_main!(benches);
