//! Trueno-Grid end to end: upload, evolve the schema, train, predict
//!
//! This example demonstrates:
//! - Schema inference from a raw CSV export
//! - Adding and removing columns as the dataset evolves
//! - Training all three regression models and reading the report
//! - Serving predictions from each model
//!
//! Run with: cargo run --example train_and_predict
//! Verbose logs: RUST_LOG=trueno_grid=debug cargo run --example train_and_predict

use std::collections::HashMap;

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use trueno_grid::config::EngineConfig;
use trueno_grid::engine::GridEngine;
use trueno_grid::model::Algorithm;
use trueno_grid::record::{Fields, Value};
use trueno_grid::ColumnAdded;

/// Greenhouse readings: pressure tracks temperature and humidity.
fn greenhouse_csv(rows: usize) -> String {
    let mut csv = String::from("timestamp,zone,temp,humidity,pressure\n");
    for i in 0..rows {
        let temp = 18.0 + (i % 12) as f64 * 0.75;
        let humidity = 40.0 + ((i * 7) % 25) as f64;
        let pressure = 1000.0 + 1.8 * temp - 0.3 * humidity + (i % 3) as f64 * 0.2;
        csv.push_str(&format!(
            "2024-03-{:02}T{:02}:00,zone-{},{temp:.2},{humidity:.1},{pressure:.2}\n",
            1 + i / 24,
            i % 24,
            i % 3
        ));
    }
    csv
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-Grid Train & Predict Example ===\n");

    let config = EngineConfig::from_json(r#"{ "training": { "forest": { "n_trees": 50 } } }"#)
        .context("invalid engine config")?;
    let engine = GridEngine::builder().config(config).build();

    // Upload
    println!("Uploading greenhouse export (96 rows)...");
    let schema = engine.replace_dataset(greenhouse_csv(96).as_bytes()).await?;
    println!("  ✓ Columns:  {:?}", schema.columns());
    println!("  ✓ Numeric:  {:?}", schema.numeric_columns());
    println!("  ✓ Target:   {:?}", schema.target());
    println!("  ✓ Features: {:?}\n", schema.feature_columns());

    // Evolve the schema
    println!("Adding and removing a scratch column...");
    match engine.add_column("co2").await? {
        ColumnAdded::Added(next) => println!("  ✓ Added co2, target is now {:?}", next.target()),
        ColumnAdded::AlreadyExists(_) => println!("  • co2 already present"),
    }
    let schema = engine.delete_column("co2").await?;
    println!("  ✓ Removed co2, target is now {:?}", schema.target());

    // Deleting the target leaves no label: start over from the stored rows
    let csv = engine.export_csv().await?;
    let schema = engine.replace_dataset(&csv).await?;
    println!("  ✓ Re-inferred from export, target {:?}\n", schema.target());

    // Add a record by hand
    let mut reading = Fields::new();
    reading.insert("timestamp".to_string(), Value::from("2024-03-05T00:00"));
    reading.insert("zone".to_string(), Value::from("zone-0"));
    reading.insert("temp".to_string(), Value::Number(22.0));
    reading.insert("humidity".to_string(), Value::Number(50.0));
    reading.insert("pressure".to_string(), Value::Number(1024.6));
    let record = engine.create_record(reading).await?;
    println!("Stored manual reading {}\n", record.id());

    // Train
    println!("Training models...");
    let report = engine.train().await?;
    println!("  ✓ {} samples\n", report.samples);
    println!("  {:<20} {:>8} {:>8} {:>8}", "Model", "R²", "MAE", "RMSE");
    for result in report.models.values() {
        println!(
            "  {:<20} {:>8.4} {:>8.4} {:>8.4}",
            result.name, result.metrics.r2, result.metrics.mae, result.metrics.rmse
        );
    }
    if let Some(importance) = report
        .models
        .get(&Algorithm::RandomForest)
        .and_then(|r| r.feature_importance.as_ref())
    {
        println!("\n  Random forest feature importance:");
        for (feature, value) in importance {
            println!("    {feature:<10} {value:.3}");
        }
    }

    // Predict
    println!("\nPredicting pressure for temp=23.5, humidity=47...");
    let values = HashMap::from([
        ("temp".to_string(), 23.5),
        ("humidity".to_string(), 47.0),
    ]);
    for id in ["linear", "random_forest", "gradient_boosting"] {
        let prediction = engine.predict(id, &values).await?;
        println!("  ✓ {id:<18} {:.2}", prediction.prediction);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
