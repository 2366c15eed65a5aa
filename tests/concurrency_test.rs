//! Snapshot concurrency: readers during mutation, training racing replacement
//!
//! Toyota Way: Poka-Yoke (readers can never observe a half-applied schema)

use std::collections::HashSet;
use std::sync::Arc;

use trueno_grid::config::{BoostingConfig, EngineConfig, ForestConfig, TrainingConfig};
use trueno_grid::schema::DatasetSchema;
use trueno_grid::{Error, GridEngine};

fn engine() -> Arc<GridEngine> {
    let config = EngineConfig {
        training: TrainingConfig {
            forest: ForestConfig {
                n_trees: 200,
                ..ForestConfig::default()
            },
            boosting: BoostingConfig {
                n_stages: 200,
                ..BoostingConfig::default()
            },
            ..TrainingConfig::default()
        },
        ..EngineConfig::default()
    };
    Arc::new(GridEngine::builder().config(config).build())
}

fn csv(rows: usize) -> String {
    let mut csv = String::from("a,b,c,y\n");
    for i in 0..rows {
        csv.push_str(&format!("{},{},{},{}\n", i, (i * 7) % 11, (i * 3) % 5, i * i % 97));
    }
    csv
}

fn check(schema: &DatasetSchema) {
    let columns: HashSet<&String> = schema.columns().iter().collect();
    assert_eq!(columns.len(), schema.columns().len());
    assert!(schema.numeric_columns().iter().all(|c| columns.contains(c)));
    assert!(schema
        .feature_columns()
        .iter()
        .all(|c| schema.numeric_columns().contains(c)));
    if let Some(target) = schema.target() {
        assert!(!schema.feature_columns().iter().any(|c| c == target));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_consistent_schemas_during_mutation() {
    let engine = engine();
    engine.replace_dataset(csv(30).as_bytes()).await.unwrap();

    let writer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for i in 0..40 {
                let name = format!("extra{}", i % 5);
                if i % 2 == 0 {
                    engine.add_column(&name).await.unwrap();
                } else {
                    let _ = engine.delete_column(&name).await;
                }
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let schema = engine.schema().await.unwrap();
                check(&schema);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    check(&engine.schema().await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_training_racing_replacement_is_discarded() {
    let engine = engine();
    engine.replace_dataset(csv(400).as_bytes()).await.unwrap();

    let trainer = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.train().await })
    };

    // Give the trainer time to capture its snapshot, then replace the dataset
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    engine.replace_dataset(csv(50).as_bytes()).await.unwrap();

    match trainer.await.unwrap() {
        Err(Error::DatasetReplaced) => {
            assert!(engine.snapshot().models().is_empty());
        }
        // The trainer only started after the replacement
        Ok(report) if report.samples == 50 => {
            assert_eq!(engine.snapshot().models().len(), 3);
        }
        // The fit finished before the replacement landed; the replacement
        // then cleared the models it installed.
        Ok(_) => assert!(engine.snapshot().models().is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.list_records().await.unwrap().len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_training_runs_all_install() {
    let engine = engine();
    engine.replace_dataset(csv(40).as_bytes()).await.unwrap();

    let mut runs = Vec::new();
    for _ in 0..3 {
        let engine = Arc::clone(&engine);
        runs.push(tokio::spawn(async move { engine.train().await }));
    }
    let mut reports = Vec::new();
    for run in runs {
        reports.push(run.await.unwrap().unwrap());
    }

    // Same data, same seeds: every run reports the same numbers
    for report in &reports[1..] {
        for (algorithm, result) in &report.models {
            assert_eq!(result.metrics, reports[0].models[algorithm].metrics);
        }
    }
    assert_eq!(engine.snapshot().models().len(), 3);
}
