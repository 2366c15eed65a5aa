//! # Trueno-Grid: Schema-Inferring Regression Engine
//!
//! **Version**: 0.1.0
//!
//! Trueno-Grid ingests an arbitrary CSV export, infers which columns are
//! numeric and which one to predict, lets the schema evolve column by column,
//! trains three regression models against it and serves single-row
//! predictions.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Preconditions fail fast with a typed error and a status code
//! - **Poka-Yoke safety**: Schema and models are published as one immutable
//!   snapshot; readers never see a half-applied mutation
//! - **Genchi Genbutsu**: The schema is inferred from the data as it is
//! - **Heijunka**: Model fitting runs on blocking workers (rayon inside),
//!   never on the async executor
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use trueno_grid::engine::GridEngine;
//!
//! # async fn example() -> trueno_grid::Result<()> {
//! let engine = GridEngine::builder().build();
//! let schema = engine.replace_dataset(&std::fs::read("data/sensors.csv")?).await?;
//! println!("target: {:?}, features: {:?}", schema.target(), schema.feature_columns());
//!
//! let report = engine.train().await?;
//! for (algorithm, result) in &report.models {
//!     println!("{algorithm}: r2={:.3}", result.metrics.r2);
//! }
//!
//! let values = HashMap::from([("temp".to_string(), 21.5), ("humidity".to_string(), 40.0)]);
//! let prediction = engine.predict("random_forest", &values).await?;
//! println!("predicted: {}", prediction.prediction);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod model;
pub mod predict;
pub mod record;
pub mod registry;
pub mod schema;
pub mod state;
pub mod store;
pub mod tabular;
pub mod training;

pub use engine::{ColumnAdded, GridEngine, GridEngineBuilder};
pub use error::{Error, Result};
