//! Single-row prediction
//!
//! Feature values arrive as a name → number mapping and are laid out in the
//! current schema's `feature_columns` order before being handed to the model.
//! A model keeps the order it was trained with; if a column was added or
//! removed since, the two can disagree. A different feature count is
//! rejected; a same-length change of names is only logged.

use std::collections::HashMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Resource, ValidationError};
use crate::model::Algorithm;
use crate::registry::ModelRegistry;
use crate::schema::DatasetSchema;
use crate::{Error, Result};

/// A served prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Model that produced the value
    pub algorithm: Algorithm,
    /// Predicted target value
    pub prediction: f64,
}

/// Predict one row with the model registered under `algorithm_id`.
///
/// Checks run in this order: the model must be trained (unknown ids count as
/// untrained), a schema must be loaded, then every feature must be present.
///
/// # Errors
///
/// - `NotFound(Model)` when no model is registered for `algorithm_id`
/// - `Validation(NoSchema)` when no schema is loaded
/// - `MissingFeature` naming the first absent feature in schema order
/// - `FeatureCountMismatch` when the schema's feature count differs from the
///   model's
pub fn predict(
    schema: Option<&DatasetSchema>,
    registry: &ModelRegistry,
    algorithm_id: &str,
    values: &HashMap<String, f64>,
) -> Result<Prediction> {
    let model = algorithm_id
        .parse::<Algorithm>()
        .ok()
        .and_then(|algorithm| registry.get(algorithm))
        .ok_or_else(|| Resource::Model(algorithm_id.to_string()))?;
    let schema = schema.ok_or(ValidationError::NoSchema)?;

    let row = schema
        .feature_columns()
        .iter()
        .map(|name| {
            values
                .get(name)
                .copied()
                .ok_or_else(|| Error::MissingFeature(name.clone()))
        })
        .collect::<Result<Array1<f64>>>()?;

    let expected = model.feature_columns().len();
    if row.len() != expected {
        return Err(Error::FeatureCountMismatch {
            expected,
            found: row.len(),
        });
    }
    if model.feature_columns() != schema.feature_columns() {
        tracing::debug!(
            algorithm = algorithm_id,
            trained = ?model.feature_columns(),
            current = ?schema.feature_columns(),
            "Feature columns changed since training"
        );
    }

    let prediction = model.predict_row(row.view());
    tracing::debug!(algorithm = algorithm_id, prediction, "Prediction served");
    Ok(Prediction {
        algorithm: model.algorithm(),
        prediction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FittedModel, LinearRegression};
    use crate::registry::TrainedModel;
    use ndarray::array;

    fn schema() -> DatasetSchema {
        let names = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        DatasetSchema::from_classification(names(&["a", "b", "y"]), names(&["a", "b", "y"]), 3)
    }

    fn registry() -> ModelRegistry {
        // y = a + 10 b
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 3.0]];
        let y = array![1.0, 10.0, 11.0, 32.0];
        let model = FittedModel::Linear(LinearRegression::fit(x.view(), y.view()));
        ModelRegistry::new().with_models([TrainedModel::new(
            model,
            vec!["a".to_string(), "b".to_string()],
            "y",
        )])
    }

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_predict_uses_schema_feature_order() {
        let schema = schema();
        let result = predict(
            Some(&schema),
            &registry(),
            "linear",
            &values(&[("b", 2.0), ("a", 5.0), ("extra", 1.0)]),
        )
        .unwrap();
        assert_eq!(result.algorithm, Algorithm::Linear);
        assert!((result.prediction - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_untrained_model_checked_before_schema() {
        let err = predict(None, &ModelRegistry::new(), "linear", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::Model(ref id)) if id == "linear"));
        assert_eq!(err.status_code(), 400);

        let err = predict(None, &registry(), "nonsense", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::Model(_))));
    }

    #[test]
    fn test_no_schema() {
        let err = predict(None, &registry(), "linear", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NoSchema)));
    }

    #[test]
    fn test_first_missing_feature_is_reported() {
        let schema = schema();
        let err = predict(Some(&schema), &registry(), "linear", &values(&[("y", 1.0)])).unwrap_err();
        assert!(matches!(err, Error::MissingFeature(ref name) if name == "a"));

        let err = predict(Some(&schema), &registry(), "linear", &values(&[("a", 1.0)])).unwrap_err();
        assert!(matches!(err, Error::MissingFeature(ref name) if name == "b"));
    }

    #[test]
    fn test_feature_count_change_is_rejected() {
        let names = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        let wider = DatasetSchema::from_classification(
            names(&["a", "b", "c", "y"]),
            names(&["a", "b", "c", "y"]),
            3,
        );
        let err = predict(
            Some(&wider),
            &registry(),
            "linear",
            &values(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureCountMismatch {
                expected: 2,
                found: 3
            }
        ));
        assert_eq!(err.status_code(), 400);

        let narrower =
            DatasetSchema::from_classification(names(&["b", "y"]), names(&["b", "y"]), 3);
        let err = predict(Some(&narrower), &registry(), "linear", &values(&[("b", 1.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureCountMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_same_count_rename_is_served() {
        let names = |v: &[&str]| v.iter().map(ToString::to_string).collect::<Vec<_>>();
        let renamed =
            DatasetSchema::from_classification(names(&["p", "q", "y"]), names(&["p", "q", "y"]), 3);
        let result = predict(
            Some(&renamed),
            &registry(),
            "linear",
            &values(&[("p", 1.0), ("q", 1.0)]),
        )
        .unwrap();
        assert!((result.prediction - 11.0).abs() < 1e-9);
    }
}
