//! Dataset schema: column classification and target/feature split
//!
//! ## Invariants
//!
//! ```text
//! columns ⊇ numeric_columns ⊇ feature_columns
//! target ∈ numeric_columns (when present)
//! target ∉ feature_columns
//! no duplicates within any sequence
//! ```
//!
//! A schema value is never mutated in place once published. The structural
//! operations here take `&self` and return the next schema, which the engine
//! swaps in as a whole.
//!
//! The one deliberate exception to "recompute everything": deleting the
//! target column clears `target` but leaves `feature_columns` as it was.

mod infer;

pub use infer::{compute_schema, infer_from_records};

use serde::{Deserialize, Serialize};

use crate::error::{Resource, ValidationError};
use crate::Result;

/// Inferred or maintained description of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    columns: Vec<String>,
    numeric_columns: Vec<String>,
    target: Option<String>,
    feature_columns: Vec<String>,
    samples: usize,
}

/// Outcome of [`DatasetSchema::add_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddColumn {
    /// Column appended; carries the next schema.
    Added(DatasetSchema),
    /// Name was already present; nothing changed.
    AlreadyExists,
}

impl DatasetSchema {
    /// Build a schema from a numeric classification.
    ///
    /// The target is the last numeric column; features are the remaining
    /// numeric columns in order.
    #[must_use]
    pub fn from_classification(
        columns: Vec<String>,
        numeric_columns: Vec<String>,
        samples: usize,
    ) -> Self {
        let mut schema = Self {
            columns,
            numeric_columns,
            target: None,
            feature_columns: Vec::new(),
            samples,
        };
        schema.recompute_split();
        schema
    }

    /// Schema for a user-declared, still empty table.
    ///
    /// Nothing is classified numeric until data arrives, so there is no
    /// target and no features. Blank names are dropped and repeats collapsed.
    ///
    /// # Errors
    ///
    /// Returns `Validation(NoColumns)` if no usable name remains.
    pub fn empty<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in columns {
            let name = name.as_ref().trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return Err(ValidationError::NoColumns.into());
        }
        Ok(Self {
            columns: names,
            numeric_columns: Vec::new(),
            target: None,
            feature_columns: Vec::new(),
            samples: 0,
        })
    }

    /// All columns in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Numeric columns in order.
    #[must_use]
    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    /// Regression label, if one could be chosen.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Regression inputs in design-matrix order.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Row count at the last (re)computation.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Whether `name` is one of the columns.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Target present and at least one feature.
    #[must_use]
    pub fn is_trainable(&self) -> bool {
        self.target.is_some() && !self.feature_columns.is_empty()
    }

    fn recompute_split(&mut self) {
        self.target = self.numeric_columns.last().cloned();
        self.feature_columns = match &self.target {
            Some(target) => self
                .numeric_columns
                .iter()
                .filter(|c| *c != target)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }

    /// Append a column.
    ///
    /// New columns are optimistically numeric: they join `numeric_columns`
    /// and, being last, become the target. The previous target moves into
    /// the features.
    ///
    /// # Errors
    ///
    /// Returns `Validation(EmptyName)` if `name` is blank after trimming.
    pub fn add_column(&self, name: &str) -> Result<AddColumn> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.contains(name) {
            return Ok(AddColumn::AlreadyExists);
        }

        let mut next = self.clone();
        next.columns.push(name.to_string());
        next.numeric_columns.push(name.to_string());
        next.recompute_split();
        Ok(AddColumn::Added(next))
    }

    /// Remove a column everywhere it appears.
    ///
    /// Removing the target clears it without recomputing `feature_columns`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound(Column)` if `name` is not a column.
    pub fn delete_column(&self, name: &str) -> Result<Self> {
        if !self.contains(name) {
            return Err(Resource::Column(name.to_string()).into());
        }

        let mut next = self.clone();
        next.columns.retain(|c| c != name);
        next.numeric_columns.retain(|c| c != name);
        next.feature_columns.retain(|c| c != name);
        if next.target.as_deref() == Some(name) {
            next.target = None;
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(ToString::to_string).collect()
    }

    fn sensor_schema() -> DatasetSchema {
        DatasetSchema::from_classification(
            names(&["ts", "temp", "humidity", "pressure"]),
            names(&["temp", "humidity", "pressure"]),
            42,
        )
    }

    #[test]
    fn test_from_classification_picks_last_numeric_as_target() {
        let schema = sensor_schema();
        assert_eq!(schema.target(), Some("pressure"));
        assert_eq!(schema.feature_columns(), ["temp", "humidity"]);
        assert_eq!(schema.samples(), 42);
        assert!(schema.is_trainable());
    }

    #[test]
    fn test_empty_schema() {
        let schema = DatasetSchema::empty(["a", " b ", "", "a"]).unwrap();
        assert_eq!(schema.columns(), ["a", "b"]);
        assert!(schema.numeric_columns().is_empty());
        assert!(schema.target().is_none());
        assert_eq!(schema.samples(), 0);

        let err = DatasetSchema::empty(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NoColumns)));
    }

    #[test]
    fn test_add_column_becomes_target() {
        let AddColumn::Added(next) = sensor_schema().add_column(" wind ").unwrap() else {
            panic!("expected column to be added");
        };
        assert_eq!(next.columns().last().map(String::as_str), Some("wind"));
        assert_eq!(next.target(), Some("wind"));
        assert_eq!(next.feature_columns(), ["temp", "humidity", "pressure"]);
    }

    #[test]
    fn test_add_existing_column_is_a_notice() {
        assert_eq!(
            sensor_schema().add_column("temp").unwrap(),
            AddColumn::AlreadyExists
        );
    }

    #[test]
    fn test_add_blank_column_rejected() {
        let err = sensor_schema().add_column("   ").unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn test_delete_feature_column() {
        let next = sensor_schema().delete_column("humidity").unwrap();
        assert_eq!(next.columns(), ["ts", "temp", "pressure"]);
        assert_eq!(next.feature_columns(), ["temp"]);
        assert_eq!(next.target(), Some("pressure"));
    }

    #[test]
    fn test_delete_target_keeps_features() {
        let next = sensor_schema().delete_column("pressure").unwrap();
        assert!(next.target().is_none());
        assert_eq!(next.numeric_columns(), ["temp", "humidity"]);
        assert_eq!(next.feature_columns(), ["temp", "humidity"]);
        assert!(!next.is_trainable());
    }

    #[test]
    fn test_delete_unknown_column() {
        let err = sensor_schema().delete_column("nope").unwrap_err();
        assert!(matches!(err, Error::NotFound(Resource::Column(ref c)) if c == "nope"));
    }

    #[test]
    fn test_add_then_delete_restores_columns() {
        let schema = sensor_schema();
        let AddColumn::Added(added) = schema.add_column("x").unwrap() else {
            panic!("expected column to be added");
        };
        let restored = added.delete_column("x").unwrap();
        assert_eq!(restored.columns(), schema.columns());
        assert_eq!(restored.samples(), schema.samples());
    }

    #[test]
    fn test_schema_json_shape() {
        let json = serde_json::to_value(sensor_schema()).unwrap();
        assert_eq!(json["target"], "pressure");
        assert_eq!(json["feature_columns"][0], "temp");
        assert_eq!(json["samples"], 42);
    }
}
