//! Design-matrix assembly
//!
//! Records are open-keyed and loosely typed; models want a dense `f64`
//! matrix. The frame bridges the two through an Arrow batch: one nullable
//! `Float64` column per feature (in schema order) plus the target, a
//! completeness mask, and `filter_record_batch` to keep only rows where
//! every used column holds a number.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, RecordBatch};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use ndarray::{Array1, Array2};

use crate::record::Record;
use crate::{Error, Result};

/// Complete numeric rows for one feature set and target.
#[derive(Debug, Clone)]
pub struct DesignFrame {
    batch: RecordBatch,
    n_features: usize,
    dropped: usize,
}

impl DesignFrame {
    /// Assemble a frame from records.
    ///
    /// A row is kept only when every feature and the target are present and
    /// numeric; the rest are counted in [`dropped_rows`](Self::dropped_rows).
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the batch cannot be built or filtered.
    pub fn from_records(records: &[Record], features: &[String], target: &str) -> Result<Self> {
        let names: Vec<&str> = features
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(target))
            .collect();

        let fields: Vec<Field> = names
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, true))
            .collect();
        let columns: Vec<ArrayRef> = names
            .iter()
            .map(|name| {
                let values: Vec<Option<f64>> = records.iter().map(|r| r.number(name)).collect();
                Arc::new(Float64Array::from(values)) as ArrayRef
            })
            .collect();

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        let mask = Self::complete_rows(&batch);
        let complete = compute::filter_record_batch(&batch, &mask)?;
        let dropped = batch.num_rows() - complete.num_rows();

        Ok(Self {
            batch: complete,
            n_features: features.len(),
            dropped,
        })
    }

    fn complete_rows(batch: &RecordBatch) -> BooleanArray {
        let values: Vec<bool> = (0..batch.num_rows())
            .map(|row| batch.columns().iter().all(|col| col.is_valid(row)))
            .collect();
        BooleanArray::from(values)
    }

    /// Number of complete rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Rows discarded for a missing or non-numeric value.
    #[must_use]
    pub const fn dropped_rows(&self) -> usize {
        self.dropped
    }

    /// Underlying Arrow batch (features first, target last).
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    fn column(&self, index: usize) -> Result<&Float64Array> {
        self.batch
            .column(index)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::Other("Failed to downcast to Float64Array".to_string()))
    }

    /// Row-major feature matrix `X`.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is not `Float64`.
    pub fn features(&self) -> Result<Array2<f64>> {
        let columns = (0..self.n_features)
            .map(|i| self.column(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn(
            (self.num_rows(), self.n_features),
            |(row, col)| columns[col].value(row),
        ))
    }

    /// Target vector `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if the target column is not `Float64`.
    pub fn target(&self) -> Result<Array1<f64>> {
        let column = self.column(self.n_features)?;
        Ok(column.values().iter().copied().collect())
    }
}
