//! Error types for trueno-grid
//!
//! Every failure is terminal for the call that raised it. Nothing here is
//! retried or swallowed; the request layer maps errors to status codes via
//! [`Error::status_code`].

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Input or state preconditions that a call did not meet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Uploaded table had no data rows
    #[error("uploaded dataset is empty")]
    EmptyDataset,

    /// Column name was blank after trimming
    #[error("column name must not be empty")]
    EmptyName,

    /// Empty dataset requested without any column
    #[error("at least one column is required")]
    NoColumns,

    /// No schema is loaded yet
    #[error("no dataset schema available")]
    NoSchema,

    /// Too few rows to fit the models
    #[error("not enough rows to train: need {required}, found {found}")]
    InsufficientData {
        /// Minimum row count
        required: usize,
        /// Rows actually available
        found: usize,
    },

    /// Schema has no target or no feature columns
    #[error("could not determine target/feature columns from dataset")]
    NoTargetOrFeatures,
}

/// Kinds of things a lookup can fail to find.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Record id absent from the store
    #[error("record not found")]
    Record,

    /// Column absent from the schema
    #[error("column '{0}' not found")]
    Column(String),

    /// Algorithm has no trained model
    #[error("model '{0}' not trained yet")]
    Model(String),

    /// No schema loaded and nothing in the store to infer one from
    #[error("no dataset loaded, upload a CSV first")]
    Dataset,

    /// Export requested on an empty store
    #[error("no data to download")]
    Data,
}

/// trueno-grid error types
#[derive(Error, Debug)]
pub enum Error {
    /// Precondition failure
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Lookup failure
    #[error("Not found: {0}")]
    NotFound(#[from] Resource),

    /// Prediction input lacks a feature the schema requires
    #[error("Missing feature '{0}' in prediction request")]
    MissingFeature(String),

    /// Current feature layout no longer matches what the model was trained on
    #[error("Model expects {expected} features but the schema now has {found}; retrain first")]
    FeatureCountMismatch {
        /// Feature count at training time
        expected: usize,
        /// Feature count in the current schema
        found: usize,
    },

    /// Record id could not be parsed
    #[error("Invalid record id: {0}")]
    InvalidId(String),

    /// The dataset was replaced while a training run was fitting
    #[error("Dataset was replaced during training; fitted models were discarded")]
    DatasetReplaced,

    /// Document store failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// CSV reader/writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (config) error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status a request layer should answer with.
    ///
    /// An untrained model is a client-side precondition (400), not a missing
    /// resource, so it is mapped apart from the other lookups.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::MissingFeature(_)
            | Self::FeatureCountMismatch { .. }
            | Self::InvalidId(_)
            | Self::NotFound(Resource::Model(_)) => 400,
            Self::NotFound(_) => 404,
            Self::DatasetReplaced => 409,
            Self::StorageError(_)
            | Self::Csv(_)
            | Self::Io(_)
            | Self::Arrow(_)
            | Self::Json(_)
            | Self::Other(_) => 500,
        }
    }
}
