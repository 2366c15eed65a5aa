//! Records and cell values
//!
//! Records are open-keyed: any column name may appear, whether or not the
//! schema knows about it. Cells carry a closed tagged [`Value`] so numeric
//! classification never has to guess at a loosely-typed payload.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

/// A single cell.
///
/// A field that is missing from a record entirely is "absent"; that state is
/// represented by the key not being present in [`Fields`], not by a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Parsed floating-point number
    Number(f64),
    /// Anything that did not parse as a number
    Text(String),
    /// Explicit empty cell
    Null,
}

impl Value {
    /// Classify a raw CSV cell.
    ///
    /// Empty (after trimming) is `Null`, anything `f64::from_str` accepts is a
    /// `Number`, the rest is kept verbatim as `Text`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_nan() => Self::Null,
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Numeric view of the cell, if any.
    ///
    /// Text that parses as a number counts: a record edited through the API
    /// may carry `"21.5"` as a string.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
            Self::Null => return None,
        };
        (!n.is_nan()).then_some(n)
    }

    /// `true` for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this non-missing cell keeps a column numeric.
    ///
    /// `Null` is missing and therefore never disqualifies a column.
    #[must_use]
    pub fn is_numeric_or_missing(&self) -> bool {
        match self {
            Self::Number(_) | Self::Null => true,
            Self::Text(s) => s.trim().parse::<f64>().is_ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Null => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Column name -> value mapping of one record, in insertion order.
///
/// Upload order is the column order the schema fallback and the export see,
/// so it must survive storage.
pub type Fields = IndexMap<String, Value>;

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form handed out to clients.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if `raw` is not a UUID.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| Error::InvalidId(raw.to_string()))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored row: identifier plus open fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    data: Fields,
}

impl Record {
    /// New record with a fresh id.
    #[must_use]
    pub fn new(data: Fields) -> Self {
        Self::with_id(RecordId::new(), data)
    }

    /// Record with a known id.
    #[must_use]
    pub const fn with_id(id: RecordId, data: Fields) -> Self {
        Self { id, data }
    }

    /// Get the record ID.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Get the fields.
    #[must_use]
    pub const fn data(&self) -> &Fields {
        &self.data
    }

    /// Look up one field.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    /// Set (or overwrite) one field.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.data.insert(column.into(), value);
    }

    /// Remove one field, returning its previous value.
    pub fn unset(&mut self, column: &str) -> Option<Value> {
        self.data.shift_remove(column)
    }

    /// Merge a patch: every key in `patch` overwrites the existing field.
    pub fn merge(&mut self, patch: Fields) {
        self.data.extend(patch);
    }

    /// Numeric value of `column`, `None` when absent, null or non-numeric.
    #[must_use]
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }
}
