//! Schema inference
//!
//! A column is numeric when every non-missing cell parses as a float. The
//! target is then simply the last numeric column: sensor exports put the
//! reading after the context columns.

use super::DatasetSchema;
use crate::record::{Record, Value};
use crate::tabular::Table;

/// Infer a schema from a parsed table.
#[must_use]
pub fn compute_schema(table: &Table) -> DatasetSchema {
    let numeric_columns = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(index, _)| table.column_values(*index).all(Value::is_numeric_or_missing))
        .map(|(_, name)| name.clone())
        .collect();

    DatasetSchema::from_classification(table.columns().to_vec(), numeric_columns, table.len())
}

/// Infer a schema from stored records.
///
/// Columns are collected in first-seen order: each record's fields in the
/// order they were stored, new names appended as later records introduce
/// them. A record lacking a column counts as a missing cell for it.
#[must_use]
pub fn infer_from_records(records: &[Record]) -> DatasetSchema {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.data().keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let numeric_columns = columns
        .iter()
        .filter(|column| {
            records
                .iter()
                .filter_map(|r| r.get(column))
                .all(Value::is_numeric_or_missing)
        })
        .cloned()
        .collect();

    DatasetSchema::from_classification(columns, numeric_columns, records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Fields;
    use crate::tabular::parse_table;

    #[test]
    fn test_sensor_columns() {
        let table = parse_table(
            b"device,temp,humidity,pressure\nd1,20.1,40,1012\nd2,21.3,42,1011\n",
        )
        .unwrap();
        let schema = compute_schema(&table);

        assert_eq!(schema.columns(), ["device", "temp", "humidity", "pressure"]);
        assert_eq!(schema.numeric_columns(), ["temp", "humidity", "pressure"]);
        assert_eq!(schema.target(), Some("pressure"));
        assert_eq!(schema.feature_columns(), ["temp", "humidity"]);
        assert_eq!(schema.samples(), 2);
    }

    #[test]
    fn test_no_numeric_columns() {
        let table = parse_table(b"a,b\nx,y\nz,w\n").unwrap();
        let schema = compute_schema(&table);

        assert!(schema.numeric_columns().is_empty());
        assert!(schema.target().is_none());
        assert!(schema.feature_columns().is_empty());
    }

    #[test]
    fn test_single_numeric_column_is_target_only() {
        let table = parse_table(b"name,value\na,1\nb,2\n").unwrap();
        let schema = compute_schema(&table);

        assert_eq!(schema.target(), Some("value"));
        assert!(schema.feature_columns().is_empty());
        assert!(!schema.is_trainable());
    }

    #[test]
    fn test_missing_cells_do_not_disqualify() {
        let table = parse_table(b"a,b,c\n1,,x\n,2,3\n").unwrap();
        let schema = compute_schema(&table);

        // c holds "x", so only a and b are numeric
        assert_eq!(schema.numeric_columns(), ["a", "b"]);
        assert_eq!(schema.target(), Some("b"));
    }

    #[test]
    fn test_infer_from_records() {
        let records = vec![
            Record::new(Fields::from([
                ("humidity".to_string(), Value::Number(40.0)),
                ("temp".to_string(), Value::Number(20.0)),
            ])),
            Record::new(Fields::from([
                ("humidity".to_string(), Value::Number(41.0)),
                ("site".to_string(), Value::from("north")),
            ])),
        ];
        let schema = infer_from_records(&records);

        assert_eq!(schema.columns(), ["humidity", "temp", "site"]);
        assert_eq!(schema.numeric_columns(), ["humidity", "temp"]);
        assert_eq!(schema.target(), Some("temp"));
        assert_eq!(schema.samples(), 2);
    }

    #[test]
    fn test_infer_from_records_keeps_field_order() {
        let records: Vec<Record> = (0..3)
            .map(|i| {
                Record::new(Fields::from([
                    ("temp".to_string(), Value::Number(20.0 + f64::from(i))),
                    ("humidity".to_string(), Value::Number(40.0)),
                    ("pressure".to_string(), Value::Number(1012.0)),
                ]))
            })
            .collect();
        let schema = infer_from_records(&records);

        assert_eq!(schema.columns(), ["temp", "humidity", "pressure"]);
        assert_eq!(schema.target(), Some("pressure"));
        assert_eq!(schema.feature_columns(), ["temp", "humidity"]);
    }
}
