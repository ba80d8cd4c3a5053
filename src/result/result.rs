use crate::core::{Row, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One stored row keyed by its surrogate id. `values` follows the
/// column order of the owning [`RowSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub values: Row,
}

/// Rows in the order the store returned them.
///
/// Serializes as `{ "<id>": { "<column>": value, ... }, ... }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl RowSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, id: i64, values: Row) {
        self.rows.push(Record { id, values });
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.rows.iter().map(|record| record.id).collect()
    }

    pub fn get(&self, id: i64) -> Option<&Record> {
        self.rows.iter().find(|record| record.id == id)
    }

    pub fn value(&self, id: i64, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.get(id).and_then(|record| record.values.get(idx))
    }
}

struct RecordFields<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for RecordFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for RowSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for record in &self.rows {
            map.serialize_entry(
                &record.id,
                &RecordFields {
                    columns: &self.columns,
                    values: &record.values,
                },
            )?;
        }
        map.end()
    }
}
