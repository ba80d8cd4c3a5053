use crate::core::{ColumnDescriptor, DbError, ID_COLUMN, Identifier, Result, Row, SqlType};
use std::collections::HashMap;

/// Schema of one in-memory table, `id` first.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: Identifier,
    columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(name: Identifier, columns: &[(Identifier, SqlType)]) -> Result<Self> {
        let mut descriptors = vec![ColumnDescriptor::new(ID_COLUMN, SqlType::Integer).not_null()];

        for (column, data_type) in columns {
            if descriptors.iter().any(|c| c.name == column.as_str()) {
                return Err(DbError::ConstraintViolation(format!(
                    "column '{}' specified more than once",
                    column
                )));
            }
            data_type.ddl()?;
            descriptors.push(ColumnDescriptor::new(column.as_str(), data_type.clone()).not_null());
        }

        Ok(Self {
            name,
            columns: descriptors,
        })
    }

    pub fn name(&self) -> &Identifier {
        &self.name
    }

    /// All columns including `id`.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Columns a row stores values for.
    pub fn data_columns(&self) -> &[ColumnDescriptor] {
        &self.columns[1..]
    }

    pub fn data_column_names(&self) -> Vec<String> {
        self.data_columns().iter().map(|c| c.name.clone()).collect()
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.data_columns().iter().position(|col| col.name == name)
    }
}

/// Committed rows of a table plus its id sequence.
#[derive(Debug, Clone)]
pub struct TableData {
    pub schema: TableSchema,
    pub rows: Vec<(i64, Row)>,
    next_id: i64,
}

impl TableData {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    /// Draw the next serial value. Like a PostgreSQL sequence, values are
    /// not returned on rollback.
    pub fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Tables of the in-memory store.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, TableData>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        let name = schema.name().to_string();

        if self.tables.contains_key(&name) {
            return Err(DbError::TableExists(name));
        }

        self.tables.insert(name, TableData::new(schema));
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<TableData> {
        self.tables
            .remove(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn get_table(&self, name: &str) -> Result<&TableData> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut TableData> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}
