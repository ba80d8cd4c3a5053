//! In-memory store with the observable behaviour of the PostgreSQL one.
//!
//! Connections share one catalog. Inserts are staged per connection and
//! published on commit; DDL applies immediately. A rejected statement
//! aborts the connection's transaction until it is rolled back.

use super::catalog::{Catalog, TableSchema};
use crate::connection::{ConnectionState, Connector, Selection, StoreConnection};
use crate::core::{ColumnDescriptor, DbError, Identifier, Result, Row, SqlType, Value};
use crate::result::RowSet;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Shared in-memory database. Clones address the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
    opened: Arc<AtomicUsize>,
    reachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Catalog::new())),
            opened: Arc::new(AtomicUsize::new(0)),
            reachable: true,
        }
    }

    /// A store whose every connection attempt fails.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Number of connections opened so far.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub async fn table_names(&self) -> Vec<String> {
        self.catalog.read().await.table_names()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryStore {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection> {
        if !self.reachable {
            return Err(DbError::ConnectionFailed(format!(
                "{}: store is unreachable",
                self.target()
            )));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            catalog: Arc::clone(&self.catalog),
            pending: Vec::new(),
            state: ConnectionState::Idle,
        })
    }

    fn target(&self) -> String {
        "memory://".to_string()
    }
}

#[derive(Debug)]
struct PendingInsert {
    table: String,
    id: i64,
    values: Row,
}

pub struct MemoryConnection {
    catalog: Arc<RwLock<Catalog>>,
    pending: Vec<PendingInsert>,
    state: ConnectionState,
}

impl MemoryConnection {
    fn begin_if_idle(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(DbError::ConnectionClosed),
            ConnectionState::Idle => {
                self.state = ConnectionState::InTransaction;
                Ok(())
            }
            ConnectionState::InTransaction => Ok(()),
            ConnectionState::Aborted => Err(DbError::TransactionAborted),
        }
    }

    /// A statement the store rejects aborts the open transaction.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() && self.state == ConnectionState::InTransaction {
            self.state = ConnectionState::Aborted;
        }
        result
    }

    /// Validate a row against the table and draw its id.
    async fn stage(
        &self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Value],
    ) -> Result<PendingInsert> {
        if columns.len() != values.len() {
            return Err(DbError::ConstraintViolation(format!(
                "INSERT has {} target columns but {} values",
                columns.len(),
                values.len()
            )));
        }

        let mut catalog = self.catalog.write().await;
        let data = catalog.get_table_mut(table.as_str())?;

        let mut row: Vec<Option<Value>> = vec![None; data.schema.data_columns().len()];
        for (column, value) in columns.iter().zip(values) {
            let idx = data
                .schema
                .find_column_index(column.as_str())
                .ok_or_else(|| DbError::ColumnNotFound(column.to_string(), table.to_string()))?;
            let descriptor = &data.schema.data_columns()[idx];
            descriptor.validate(value)?;
            row[idx] = Some(descriptor.data_type.stored_form(value.clone()));
        }

        let mut stored = Vec::with_capacity(row.len());
        for (descriptor, value) in data.schema.data_columns().iter().zip(row) {
            let value = value.unwrap_or(Value::Null);
            descriptor.validate(&value)?;
            stored.push(value);
        }

        Ok(PendingInsert {
            table: table.to_string(),
            id: data.next_id(),
            values: stored,
        })
    }

    fn pending_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a PendingInsert> + 'a {
        self.pending.iter().filter(move |p| p.table == table)
    }

    /// Committed rows followed by this connection's staged rows.
    async fn visible_rows(&self, table: &Identifier) -> Result<(Vec<String>, Vec<(i64, Row)>)> {
        let catalog = self.catalog.read().await;
        let data = catalog.get_table(table.as_str())?;

        let mut rows = data.rows.clone();
        rows.extend(
            self.pending_for(table.as_str())
                .map(|p| (p.id, p.values.clone())),
        );

        Ok((data.schema.data_column_names(), rows))
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn table_exists(&mut self, table: &Identifier) -> Result<bool> {
        self.begin_if_idle()?;
        Ok(self.catalog.read().await.table_exists(table.as_str()))
    }

    async fn column_types(&mut self, table: &Identifier) -> Result<Vec<ColumnDescriptor>> {
        self.begin_if_idle()?;
        let catalog = self.catalog.read().await;
        Ok(catalog
            .get_table(table.as_str())
            .map(|data| data.schema.columns().to_vec())
            .unwrap_or_default())
    }

    async fn create_table(
        &mut self,
        table: &Identifier,
        columns: &[(Identifier, SqlType)],
    ) -> Result<()> {
        self.begin_if_idle()?;
        let result: Result<()> = async {
            let schema = TableSchema::new(table.clone(), columns)?;
            self.catalog.write().await.create_table(schema)
        }
        .await;
        self.track(result)
    }

    async fn drop_table(&mut self, table: &Identifier) -> Result<()> {
        self.begin_if_idle()?;
        let dropped = self.catalog.write().await.drop_table(table.as_str());
        self.track(dropped)?;
        self.pending.retain(|p| p.table != table.as_str());
        Ok(())
    }

    async fn insert(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Value],
    ) -> Result<()> {
        self.begin_if_idle()?;
        let staged = self.stage(table, columns, values).await;
        let staged = self.track(staged)?;
        self.pending.push(staged);
        Ok(())
    }

    async fn count(&mut self, table: &Identifier) -> Result<i64> {
        self.begin_if_idle()?;
        let committed = self
            .catalog
            .read()
            .await
            .get_table(table.as_str())
            .map(|data| data.rows.len());
        let committed = self.track(committed)?;
        let staged = self.pending_for(table.as_str()).count();
        Ok((committed + staged) as i64)
    }

    async fn select(&mut self, table: &Identifier, selection: Selection) -> Result<RowSet> {
        self.begin_if_idle()?;
        let visible = self.visible_rows(table).await;
        let (columns, rows) = self.track(visible)?;

        let selected: Vec<(i64, Row)> = match selection {
            Selection::All => rows,
            Selection::ById(id) => rows.into_iter().filter(|(row_id, _)| *row_id == id).collect(),
            Selection::Range { limit, offset } => rows
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
        };

        let mut result = RowSet::new(columns);
        for (id, values) in selected {
            result.push(id, values);
        }
        Ok(result)
    }

    async fn commit(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(DbError::ConnectionClosed),
            ConnectionState::Idle => Ok(()),
            ConnectionState::Aborted => {
                self.pending.clear();
                self.state = ConnectionState::Idle;
                Ok(())
            }
            ConnectionState::InTransaction => {
                self.state = ConnectionState::Idle;
                let pending = std::mem::take(&mut self.pending);
                let mut catalog = self.catalog.write().await;

                // staged rows land together or not at all
                if let Some(orphan) = pending.iter().find(|p| !catalog.table_exists(&p.table)) {
                    return Err(DbError::TableNotFound(orphan.table.clone()));
                }
                for insert in pending {
                    catalog
                        .get_table_mut(&insert.table)?
                        .rows
                        .push((insert.id, insert.values));
                }
                Ok(())
            }
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(DbError::ConnectionClosed);
        }
        self.pending.clear();
        self.state = ConnectionState::Idle;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.pending.clear();
        self.state = ConnectionState::Closed;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}
