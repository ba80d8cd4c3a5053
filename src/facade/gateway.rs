use crate::connection::{Connector, Selection, StoreConnection};
use crate::core::{ColumnDescriptor, DbError, ID_COLUMN, Identifier, Result, RowValues, Value};
use crate::result::{RowSet, TableLookup};
use std::collections::HashMap;
use tracing::{debug, info};

/// Default page size of [`TableGateway::retrieve_rows`].
pub const DEFAULT_RETRIEVE_LIMIT: u64 = 100;

/// Per-table CRUD and introspection over one lazily opened connection.
///
/// A gateway is not shared: concurrent callers each build their own and
/// drop it when done. Operations on a table that does not exist return
/// [`TableLookup::MissingTable`] instead of failing.
///
/// There is no retry, timeout or reconnect logic; a failed connection
/// attempt surfaces as [`DbError::ConnectionFailed`].
///
/// # Examples
///
/// ```no_run
/// use plantdb::{MemoryStore, TableGateway, Value};
/// use std::collections::HashMap;
///
/// # async fn demo() -> plantdb::Result<()> {
/// let mut gateway = TableGateway::new(MemoryStore::new());
/// let row = HashMap::from([("AT".to_string(), Value::Float(14.96))]);
/// gateway.insert_row("powerplant", &row).await?;
/// let rows = gateway.count_rows("powerplant").await?.unwrap_or_default();
/// # Ok(())
/// # }
/// ```
pub struct TableGateway<C: Connector> {
    connector: C,
    conn: Option<C::Connection>,
}

impl<C: Connector> TableGateway<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            conn: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection unless one is already held.
    pub async fn ensure_connection(&mut self) -> Result<&mut C::Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                info!(target = %self.connector.target(), "Creating connection to store");
                self.connector.connect().await?
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Commit pending writes. No-op without a connection.
    pub async fn commit(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.as_mut() {
            conn.commit().await?;
        }
        Ok(())
    }

    /// Release the connection; the next operation opens a fresh one.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            info!(target = %self.connector.target(), "Closing connection to store");
            conn.close().await?;
        }
        Ok(())
    }

    /// Roll back the open transaction, then commit.
    ///
    /// The trailing commit ends an empty transaction.
    // TODO: confirm with the data owners whether the commit after rollback can go.
    pub async fn rollback(&mut self) -> Result<()> {
        self.ensure_connection().await?.rollback().await?;
        self.commit().await
    }

    pub async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let table = Identifier::new(table)?;
        self.ensure_connection().await?.table_exists(&table).await
    }

    /// Validated identifier of `table` if it exists.
    async fn existing_table(&mut self, table: &str) -> Result<Option<Identifier>> {
        let table = Identifier::new(table)?;
        let exists = self.ensure_connection().await?.table_exists(&table).await?;
        Ok(exists.then_some(table))
    }

    /// Column names and declared types in catalog order.
    pub async fn column_types(
        &mut self,
        table: &str,
        ignore_id: bool,
    ) -> Result<TableLookup<Vec<ColumnDescriptor>>> {
        let Some(table) = self.existing_table(table).await? else {
            return Ok(TableLookup::MissingTable);
        };

        let mut columns = self.ensure_connection().await?.column_types(&table).await?;
        if ignore_id {
            columns.retain(|c| c.name != ID_COLUMN);
        }
        Ok(TableLookup::Found(columns))
    }

    pub async fn column_names(
        &mut self,
        table: &str,
        ignore_id: bool,
    ) -> Result<TableLookup<Vec<String>>> {
        Ok(self
            .column_types(table, ignore_id)
            .await?
            .map(|columns| columns.into_iter().map(|c| c.name).collect()))
    }

    /// Insert one row and commit it.
    ///
    /// Keys of `row` are matched to columns case-insensitively. Every
    /// column except `id` needs a value; keys naming no column are ignored.
    pub async fn insert_row(&mut self, table: &str, row: &RowValues) -> Result<TableLookup<()>> {
        let Some(table) = self.existing_table(table).await? else {
            return Ok(TableLookup::MissingTable);
        };

        let mut lowered: HashMap<String, &Value> = HashMap::with_capacity(row.len());
        for (key, value) in row {
            let key = key.to_lowercase();
            if lowered.contains_key(&key) {
                return Err(DbError::DuplicateColumnValue {
                    table: table.to_string(),
                    column: key,
                });
            }
            lowered.insert(key, value);
        }

        let names = self
            .ensure_connection()
            .await?
            .column_types(&table)
            .await?
            .into_iter()
            .map(|c| c.name)
            .filter(|name| name != ID_COLUMN);

        let mut columns = Vec::new();
        let mut values = Vec::new();
        for name in names {
            let value = lowered
                .get(&name)
                .ok_or_else(|| DbError::MissingColumnValue {
                    table: table.to_string(),
                    column: name.clone(),
                })?;
            columns.push(Identifier::new(&name)?);
            values.push((*value).clone());
        }

        debug!(table = %table, columns = columns.len(), "Inserting row");
        self.ensure_connection()
            .await?
            .insert(&table, &columns, &values)
            .await?;
        self.commit().await?;

        Ok(TableLookup::Found(()))
    }

    pub async fn count_rows(&mut self, table: &str) -> Result<TableLookup<i64>> {
        let Some(table) = self.existing_table(table).await? else {
            return Ok(TableLookup::MissingTable);
        };
        let count = self.ensure_connection().await?.count(&table).await?;
        Ok(TableLookup::Found(count))
    }

    /// The row with `id`, or an empty set if there is none.
    pub async fn retrieve_row(&mut self, table: &str, id: i64) -> Result<TableLookup<RowSet>> {
        self.select(table, Selection::ById(id)).await
    }

    /// Up to `limit` rows after skipping `offset`, in the store's default
    /// order. Neither bound is capped.
    pub async fn retrieve_rows(
        &mut self,
        table: &str,
        limit: u64,
        offset: u64,
    ) -> Result<TableLookup<RowSet>> {
        self.select(table, Selection::Range { limit, offset }).await
    }

    pub async fn retrieve_all(&mut self, table: &str) -> Result<TableLookup<RowSet>> {
        self.select(table, Selection::All).await
    }

    async fn select(&mut self, table: &str, selection: Selection) -> Result<TableLookup<RowSet>> {
        let Some(table) = self.existing_table(table).await? else {
            return Ok(TableLookup::MissingTable);
        };
        let rows = self
            .ensure_connection()
            .await?
            .select(&table, selection)
            .await?;
        Ok(TableLookup::Found(rows))
    }
}
