pub mod config;

use crate::core::{ColumnDescriptor, Identifier, Result, SqlType, Value};
use crate::result::RowSet;
use async_trait::async_trait;

/// Which rows a select returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    ById(i64),
    Range { limit: u64, offset: u64 },
}

/// Transaction state of a store connection.
///
/// The first statement on an idle connection opens a transaction that
/// stays open until `commit` or `rollback`, the way the classic DB-API
/// drivers behave. A statement the store rejects leaves the transaction
/// `Aborted`: every later statement fails until `rollback`, and `commit`
/// only ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    InTransaction,
    Aborted,
    Closed,
}

/// Opens connections to a backing store.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: StoreConnection;

    async fn connect(&self) -> Result<Self::Connection>;

    /// Human readable target, for logs. Never contains secrets.
    fn target(&self) -> String;
}

/// A single live connection.
///
/// Statements run inside the connection's implicit transaction; writes
/// become visible to other connections only after `commit`.
#[async_trait]
pub trait StoreConnection: Send {
    async fn table_exists(&mut self, table: &Identifier) -> Result<bool>;

    /// Columns of `table` in ordinal order, `id` included. Empty when the
    /// table does not exist.
    async fn column_types(&mut self, table: &Identifier) -> Result<Vec<ColumnDescriptor>>;

    /// `CREATE TABLE` with a serial `id` key and the given NOT NULL columns.
    /// Fails if the table already exists.
    async fn create_table(&mut self, table: &Identifier, columns: &[(Identifier, SqlType)])
    -> Result<()>;

    /// `DROP TABLE`. Fails if the table does not exist.
    async fn drop_table(&mut self, table: &Identifier) -> Result<()>;

    async fn insert(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Value],
    ) -> Result<()>;

    async fn count(&mut self, table: &Identifier) -> Result<i64>;

    async fn select(&mut self, table: &Identifier, selection: Selection) -> Result<RowSet>;

    /// Publish staged writes. On an aborted transaction this discards
    /// them instead, as PostgreSQL does.
    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Release the connection. Uncommitted writes are discarded.
    async fn close(&mut self) -> Result<()>;

    fn state(&self) -> ConnectionState;

    fn is_in_transaction(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::InTransaction | ConnectionState::Aborted
        )
    }
}

