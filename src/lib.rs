// ============================================================================
// plantdb Library
// ============================================================================

//! Table gateway for power plant sensor readings.
//!
//! [`TableGateway`] performs row inserts, lookups and catalog introspection
//! against one table at a time over a single lazily opened connection. The
//! store behind it is a [`Connector`]: [`PgConnector`] for PostgreSQL, or
//! [`MemoryStore`] when a test needs the same semantics without a server.
//!
//! ```no_run
//! use plantdb::{ConnectionConfig, PgConnector, TableGateway, powerplant};
//!
//! # async fn demo() -> plantdb::Result<()> {
//! let config = ConnectionConfig::from_env()?;
//! let mut gateway = TableGateway::new(PgConnector::new(config));
//!
//! let rows = gateway
//!     .retrieve_rows(powerplant::TABLE_NAME, 10, 0)
//!     .await?
//!     .unwrap_or_default();
//! println!("{}", serde_json::to_string(&rows).unwrap());
//! gateway.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod core;
pub mod facade;
pub mod powerplant;
pub mod result;
pub mod storage;

// Re-export main types for convenience
pub use connection::{ConnectionState, Connector, Selection, StoreConnection, config::ConnectionConfig};
pub use core::{ColumnDescriptor, DbError, Identifier, Result, RowValues, SqlType, Value};
pub use facade::{DEFAULT_RETRIEVE_LIMIT, TableGateway};
pub use result::{Record, RowSet, TableLookup};
pub use storage::{MemoryStore, PgConnector};
