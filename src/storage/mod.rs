pub mod catalog;
pub mod memory;
pub mod postgres;
pub mod sql;

pub use catalog::{Catalog, TableSchema};
pub use memory::{MemoryConnection, MemoryStore};
pub use postgres::{PgConnection, PgConnector};
