//! Initialization-time schema operations.

use super::TableGateway;
use crate::connection::{Connector, StoreConnection};
use crate::core::{Identifier, Result, SqlType};
use tracing::{debug, info};

impl<C: Connector> TableGateway<C> {
    /// Create `name` with a serial `id` key and one NOT NULL column per
    /// entry of `columns`, in order. Returns `false` without touching the
    /// store if the table already exists.
    pub async fn create_table(&mut self, name: &str, columns: &[(&str, SqlType)]) -> Result<bool> {
        let table = Identifier::new(name)?;
        let columns = columns
            .iter()
            .map(|(column, data_type)| Ok((Identifier::new(column)?, data_type.clone())))
            .collect::<Result<Vec<_>>>()?;

        let conn = self.ensure_connection().await?;
        if conn.table_exists(&table).await? {
            debug!(table = %table, "Table already exists, skipping creation");
            return Ok(false);
        }

        info!(table = %table, "Creating table");
        conn.create_table(&table, &columns).await?;
        self.commit().await?;
        info!(table = %table, "Table created successfully");
        Ok(true)
    }

    /// Drop `name`. Unlike creation this is not idempotent: dropping a
    /// table that does not exist fails.
    pub async fn delete_table(&mut self, name: &str) -> Result<()> {
        let table = Identifier::new(name)?;

        info!(table = %table, "Deleting table");
        self.ensure_connection().await?.drop_table(&table).await?;
        self.commit().await?;
        info!(table = %table, "Table deleted from database");
        Ok(())
    }
}
