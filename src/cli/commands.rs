use super::Command;
use anyhow::{Context, Result};
use plantdb::powerplant::{self, PowerPlantReading, TABLE_NAME};
use plantdb::{Connector, TableGateway};
use serde_json::{Map, Value as Json, json};
use tracing::warn;

/// Run one command and return its JSON body.
pub async fn run<C: Connector>(gateway: &mut TableGateway<C>, command: Command) -> Result<Json> {
    let body = match command {
        Command::Init { csv, url } => {
            let readings = match (csv, url) {
                (Some(path), _) => powerplant::read_csv(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, Some(url)) => powerplant::fetch_csv(&url)
                    .await
                    .with_context(|| format!("failed to download {}", url))?,
                (None, None) => Vec::new(),
            };
            let report = powerplant::initialize(gateway, &readings)
                .await
                .context("failed to initialize power plant table")?;
            json!(report)
        }
        Command::Add { at, v, ap, rh, pe } => {
            let reading = PowerPlantReading {
                AT: at,
                V: v,
                AP: ap,
                RH: rh,
                PE: pe,
            };
            let inserted = gateway
                .insert_row(TABLE_NAME, &reading.to_row())
                .await
                .context("failed to insert reading")?;
            if inserted.is_missing() {
                warn!(table = TABLE_NAME, "Table does not exist, reading not stored");
            }
            json!({ "data_added": reading })
        }
        Command::TotalRows => {
            let rows = gateway.count_rows(TABLE_NAME).await?.unwrap_or_default();
            json!({ "rows": rows })
        }
        Command::RetrieveRange { skip, limit } => {
            let rows = gateway.retrieve_rows(TABLE_NAME, limit, skip).await?;
            serde_json::to_value(rows.unwrap_or_default())?
        }
        Command::RetrieveOne { id } => {
            let rows = gateway.retrieve_row(TABLE_NAME, id).await?;
            serde_json::to_value(rows.unwrap_or_default())?
        }
        Command::ColumnNames { return_id } => {
            let names = gateway.column_names(TABLE_NAME, !return_id).await?;
            json!({ "column_names": names.unwrap_or_default() })
        }
        Command::ColumnTypes { return_id } => {
            let columns = gateway.column_types(TABLE_NAME, !return_id).await?;
            let types: Map<String, Json> = columns
                .unwrap_or_default()
                .into_iter()
                .map(|c| (c.name, json!(c.data_type)))
                .collect();
            Json::Object(types)
        }
        Command::Drop => {
            gateway
                .delete_table(TABLE_NAME)
                .await
                .with_context(|| format!("failed to drop table {}", TABLE_NAME))?;
            json!({ "table_deleted": TABLE_NAME })
        }
    };

    Ok(body)
}
