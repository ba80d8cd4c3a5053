use super::{PowerPlantReading, TABLE_NAME, table_columns};
use crate::connection::Connector;
use crate::core::{DbError, Result};
use crate::facade::TableGateway;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const PROGRESS_EVERY: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub table_created: bool,
    pub rows_inserted: usize,
    /// Table already held data, nothing was inserted.
    pub skipped: bool,
}

fn csv_reader() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

fn collect_readings<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<PowerPlantReading>> {
    Ok(reader
        .deserialize()
        .collect::<std::result::Result<Vec<PowerPlantReading>, csv::Error>>()?)
}

/// Read readings from a CSV export with an `AT,V,AP,RH,PE` header.
pub fn read_csv(path: &Path) -> Result<Vec<PowerPlantReading>> {
    let readings = collect_readings(csv_reader().from_path(path)?)?;

    info!(path = %path.display(), rows = readings.len(), "Read power plant data");
    Ok(readings)
}

/// Download a CSV export in the same format as [`read_csv`] expects.
pub async fn fetch_csv(url: &str) -> Result<Vec<PowerPlantReading>> {
    info!(url, "Downloading power plant data");
    let body = reqwest::get(url)
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let readings = collect_readings(csv_reader().from_reader(body.as_ref()))?;
    info!(url, rows = readings.len(), "Read power plant data");
    Ok(readings)
}

/// Create the power plant table if needed and load `readings` into it
/// when it is empty. The gateway's connection is closed afterwards,
/// whether or not seeding succeeded.
pub async fn initialize<C: Connector>(
    gateway: &mut TableGateway<C>,
    readings: &[PowerPlantReading],
) -> Result<SeedReport> {
    let outcome = seed(gateway, readings).await;
    let closed = gateway.close().await;

    let report = outcome?;
    closed?;
    Ok(report)
}

async fn seed<C: Connector>(
    gateway: &mut TableGateway<C>,
    readings: &[PowerPlantReading],
) -> Result<SeedReport> {
    let mut report = SeedReport {
        table_created: gateway.create_table(TABLE_NAME, &table_columns()).await?,
        ..SeedReport::default()
    };

    let existing = gateway.count_rows(TABLE_NAME).await?.unwrap_or_default();
    if existing >= 1 {
        warn!(
            rows = existing,
            "Database already contains data, skipping initialization"
        );
        report.skipped = true;
        return Ok(report);
    }

    info!(rows = readings.len(), "Pushing power plant data");
    for reading in readings {
        if gateway
            .insert_row(TABLE_NAME, &reading.to_row())
            .await?
            .is_missing()
        {
            return Err(DbError::TableNotFound(TABLE_NAME.to_string()));
        }

        report.rows_inserted += 1;
        if report.rows_inserted % PROGRESS_EVERY == 0 {
            debug!(inserted = report.rows_inserted, "Seeding progress");
        }
    }

    info!(rows = report.rows_inserted, "Power plant data loaded");
    Ok(report)
}
