pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage the power plant readings table.
#[derive(Debug, Parser)]
#[command(name = "plantdb", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the table and load readings into it if it is empty
    Init {
        /// CSV export of the data set with an AT,V,AP,RH,PE header
        #[arg(long, conflicts_with = "url")]
        csv: Option<PathBuf>,
        /// Download the CSV export from this URL instead
        #[arg(long)]
        url: Option<String>,
    },
    /// Insert one reading
    Add {
        #[arg(long, allow_hyphen_values = true)]
        at: f64,
        #[arg(long, allow_hyphen_values = true)]
        v: f64,
        #[arg(long, allow_hyphen_values = true)]
        ap: f64,
        #[arg(long, allow_hyphen_values = true)]
        rh: f64,
        #[arg(long, allow_hyphen_values = true)]
        pe: f64,
    },
    /// Number of stored readings
    TotalRows,
    /// A page of readings
    RetrieveRange {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = plantdb::DEFAULT_RETRIEVE_LIMIT)]
        limit: u64,
    },
    /// One reading by id
    RetrieveOne { id: i64 },
    /// Column names of the table
    ColumnNames {
        #[arg(long)]
        return_id: bool,
    },
    /// Column names and declared types
    ColumnTypes {
        #[arg(long)]
        return_id: bool,
    },
    /// Drop the table
    Drop,
}
