mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, commands};
use plantdb::{ConnectionConfig, PgConnector, TableGateway};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ConnectionConfig::from_env().context("failed to load database configuration")?;
    let mut gateway = TableGateway::new(PgConnector::new(config));

    let outcome = commands::run(&mut gateway, cli.command).await;
    gateway.close().await.context("failed to close connection")?;

    println!("{}", serde_json::to_string_pretty(&outcome?)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plantdb=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
