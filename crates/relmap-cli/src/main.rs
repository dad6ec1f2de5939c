//! relmap - compile a declarative schema into SQL.

mod commands;
mod config;
mod error;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relmap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.into_config();

    tracing::info!(
        schema = %config.schema_path.display(),
        primary_key_name = %config.catalog.primary_key_name,
        "configuration loaded"
    );

    let schema = commands::load_schema(&config.schema_path)?;
    let statements = commands::compile(schema, config.catalog, &config.command)?;

    for statement in &statements {
        println!("{};", statement);
    }
    tracing::info!(statements = statements.len(), "compiled");

    Ok(())
}
