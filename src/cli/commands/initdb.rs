use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use tracing::{debug, info, trace};

use crate::config;

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");

    let db = config::connect(database_url, true).await?;

    info!("Running database migrations");
    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;
    debug!("All pending migrations have been applied");

    info!("Database initialization completed successfully!");
    println!("Database initialized at {}", database_url);
    Ok(())
}
