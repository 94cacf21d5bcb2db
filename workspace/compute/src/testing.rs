//! Shared fixtures for the compute tests.

pub mod helpers;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};

use migration::{Migrator, MigratorTrait};

pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    // Connect to the SQLite database
    let db = Database::connect("sqlite::memory:").await?;

    // Enable foreign keys
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

    Migrator::up(&db, None).await.expect("Migrations failed.");
    Ok(db)
}
