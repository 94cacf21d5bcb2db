use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection};
use tracing::{debug, info};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://expenses.db";

/// Used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "expense_tracker=info,compute=info";

/// Opens the database and enables foreign keys on SQLite.
///
/// With `create` set, a missing SQLite file is created.
pub async fn connect(database_url: &str, create: bool) -> Result<DatabaseConnection> {
    let url = sqlite_url(database_url, create);
    info!("Connecting to database: {}", database_url);

    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    if db.get_database_backend() == DatabaseBackend::Sqlite {
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        debug!("Enabled SQLite foreign keys");
    }

    Ok(db)
}

/// Adds `mode=rwc` to SQLite file URLs that do not choose a mode.
fn sqlite_url(database_url: &str, create: bool) -> String {
    if !create || !database_url.starts_with("sqlite:") || database_url.contains(":memory:") {
        return database_url.to_string();
    }
    if database_url.contains("mode=") {
        return database_url.to_string();
    }
    let separator = if database_url.contains('?') { '&' } else { '?' };
    format!("{}{}mode=rwc", database_url, separator)
}

/// The moment commands run at unless told otherwise.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
