use crate::database::StoreError;
use app_state::StorageSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS pin (
        id               TEXT PRIMARY KEY NOT NULL,
        latitude         REAL NOT NULL,
        longitude        REAL NOT NULL,
        last_photo_count INTEGER NOT NULL DEFAULT 0,
        created_at       TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS photo (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        pin_id     TEXT NOT NULL REFERENCES pin (id) ON DELETE CASCADE,
        title      TEXT NOT NULL,
        remote_url TEXT NOT NULL,
        cache_key  TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_photo_pin_title ON photo (pin_id, title)",
    "CREATE INDEX IF NOT EXISTS idx_photo_cache_key ON photo (cache_key)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_photo_pin_cache_key ON photo (pin_id, cache_key)",
    r"
    CREATE TABLE IF NOT EXISTS map_region (
        id               INTEGER PRIMARY KEY CHECK (id = 1),
        center_latitude  REAL NOT NULL,
        center_longitude REAL NOT NULL,
        span_latitude    REAL NOT NULL,
        span_longitude   REAL NOT NULL,
        updated_at       TEXT NOT NULL
    )
    ",
];

/// Connect to the SQLite database and apply the schema.
/// # Errors
///
/// * The database url cannot be parsed or the file cannot be created.
/// * A schema statement fails.
pub async fn get_db_pool(settings: &StorageSettings) -> Result<SqlitePool, StoreError> {
    info!("Connecting to database.");
    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    if !settings.is_in_memory() {
        let parent = Path::new(options.get_filename())
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = if settings.is_in_memory() {
        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?
    };

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Apply the schema. Every statement is idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
