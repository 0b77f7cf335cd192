use std::str::FromStr;

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use crate::{config::AppConfig, error::StorageError};

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id             INTEGER PRIMARY KEY AUTOINCREMENT,
        email               TEXT NOT NULL UNIQUE,
        username            TEXT,
        diningHall          TEXT,
        allergens           TEXT,
        dietaryRestrictions TEXT,
        favorites           TEXT
    )
"#;

const CREATE_FOOD_JOURNAL: &str = r#"
    CREATE TABLE IF NOT EXISTS food_journal (
        entry_id    TEXT PRIMARY KEY,
        user_id     INTEGER NOT NULL,
        date        TEXT NOT NULL,
        meal_type   TEXT NOT NULL,
        food_item   TEXT NOT NULL,
        dining_hall TEXT NOT NULL DEFAULT '',
        notes       TEXT NOT NULL DEFAULT '',
        calories    REAL NOT NULL DEFAULT 0,
        protein     REAL NOT NULL DEFAULT 0,
        carbs       REAL NOT NULL DEFAULT 0,
        fat         REAL NOT NULL DEFAULT 0,
        created_at  TIMESTAMP NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f000000Z', 'now')),
        FOREIGN KEY (user_id) REFERENCES users (user_id)
    )
"#;

const CREATE_JOURNAL_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_food_journal_user_date
        ON food_journal (user_id, date)
"#;

/// Open the SQLite pool. The journal's user reference is not enforced, so
/// foreign key checks stay off.
pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("parse DATABASE_URL {}", config.database_url))?
        .create_if_missing(true)
        .foreign_keys(false);

    let db = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Create `users` and `food_journal` when they are missing. Safe to call on
/// every start; existing columns are left untouched.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), StorageError> {
    for statement in [CREATE_USERS, CREATE_FOOD_JOURNAL, CREATE_JOURNAL_INDEX] {
        sqlx::query(statement).execute(db).await?;
    }
    info!("schema ready");
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory url")
        .foreign_keys(false);
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("open in-memory sqlite");
    ensure_schema(&db).await.expect("schema");
    db
}

/// File-backed database in a temp dir, for tests that need several
/// connections writing at once. Keep the dir alive as long as the pool.
#[cfg(test)]
pub async fn file_pool(max_connections: u32) -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("food_journal.db"))
        .create_if_missing(true)
        .foreign_keys(false);
    let db = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .expect("open file sqlite");
    ensure_schema(&db).await.expect("schema");
    (db, dir)
}
