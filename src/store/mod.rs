mod achievements;
mod migrations;
mod plans;
mod profiles;
mod progress;
mod reminders;


pub use profiles::NewProfile;
pub use reminders::NewReminder;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Single writer/reader for all durable entities: profiles, plans,
/// progress entries, reminders, achievements. Entity-specific operations
/// live in the submodules; each call is a self-contained transaction.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        migrations::run(&pool).await?;
        info!(db_path, "SQLite store initialized");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Timestamps are stored as RFC 3339 TEXT; same format everywhere so
/// lexicographic ORDER BY matches chronological order.
pub(crate) fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow::anyhow!("invalid timestamp '{}': {}", s, e))?
        .with_timezone(&Utc))
}
