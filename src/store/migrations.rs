use sqlx::SqlitePool;
use tracing::info;

/// Idempotent schema setup. Every statement is safe to run on an existing
/// database via `IF NOT EXISTS`.
pub(crate) async fn run(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT NOT NULL,
            age INTEGER NOT NULL,
            weight REAL NOT NULL,
            height REAL NOT NULL,
            gender TEXT NOT NULL,
            fitness_level TEXT NOT NULL,
            goals TEXT NOT NULL,
            medical_conditions TEXT,
            dietary_restrictions TEXT,
            workout_days INTEGER NOT NULL,
            workout_duration INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            content TEXT NOT NULL,
            generated_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (user_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_plans_user_kind_active
         ON plans(user_id, kind, is_active)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS progress (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            weight REAL,
            workout_completed INTEGER NOT NULL DEFAULT 0,
            exercises_completed INTEGER NOT NULL DEFAULT 0,
            duration_minutes INTEGER NOT NULL DEFAULT 0,
            calories_burned INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            mood_rating INTEGER,
            recorded_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (user_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_progress_user_time
         ON progress(user_id, recorded_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS reminders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            time_of_day TEXT NOT NULL,
            days TEXT,
            message TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (user_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_reminders_kind_active
         ON reminders(kind, is_active)",
    )
    .execute(pool)
    .await?;

    // UNIQUE(user_id, kind) backs up the evaluator's explicit existence
    // check: a milestone can never be awarded twice.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            achieved_at TEXT NOT NULL,
            UNIQUE(user_id, kind),
            FOREIGN KEY (user_id) REFERENCES users (user_id)
        )",
    )
    .execute(pool)
    .await?;

    info!("Database migrations complete");
    Ok(())
}
