use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tracing::info;

use super::{parse_ts, SqliteStore};
use crate::types::{NewProgress, ProgressEntry, UserStats};

impl SqliteStore {
    /// Append one progress entry. Entries are never updated in place.
    pub async fn log_progress(&self, entry: &NewProgress) -> anyhow::Result<i64> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO progress (user_id, weight, workout_completed, exercises_completed,
                                   duration_minutes, calories_burned, notes, mood_rating,
                                   recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id)
        .bind(entry.weight_kg)
        .bind(entry.workout_completed as i64)
        .bind(entry.exercises_completed)
        .bind(entry.duration_minutes)
        .bind(entry.calories_burned)
        .bind(&entry.notes)
        .bind(entry.mood_rating)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(user_id = entry.user_id, "Progress logged");
        Ok(result.last_insert_rowid())
    }

    /// Most recent entries first.
    pub async fn recent_progress(
        &self,
        user_id: i64,
        limit: i64,
    ) -> anyhow::Result<Vec<ProgressEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM progress WHERE user_id = ? ORDER BY recorded_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Entries at or after `since`, oldest first.
    pub async fn progress_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ProgressEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM progress WHERE user_id = ? AND recorded_at >= ?
             ORDER BY recorded_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Aggregate statistics feeding the achievement evaluator and the
    /// progress view.
    pub async fn user_stats(&self, user_id: i64) -> anyhow::Result<UserStats> {
        let totals = sqlx::query(
            "SELECT
               COUNT(CASE WHEN workout_completed = 1 THEN 1 END) AS total_workouts,
               COALESCE(AVG(CASE WHEN workout_completed = 1 THEN duration_minutes END), 0.0)
                 AS avg_duration,
               COALESCE(SUM(calories_burned), 0) AS total_calories
             FROM progress WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let first_weight = sqlx::query(
            "SELECT weight FROM progress
             WHERE user_id = ? AND weight IS NOT NULL
             ORDER BY recorded_at ASC, id ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|r| r.get::<f64, _>("weight"));

        let last_weight = sqlx::query(
            "SELECT weight FROM progress
             WHERE user_id = ? AND weight IS NOT NULL
             ORDER BY recorded_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|r| r.get::<f64, _>("weight"));

        let days_registered = match sqlx::query("SELECT created_at FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(row) => {
                let created: String = row.get("created_at");
                (Utc::now() - parse_ts(&created)?).num_days()
            }
            None => 0,
        };

        let weight_change = match (first_weight, last_weight) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        };

        Ok(UserStats {
            total_workouts: totals.get::<i64, _>("total_workouts"),
            avg_duration: totals.get::<f64, _>("avg_duration"),
            total_calories: totals.get::<i64, _>("total_calories"),
            weight_change,
            days_registered,
        })
    }

    /// Retention sweep: drop entries older than the cutoff. Returns the
    /// number of rows deleted.
    pub async fn cleanup_old_progress(&self, days: i64) -> anyhow::Result<u64> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();

        let result = sqlx::query("DELETE FROM progress WHERE recorded_at < ?")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!(deleted, "Cleaned up old progress records");
        }
        Ok(deleted)
    }
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<ProgressEntry> {
    let recorded: String = row.get("recorded_at");

    Ok(ProgressEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        weight_kg: row.get("weight"),
        workout_completed: row.get::<i64, _>("workout_completed") != 0,
        exercises_completed: row.get("exercises_completed"),
        duration_minutes: row.get("duration_minutes"),
        calories_burned: row.get("calories_burned"),
        notes: row.get("notes"),
        mood_rating: row.get("mood_rating"),
        recorded_at: parse_ts(&recorded)?,
    })
}
