use chrono::Utc;
use sqlx::Row;
use tracing::info;

use super::{parse_ts, SqliteStore};
use crate::types::{Reminder, ReminderKind};

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: i64,
    pub kind: ReminderKind,
    pub time_of_day: String,
    pub days: Option<Vec<u8>>,
    pub message: Option<String>,
}

impl SqliteStore {
    pub async fn save_reminder(&self, reminder: &NewReminder) -> anyhow::Result<i64> {
        let now = Utc::now().to_rfc3339();
        let days_json = reminder
            .days
            .as_ref()
            .map(|d| serde_json::to_string(d))
            .transpose()?;

        let result = sqlx::query(
            "INSERT INTO reminders (user_id, kind, time_of_day, days, message, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(reminder.user_id)
        .bind(reminder.kind.as_str())
        .bind(&reminder.time_of_day)
        .bind(&days_json)
        .bind(&reminder.message)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(
            user_id = reminder.user_id,
            kind = reminder.kind.as_str(),
            "Reminder saved"
        );
        Ok(result.last_insert_rowid())
    }

    pub async fn reminders_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT * FROM reminders WHERE user_id = ? AND is_active = 1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reminder_from_row).collect()
    }

    /// All active reminders of a kind, across users. One row per
    /// subscription; the scheduler applies the day-of-week filter.
    pub async fn active_reminders(&self, kind: ReminderKind) -> anyhow::Result<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT r.* FROM reminders r
             JOIN users u ON u.user_id = r.user_id
             WHERE r.kind = ? AND r.is_active = 1
             ORDER BY r.user_id ASC",
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(reminder_from_row).collect()
    }

    /// Deactivate one of the user's reminders. Returns false when the id
    /// does not belong to the user or is already inactive.
    pub async fn deactivate_reminder(&self, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE reminders SET is_active = 0 WHERE id = ? AND user_id = ? AND is_active = 1",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn reminder_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Reminder> {
    let kind_str: String = row.get("kind");
    let created: String = row.get("created_at");
    let days: Option<String> = row.get("days");

    Ok(Reminder {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: ReminderKind::parse(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("invalid reminder kind in store: {}", kind_str))?,
        time_of_day: row.get("time_of_day"),
        days: days.map(|d| serde_json::from_str(&d)).transpose()?,
        message: row.get("message"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_ts(&created)?,
    })
}
