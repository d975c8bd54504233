use chrono::Utc;
use sqlx::Row;
use tracing::info;

use super::{parse_ts, SqliteStore};
use crate::types::{Achievement, AchievementKind};

impl SqliteStore {
    pub async fn has_achievement(
        &self,
        user_id: i64,
        kind: AchievementKind,
    ) -> anyhow::Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM achievements WHERE user_id = ? AND kind = ? LIMIT 1",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Returns true when a new row was written, false when the user already
    /// had the achievement.
    pub async fn add_achievement(
        &self,
        user_id: i64,
        kind: AchievementKind,
    ) -> anyhow::Result<bool> {
        let now = Utc::now().to_rfc3339();

        // OR IGNORE: the UNIQUE(user_id, kind) constraint makes a racing
        // duplicate insert a no-op instead of an error.
        let result = sqlx::query(
            "INSERT OR IGNORE INTO achievements (user_id, kind, title, description, achieved_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(kind.title())
        .bind(kind.description())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() > 0;
        if inserted {
            info!(user_id, kind = kind.as_str(), "Achievement awarded");
        }
        Ok(inserted)
    }

    pub async fn achievements_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Achievement>> {
        let rows = sqlx::query(
            "SELECT * FROM achievements WHERE user_id = ? ORDER BY achieved_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let kind_str: String = row.get("kind");
                let achieved: String = row.get("achieved_at");
                Ok(Achievement {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    kind: AchievementKind::parse(&kind_str).ok_or_else(|| {
                        anyhow::anyhow!("invalid achievement kind in store: {}", kind_str)
                    })?,
                    title: row.get("title"),
                    description: row.get("description"),
                    achieved_at: parse_ts(&achieved)?,
                })
            })
            .collect()
    }
}
