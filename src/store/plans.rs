use chrono::Utc;
use sqlx::Row;
use tracing::info;

use super::{parse_ts, SqliteStore};
use crate::types::{PlanKind, PlanRecord};

impl SqliteStore {
    /// Save a freshly generated plan. Deactivating the previous plans of
    /// the same kind and inserting the new one happen in one transaction,
    /// so there is never a window with zero or two active plans.
    pub async fn save_plan(
        &self,
        user_id: i64,
        kind: PlanKind,
        content: &str,
    ) -> anyhow::Result<PlanRecord> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE plans SET is_active = 0 WHERE user_id = ? AND kind = ?")
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO plans (id, user_id, kind, content, generated_at, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(content)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user_id, kind = kind.as_str(), "Plan saved");

        Ok(PlanRecord {
            id,
            user_id,
            kind,
            content: content.to_string(),
            generated_at: now,
            is_active: true,
            created_at: now,
        })
    }

    pub async fn get_active_plan(
        &self,
        user_id: i64,
        kind: PlanKind,
    ) -> anyhow::Result<Option<PlanRecord>> {
        let row = sqlx::query(
            "SELECT * FROM plans
             WHERE user_id = ? AND kind = ? AND is_active = 1
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| plan_from_row(&r)).transpose()
    }

    #[cfg(test)]
    pub(crate) async fn count_active_plans(
        &self,
        user_id: i64,
        kind: PlanKind,
    ) -> anyhow::Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM plans WHERE user_id = ? AND kind = ? AND is_active = 1",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

fn plan_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<PlanRecord> {
    let kind_str: String = row.get("kind");
    let generated: String = row.get("generated_at");
    let created: String = row.get("created_at");

    Ok(PlanRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind: PlanKind::parse(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("invalid plan kind in store: {}", kind_str))?,
        content: row.get("content"),
        generated_at: parse_ts(&generated)?,
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: parse_ts(&created)?,
    })
}
