use chrono::{Duration, Utc};
use sqlx::Row;
use tracing::info;

use super::{parse_ts, SqliteStore};
use crate::types::{FitnessLevel, Gender, Profile};

/// Everything needed to create or replace a profile. Timestamps are
/// assigned by the store; an upsert keeps the original created_at.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub age: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
    pub fitness_level: FitnessLevel,
    pub goals: String,
    pub medical_conditions: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub workout_days: i64,
    pub workout_duration: i64,
}

impl SqliteStore {
    /// Upsert: re-running onboarding replaces the prior profile for the
    /// user, preserving the registration date.
    pub async fn save_profile(&self, profile: &NewProfile) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (user_id, username, first_name, age, weight, height, gender,
                                fitness_level, goals, medical_conditions, dietary_restrictions,
                                workout_days, workout_duration, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
               username = excluded.username,
               first_name = excluded.first_name,
               age = excluded.age,
               weight = excluded.weight,
               height = excluded.height,
               gender = excluded.gender,
               fitness_level = excluded.fitness_level,
               goals = excluded.goals,
               medical_conditions = excluded.medical_conditions,
               dietary_restrictions = excluded.dietary_restrictions,
               workout_days = excluded.workout_days,
               workout_duration = excluded.workout_duration,
               updated_at = excluded.updated_at",
        )
        .bind(profile.user_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(profile.age)
        .bind(profile.weight_kg)
        .bind(profile.height_cm)
        .bind(profile.gender.as_str())
        .bind(profile.fitness_level.as_str())
        .bind(&profile.goals)
        .bind(&profile.medical_conditions)
        .bind(&profile.dietary_restrictions)
        .bind(profile.workout_days)
        .bind(profile.workout_duration)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(user_id = profile.user_id, "Profile saved");
        Ok(())
    }

    pub async fn get_profile(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| profile_from_row(&r)).transpose()
    }

    /// Users who registered, updated their profile, or logged progress
    /// within the trailing window. Default recipient set for triggers with
    /// no explicit reminder subscription.
    pub async fn recently_active_users(&self, days: i64) -> anyhow::Result<Vec<i64>> {
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();

        let rows = sqlx::query(
            "SELECT user_id FROM users WHERE updated_at >= ?
             UNION
             SELECT DISTINCT user_id FROM progress WHERE recorded_at >= ?
             ORDER BY user_id",
        )
        .bind(&cutoff)
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get::<i64, _>("user_id")).collect())
    }
}

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Profile> {
    let gender_str: String = row.get("gender");
    let level_str: String = row.get("fitness_level");
    let created: String = row.get("created_at");
    let updated: String = row.get("updated_at");

    Ok(Profile {
        user_id: row.get("user_id"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        age: row.get("age"),
        weight_kg: row.get("weight"),
        height_cm: row.get("height"),
        gender: Gender::from_input(&gender_str)
            .ok_or_else(|| anyhow::anyhow!("invalid gender in store: {}", gender_str))?,
        fitness_level: FitnessLevel::from_input(&level_str)
            .ok_or_else(|| anyhow::anyhow!("invalid fitness level in store: {}", level_str))?,
        goals: row.get("goals"),
        medical_conditions: row.get("medical_conditions"),
        dietary_restrictions: row.get("dietary_restrictions"),
        workout_days: row.get("workout_days"),
        workout_duration: row.get("workout_duration"),
        created_at: parse_ts(&created)?,
        updated_at: parse_ts(&updated)?,
    })
}
