use std::sync::Arc;

use tracing::{info, warn};

use crate::store::SqliteStore;
use crate::traits::Messenger;
use crate::types::AchievementKind;

/// Checks a user's aggregate stats against every achievement predicate and
/// awards whatever is newly earned. Awards are permanent; once a kind is in
/// the store it is never re-evaluated or revoked, even if the underlying
/// stats later drop back below the threshold.
pub struct AchievementEvaluator {
    store: Arc<SqliteStore>,
    messenger: Arc<dyn Messenger>,
}

impl AchievementEvaluator {
    pub fn new(store: Arc<SqliteStore>, messenger: Arc<dyn Messenger>) -> Self {
        Self { store, messenger }
    }

    /// Evaluate all achievement kinds for the user and award the new ones.
    /// Returns the kinds awarded by this call. A failed congratulation
    /// message does not roll back the award; the user just misses the
    /// notification.
    pub async fn check_and_award(&self, user_id: i64) -> anyhow::Result<Vec<AchievementKind>> {
        let stats = self.store.user_stats(user_id).await?;
        let mut awarded = Vec::new();

        for kind in AchievementKind::ALL {
            if !kind.earned(&stats) {
                continue;
            }
            if self.store.has_achievement(user_id, kind).await? {
                continue;
            }

            // A concurrent evaluation may have won the insert; skip the
            // notification in that case.
            if !self.store.add_achievement(user_id, kind).await? {
                continue;
            }
            awarded.push(kind);

            let text = format!(
                "🏆 <b>Achievement unlocked!</b>\n\n{}\n{}",
                kind.title(),
                kind.description()
            );
            if let Err(err) = self.messenger.send(user_id, &text, true).await {
                warn!(user_id, kind = kind.as_str(), error = %err, "Failed to send achievement notification");
            }
        }

        if !awarded.is_empty() {
            info!(user_id, count = awarded.len(), "Achievements awarded");
        }
        Ok(awarded)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::store::NewProfile;
    use crate::types::{FitnessLevel, Gender, NewProgress};

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<(i64, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Messenger for RecordingMessenger {
        async fn send(&self, user_id: i64, text: &str, _html: bool) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("network down");
            }
            self.sent.lock().unwrap().push((user_id, text.to_string()));
            Ok(())
        }
    }

    async fn setup() -> (Arc<SqliteStore>, tempfile::NamedTempFile) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let store = SqliteStore::new(db_file.path().to_str().unwrap())
            .await
            .unwrap();
        let store = Arc::new(store);
        store
            .save_profile(&NewProfile {
                user_id: 1,
                username: None,
                first_name: "Sam".to_string(),
                age: 28,
                weight_kg: 80.0,
                height_cm: 180.0,
                gender: Gender::Female,
                fitness_level: FitnessLevel::Beginner,
                goals: "lose weight".to_string(),
                medical_conditions: None,
                dietary_restrictions: None,
                workout_days: 3,
                workout_duration: 45,
            })
            .await
            .unwrap();
        (store, db_file)
    }

    fn completed_workout(user_id: i64) -> NewProgress {
        NewProgress {
            user_id,
            workout_completed: true,
            duration_minutes: 30,
            calories_burned: 250,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_workout_awarded_once() {
        let (store, _db) = setup().await;
        let messenger = Arc::new(RecordingMessenger::default());
        let evaluator = AchievementEvaluator::new(store.clone(), messenger.clone());

        store.log_progress(&completed_workout(1)).await.unwrap();

        let awarded = evaluator.check_and_award(1).await.unwrap();
        assert_eq!(awarded, vec![AchievementKind::FirstWorkout]);
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);

        // Re-running awards nothing new.
        let again = evaluator.check_and_award(1).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(messenger.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn weight_loss_awarded_on_five_kilos() {
        let (store, _db) = setup().await;
        let messenger = Arc::new(RecordingMessenger::default());
        let evaluator = AchievementEvaluator::new(store.clone(), messenger.clone());

        store
            .log_progress(&NewProgress {
                user_id: 1,
                weight_kg: Some(85.0),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .log_progress(&NewProgress {
                user_id: 1,
                weight_kg: Some(79.5),
                ..Default::default()
            })
            .await
            .unwrap();

        let awarded = evaluator.check_and_award(1).await.unwrap();
        assert!(awarded.contains(&AchievementKind::WeightLoss5kg));
    }

    #[tokio::test]
    async fn month_commitment_requires_thirty_days() {
        let (store, _db) = setup().await;
        let messenger = Arc::new(RecordingMessenger::default());
        let evaluator = AchievementEvaluator::new(store.clone(), messenger.clone());

        let awarded = evaluator.check_and_award(1).await.unwrap();
        assert!(!awarded.contains(&AchievementKind::MonthCommitment));

        let old = (chrono::Utc::now() - chrono::Duration::days(31)).to_rfc3339();
        sqlx::query("UPDATE users SET created_at = ? WHERE user_id = 1")
            .bind(&old)
            .execute(store.pool())
            .await
            .unwrap();

        let awarded = evaluator.check_and_award(1).await.unwrap();
        assert!(awarded.contains(&AchievementKind::MonthCommitment));
    }

    #[tokio::test]
    async fn award_stands_when_notification_fails() {
        let (store, _db) = setup().await;
        let messenger = Arc::new(RecordingMessenger {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let evaluator = AchievementEvaluator::new(store.clone(), messenger);

        store.log_progress(&completed_workout(1)).await.unwrap();

        let awarded = evaluator.check_and_award(1).await.unwrap();
        assert_eq!(awarded, vec![AchievementKind::FirstWorkout]);
        assert!(store
            .has_achievement(1, AchievementKind::FirstWorkout)
            .await
            .unwrap());
    }
}
