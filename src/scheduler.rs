use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use croner::Cron;
use tracing::{error, info, warn};

use crate::achievements::AchievementEvaluator;
use crate::coach::Coach;
use crate::store::SqliteStore;
use crate::traits::Messenger;
use crate::types::{Reminder, ReminderKind};

/// Time source, swappable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The fixed daily/weekly dispatch points. Reminder rows select recipients
/// and carry optional custom text; the firing times themselves are not
/// user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Morning,
    Hydration,
    Evening,
    WeeklySummary,
    RetentionCleanup,
}

impl Trigger {
    const ALL: [Trigger; 5] = [
        Trigger::Morning,
        Trigger::Hydration,
        Trigger::Evening,
        Trigger::WeeklySummary,
        Trigger::RetentionCleanup,
    ];

    fn cron(&self) -> &'static str {
        match self {
            Trigger::Morning => "0 8 * * *",
            Trigger::Hydration => "0 13 * * *",
            Trigger::Evening => "0 19 * * *",
            Trigger::WeeklySummary => "0 18 * * 0",
            Trigger::RetentionCleanup => "0 3 * * *",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Trigger::Morning => "morning_motivation",
            Trigger::Hydration => "hydration",
            Trigger::Evening => "evening_progress",
            Trigger::WeeklySummary => "weekly_summary",
            Trigger::RetentionCleanup => "retention_cleanup",
        }
    }
}

/// Compute the next occurrence of a cron expression strictly after `after`.
pub fn compute_next_run(
    cron_expr: &str,
    after: &DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    let cron: Cron = Cron::new(cron_expr)
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse cron '{}': {}", cron_expr, e))?;

    cron.find_next_occurrence(after, false)
        .map_err(|e| anyhow::anyhow!("No next occurrence for '{}': {}", cron_expr, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeeklyTier {
    Met,
    Partial,
    None,
}

/// Classify a week: target met, some activity, or nothing logged.
pub fn weekly_tier(completed: i64, target: i64) -> WeeklyTier {
    if target > 0 && completed >= target {
        WeeklyTier::Met
    } else if completed > 0 {
        WeeklyTier::Partial
    } else {
        WeeklyTier::None
    }
}

/// True when the reminder fires on `now`'s weekday. `days` uses cron
/// weekday numbers, 0 = Sunday.
fn reminder_due_today(reminder: &Reminder, now: &DateTime<Utc>) -> bool {
    match &reminder.days {
        None => true,
        Some(days) => {
            let today = now.weekday().num_days_from_sunday() as u8;
            days.contains(&today)
        }
    }
}

/// Drives all time-based outbound messaging: morning motivation, hydration
/// nudges, evening progress prompts, the Sunday weekly summary, and the
/// nightly retention sweep. One failed recipient never aborts a batch.
pub struct NotificationScheduler {
    store: Arc<SqliteStore>,
    coach: Arc<Coach>,
    messenger: Arc<dyn Messenger>,
    achievements: Arc<AchievementEvaluator>,
    clock: Arc<dyn Clock>,
    retention_days: i64,
    send_pacing: std::time::Duration,
    running: AtomicBool,
}

impl NotificationScheduler {
    pub fn new(
        store: Arc<SqliteStore>,
        coach: Arc<Coach>,
        messenger: Arc<dyn Messenger>,
        achievements: Arc<AchievementEvaluator>,
        clock: Arc<dyn Clock>,
        retention_days: i64,
        send_pacing: std::time::Duration,
    ) -> Self {
        Self {
            store,
            coach,
            messenger,
            achievements,
            clock,
            retention_days,
            send_pacing,
            running: AtomicBool::new(false),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Main loop: sleep until the earliest trigger, dispatch it, repeat.
    /// Sleeps are capped so `stop` is observed within a minute.
    pub async fn run(&self) -> anyhow::Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            anyhow::bail!("scheduler is already running");
        }
        info!("Notification scheduler started");

        while self.running.load(Ordering::SeqCst) {
            let now = self.clock.now();

            let mut next: Option<(Trigger, DateTime<Utc>)> = None;
            for trigger in Trigger::ALL {
                let at = compute_next_run(trigger.cron(), &now)?;
                if next.as_ref().map(|(_, t)| at < *t).unwrap_or(true) {
                    next = Some((trigger, at));
                }
            }
            let (trigger, at) = match next {
                Some(pair) => pair,
                None => anyhow::bail!("no schedulable triggers"),
            };

            while self.running.load(Ordering::SeqCst) && self.clock.now() < at {
                let remaining = (at - self.clock.now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);
                let chunk = remaining.min(std::time::Duration::from_secs(60));
                tokio::time::sleep(chunk).await;
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            info!(trigger = trigger.name(), "Dispatching scheduled trigger");
            if let Err(e) = self.dispatch(trigger).await {
                error!(trigger = trigger.name(), error = %e, "Trigger dispatch failed");
            }
        }

        info!("Notification scheduler stopped");
        Ok(())
    }

    async fn dispatch(&self, trigger: Trigger) -> anyhow::Result<()> {
        let now = self.clock.now();
        match trigger {
            Trigger::Morning => self.dispatch_morning(now).await,
            Trigger::Hydration => self.dispatch_hydration(now).await,
            Trigger::Evening => self.dispatch_evening(now).await,
            Trigger::WeeklySummary => self.dispatch_weekly_summary(now).await,
            Trigger::RetentionCleanup => {
                self.store.cleanup_old_progress(self.retention_days).await?;
                Ok(())
            }
        }
    }

    /// Morning motivation. Users with an explicit workout reminder get their
    /// custom text on the days it is due and nothing on the other days; only
    /// users without any workout reminder fall through to the generated
    /// message for the recently active.
    async fn dispatch_morning(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let reminders = self.store.active_reminders(ReminderKind::Workout).await?;
        let mut reached: Vec<i64> = Vec::new();

        for reminder in &reminders {
            // Off-day subscribers are recorded too: a mon/wed/fri reminder
            // means silence on tuesday, not the generic fallback.
            reached.push(reminder.user_id);
            if !reminder_due_today(reminder, &now) {
                continue;
            }
            if let Err(e) = self.send_morning(reminder.user_id, reminder.message.as_deref()).await {
                warn!(user_id = reminder.user_id, error = %e, "Morning reminder failed");
            }
            tokio::time::sleep(self.send_pacing).await;
        }

        for user_id in self.store.recently_active_users(30).await? {
            if reached.contains(&user_id) {
                continue;
            }
            if let Err(e) = self.send_morning(user_id, None).await {
                warn!(user_id, error = %e, "Morning motivation failed");
            }
            tokio::time::sleep(self.send_pacing).await;
        }
        Ok(())
    }

    async fn send_morning(&self, user_id: i64, custom: Option<&str>) -> anyhow::Result<()> {
        let profile = match self.store.get_profile(user_id).await? {
            Some(p) => p,
            None => return Ok(()),
        };
        let body = match custom {
            Some(text) => text.to_string(),
            None => {
                self.coach
                    .motivation(&profile, "morning workout reminder")
                    .await
            }
        };
        let text = format!("🌅 Good morning, {}!\n\n{}", profile.first_name, body);
        self.messenger.send(user_id, &text, false).await
    }

    /// Hydration nudges go only to users who asked for them.
    async fn dispatch_hydration(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        for reminder in self.store.active_reminders(ReminderKind::Hydration).await? {
            if !reminder_due_today(&reminder, &now) {
                continue;
            }
            let text = reminder
                .message
                .as_deref()
                .unwrap_or("💧 Time to hydrate! Drink a glass of water.");
            if let Err(e) = self.messenger.send(reminder.user_id, text, false).await {
                warn!(user_id = reminder.user_id, error = %e, "Hydration reminder failed");
            }
            tokio::time::sleep(self.send_pacing).await;
        }
        Ok(())
    }

    /// Evening progress prompt. Skipped for anyone who already logged today.
    async fn dispatch_evening(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let start_of_day = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);

        for reminder in self.store.active_reminders(ReminderKind::Progress).await? {
            if !reminder_due_today(&reminder, &now) {
                continue;
            }
            let today = self
                .store
                .progress_since(reminder.user_id, start_of_day)
                .await?;
            if !today.is_empty() {
                continue;
            }
            let text = reminder.message.as_deref().unwrap_or(
                "📝 How did today go? Log your progress so I can keep your plan on track!",
            );
            if let Err(e) = self.messenger.send(reminder.user_id, text, false).await {
                warn!(user_id = reminder.user_id, error = %e, "Evening reminder failed");
            }
            tokio::time::sleep(self.send_pacing).await;
        }
        Ok(())
    }

    /// Sunday recap: last 7 days of activity against the user's target,
    /// followed by an achievement pass (the weekly workout counts may have
    /// just crossed a threshold).
    async fn dispatch_weekly_summary(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        for user_id in self.store.recently_active_users(30).await? {
            if let Err(e) = self.send_weekly_summary(user_id, now).await {
                warn!(user_id, error = %e, "Weekly summary failed");
            }
            tokio::time::sleep(self.send_pacing).await;
        }
        Ok(())
    }

    async fn send_weekly_summary(&self, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<()> {
        let profile = match self.store.get_profile(user_id).await? {
            Some(p) => p,
            None => return Ok(()),
        };

        let entries = self.store.progress_since(user_id, now - Duration::days(7)).await?;
        let completed = entries.iter().filter(|e| e.workout_completed).count() as i64;
        let minutes: i64 = entries
            .iter()
            .filter(|e| e.workout_completed)
            .map(|e| e.duration_minutes)
            .sum();
        let calories: i64 = entries.iter().map(|e| e.calories_burned).sum();

        let headline = match weekly_tier(completed, profile.workout_days) {
            WeeklyTier::Met => format!(
                "🎉 Amazing week, {}! You hit your target of {} workouts.",
                profile.first_name, profile.workout_days
            ),
            WeeklyTier::Partial => format!(
                "💪 Good effort, {}! {} of {} workouts done — let's close the gap next week.",
                profile.first_name, completed, profile.workout_days
            ),
            WeeklyTier::None => format!(
                "🌱 A fresh week ahead, {}! Let's get your first workout in early.",
                profile.first_name
            ),
        };

        let text = format!(
            "{}\n\n📊 This week:\n• Workouts: {}\n• Active minutes: {}\n• Calories burned: {}",
            headline, completed, minutes, calories
        );
        self.messenger.send(user_id, &text, false).await?;

        if let Err(e) = self.achievements.check_and_award(user_id).await {
            warn!(user_id, error = %e, "Achievement check failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::providers::ProviderError;
    use crate::store::{NewProfile, NewReminder};
    use crate::traits::CompletionProvider;
    use crate::types::{FitnessLevel, Gender, NewProgress};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct StaticProvider;

    #[async_trait]
    impl CompletionProvider for StaticProvider {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ProviderError> {
            Ok("Keep pushing!".to_string())
        }
    }

    struct FlakyMessenger {
        fail_for: i64,
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl Messenger for FlakyMessenger {
        async fn send(&self, user_id: i64, text: &str, _html: bool) -> anyhow::Result<()> {
            if user_id == self.fail_for {
                anyhow::bail!("chat not found");
            }
            self.sent.lock().unwrap().push((user_id, text.to_string()));
            Ok(())
        }
    }

    fn profile(user_id: i64) -> NewProfile {
        NewProfile {
            user_id,
            username: None,
            first_name: format!("User{}", user_id),
            age: 30,
            weight_kg: 70.0,
            height_cm: 175.0,
            gender: Gender::Male,
            fitness_level: FitnessLevel::Beginner,
            goals: "stay fit".to_string(),
            medical_conditions: None,
            dietary_restrictions: None,
            workout_days: 3,
            workout_duration: 45,
        }
    }

    async fn setup(
        fail_for: i64,
        now: DateTime<Utc>,
    ) -> (
        NotificationScheduler,
        Arc<SqliteStore>,
        Arc<FlakyMessenger>,
        tempfile::NamedTempFile,
    ) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let store = Arc::new(
            SqliteStore::new(db_file.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let messenger = Arc::new(FlakyMessenger {
            fail_for,
            sent: Mutex::new(Vec::new()),
        });
        let coach = Arc::new(Coach::new(Arc::new(StaticProvider)));
        let achievements =
            AchievementEvaluator::new(store.clone(), messenger.clone() as Arc<dyn Messenger>);
        let scheduler = NotificationScheduler::new(
            store.clone(),
            coach,
            messenger.clone() as Arc<dyn Messenger>,
            Arc::new(achievements),
            Arc::new(FixedClock(now)),
            90,
            std::time::Duration::ZERO,
        );
        (scheduler, store, messenger, db_file)
    }

    #[test]
    fn weekly_tier_classification() {
        assert_eq!(weekly_tier(3, 3), WeeklyTier::Met);
        assert_eq!(weekly_tier(5, 3), WeeklyTier::Met);
        assert_eq!(weekly_tier(1, 3), WeeklyTier::Partial);
        assert_eq!(weekly_tier(0, 3), WeeklyTier::None);
        // A zero target never counts as met.
        assert_eq!(weekly_tier(2, 0), WeeklyTier::Partial);
        assert_eq!(weekly_tier(0, 0), WeeklyTier::None);
    }

    #[test]
    fn next_run_daily_at_eight() {
        let after = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let next = compute_next_run("0 8 * * *", &after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap());
    }

    #[test]
    fn next_run_weekly_on_sunday() {
        // 2025-06-02 is a Monday.
        let after = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let next = compute_next_run("0 18 * * 0", &after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 8, 18, 0, 0).unwrap());
    }

    #[test]
    fn day_filter_uses_cron_weekdays() {
        let reminder = Reminder {
            id: 1,
            user_id: 1,
            kind: ReminderKind::Workout,
            time_of_day: "08:00".to_string(),
            days: Some(vec![1, 3, 5]),
            message: None,
            is_active: true,
            created_at: Utc::now(),
        };
        let monday = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();
        assert!(reminder_due_today(&reminder, &monday));
        assert!(!reminder_due_today(&reminder, &tuesday));

        let daily = Reminder { days: None, ..reminder };
        assert!(reminder_due_today(&daily, &tuesday));
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_batch() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let (scheduler, store, messenger, _db) = setup(3, now).await;

        for uid in 1..=5 {
            store.save_profile(&profile(uid)).await.unwrap();
            store
                .save_reminder(&NewReminder {
                    user_id: uid,
                    kind: ReminderKind::Workout,
                    time_of_day: "08:00".to_string(),
                    days: None,
                    message: Some("Time to train!".to_string()),
                })
                .await
                .unwrap();
        }

        scheduler.dispatch_morning(now).await.unwrap();

        let sent = messenger.sent.lock().unwrap();
        let recipients: Vec<i64> = sent.iter().map(|(uid, _)| *uid).collect();
        assert!(recipients.contains(&1));
        assert!(recipients.contains(&2));
        assert!(!recipients.contains(&3));
        assert!(recipients.contains(&4));
        assert!(recipients.contains(&5));
        assert!(sent[0].1.contains("Good morning, User1"));
        assert!(sent[0].1.contains("Time to train!"));
    }

    #[tokio::test]
    async fn off_day_reminder_silences_the_morning_fallback() {
        // 2025-06-03 is a Tuesday; the reminder covers mon/wed/fri.
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();
        let (scheduler, store, messenger, _db) = setup(0, now).await;

        store.save_profile(&profile(1)).await.unwrap();
        store.save_profile(&profile(2)).await.unwrap();
        store
            .save_reminder(&NewReminder {
                user_id: 1,
                kind: ReminderKind::Workout,
                time_of_day: "08:00".to_string(),
                days: Some(vec![1, 3, 5]),
                message: Some("Leg day!".to_string()),
            })
            .await
            .unwrap();

        scheduler.dispatch_morning(now).await.unwrap();

        let sent = messenger.sent.lock().unwrap();
        let recipients: Vec<i64> = sent.iter().map(|(uid, _)| *uid).collect();
        assert!(
            !recipients.contains(&1),
            "day-restricted subscriber must stay quiet on off days"
        );
        assert!(recipients.contains(&2));
    }

    #[tokio::test]
    async fn hydration_goes_only_to_subscribers() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 13, 0, 0).unwrap();
        let (scheduler, store, messenger, _db) = setup(0, now).await;

        store.save_profile(&profile(1)).await.unwrap();
        store.save_profile(&profile(2)).await.unwrap();
        store
            .save_reminder(&NewReminder {
                user_id: 1,
                kind: ReminderKind::Hydration,
                time_of_day: "13:00".to_string(),
                days: None,
                message: None,
            })
            .await
            .unwrap();

        scheduler.dispatch_hydration(now).await.unwrap();

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 1);
        assert!(sent[0].1.contains("hydrate"));
    }

    #[tokio::test]
    async fn evening_prompt_skips_users_who_logged_today() {
        let now = Utc::now();
        let (scheduler, store, messenger, _db) = setup(0, now).await;

        store.save_profile(&profile(1)).await.unwrap();
        store.save_profile(&profile(2)).await.unwrap();
        for uid in [1i64, 2] {
            store
                .save_reminder(&NewReminder {
                    user_id: uid,
                    kind: ReminderKind::Progress,
                    time_of_day: "19:00".to_string(),
                    days: None,
                    message: None,
                })
                .await
                .unwrap();
        }
        store
            .log_progress(&NewProgress {
                user_id: 1,
                workout_completed: true,
                duration_minutes: 30,
                ..Default::default()
            })
            .await
            .unwrap();

        scheduler.dispatch_evening(now).await.unwrap();

        let sent = messenger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);
    }

    #[tokio::test]
    async fn weekly_summary_reports_tier_and_totals() {
        let now = Utc::now();
        let (scheduler, store, messenger, _db) = setup(0, now).await;

        store.save_profile(&profile(1)).await.unwrap();
        for _ in 0..3 {
            store
                .log_progress(&NewProgress {
                    user_id: 1,
                    workout_completed: true,
                    duration_minutes: 40,
                    calories_burned: 300,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        scheduler.dispatch_weekly_summary(now).await.unwrap();

        let sent = messenger.sent.lock().unwrap();
        let summary = sent
            .iter()
            .find(|(_, text)| text.contains("This week"))
            .map(|(_, text)| text.clone())
            .unwrap();
        assert!(summary.contains("Amazing week"));
        assert!(summary.contains("Workouts: 3"));
        assert!(summary.contains("Active minutes: 120"));
        assert!(summary.contains("Calories burned: 900"));
    }
}
