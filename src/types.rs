use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's durable fitness intake record. One row per Telegram user;
/// exists only after onboarding finalized (partial data never persists).
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Case-insensitive parse; stored and displayed in capitalized form.
    pub fn from_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl FitnessLevel {
    pub fn from_input(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(FitnessLevel::Beginner),
            "intermediate" => Some(FitnessLevel::Intermediate),
            "advanced" => Some(FitnessLevel::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitnessLevel::Beginner => "Beginner",
            FitnessLevel::Intermediate => "Intermediate",
            FitnessLevel::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Workout,
    Diet,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Workout => "workout",
            PlanKind::Diet => "diet",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "workout" => Some(PlanKind::Workout),
            "diet" => Some(PlanKind::Diet),
            _ => None,
        }
    }
}

/// AI-generated workout or diet content tied to a user and a point in time.
/// At most one active plan per (user, kind).
#[derive(Debug, Clone)]
pub struct PlanRecord {
    pub id: String,
    pub user_id: i64,
    pub kind: PlanKind,
    pub content: String,
    pub generated_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only progress log entry. Never mutated; only the retention
/// sweep deletes old rows.
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub id: i64,
    pub user_id: i64,
    pub weight_kg: Option<f64>,
    pub workout_completed: bool,
    pub exercises_completed: i64,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub notes: Option<String>,
    pub mood_rating: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

impl Default for ProgressEntry {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            weight_kg: None,
            workout_completed: false,
            exercises_completed: 0,
            duration_minutes: 0,
            calories_burned: 0,
            notes: None,
            mood_rating: None,
            recorded_at: Utc::now(),
        }
    }
}

/// Fields for a new progress entry; id and timestamp are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewProgress {
    pub user_id: i64,
    pub weight_kg: Option<f64>,
    pub workout_completed: bool,
    pub exercises_completed: i64,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub notes: Option<String>,
    pub mood_rating: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Workout,
    Progress,
    Hydration,
    General,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Workout => "workout",
            ReminderKind::Progress => "progress",
            ReminderKind::Hydration => "hydration",
            ReminderKind::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "workout" => Some(ReminderKind::Workout),
            "progress" => Some(ReminderKind::Progress),
            "hydration" => Some(ReminderKind::Hydration),
            "general" => Some(ReminderKind::General),
            _ => None,
        }
    }
}

/// User-configured reminder. `days` holds cron-style weekday numbers
/// (0 = Sunday .. 6 = Saturday); `None` means every day.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub kind: ReminderKind,
    pub time_of_day: String,
    pub days: Option<Vec<u8>>,
    pub message: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    FirstWorkout,
    Consistent10,
    Consistent50,
    WeightLoss5kg,
    MonthCommitment,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 5] = [
        AchievementKind::FirstWorkout,
        AchievementKind::Consistent10,
        AchievementKind::Consistent50,
        AchievementKind::WeightLoss5kg,
        AchievementKind::MonthCommitment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::FirstWorkout => "first_workout",
            AchievementKind::Consistent10 => "consistent_10",
            AchievementKind::Consistent50 => "consistent_50",
            AchievementKind::WeightLoss5kg => "weight_loss_5kg",
            AchievementKind::MonthCommitment => "month_commitment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first_workout" => Some(AchievementKind::FirstWorkout),
            "consistent_10" => Some(AchievementKind::Consistent10),
            "consistent_50" => Some(AchievementKind::Consistent50),
            "weight_loss_5kg" => Some(AchievementKind::WeightLoss5kg),
            "month_commitment" => Some(AchievementKind::MonthCommitment),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AchievementKind::FirstWorkout => "First Workout",
            AchievementKind::Consistent10 => "Consistency Builder",
            AchievementKind::Consistent50 => "Fitness Devotee",
            AchievementKind::WeightLoss5kg => "5 kg Down",
            AchievementKind::MonthCommitment => "One Month Strong",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AchievementKind::FirstWorkout => "Completed your first workout",
            AchievementKind::Consistent10 => "Completed 10 workouts",
            AchievementKind::Consistent50 => "Completed 50 workouts",
            AchievementKind::WeightLoss5kg => "Lost 5 kg since your first log",
            AchievementKind::MonthCommitment => "30 days on your fitness journey",
        }
    }

    /// Milestone predicate over aggregate statistics.
    pub fn earned(&self, stats: &UserStats) -> bool {
        match self {
            AchievementKind::FirstWorkout => stats.total_workouts >= 1,
            AchievementKind::Consistent10 => stats.total_workouts >= 10,
            AchievementKind::Consistent50 => stats.total_workouts >= 50,
            AchievementKind::WeightLoss5kg => {
                stats.weight_change.map(|d| d <= -5.0).unwrap_or(false)
            }
            AchievementKind::MonthCommitment => stats.days_registered >= 30,
        }
    }
}

/// A one-time-awarded recognition of a statistical threshold.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub achieved_at: DateTime<Utc>,
}

/// Aggregate statistics derived from the progress log and registration date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub total_workouts: i64,
    pub avg_duration: f64,
    pub total_calories: i64,
    /// Last recorded weight minus first recorded weight; `None` until
    /// at least one entry carries a weight.
    pub weight_change: Option<f64>,
    pub days_registered: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parse_is_case_insensitive_and_normalized() {
        assert_eq!(Gender::from_input("MALE"), Some(Gender::Male));
        assert_eq!(Gender::from_input("  female "), Some(Gender::Female));
        assert_eq!(Gender::from_input("oThEr"), Some(Gender::Other));
        assert_eq!(Gender::from_input("unknown"), None);
        assert_eq!(Gender::Female.as_str(), "Female");
    }

    #[test]
    fn fitness_level_parse() {
        assert_eq!(
            FitnessLevel::from_input("Intermediate"),
            Some(FitnessLevel::Intermediate)
        );
        assert_eq!(FitnessLevel::from_input("pro"), None);
    }

    #[test]
    fn achievement_predicates() {
        let stats = UserStats {
            total_workouts: 10,
            weight_change: Some(-5.0),
            days_registered: 29,
            ..Default::default()
        };
        assert!(AchievementKind::FirstWorkout.earned(&stats));
        assert!(AchievementKind::Consistent10.earned(&stats));
        assert!(!AchievementKind::Consistent50.earned(&stats));
        assert!(AchievementKind::WeightLoss5kg.earned(&stats));
        assert!(!AchievementKind::MonthCommitment.earned(&stats));
    }

    #[test]
    fn weight_loss_requires_recorded_weights() {
        let stats = UserStats {
            weight_change: None,
            ..Default::default()
        };
        assert!(!AchievementKind::WeightLoss5kg.earned(&stats));
    }
}
