use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::types::{FitnessLevel, Gender};

/// Dialogue steps, in strict order. No skipping, no backward navigation;
/// a failed validation keeps the session on the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    Start,
    Age,
    Weight,
    Height,
    Gender,
    FitnessLevel,
    Goals,
    MedicalConditions,
    DietaryRestrictions,
    WorkoutDays,
    WorkoutDuration,
    Complete,
}

/// Partially collected profile fields. Lives only in memory while the
/// dialogue is in progress; never persisted.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub fitness_level: Option<FitnessLevel>,
    pub goals: Option<String>,
    pub medical_conditions: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub workout_days: Option<i64>,
    pub workout_duration: Option<i64>,
}

/// A fully validated draft, produced exactly once when the final step passes.
/// All required fields are present by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDraft {
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

/// Result of feeding one user message into the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Answer accepted; ask the next question. `choices` is non-empty when
    /// the step has a fixed answer set worth rendering as keyboard buttons.
    Ask {
        prompt: String,
        choices: Vec<&'static str>,
    },
    /// Answer rejected; re-prompt and stay on the current step. `choices`
    /// repeats the step's answer set so the buttons survive a typo.
    Retry {
        prompt: String,
        choices: Vec<&'static str>,
    },
    /// All fields validated; the caller persists the profile and closes
    /// the session.
    Finalized(CompletedDraft),
}

impl StepOutcome {
    fn ask(prompt: impl Into<String>) -> Self {
        StepOutcome::Ask {
            prompt: prompt.into(),
            choices: Vec::new(),
        }
    }

    fn ask_with(prompt: impl Into<String>, choices: &[&'static str]) -> Self {
        StepOutcome::Ask {
            prompt: prompt.into(),
            choices: choices.to_vec(),
        }
    }

    fn retry(prompt: impl Into<String>) -> Self {
        StepOutcome::Retry {
            prompt: prompt.into(),
            choices: Vec::new(),
        }
    }

    fn retry_with(prompt: impl Into<String>, choices: &[&'static str]) -> Self {
        StepOutcome::Retry {
            prompt: prompt.into(),
            choices: choices.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OnboardingSession {
    step: OnboardingStep,
    draft: ProfileDraft,
}

impl Default for OnboardingStep {
    fn default() -> Self {
        OnboardingStep::Start
    }
}

/// The literal answer "none" (any case) clears an optional free-text field.
fn normalize_optional(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl OnboardingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn is_in_progress(&self) -> bool {
        self.step != OnboardingStep::Complete
    }

    /// Feed one raw user message into the machine. On success the value is
    /// stored and the session advances; on failure nothing changes except
    /// the corrective prompt going back out. The `WorkoutDuration` step
    /// finalizes: every prior field is guaranteed present at that point.
    pub fn advance(&mut self, input: &str) -> StepOutcome {
        let input = input.trim();
        match self.step {
            OnboardingStep::Start => {
                self.step = OnboardingStep::Age;
                StepOutcome::ask("Let's start by setting up your profile. Please tell me your age:")
            }
            OnboardingStep::Age => match input.parse::<i64>() {
                Ok(age) if (13..=100).contains(&age) => {
                    self.draft.age = Some(age);
                    self.step = OnboardingStep::Weight;
                    StepOutcome::ask("Great! Now please tell me your weight in kg:")
                }
                Ok(_) => StepOutcome::retry("Please enter a valid age (13-100):"),
                Err(_) => StepOutcome::retry("Please enter a valid number for your age:"),
            },
            OnboardingStep::Weight => match input.parse::<f64>() {
                Ok(weight) if (30.0..=300.0).contains(&weight) => {
                    self.draft.weight_kg = Some(weight);
                    self.step = OnboardingStep::Height;
                    StepOutcome::ask("Perfect! Now please tell me your height in cm:")
                }
                Ok(_) => StepOutcome::retry("Please enter a valid weight (30-300 kg):"),
                Err(_) => StepOutcome::retry("Please enter a valid number for your weight:"),
            },
            OnboardingStep::Height => match input.parse::<f64>() {
                Ok(height) if (100.0..=250.0).contains(&height) => {
                    self.draft.height_cm = Some(height);
                    self.step = OnboardingStep::Gender;
                    StepOutcome::ask_with(
                        "Great! What's your gender?",
                        &["Male", "Female", "Other"],
                    )
                }
                Ok(_) => StepOutcome::retry("Please enter a valid height (100-250 cm):"),
                Err(_) => StepOutcome::retry("Please enter a valid number for your height:"),
            },
            OnboardingStep::Gender => match Gender::from_input(input) {
                Some(gender) => {
                    self.draft.gender = Some(gender);
                    self.step = OnboardingStep::FitnessLevel;
                    StepOutcome::ask_with(
                        "What's your current fitness level?",
                        &["Beginner", "Intermediate", "Advanced"],
                    )
                }
                None => StepOutcome::retry_with(
                    "Please select from: Male, Female, or Other",
                    &["Male", "Female", "Other"],
                ),
            },
            OnboardingStep::FitnessLevel => match FitnessLevel::from_input(input) {
                Some(level) => {
                    self.draft.fitness_level = Some(level);
                    self.step = OnboardingStep::Goals;
                    StepOutcome::ask(
                        "What are your fitness goals? (e.g., lose weight, build muscle, improve endurance)",
                    )
                }
                None => StepOutcome::retry_with(
                    "Please select: Beginner, Intermediate, or Advanced",
                    &["Beginner", "Intermediate", "Advanced"],
                ),
            },
            OnboardingStep::Goals => {
                if input.is_empty() {
                    StepOutcome::retry("Please tell me a bit about your fitness goals:")
                } else {
                    self.draft.goals = Some(input.to_string());
                    self.step = OnboardingStep::MedicalConditions;
                    StepOutcome::ask(
                        "Do you have any medical conditions or injuries I should know about? (type 'none' if none)",
                    )
                }
            }
            OnboardingStep::MedicalConditions => {
                self.draft.medical_conditions = normalize_optional(input);
                self.step = OnboardingStep::DietaryRestrictions;
                StepOutcome::ask("Any dietary restrictions or allergies? (type 'none' if none)")
            }
            OnboardingStep::DietaryRestrictions => {
                self.draft.dietary_restrictions = normalize_optional(input);
                self.step = OnboardingStep::WorkoutDays;
                StepOutcome::ask_with(
                    "How many days per week do you want to workout?",
                    &["3", "4", "5", "6", "7"],
                )
            }
            OnboardingStep::WorkoutDays => match input.parse::<i64>() {
                Ok(days) if (1..=7).contains(&days) => {
                    self.draft.workout_days = Some(days);
                    self.step = OnboardingStep::WorkoutDuration;
                    StepOutcome::ask_with(
                        "How long should each workout be (in minutes)?",
                        &["30", "45", "60", "90"],
                    )
                }
                Ok(_) => StepOutcome::retry_with(
                    "Please enter a number between 1 and 7:",
                    &["3", "4", "5", "6", "7"],
                ),
                Err(_) => StepOutcome::retry_with(
                    "Please enter a valid number:",
                    &["3", "4", "5", "6", "7"],
                ),
            },
            OnboardingStep::WorkoutDuration => match input.parse::<i64>() {
                Ok(duration) if (15..=180).contains(&duration) => {
                    self.draft.workout_duration = Some(duration);
                    self.step = OnboardingStep::Complete;
                    StepOutcome::Finalized(self.completed_draft())
                }
                Ok(_) => StepOutcome::retry_with(
                    "Please enter a duration between 15 and 180 minutes:",
                    &["30", "45", "60", "90"],
                ),
                Err(_) => StepOutcome::retry_with(
                    "Please enter a valid number:",
                    &["30", "45", "60", "90"],
                ),
            },
            OnboardingStep::Complete => StepOutcome::retry(
                "Your profile is already set up. Use /start to open the main menu.".to_string(),
            ),
        }
    }

    /// Only reachable from the duration step, where every field has passed
    /// its validator. The unwraps are guarded by the state order.
    fn completed_draft(&self) -> CompletedDraft {
        let d = &self.draft;
        CompletedDraft {
            age: d.age.expect("age validated"),
            weight_kg: d.weight_kg.expect("weight validated"),
            height_cm: d.height_cm.expect("height validated"),
            gender: d.gender.expect("gender validated"),
            fitness_level: d.fitness_level.expect("fitness level validated"),
            goals: d.goals.clone().expect("goals validated"),
            medical_conditions: d.medical_conditions.clone(),
            dietary_restrictions: d.dietary_restrictions.clone(),
            workout_days: d.workout_days.expect("workout days validated"),
            workout_duration: d.workout_duration.expect("workout duration validated"),
        }
    }

    #[cfg(test)]
    fn draft(&self) -> &ProfileDraft {
        &self.draft
    }
}

/// In-process session store, one session per user while a dialogue is open.
/// Deliberately not durable: a restart drops in-flight onboarding and the
/// user starts over with /start.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, OnboardingSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh session for the user, replacing any stale one, and
    /// return the first prompt.
    pub async fn begin(&self, user_id: i64) -> StepOutcome {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user_id).or_insert_with(OnboardingSession::new);
        *session = OnboardingSession::new();
        session.advance("")
    }

    /// Whether an onboarding dialogue is currently open for the user.
    pub async fn is_open(&self, user_id: i64) -> bool {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&user_id)
            .map(|s| s.is_in_progress())
            .unwrap_or(false)
    }

    /// Route one message into the user's open session. Returns `None` when
    /// no session is open (the caller falls through to command/Q&A handling).
    pub async fn advance(&self, user_id: i64, input: &str) -> Option<StepOutcome> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&user_id)?;
        if !session.is_in_progress() {
            return None;
        }
        Some(session.advance(input))
    }

    pub async fn close(&self, user_id: i64) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at_age() -> OnboardingSession {
        let mut s = OnboardingSession::new();
        s.advance("");
        assert_eq!(s.step(), OnboardingStep::Age);
        s
    }

    fn walk_to_duration(s: &mut OnboardingSession) {
        s.advance("");
        s.advance("30");
        s.advance("70");
        s.advance("175");
        s.advance("male");
        s.advance("intermediate");
        s.advance("build muscle");
        s.advance("none");
        s.advance("vegetarian");
        s.advance("4");
        assert_eq!(s.step(), OnboardingStep::WorkoutDuration);
    }

    #[test]
    fn start_asks_for_age() {
        let mut s = OnboardingSession::new();
        match s.advance("ignored") {
            StepOutcome::Ask { prompt, choices } => {
                assert!(prompt.contains("age"));
                assert!(choices.is_empty());
            }
            other => panic!("expected Ask, got {:?}", other),
        }
    }

    #[test]
    fn age_accepts_full_valid_range() {
        for age in [13, 14, 50, 99, 100] {
            let mut s = session_at_age();
            let outcome = s.advance(&age.to_string());
            assert!(matches!(outcome, StepOutcome::Ask { .. }), "age {}", age);
            assert_eq!(s.step(), OnboardingStep::Weight);
            assert_eq!(s.draft().age, Some(age));
        }
    }

    #[test]
    fn age_rejects_out_of_range_and_garbage() {
        for bad in ["12", "101", "-5", "0", "abc", "", "12.5"] {
            let mut s = session_at_age();
            let outcome = s.advance(bad);
            assert!(matches!(outcome, StepOutcome::Retry { .. }), "input {:?}", bad);
            assert_eq!(s.step(), OnboardingStep::Age);
            assert_eq!(s.draft().age, None);
        }
    }

    #[test]
    fn weight_and_height_boundaries() {
        let mut s = session_at_age();
        s.advance("25");
        assert!(matches!(s.advance("29.9"), StepOutcome::Retry { .. }));
        assert!(matches!(s.advance("300.1"), StepOutcome::Retry { .. }));
        assert!(matches!(s.advance("30"), StepOutcome::Ask { .. }));
        assert!(matches!(s.advance("99"), StepOutcome::Retry { .. }));
        assert!(matches!(s.advance("250.5"), StepOutcome::Retry { .. }));
        assert!(matches!(s.advance("181.5"), StepOutcome::Ask { .. }));
        assert_eq!(s.step(), OnboardingStep::Gender);
    }

    #[test]
    fn gender_is_normalized_and_offers_choices() {
        let mut s = session_at_age();
        s.advance("25");
        s.advance("80");
        match s.advance("170") {
            StepOutcome::Ask { choices, .. } => {
                assert_eq!(choices, vec!["Male", "Female", "Other"]);
            }
            other => panic!("expected Ask, got {:?}", other),
        }
        s.advance("FEMALE");
        assert_eq!(s.draft().gender, Some(Gender::Female));
    }

    #[test]
    fn rejected_answer_keeps_the_choice_buttons() {
        let mut s = session_at_age();
        s.advance("25");
        s.advance("80");
        s.advance("170");
        match s.advance("yes") {
            StepOutcome::Retry { choices, .. } => {
                assert_eq!(choices, vec!["Male", "Female", "Other"]);
            }
            other => panic!("expected Retry, got {:?}", other),
        }
        s.advance("male");
        match s.advance("extreme") {
            StepOutcome::Retry { choices, .. } => {
                assert_eq!(choices, vec!["Beginner", "Intermediate", "Advanced"]);
            }
            other => panic!("expected Retry, got {:?}", other),
        }
    }

    #[test]
    fn rejected_answer_preserves_previous_fields() {
        let mut s = session_at_age();
        s.advance("30");
        s.advance("70");
        s.advance("175");
        s.advance("male");

        // Bogus fitness level: nothing already collected may change.
        let before = s.draft().clone();
        let outcome = s.advance("superhuman");
        assert!(matches!(outcome, StepOutcome::Retry { .. }));
        assert_eq!(s.step(), OnboardingStep::FitnessLevel);
        assert_eq!(s.draft().age, before.age);
        assert_eq!(s.draft().weight_kg, before.weight_kg);
        assert_eq!(s.draft().height_cm, before.height_cm);
        assert_eq!(s.draft().gender, before.gender);
    }

    #[test]
    fn none_clears_optional_fields() {
        let mut s = session_at_age();
        s.advance("30");
        s.advance("70");
        s.advance("175");
        s.advance("male");
        s.advance("beginner");
        s.advance("lose weight");
        s.advance("NONE");
        s.advance("None");
        assert_eq!(s.draft().medical_conditions, None);
        assert_eq!(s.draft().dietary_restrictions, None);
    }

    #[test]
    fn optional_fields_keep_real_answers() {
        let mut s = session_at_age();
        s.advance("30");
        s.advance("70");
        s.advance("175");
        s.advance("male");
        s.advance("beginner");
        s.advance("lose weight");
        s.advance("asthma");
        s.advance("no dairy");
        assert_eq!(s.draft().medical_conditions.as_deref(), Some("asthma"));
        assert_eq!(s.draft().dietary_restrictions.as_deref(), Some("no dairy"));
    }

    #[test]
    fn empty_goals_rejected() {
        let mut s = session_at_age();
        s.advance("30");
        s.advance("70");
        s.advance("175");
        s.advance("male");
        s.advance("beginner");
        assert!(matches!(s.advance("   "), StepOutcome::Retry { .. }));
        assert_eq!(s.step(), OnboardingStep::Goals);
    }

    #[test]
    fn duration_step_finalizes_with_all_fields() {
        let mut s = OnboardingSession::new();
        walk_to_duration(&mut s);
        match s.advance("60") {
            StepOutcome::Finalized(draft) => {
                assert_eq!(draft.age, 30);
                assert_eq!(draft.weight_kg, 70.0);
                assert_eq!(draft.height_cm, 175.0);
                assert_eq!(draft.gender, Gender::Male);
                assert_eq!(draft.fitness_level, FitnessLevel::Intermediate);
                assert_eq!(draft.goals, "build muscle");
                assert_eq!(draft.medical_conditions, None);
                assert_eq!(draft.dietary_restrictions.as_deref(), Some("vegetarian"));
                assert_eq!(draft.workout_days, 4);
                assert_eq!(draft.workout_duration, 60);
            }
            other => panic!("expected Finalized, got {:?}", other),
        }
        assert_eq!(s.step(), OnboardingStep::Complete);
    }

    #[test]
    fn no_finalization_before_duration_passes() {
        let mut s = OnboardingSession::new();
        walk_to_duration(&mut s);
        assert!(matches!(s.advance("10"), StepOutcome::Retry { .. }));
        assert!(matches!(s.advance("181"), StepOutcome::Retry { .. }));
        assert_eq!(s.step(), OnboardingStep::WorkoutDuration);
        assert!(matches!(s.advance("15"), StepOutcome::Finalized(_)));
    }

    #[tokio::test]
    async fn session_store_lifecycle() {
        let store = SessionStore::new();
        assert!(!store.is_open(7).await);
        assert!(store.advance(7, "30").await.is_none());

        let first = store.begin(7).await;
        assert!(matches!(first, StepOutcome::Ask { .. }));
        assert!(store.is_open(7).await);

        let outcome = store.advance(7, "30").await.unwrap();
        assert!(matches!(outcome, StepOutcome::Ask { .. }));

        store.close(7).await;
        assert!(!store.is_open(7).await);
    }

    #[tokio::test]
    async fn begin_replaces_stale_session() {
        let store = SessionStore::new();
        store.begin(7).await;
        store.advance(7, "30").await.unwrap();
        // Re-running /start restarts the dialogue from the top.
        store.begin(7).await;
        let outcome = store.advance(7, "44").await.unwrap();
        // 44 is a valid age, so the restarted session moves to weight.
        assert!(matches!(outcome, StepOutcome::Ask { ref prompt, .. } if prompt.contains("weight")));
    }
}
