use std::sync::Arc;

use tracing::error;

use crate::providers::FailureCategory;
use crate::traits::CompletionProvider;
use crate::types::{Gender, Profile, ProgressEntry};

/// Fixed user-facing fallbacks, one per failure category. The coach never
/// lets a provider error cross its boundary — callers always get text they
/// can put in front of the user.
pub const FALLBACK_TRANSPORT: &str =
    "Sorry, I'm experiencing technical difficulties. Please try again later.";
pub const FALLBACK_SHAPE: &str = "Sorry, I couldn't process the response. Please try again.";
pub const FALLBACK_OTHER: &str = "An unexpected error occurred. Please try again later.";

/// Harris-Benedict basal metabolic rate.
pub fn basal_metabolic_rate(profile: &Profile) -> f64 {
    match profile.gender {
        Gender::Male => {
            88.362 + 13.397 * profile.weight_kg + 4.799 * profile.height_cm
                - 5.677 * profile.age as f64
        }
        Gender::Female | Gender::Other => {
            447.593 + 9.247 * profile.weight_kg + 3.098 * profile.height_cm
                - 4.330 * profile.age as f64
        }
    }
}

/// Activity multiplier from weekly workout frequency.
pub fn activity_multiplier(workout_days: i64) -> f64 {
    if workout_days <= 2 {
        1.2
    } else if workout_days <= 4 {
        1.375
    } else {
        1.55
    }
}

/// Estimated daily caloric need, floored to a whole number.
pub fn daily_calories(profile: &Profile) -> i64 {
    (basal_metabolic_rate(profile) * activity_multiplier(profile.workout_days)).floor() as i64
}

/// Content-generation facade: builds a kind-specific instructional preamble,
/// interpolates profile data into the request, and delegates to the
/// completion provider with a per-kind length budget.
pub struct Coach {
    provider: Arc<dyn CompletionProvider>,
}

impl Coach {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    async fn request(&self, system: &str, user: &str, max_tokens: u32, temperature: f32) -> String {
        match self
            .provider
            .complete(system, user, max_tokens, temperature)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Completion request failed: {}", e);
                match e.category() {
                    FailureCategory::Transport => FALLBACK_TRANSPORT.to_string(),
                    FailureCategory::Shape => FALLBACK_SHAPE.to_string(),
                    FailureCategory::Other => FALLBACK_OTHER.to_string(),
                }
            }
        }
    }

    pub async fn workout_plan(&self, profile: &Profile) -> String {
        let system = "You are a certified personal trainer and fitness expert. \
            Create detailed, safe, and effective workout plans based on user profiles. \
            Always include warm-up and cool-down, proper form instructions, progressive \
            difficulty, rest periods, and alternative exercises for different fitness \
            levels. Format your response clearly for mobile reading.";

        let user = format!(
            "Create a comprehensive weekly workout plan for:\n\n\
             User Profile:\n\
             - Age: {} years\n\
             - Weight: {} kg\n\
             - Height: {} cm\n\
             - Gender: {}\n\
             - Fitness Level: {}\n\
             - Goals: {}\n\
             - Medical Conditions: {}\n\
             - Available Days: {} days per week\n\
             - Workout Duration: {} minutes per session\n\n\
             Please provide:\n\
             1. Weekly schedule overview\n\
             2. Detailed daily workouts with exercises, sets, reps\n\
             3. Progression recommendations\n\
             4. Safety tips specific to their profile\n\n\
             Keep the response under 1200 words and format for easy mobile reading.",
            profile.age,
            profile.weight_kg,
            profile.height_cm,
            profile.gender.as_str(),
            profile.fitness_level.as_str(),
            profile.goals,
            profile.medical_conditions.as_deref().unwrap_or("None"),
            profile.workout_days,
            profile.workout_duration,
        );

        self.request(system, &user, 1500, 0.7).await
    }

    pub async fn diet_plan(&self, profile: &Profile) -> String {
        let system = "You are a qualified nutritionist. Create balanced, healthy meal \
            plans based on user profiles. Always include caloric requirements, macro \
            and micronutrient balance, meal timing suggestions, hydration \
            recommendations, and practical preparation tips. Consider dietary \
            restrictions and fitness goals.";

        let calories = daily_calories(profile);

        let user = format!(
            "Create a comprehensive daily meal plan for:\n\n\
             User Profile:\n\
             - Age: {} years\n\
             - Weight: {} kg\n\
             - Height: {} cm\n\
             - Gender: {}\n\
             - Fitness Goals: {}\n\
             - Dietary Restrictions: {}\n\
             - Estimated Daily Calories Needed: {}\n\n\
             Please provide:\n\
             1. Daily meal structure (breakfast, lunch, dinner, snacks)\n\
             2. Sample meals with approximate calories\n\
             3. Macronutrient breakdown\n\
             4. Pre/post workout nutrition tips\n\
             5. Hydration guidelines\n\
             6. Weekly meal prep suggestions\n\n\
             Keep response under 1200 words and mobile-friendly format.",
            profile.age,
            profile.weight_kg,
            profile.height_cm,
            profile.gender.as_str(),
            profile.goals,
            profile.dietary_restrictions.as_deref().unwrap_or("None"),
            calories,
        );

        self.request(system, &user, 1500, 0.7).await
    }

    pub async fn explain_exercise(&self, exercise: &str, level: &str) -> String {
        let system = "You are a fitness instructor. Provide clear, safe exercise \
            instructions with proper form cues and common mistakes to avoid.";

        let user = format!(
            "Explain how to perform the \"{}\" exercise for a {} level person.\n\n\
             Include:\n\
             1. Step-by-step instructions\n\
             2. Proper form and breathing\n\
             3. Common mistakes to avoid\n\
             4. Modifications for different levels\n\
             5. Muscles targeted\n\n\
             Keep it concise but comprehensive (under 400 words).",
            exercise, level,
        );

        self.request(system, &user, 500, 0.7).await
    }

    pub async fn analyze_progress(&self, entries: &[ProgressEntry], profile: &Profile) -> String {
        let system = "You are a fitness coach analyzing client progress. Provide \
            encouraging, constructive feedback with specific recommendations.";

        let mut summary = String::new();
        for entry in entries {
            summary.push_str(&format!(
                "- {}: weight {}, workout completed: {}, duration {} min, {} kcal\n",
                entry.recorded_at.format("%Y-%m-%d"),
                entry
                    .weight_kg
                    .map(|w| format!("{} kg", w))
                    .unwrap_or_else(|| "n/a".to_string()),
                entry.workout_completed,
                entry.duration_minutes,
                entry.calories_burned,
            ));
        }

        let user = format!(
            "Analyze the fitness progress for a user with goals: \"{}\"\n\n\
             Recent Progress Data:\n{}\n\
             User Profile:\n\
             - Fitness Level: {}\n\
             - Target Workout Days: {}/week\n\n\
             Please provide:\n\
             1. Progress assessment\n\
             2. Areas of improvement\n\
             3. Specific recommendations\n\
             4. Motivational feedback\n\n\
             Keep response encouraging and actionable (under 600 words).",
            profile.goals,
            summary,
            profile.fitness_level.as_str(),
            profile.workout_days,
        );

        self.request(system, &user, 800, 0.7).await
    }

    pub async fn motivation(&self, profile: &Profile, context: &str) -> String {
        let system = "You are an enthusiastic fitness coach. Create short, personalized \
            motivational messages that inspire action.";

        let user = format!(
            "Create a motivational message for a person with fitness goals: \"{}\"\n\n\
             Context: {}\n\
             Fitness Level: {}\n\n\
             Make it personal, encouraging, and action-oriented.\n\
             Keep it under 100 words.",
            profile.goals,
            context,
            profile.fitness_level.as_str(),
        );

        self.request(system, &user, 150, 0.8).await
    }

    pub async fn answer_question(&self, question: &str, profile: &Profile) -> String {
        let system = "You are a knowledgeable fitness expert. Provide accurate, helpful \
            answers to fitness questions. Always prioritize safety and suggest \
            consulting professionals for medical concerns.";

        let user = format!(
            "User question: \"{}\"\n\n\
             User context:\n\
             - Fitness Level: {}\n\
             - Goals: {}\n\
             - Age: {}\n\n\
             Provide a helpful, accurate answer. If it's medical-related, recommend \
             consulting a healthcare professional.\n\
             Keep response under 500 words.",
            question,
            profile.fitness_level.as_str(),
            profile.goals,
            profile.age,
        );

        self.request(system, &user, 600, 0.7).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::types::FitnessLevel;
    use async_trait::async_trait;
    use chrono::Utc;

    fn test_profile(gender: Gender) -> Profile {
        Profile {
            user_id: 1,
            username: None,
            first_name: "Alex".to_string(),
            age: 30,
            weight_kg: 70.0,
            height_cm: 175.0,
            gender,
            fitness_level: FitnessLevel::Intermediate,
            goals: "build muscle".to_string(),
            medical_conditions: None,
            dietary_restrictions: None,
            workout_days: 4,
            workout_duration: 60,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct StaticProvider(&'static str);

    #[async_trait]
    impl CompletionProvider for StaticProvider {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingProvider(fn() -> ProviderError);

    #[async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ProviderError> {
            Err((self.0)())
        }
    }

    #[test]
    fn bmr_matches_harris_benedict_male_example() {
        // 30y / 70kg / 175cm male:
        // 88.362 + 13.397*70 + 4.799*175 - 5.677*30 = 1695.667
        let profile = test_profile(Gender::Male);
        let bmr = basal_metabolic_rate(&profile);
        assert!((bmr - 1695.667).abs() < 0.1, "bmr = {}", bmr);
    }

    #[test]
    fn bmr_female_formula() {
        let profile = test_profile(Gender::Female);
        let expected = 447.593 + 9.247 * 70.0 + 3.098 * 175.0 - 4.330 * 30.0;
        assert!((basal_metabolic_rate(&profile) - expected).abs() < 1e-9);
        // Other uses the same coefficients as female.
        let other = test_profile(Gender::Other);
        assert!((basal_metabolic_rate(&other) - expected).abs() < 1e-9);
    }

    #[test]
    fn activity_multiplier_tiers() {
        assert_eq!(activity_multiplier(1), 1.2);
        assert_eq!(activity_multiplier(2), 1.2);
        assert_eq!(activity_multiplier(3), 1.375);
        assert_eq!(activity_multiplier(4), 1.375);
        assert_eq!(activity_multiplier(5), 1.55);
        assert_eq!(activity_multiplier(7), 1.55);
    }

    #[test]
    fn daily_calories_is_floored_product() {
        let profile = test_profile(Gender::Male);
        let expected =
            (basal_metabolic_rate(&profile) * activity_multiplier(profile.workout_days)).floor()
                as i64;
        assert_eq!(daily_calories(&profile), expected);
        // 1695.667 * 1.375 = 2331.54..., floored.
        assert_eq!(daily_calories(&profile), 2331);
    }

    #[tokio::test]
    async fn success_returns_provider_text_verbatim() {
        let coach = Coach::new(Arc::new(StaticProvider("Day 1: squats")));
        let plan = coach.workout_plan(&test_profile(Gender::Male)).await;
        assert_eq!(plan, "Day 1: squats");
    }

    #[tokio::test]
    async fn transport_failure_maps_to_transport_fallback() {
        let coach = Coach::new(Arc::new(FailingProvider(|| {
            ProviderError::from_status(503, "down")
        })));
        let text = coach.motivation(&test_profile(Gender::Male), "daily").await;
        assert_eq!(text, FALLBACK_TRANSPORT);
    }

    #[tokio::test]
    async fn shape_failure_maps_to_shape_fallback() {
        let coach = Coach::new(Arc::new(FailingProvider(|| {
            ProviderError::malformed("no choices")
        })));
        let text = coach.diet_plan(&test_profile(Gender::Female)).await;
        assert_eq!(text, FALLBACK_SHAPE);
    }

    #[tokio::test]
    async fn other_failure_maps_to_generic_fallback() {
        let coach = Coach::new(Arc::new(FailingProvider(|| {
            ProviderError::from_status(401, "bad key")
        })));
        let text = coach
            .answer_question("how much protein?", &test_profile(Gender::Male))
            .await;
        assert_eq!(text, FALLBACK_OTHER);
    }

    #[tokio::test]
    async fn diet_prompt_embeds_daily_calories() {
        struct CapturingProvider(std::sync::Mutex<Vec<String>>);

        #[async_trait]
        impl CompletionProvider for CapturingProvider {
            async fn complete(
                &self,
                _system: &str,
                user: &str,
                _max_tokens: u32,
                _temperature: f32,
            ) -> Result<String, ProviderError> {
                self.0.lock().unwrap().push(user.to_string());
                Ok("ok".to_string())
            }
        }

        let provider = Arc::new(CapturingProvider(std::sync::Mutex::new(Vec::new())));
        let coach = Coach::new(provider.clone());
        let profile = test_profile(Gender::Male);
        coach.diet_plan(&profile).await;

        let prompts = provider.0.lock().unwrap();
        assert!(prompts[0].contains("Estimated Daily Calories Needed: 2331"));
    }
}
