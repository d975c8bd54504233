use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::update_listeners::webhooks;
use tracing::{info, warn};

use super::formatting::{
    build_help_text, format_achievements, format_profile, format_progress, html_escape,
    markdown_to_telegram_html, split_message, TELEGRAM_MAX_MESSAGE_LEN,
};
use crate::achievements::AchievementEvaluator;
use crate::coach::Coach;
use crate::config::DeployMode;
use crate::onboarding::{CompletedDraft, SessionStore, StepOutcome};
use crate::store::{NewProfile, NewReminder, SqliteStore};
use crate::traits::Messenger;
use crate::types::{NewProgress, PlanKind, ReminderKind};

/// Plain outbound transport over the bot API. Long texts are split at the
/// Telegram message limit; each chunk is a separate message.
pub struct BotMessenger {
    bot: Bot,
}

impl BotMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for BotMessenger {
    async fn send(&self, user_id: i64, text: &str, html: bool) -> anyhow::Result<()> {
        for chunk in split_message(text, TELEGRAM_MAX_MESSAGE_LEN) {
            let mut request = self.bot.send_message(ChatId(user_id), chunk);
            if html {
                request = request.parse_mode(ParseMode::Html);
            }
            request.await?;
        }
        Ok(())
    }
}

/// The bot's interactive surface: commands, free-text coaching Q&A, the
/// onboarding dialogue, and inline-keyboard menus.
pub struct TelegramChannel {
    bot: Bot,
    store: Arc<SqliteStore>,
    coach: Arc<Coach>,
    sessions: Arc<SessionStore>,
    achievements: Arc<AchievementEvaluator>,
}

impl TelegramChannel {
    pub fn new(
        bot: Bot,
        store: Arc<SqliteStore>,
        coach: Arc<Coach>,
        sessions: Arc<SessionStore>,
        achievements: Arc<AchievementEvaluator>,
    ) -> Self {
        Self {
            bot,
            store,
            coach,
            sessions,
            achievements,
        }
    }

    pub async fn start(self: Arc<Self>, mode: DeployMode) -> anyhow::Result<()> {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let channel = Arc::clone(&self);
                move |msg: Message, bot: Bot| {
                    let channel = Arc::clone(&channel);
                    async move {
                        channel.handle_message(msg, bot).await;
                        respond(())
                    }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let channel = Arc::clone(&self);
                move |q: CallbackQuery, bot: Bot| {
                    let channel = Arc::clone(&channel);
                    async move {
                        channel.handle_callback(q, bot).await;
                        respond(())
                    }
                }
            }));

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build();

        match mode {
            DeployMode::Polling => {
                info!("Starting Telegram channel (long polling)");
                dispatcher.dispatch().await;
            }
            DeployMode::Webhook { url, port } => {
                info!(%url, port, "Starting Telegram channel (webhook)");
                let addr = ([0, 0, 0, 0], port).into();
                let listener = webhooks::axum(
                    self.bot.clone(),
                    webhooks::Options::new(addr, url.parse()?),
                )
                .await?;
                dispatcher
                    .dispatch_with_listener(
                        listener,
                        LoggingErrorHandler::with_custom_text("Webhook listener error"),
                    )
                    .await;
            }
        }
        Ok(())
    }

    async fn handle_message(&self, msg: Message, bot: Bot) {
        let chat_id = msg.chat.id;
        let user_id = chat_id.0;
        let text = match msg.text() {
            Some(t) => t.trim().to_string(),
            None => {
                let _ = bot
                    .send_message(chat_id, "I can only work with text messages for now.")
                    .await;
                return;
            }
        };

        let (first_name, username) = sender_identity(&msg);

        let result = if let Some(cmd) = text.strip_prefix('/') {
            self.handle_command(cmd, user_id, &first_name, &bot).await
        } else if self.sessions.is_open(user_id).await {
            self.handle_onboarding_input(user_id, &first_name, &username, &text, &bot)
                .await
        } else {
            self.handle_question(user_id, &text, &bot).await
        };

        if let Err(e) = result {
            warn!(user_id, error = %e, "Message handling failed");
            let _ = bot
                .send_message(chat_id, "Something went wrong on my end. Please try again.")
                .await;
        }
    }

    async fn handle_command(
        &self,
        cmd: &str,
        user_id: i64,
        first_name: &str,
        bot: &Bot,
    ) -> anyhow::Result<()> {
        let (command, args) = match cmd.split_once(char::is_whitespace) {
            Some((c, rest)) => (c, rest.trim()),
            None => (cmd, ""),
        };
        // Strip the "@botname" suffix used in groups.
        let command = command.split('@').next().unwrap_or(command).to_lowercase();

        match command.as_str() {
            "start" => self.cmd_start(user_id, first_name, bot).await,
            "help" => {
                self.send_html(bot, user_id, &build_help_text()).await
            }
            "profile" => self.cmd_profile(user_id, bot).await,
            "workout" => self.cmd_plan(user_id, PlanKind::Workout, bot).await,
            "diet" => self.cmd_plan(user_id, PlanKind::Diet, bot).await,
            "progress" => self.cmd_progress(user_id, bot).await,
            "log" => self.cmd_log(user_id, args, bot).await,
            "ask" => {
                if args.is_empty() {
                    bot.send_message(
                        ChatId(user_id),
                        "What would you like to know? e.g. /ask how much protein do I need?",
                    )
                    .await?;
                    Ok(())
                } else {
                    self.handle_question(user_id, args, bot).await
                }
            }
            "explain" => self.cmd_explain(user_id, args, bot).await,
            "remind" => self.cmd_remind(user_id, args, bot).await,
            "achievements" => self.cmd_achievements(user_id, bot).await,
            _ => {
                bot.send_message(
                    ChatId(user_id),
                    "I don't know that command. Try /help for the full list.",
                )
                .await?;
                Ok(())
            }
        }
    }

    async fn cmd_start(&self, user_id: i64, first_name: &str, bot: &Bot) -> anyhow::Result<()> {
        if let Some(profile) = self.store.get_profile(user_id).await? {
            let text = format!(
                "Welcome back, {}! 💪 What would you like to do?",
                html_escape(&profile.first_name)
            );
            bot.send_message(ChatId(user_id), text)
                .parse_mode(ParseMode::Html)
                .reply_markup(main_menu_keyboard())
                .await?;
            return Ok(());
        }

        let greeting = format!(
            "Hi {}! I'm your personal fitness coach. 🏋️\n\
             I'll build workout and meal plans around you, track your progress, \
             and keep you motivated.",
            first_name
        );
        bot.send_message(ChatId(user_id), greeting).await?;

        let outcome = self.sessions.begin(user_id).await;
        self.deliver_outcome(user_id, first_name, &None, outcome, bot)
            .await
    }

    async fn handle_onboarding_input(
        &self,
        user_id: i64,
        first_name: &str,
        username: &Option<String>,
        text: &str,
        bot: &Bot,
    ) -> anyhow::Result<()> {
        match self.sessions.advance(user_id, text).await {
            Some(outcome) => {
                self.deliver_outcome(user_id, first_name, username, outcome, bot)
                    .await
            }
            None => {
                bot.send_message(ChatId(user_id), "Use /start to set up your profile first.")
                    .await?;
                Ok(())
            }
        }
    }

    async fn deliver_outcome(
        &self,
        user_id: i64,
        first_name: &str,
        username: &Option<String>,
        outcome: StepOutcome,
        bot: &Bot,
    ) -> anyhow::Result<()> {
        match outcome {
            StepOutcome::Ask { prompt, choices } => {
                let mut request = bot.send_message(ChatId(user_id), prompt);
                if !choices.is_empty() {
                    request = request.reply_markup(choice_keyboard(&choices));
                }
                request.await?;
            }
            StepOutcome::Retry { prompt, choices } => {
                let mut request = bot.send_message(ChatId(user_id), prompt);
                if !choices.is_empty() {
                    request = request.reply_markup(choice_keyboard(&choices));
                }
                request.await?;
            }
            StepOutcome::Finalized(draft) => {
                self.finalize_onboarding(user_id, first_name, username, draft, bot)
                    .await?;
            }
        }
        Ok(())
    }

    async fn finalize_onboarding(
        &self,
        user_id: i64,
        first_name: &str,
        username: &Option<String>,
        draft: CompletedDraft,
        bot: &Bot,
    ) -> anyhow::Result<()> {
        let profile = NewProfile {
            user_id,
            username: username.clone(),
            first_name: first_name.to_string(),
            age: draft.age,
            weight_kg: draft.weight_kg,
            height_cm: draft.height_cm,
            gender: draft.gender,
            fitness_level: draft.fitness_level,
            goals: draft.goals,
            medical_conditions: draft.medical_conditions,
            dietary_restrictions: draft.dietary_restrictions,
            workout_days: draft.workout_days,
            workout_duration: draft.workout_duration,
        };
        self.store.save_profile(&profile).await?;
        self.sessions.close(user_id).await;
        info!(user_id, "Onboarding completed");

        bot.send_message(
            ChatId(user_id),
            "🎉 Your profile is ready! Here's what I can do for you:",
        )
        .reply_markup(main_menu_keyboard())
        .await?;
        Ok(())
    }

    async fn cmd_profile(&self, user_id: i64, bot: &Bot) -> anyhow::Result<()> {
        match self.store.get_profile(user_id).await? {
            Some(profile) => self.send_html(bot, user_id, &format_profile(&profile)).await,
            None => self.prompt_onboarding(user_id, bot).await,
        }
    }

    async fn cmd_plan(&self, user_id: i64, kind: PlanKind, bot: &Bot) -> anyhow::Result<()> {
        let profile = match self.store.get_profile(user_id).await? {
            Some(p) => p,
            None => return self.prompt_onboarding(user_id, bot).await,
        };

        let (wait_text, header) = match kind {
            PlanKind::Workout => (
                "💪 Putting together your workout plan, give me a moment...",
                "🏋️ <b>Your Workout Plan</b>",
            ),
            PlanKind::Diet => (
                "🥗 Putting together your meal plan, give me a moment...",
                "🥗 <b>Your Meal Plan</b>",
            ),
        };
        bot.send_message(ChatId(user_id), wait_text).await?;

        let content = match kind {
            PlanKind::Workout => self.coach.workout_plan(&profile).await,
            PlanKind::Diet => self.coach.diet_plan(&profile).await,
        };
        self.store.save_plan(user_id, kind, &content).await?;

        let html = format!("{}\n\n{}", header, markdown_to_telegram_html(&content));
        self.send_html(bot, user_id, &html).await
    }

    async fn cmd_progress(&self, user_id: i64, bot: &Bot) -> anyhow::Result<()> {
        let profile = match self.store.get_profile(user_id).await? {
            Some(p) => p,
            None => return self.prompt_onboarding(user_id, bot).await,
        };

        let stats = self.store.user_stats(user_id).await?;
        let entries = self.store.recent_progress(user_id, 5).await?;

        let mut text = format_progress(&entries);
        text.push_str(&format!(
            "\n📈 <b>Overall</b>\n• Workouts: {}\n• Avg duration: {:.0} min\n• Calories burned: {}\n",
            stats.total_workouts, stats.avg_duration, stats.total_calories
        ));
        if let Some(change) = stats.weight_change {
            text.push_str(&format!("• Weight change: {:+.1} kg\n", change));
        }
        self.send_html(bot, user_id, &text).await?;

        // Enough history for the coach to say something useful.
        if entries.len() >= 3 {
            let analysis = self.coach.analyze_progress(&entries, &profile).await;
            self.send_html(bot, user_id, &markdown_to_telegram_html(&analysis))
                .await?;
        }
        Ok(())
    }

    async fn cmd_log(&self, user_id: i64, args: &str, bot: &Bot) -> anyhow::Result<()> {
        if self.store.get_profile(user_id).await?.is_none() {
            return self.prompt_onboarding(user_id, bot).await;
        }

        let entry = match parse_log_args(user_id, args) {
            Some(entry) => entry,
            None => {
                bot.send_message(
                    ChatId(user_id),
                    "Tell me what to log, e.g.:\n\
                     /log 45min 300cal — completed workout\n\
                     /log 81.5kg — weigh-in\n\
                     /log 30min mood 4 felt strong today",
                )
                .await?;
                return Ok(());
            }
        };

        self.store.log_progress(&entry).await?;

        let mut parts = vec!["✅ Logged!".to_string()];
        if entry.workout_completed {
            parts.push(format!(
                "Workout: {} min, {} kcal",
                entry.duration_minutes, entry.calories_burned
            ));
        }
        if let Some(w) = entry.weight_kg {
            parts.push(format!("Weight: {} kg", w));
        }
        bot.send_message(ChatId(user_id), parts.join("\n")).await?;

        let newly_awarded = self.achievements.check_and_award(user_id).await?;
        if !newly_awarded.is_empty() {
            info!(user_id, count = newly_awarded.len(), "Log triggered achievements");
        }
        Ok(())
    }

    async fn cmd_explain(&self, user_id: i64, args: &str, bot: &Bot) -> anyhow::Result<()> {
        if args.is_empty() {
            bot.send_message(
                ChatId(user_id),
                "Which exercise? e.g. /explain romanian deadlift",
            )
            .await?;
            return Ok(());
        }
        let level = self
            .store
            .get_profile(user_id)
            .await?
            .map(|p| p.fitness_level.as_str())
            .unwrap_or("beginner");

        let answer = self.coach.explain_exercise(args, level).await;
        self.send_html(bot, user_id, &markdown_to_telegram_html(&answer))
            .await
    }

    async fn cmd_remind(&self, user_id: i64, args: &str, bot: &Bot) -> anyhow::Result<()> {
        if self.store.get_profile(user_id).await?.is_none() {
            return self.prompt_onboarding(user_id, bot).await;
        }

        if args.is_empty() {
            let reminders = self.store.reminders_for_user(user_id).await?;
            let mut text = String::from("⏰ <b>Your reminders</b>\n");
            if reminders.is_empty() {
                text.push_str("\nNone yet.\n");
            } else {
                for r in &reminders {
                    text.push_str(&format!(
                        "\n#{} — {} at {}{}\n",
                        r.id,
                        r.kind.as_str(),
                        r.time_of_day,
                        r.message
                            .as_deref()
                            .map(|m| format!(" ({})", html_escape(m)))
                            .unwrap_or_default(),
                    ));
                }
            }
            text.push_str(
                "\nAdd one: <code>/remind workout 08:00 mon,wed,fri</code>\n\
                 Remove: <code>/remind off 3</code>",
            );
            return self.send_html(bot, user_id, &text).await;
        }

        if let Some(rest) = args.strip_prefix("off") {
            let reply = match rest.trim().parse::<i64>() {
                Ok(id) if self.store.deactivate_reminder(user_id, id).await? => {
                    format!("Reminder #{} removed.", id)
                }
                Ok(id) => format!("No active reminder #{} found.", id),
                Err(_) => "Which one? e.g. /remind off 3".to_string(),
            };
            bot.send_message(ChatId(user_id), reply).await?;
            return Ok(());
        }

        match parse_reminder_args(user_id, args) {
            Some(reminder) => {
                self.store.save_reminder(&reminder).await?;
                bot.send_message(
                    ChatId(user_id),
                    format!(
                        "⏰ {} reminder set for {}.",
                        reminder.kind.as_str(),
                        reminder.time_of_day
                    ),
                )
                .await?;
            }
            None => {
                bot.send_message(
                    ChatId(user_id),
                    "I couldn't parse that. Format: /remind <workout|progress|hydration|general> \
                     <time> [days] [message]\ne.g. /remind workout 08:00 mon,wed,fri Leg day!",
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn cmd_achievements(&self, user_id: i64, bot: &Bot) -> anyhow::Result<()> {
        let achievements = self.store.achievements_for_user(user_id).await?;
        self.send_html(bot, user_id, &format_achievements(&achievements))
            .await
    }

    /// Free-text message outside onboarding: treat it as a coaching question.
    async fn handle_question(&self, user_id: i64, text: &str, bot: &Bot) -> anyhow::Result<()> {
        let profile = match self.store.get_profile(user_id).await? {
            Some(p) => p,
            None => return self.prompt_onboarding(user_id, bot).await,
        };
        let answer = self.coach.answer_question(text, &profile).await;
        self.send_html(bot, user_id, &markdown_to_telegram_html(&answer))
            .await
    }

    async fn handle_callback(&self, q: CallbackQuery, bot: Bot) {
        let user_id = q.from.id.0 as i64;
        let data = match q.data {
            Some(ref d) => d.clone(),
            None => return,
        };
        let _ = bot.answer_callback_query(q.id).await;

        let (first_name, username) = (
            q.from.first_name.clone(),
            q.from.username.clone(),
        );

        let result = match data.as_str() {
            "menu:profile" => self.cmd_profile(user_id, &bot).await,
            "menu:workout" => self.cmd_plan(user_id, PlanKind::Workout, &bot).await,
            "menu:diet" => self.cmd_plan(user_id, PlanKind::Diet, &bot).await,
            "menu:progress" => self.cmd_progress(user_id, &bot).await,
            "menu:settings" => self.show_settings(user_id, &bot).await,
            "settings:reminders" => self.cmd_remind(user_id, "", &bot).await,
            "settings:update_profile" => {
                // Restart the intake dialogue; the old profile stays until
                // the new one finalizes.
                let outcome = self.sessions.begin(user_id).await;
                self.deliver_outcome(user_id, &first_name, &username, outcome, &bot)
                    .await
            }
            other => {
                if let Some(choice) = other.strip_prefix("ob:") {
                    self.handle_onboarding_input(user_id, &first_name, &username, choice, &bot)
                        .await
                } else {
                    Ok(())
                }
            }
        };

        if let Err(e) = result {
            warn!(user_id, error = %e, "Callback handling failed");
        }
    }

    async fn show_settings(&self, user_id: i64, bot: &Bot) -> anyhow::Result<()> {
        let keyboard = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("⏰ Reminders", "settings:reminders"),
            InlineKeyboardButton::callback("📝 Update profile", "settings:update_profile"),
        ]]);
        bot.send_message(ChatId(user_id), "⚙️ Settings")
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn prompt_onboarding(&self, user_id: i64, bot: &Bot) -> anyhow::Result<()> {
        bot.send_message(
            ChatId(user_id),
            "I don't have your profile yet — send /start and we'll set it up in a minute.",
        )
        .await?;
        Ok(())
    }

    async fn send_html(&self, bot: &Bot, user_id: i64, html: &str) -> anyhow::Result<()> {
        for chunk in split_message(html, TELEGRAM_MAX_MESSAGE_LEN) {
            bot.send_message(ChatId(user_id), chunk)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Ok(())
    }
}

fn sender_identity(msg: &Message) -> (String, Option<String>) {
    match msg.from.as_ref() {
        Some(user) => (user.first_name.clone(), user.username.clone()),
        None => ("there".to_string(), None),
    }
}

fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("👤 Profile", "menu:profile"),
            InlineKeyboardButton::callback("📊 Progress", "menu:progress"),
        ],
        vec![
            InlineKeyboardButton::callback("🏋️ Workout plan", "menu:workout"),
            InlineKeyboardButton::callback("🥗 Meal plan", "menu:diet"),
        ],
        vec![InlineKeyboardButton::callback("⚙️ Settings", "menu:settings")],
    ])
}

fn choice_keyboard(choices: &[&'static str]) -> InlineKeyboardMarkup {
    let row = choices
        .iter()
        .map(|c| InlineKeyboardButton::callback(c.to_string(), format!("ob:{}", c)))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

static LOG_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(min(?:ute)?s?|kg|k?cal(?:orie)?s?)").unwrap()
});
static MOOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmood\s*([1-5])\b").unwrap());
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?(am|pm)?$").unwrap());

/// Parse `/log` arguments: unit-tagged numbers in any order, an optional
/// mood rating, and whatever remains becomes the notes.
/// Returns `None` when nothing loggable was found.
pub(crate) fn parse_log_args(user_id: i64, args: &str) -> Option<NewProgress> {
    let mut entry = NewProgress {
        user_id,
        ..Default::default()
    };
    let mut matched_spans: Vec<(usize, usize)> = Vec::new();
    let mut found = false;

    for caps in LOG_TOKEN_RE.captures_iter(args) {
        let whole = caps.get(0)?;
        let value: f64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();

        if unit.starts_with("min") {
            entry.duration_minutes = value as i64;
        } else if unit == "kg" {
            entry.weight_kg = Some(value);
        } else {
            entry.calories_burned = value as i64;
        }
        matched_spans.push((whole.start(), whole.end()));
        found = true;
    }

    if let Some(caps) = MOOD_RE.captures(args) {
        let whole = caps.get(0)?;
        entry.mood_rating = caps[1].parse().ok();
        matched_spans.push((whole.start(), whole.end()));
        found = true;
    }

    if !found {
        return None;
    }

    entry.workout_completed = entry.duration_minutes > 0 || entry.calories_burned > 0;

    let mut notes = String::new();
    let mut cursor = 0;
    matched_spans.sort();
    for (start, end) in matched_spans {
        notes.push_str(&args[cursor..start]);
        cursor = end;
    }
    notes.push_str(&args[cursor..]);
    let notes = notes.split_whitespace().collect::<Vec<_>>().join(" ");
    if !notes.is_empty() {
        entry.notes = Some(notes);
    }

    Some(entry)
}

/// Parse `/remind` arguments: `<kind> <time> [days] [message...]`.
pub(crate) fn parse_reminder_args(user_id: i64, args: &str) -> Option<NewReminder> {
    let mut words = args.split_whitespace();
    let kind = ReminderKind::parse(words.next()?)?;
    let time_of_day = parse_time(words.next()?)?;

    let rest: Vec<&str> = words.collect();
    let (days, message_words) = match rest.first().and_then(|w| parse_days(w)) {
        Some(days) => (Some(days), &rest[1..]),
        None => (None, &rest[..]),
    };
    let message = if message_words.is_empty() {
        None
    } else {
        Some(message_words.join(" "))
    };

    Some(NewReminder {
        user_id,
        kind,
        time_of_day,
        days,
        message,
    })
}

/// Accepts "8", "08:30", "8am", "8:30pm"; returns canonical "HH:MM".
pub(crate) fn parse_time(token: &str) -> Option<String> {
    let caps = TIME_RE.captures(token)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;

    if let Some(ampm) = caps.get(3) {
        let ampm = ampm.as_str().to_lowercase();
        if hour == 0 || hour > 12 {
            return None;
        }
        if ampm == "pm" && hour < 12 {
            hour += 12;
        } else if ampm == "am" && hour == 12 {
            hour = 0;
        }
    }

    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

/// Comma-separated weekday names to cron weekday numbers (0 = Sunday).
fn parse_days(token: &str) -> Option<Vec<u8>> {
    let mut days = Vec::new();
    for part in token.split(',') {
        let day = match part.to_lowercase().as_str() {
            "sun" | "sunday" => 0,
            "mon" | "monday" => 1,
            "tue" | "tuesday" => 2,
            "wed" | "wednesday" => 3,
            "thu" | "thursday" => 4,
            "fri" | "friday" => 5,
            "sat" | "saturday" => 6,
            _ => return None,
        };
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        None
    } else {
        Some(days)
    }
}
