use crate::types::{Achievement, Profile, ProgressEntry};

/// Telegram rejects messages longer than this.
pub(crate) const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split text into chunks that fit Telegram's message limit, preferring
/// paragraph and line boundaries over mid-sentence cuts.
pub(crate) fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Largest char boundary at or before max_len; never slice inside
        // a multi-byte character.
        let mut boundary = max_len;
        while boundary > 0 && !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }

        let search_region = &remaining[..boundary];
        let split_at = search_region
            .rfind("\n\n")
            .map(|p| p + 1)
            .or_else(|| search_region.rfind('\n'))
            .unwrap_or(boundary);

        // Force progress when no boundary was found at all.
        let split_at = if split_at == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(idx, _)| idx)
                .unwrap_or(remaining.len())
        } else {
            split_at
        };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches('\n');
    }

    chunks
}

/// Convert the coach's markdown-flavored output to Telegram HTML:
/// headings and `**bold**` become `<b>`, backtick spans become `<code>`,
/// list markers become bullets. Everything else is escaped verbatim.
pub(crate) fn markdown_to_telegram_html(md: &str) -> String {
    let mut result = String::with_capacity(md.len() + md.len() / 4);

    for line in md.lines() {
        let escaped = html_escape(line);

        if let Some(heading) = strip_heading(&escaped) {
            result.push_str("<b>");
            result.push_str(&heading);
            result.push_str("</b>\n");
            continue;
        }

        let with_bullet = if let Some(rest) = escaped
            .strip_prefix("- ")
            .or_else(|| escaped.strip_prefix("* "))
        {
            format!("• {}", rest)
        } else {
            escaped
        };

        result.push_str(&convert_inline_formatting(&with_bullet));
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }
    result
}

fn strip_heading(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        let after_hashes = trimmed.trim_start_matches('#');
        if after_hashes.starts_with(' ') {
            return Some(after_hashes.trim_start().to_string());
        }
    }
    None
}

fn convert_inline_formatting(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        if chars[i] == '`' {
            if let Some(end) = find_char(&chars, '`', i + 1) {
                result.push_str("<code>");
                result.extend(&chars[i + 1..end]);
                result.push_str("</code>");
                i = end + 1;
                continue;
            }
        }

        if i + 1 < len && chars[i] == '*' && chars[i + 1] == '*' {
            if let Some(end) = find_double_char(&chars, '*', i + 2) {
                result.push_str("<b>");
                result.extend(&chars[i + 2..end]);
                result.push_str("</b>");
                i = end + 2;
                continue;
            }
        }

        result.push(chars[i]);
        i += 1;
    }

    result
}

fn find_char(chars: &[char], needle: char, from: usize) -> Option<usize> {
    (from..chars.len()).find(|&i| chars[i] == needle)
}

fn find_double_char(chars: &[char], needle: char, from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&i| chars[i] == needle && chars[i + 1] == needle)
}

pub(crate) fn format_profile(profile: &Profile) -> String {
    format!(
        "👤 <b>Your Profile</b>\n\n\
         • Age: {} years\n\
         • Weight: {} kg\n\
         • Height: {} cm\n\
         • Gender: {}\n\
         • Fitness level: {}\n\
         • Goals: {}\n\
         • Medical conditions: {}\n\
         • Dietary restrictions: {}\n\
         • Workout days: {}/week\n\
         • Session length: {} min",
        profile.age,
        profile.weight_kg,
        profile.height_cm,
        profile.gender.as_str(),
        profile.fitness_level.as_str(),
        html_escape(&profile.goals),
        html_escape(profile.medical_conditions.as_deref().unwrap_or("None")),
        html_escape(profile.dietary_restrictions.as_deref().unwrap_or("None")),
        profile.workout_days,
        profile.workout_duration,
    )
}

pub(crate) fn format_progress(entries: &[ProgressEntry]) -> String {
    if entries.is_empty() {
        return "📊 No progress logged yet. Use /log after your next workout!".to_string();
    }

    let mut out = String::from("📊 <b>Recent Progress</b>\n");
    for entry in entries {
        out.push_str(&format!(
            "\n<b>{}</b>\n",
            entry.recorded_at.format("%Y-%m-%d %H:%M")
        ));
        if let Some(w) = entry.weight_kg {
            out.push_str(&format!("• Weight: {} kg\n", w));
        }
        if entry.workout_completed {
            out.push_str(&format!(
                "• Workout: ✅ {} min, {} kcal\n",
                entry.duration_minutes, entry.calories_burned
            ));
        } else {
            out.push_str("• Workout: rest day\n");
        }
        if let Some(mood) = entry.mood_rating {
            out.push_str(&format!("• Mood: {}/5\n", mood));
        }
        if let Some(notes) = &entry.notes {
            out.push_str(&format!("• Notes: {}\n", html_escape(notes)));
        }
    }
    out
}

pub(crate) fn format_achievements(achievements: &[Achievement]) -> String {
    if achievements.is_empty() {
        return "🏆 No achievements yet — your first workout unlocks the first one!".to_string();
    }

    let mut out = String::from("🏆 <b>Your Achievements</b>\n");
    for a in achievements {
        out.push_str(&format!(
            "\n<b>{}</b> — {}\n<i>{}</i>\n",
            html_escape(&a.title),
            a.achieved_at.format("%Y-%m-%d"),
            html_escape(&a.description),
        ));
    }
    out
}

pub(crate) fn build_help_text() -> String {
    "🤖 <b>FitCoach commands</b>\n\n\
     /start — set up or revisit your profile\n\
     /profile — show your profile\n\
     /workout — generate a weekly workout plan\n\
     /diet — generate a daily meal plan\n\
     /progress — show recent progress and stats\n\
     /log — log a workout, e.g. <code>/log 45min 300cal 81.5kg</code>\n\
     /ask &lt;question&gt; — ask a fitness question\n\
     /explain &lt;exercise&gt; — exercise form guide\n\
     /remind — manage reminders, e.g. <code>/remind workout 08:00</code>\n\
     /achievements — show earned achievements\n\
     /help — this message\n\n\
     You can also just send me a message and I'll answer as your coach."
        .to_string()
}
