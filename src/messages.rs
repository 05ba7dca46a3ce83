use serde::Deserialize;
use std::fs;

/// Every user-facing text the bot sends, loaded from a JSON file.
/// Placeholders are written as `{key}` and filled with [`format_with`].
#[derive(Clone, Debug, Deserialize)]
pub struct Messages {
    pub welcome: String,
    pub menu_prompt: String,
    pub pay_prompt: String,
    pub pay_prompt_start: String,
    pub pay_failed: String,
    pub access_locked: String,
    pub stop_confirmed: String,
    pub unknown_text: String,
    pub unknown_callback: String,
    pub flow_failed: String,
    pub challenge_failed: String,
    pub remind_failed: String,
    pub remind_confirmed: String,
    pub checkin_ack: String,
    pub generic_error: String,
    pub challenge_intro: String,
    pub day_complete: String,
    pub reminder: String,
    pub badge_earned: String,
    #[serde(default)]
    pub quotes: Vec<String>,
}

/// Read the bot's English texts from `path`. A missing or malformed file is
/// logged and the built-in texts are used instead, so the bot always starts.
pub fn load_messages_file(path: &str) -> Messages {
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!("messages file {} is not valid JSON ({}); using built-in texts", path, e);
            default_messages()
        }),
        Err(e) => {
            tracing::warn!("cannot read messages file {} ({}); using built-in texts", path, e);
            default_messages()
        }
    }
}

/// Built-in English texts, used when `messages/en.json` is missing or broken.
pub fn default_messages() -> Messages {
    Messages {
        welcome: "👋 Hello <b>{name}</b>!\n\nI’m your <b>Mental Wellness Assistant</b> 🌱\n\nI’ll guide you with short videos, simple tools, and daily nudges.\n\nWhich challenge would you like to work on today?".to_string(),
        menu_prompt: "🌟 Please choose a challenge below:".to_string(),
        pay_prompt: "💳 Please complete your subscription:\n\n👉 <a href=\"{link}\">Pay Now</a>\n\nAfter payment, type /menu to unlock.".to_string(),
        pay_prompt_start: "💳 To continue using the Mental Wellness Assistant, please complete your subscription:\n\n👉 <a href=\"{link}\">Pay Now</a>\n\nAfter payment, type /menu to unlock.".to_string(),
        pay_failed: "⚠️ I couldn’t create a payment link right now. Please try /pay again in a few minutes.".to_string(),
        access_locked: "🚫 Access Locked!\n\nYou need a subscription to use this bot.\n\n👉 Use /pay to purchase access.".to_string(),
        stop_confirmed: "⏹ Okay, I’ve stopped your reminders.\n\n👉 You can start again anytime with /menu.".to_string(),
        unknown_text: "🤔 I didn’t quite get that.\n\nPlease use the buttons below or type /menu to continue 👇".to_string(),
        unknown_callback: "🤷 Not sure what that was. Try /menu.".to_string(),
        flow_failed: "⚠️ Couldn’t open the next day. Try /menu.".to_string(),
        challenge_failed: "⚠️ Unknown challenge. Try /menu.".to_string(),
        remind_failed: "⚠️ Couldn’t set reminders. Try again from /menu.".to_string(),
        remind_confirmed: "✅ Done! I’ll remind you daily for {days} days.\n\nUse /stop anytime to cancel reminders.".to_string(),
        checkin_ack: "🗣️ Thanks for completing the program!\n\nIf you’d like a psychologist check-in, please reply with your preferred time window (e.g., “Evenings 7–9pm, IST”). We’ll get back to you.".to_string(),
        generic_error: "⚠️ Oops, something went wrong. Try /menu.".to_string(),
        challenge_intro: "✅ Let’s work together on {challenge}.\n\n{intro}\n\nI’ll guide you for 21 days. Here’s Day 1 👇".to_string(),
        day_complete: "🎉 You completed the 21-day {challenge} program! I’m proud of you. Would you like me to set reminders to keep your favorite tools?".to_string(),
        reminder: "🔔 Reminder: Stay consistent with your <b>{challenge}</b> practice today! Day {day} of {total}.".to_string(),
        badge_earned: "{badge} unlocked: {streak} days in a row!".to_string(),
        quotes: vec![
            "🌱 Small steps daily lead to big change.".to_string(),
            "💪 You’re stronger than you think.".to_string(),
            "✨ Progress, not perfection.".to_string(),
        ],
    }
}

/// Fill `{name}`-style placeholders in a message text. Placeholders without a
/// matching pair are left as they are.
pub fn format_with(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut s = template.to_string();
    for (k, v) in pairs {
        s = s.replace(&format!("{{{}}}", k), v);
    }
    s
}
