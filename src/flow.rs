//! Rendering of program screens into outbound messages.

use teloxide::utils::html;

use crate::callback::CallbackAction;
use crate::content::{ChallengeId, ContentStep, PROGRAM_DAYS};
use crate::messages::{Messages, format_with};
use crate::outbound::{Button, OutboundMessage};

pub const LABEL_VIDEO: &str = "🎥 Watch Video";
pub const LABEL_DOCUMENT: &str = "📄 Read PDF";
pub const LABEL_APP: &str = "📱 Download App";
pub const LABEL_PRACTICE: &str = "📖 How to Practice";
pub const LABEL_NEXT_DAY: &str = "➡ Next Day";
pub const LABEL_REMINDERS: &str = "🔁 21-Day Reminders";
pub const LABEL_CHECKIN: &str = "🗣️ Check-in";
pub const LABEL_MENU: &str = "⬅ Back to Menu";
pub const LABEL_PAY: &str = "💳 Pay Now";

/// Challenge picker, two challenges per row.
pub fn main_menu() -> Vec<Vec<Button>> {
    ChallengeId::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| Button::callback(c.menu_label(), CallbackAction::StartChallenge(*c)))
                .collect()
        })
        .collect()
}

pub fn menu_message(messages: &Messages) -> OutboundMessage {
    OutboundMessage::text(messages.menu_prompt.clone()).with_keyboard(main_menu())
}

pub fn welcome_message(messages: &Messages, first_name: Option<&str>) -> OutboundMessage {
    let name = html::escape(first_name.unwrap_or("there"));
    OutboundMessage::text(format_with(&messages.welcome, &[("name", &name)]))
        .with_keyboard(main_menu())
}

pub fn payment_message(template: &str, link: &str) -> OutboundMessage {
    let escaped = html::escape(link);
    OutboundMessage::text(format_with(template, &[("link", &escaped)]))
        .with_keyboard(vec![vec![Button::url(LABEL_PAY, link)]])
}

pub fn challenge_intro_message(
    messages: &Messages,
    challenge: ChallengeId,
    intro: &str,
) -> OutboundMessage {
    OutboundMessage::text(format_with(
        &messages.challenge_intro,
        &[
            ("challenge", challenge.display_name()),
            ("intro", &html::escape(intro)),
        ],
    ))
}

/// Day screen: title, tip, link buttons and navigation. The last day swaps
/// "next day" for the reminder and check-in actions.
pub fn step_message(
    messages: &Messages,
    challenge: ChallengeId,
    step: &ContentStep,
) -> OutboundMessage {
    let mut text = format!(
        "<b>Day {} — {}</b>\n\n{}",
        step.day,
        html::escape(&step.title),
        html::escape(&step.tip)
    );
    let is_last = step.day >= PROGRAM_DAYS;
    if is_last {
        text.push_str("\n\n");
        text.push_str(&format_with(
            &messages.day_complete,
            &[("challenge", challenge.display_name())],
        ));
    }

    let mut keyboard = Vec::new();
    let links = [
        vec![
            (LABEL_VIDEO, &step.video_url),
            (LABEL_DOCUMENT, &step.document_url),
        ],
        vec![
            (LABEL_APP, &step.app_url),
            (LABEL_PRACTICE, &step.practice_url),
        ],
    ];
    for row in links {
        let buttons: Vec<Button> = row
            .into_iter()
            .filter_map(|(label, url)| url.as_deref().map(|u| Button::url(label, u)))
            .collect();
        if !buttons.is_empty() {
            keyboard.push(buttons);
        }
    }

    let mut nav = Vec::new();
    if is_last {
        nav.push(Button::callback(
            LABEL_REMINDERS,
            CallbackAction::StartReminders {
                challenge,
                days: PROGRAM_DAYS,
            },
        ));
        nav.push(Button::callback(LABEL_CHECKIN, CallbackAction::CheckIn(challenge)));
    } else {
        nav.push(Button::callback(
            LABEL_NEXT_DAY,
            CallbackAction::ShowDay {
                challenge,
                day: step.day as i64 + 1,
            },
        ));
    }
    nav.push(Button::callback(LABEL_MENU, CallbackAction::OpenMenu));
    keyboard.push(nav);

    OutboundMessage::text(text).with_keyboard(keyboard)
}

/// Daily reminder text for a subscription on its `day`-th reminder.
pub fn reminder_message(
    messages: &Messages,
    challenge: ChallengeId,
    day: u32,
    total: u32,
    quote: Option<&str>,
    badge: Option<(&str, u32)>,
) -> OutboundMessage {
    let mut text = format_with(
        &messages.reminder,
        &[
            ("challenge", challenge.display_name()),
            ("day", &day.to_string()),
            ("total", &total.to_string()),
        ],
    );
    if let Some((badge, streak)) = badge {
        text.push_str("\n\n");
        text.push_str(&format_with(
            &messages.badge_earned,
            &[("badge", badge), ("streak", &streak.to_string())],
        ));
    }
    if let Some(q) = quote {
        text.push_str("\n\n");
        text.push_str(&html::escape(q));
    }
    OutboundMessage::text(text).with_keyboard(vec![vec![Button::callback(
        LABEL_MENU,
        CallbackAction::OpenMenu,
    )]])
}
