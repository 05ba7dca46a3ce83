use chrono::NaiveDate;
use dashmap::DashMap;
use rand::{Rng, distributions::Uniform};

/// Streak state for a single chat
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub streak: u32,
    pub last_active: Option<NaiveDate>,
}

/// Per-chat activity streaks, updated whenever a chat opens program content.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    by_chat: DashMap<i64, Progress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity on `today` and return the resulting streak.
    /// Consecutive days extend the streak, a repeat on the same day keeps it,
    /// and any gap starts over at 1.
    pub fn mark_active(&self, chat_id: i64, today: NaiveDate) -> u32 {
        let mut entry = self.by_chat.entry(chat_id).or_default();
        let p = entry.value_mut();
        p.streak = match p.last_active {
            None => 1,
            Some(last) if last == today => p.streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => p.streak + 1,
            Some(_) => 1,
        };
        p.last_active = Some(today);
        p.streak
    }

    pub fn streak(&self, chat_id: i64) -> u32 {
        self.by_chat.get(&chat_id).map(|p| p.streak).unwrap_or(0)
    }
}

/// Milestone badge earned at a given streak length, if any.
pub fn badge_for(streak: u32) -> Option<&'static str> {
    match streak {
        s if s >= 21 => Some("🏆 Resilience Badge"),
        s if s >= 14 => Some("🌟 Consistency Badge"),
        s if s >= 7 => Some("🌱 Growth Badge"),
        _ => None,
    }
}

/// Pick a random motivational quote, or `None` when there are none.
pub fn quote(quotes: &[String]) -> Option<&str> {
    if quotes.is_empty() {
        return None;
    }
    let idx = rand_in_range(0, quotes.len() - 1);
    quotes.get(idx).map(String::as_str)
}

/// Return a random index in the inclusive range [min, max].
fn rand_in_range(min: usize, max: usize) -> usize {
    let mut rng = rand::thread_rng();
    let distr = Uniform::new_inclusive(min, max);
    rng.sample(distr)
}
