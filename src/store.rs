use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::content::ChallengeId;

/// One chat's daily-reminder enrollment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSubscription {
    pub chat_id: i64,
    pub challenge: ChallengeId,
    pub total_days: u32,
    pub start_date: NaiveDate,
    /// local time of day after which the daily reminder may go out
    pub preferred_time: NaiveTime,
    pub last_sent_on: Option<NaiveDate>,
    pub completed_days: u32,
}

impl ReminderSubscription {
    pub fn new(
        chat_id: i64,
        challenge: ChallengeId,
        total_days: u32,
        start_date: NaiveDate,
        preferred_time: NaiveTime,
    ) -> Self {
        Self {
            chat_id,
            challenge,
            total_days,
            start_date,
            preferred_time,
            last_sent_on: None,
            completed_days: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed_days >= self.total_days
    }

    /// Whole days since the start date (negative if `today` is earlier).
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.start_date).num_days()
    }

    /// Due when the program is still running, nothing went out today yet and
    /// the preferred time of day has been reached.
    pub fn should_send_now(&self, now: NaiveDateTime) -> bool {
        let today = now.date();
        if self.is_finished() {
            return false;
        }
        let elapsed = self.elapsed_days(today);
        if elapsed < 0 || elapsed >= self.total_days as i64 {
            return false;
        }
        if self.last_sent_on == Some(today) {
            return false;
        }
        now.time() >= self.preferred_time
    }

    /// Record a delivered reminder.
    pub fn mark_sent(&mut self, today: NaiveDate) {
        self.last_sent_on = Some(today);
        self.completed_days = (self.completed_days + 1).min(self.total_days);
    }

    /// Record a failed delivery: today's slot is used up, but the day does
    /// not count as completed.
    pub fn mark_attempted(&mut self, today: NaiveDate) {
        self.last_sent_on = Some(today);
    }
}

/// Keyed storage of reminder subscriptions, one per chat.
///
/// Operations on the same chat are linearizable; nothing is promised across
/// different chats.
pub trait SubscriptionStore: Send + Sync {
    fn get(&self, chat_id: i64) -> Option<ReminderSubscription>;

    /// Insert or replace; returns the replaced record.
    fn put(&self, sub: ReminderSubscription) -> Option<ReminderSubscription>;

    fn delete(&self, chat_id: i64) -> Option<ReminderSubscription>;

    /// Point-in-time copy of every subscription.
    fn scan(&self) -> Vec<ReminderSubscription>;

    /// Replace the stored record with `next` only if it still equals
    /// `expected`. Returns whether the write happened.
    fn compare_and_put(&self, expected: &ReminderSubscription, next: ReminderSubscription)
    -> bool;
}

/// In-memory store, optionally mirrored to a JSON snapshot file that is
/// rewritten in full after each mutation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subs: DashMap<i64, ReminderSubscription>,
    snapshot: Option<PathBuf>,
    // serializes snapshot rewrites
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by `path`, loading any records already there.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let subs = DashMap::new();
        for sub in load_subscriptions(&path) {
            subs.insert(sub.chat_id, sub);
        }
        tracing::info!("loaded {} reminder subscriptions from {}", subs.len(), path.display());
        Self {
            subs,
            snapshot: Some(path),
            write_lock: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    fn persist(&self) {
        if let Some(path) = &self.snapshot {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            let mut all = self.scan();
            all.sort_by_key(|s| s.chat_id);
            save_subscriptions(path, &all);
        }
    }
}

impl SubscriptionStore for MemoryStore {
    fn get(&self, chat_id: i64) -> Option<ReminderSubscription> {
        self.subs.get(&chat_id).map(|s| s.clone())
    }

    fn put(&self, sub: ReminderSubscription) -> Option<ReminderSubscription> {
        let prev = self.subs.insert(sub.chat_id, sub);
        self.persist();
        prev
    }

    fn delete(&self, chat_id: i64) -> Option<ReminderSubscription> {
        let removed = self.subs.remove(&chat_id).map(|(_, s)| s);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    fn scan(&self) -> Vec<ReminderSubscription> {
        self.subs.iter().map(|e| e.value().clone()).collect()
    }

    fn compare_and_put(
        &self,
        expected: &ReminderSubscription,
        next: ReminderSubscription,
    ) -> bool {
        let written = match self.subs.get_mut(&expected.chat_id) {
            Some(mut current) if *current == *expected => {
                *current = next;
                true
            }
            _ => false,
        };
        if written {
            self.persist();
        }
        written
    }
}

/// Read the snapshot file; a missing or unreadable file yields no records.
fn load_subscriptions(path: &Path) -> Vec<ReminderSubscription> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            tracing::warn!("failed to parse {}: {}. Starting empty.", path.display(), e);
            Vec::new()
        }),
        Err(e) => {
            tracing::warn!("failed to read {}: {}. Starting empty.", path.display(), e);
            Vec::new()
        }
    }
}

/// Save the subscriptions to the given path as pretty JSON
fn save_subscriptions(path: &Path, subs: &[ReminderSubscription]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match serde_json::to_string_pretty(subs) {
        Ok(s) => {
            if let Err(e) = fs::write(path, s) {
                tracing::warn!("failed to write {}: {}", path.display(), e);
            }
        }
        Err(e) => tracing::warn!("failed to serialize subscriptions: {}", e),
    }
}
