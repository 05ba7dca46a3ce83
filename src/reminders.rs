//! Reminder enrollment and the periodic sweep that delivers due reminders.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::content::ChallengeId;
use crate::flow::reminder_message;
use crate::messages::Messages;
use crate::outbound::MessageSink;
use crate::progress::{ProgressTracker, badge_for, quote};
use crate::store::{ReminderSubscription, SubscriptionStore};

/// Counters from one sweep pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct Reminders {
    store: Arc<dyn SubscriptionStore>,
    sink: Arc<dyn MessageSink>,
    progress: Arc<ProgressTracker>,
    messages: Arc<Messages>,
    default_time: NaiveTime,
}

impl Reminders {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        sink: Arc<dyn MessageSink>,
        progress: Arc<ProgressTracker>,
        messages: Arc<Messages>,
        default_time: NaiveTime,
    ) -> Self {
        Self {
            store,
            sink,
            progress,
            messages,
            default_time,
        }
    }

    /// Create or replace the chat's subscription, starting `today`.
    pub fn subscribe(
        &self,
        chat_id: i64,
        challenge: ChallengeId,
        total_days: u32,
        today: NaiveDate,
    ) -> ReminderSubscription {
        let sub =
            ReminderSubscription::new(chat_id, challenge, total_days, today, self.default_time);
        if let Some(prev) = self.store.put(sub.clone()) {
            tracing::info!(
                "chat {} replaced {} reminders with {} for {} days",
                chat_id,
                prev.challenge,
                challenge,
                total_days
            );
        } else {
            tracing::info!(
                "chat {} subscribed to {} reminders for {} days",
                chat_id,
                challenge,
                total_days
            );
        }
        sub
    }

    /// Remove the chat's subscription. Returns whether one existed.
    pub fn unsubscribe(&self, chat_id: i64) -> bool {
        let removed = self.store.delete(chat_id).is_some();
        if removed {
            tracing::info!("chat {} unsubscribed from reminders", chat_id);
        }
        removed
    }

    /// Deliver every reminder due at `now`. Each due reminder is tried once
    /// per day; a failed delivery is logged, never stops the sweep and is not
    /// counted as a completed day.
    pub async fn sweep_once(&self, now: NaiveDateTime) -> SweepReport {
        let today = now.date();
        let mut report = SweepReport::default();
        for sub in self.store.scan() {
            if !sub.should_send_now(now) {
                continue;
            }
            report.due += 1;

            let streak = self.progress.streak(sub.chat_id);
            let message = reminder_message(
                &self.messages,
                sub.challenge,
                sub.completed_days + 1,
                sub.total_days,
                quote(&self.messages.quotes),
                badge_for(streak).map(|b| (b, streak)),
            );
            let mut next = sub.clone();
            match self.sink.send(sub.chat_id, message).await {
                Ok(()) => {
                    report.sent += 1;
                    next.mark_sent(today);
                }
                Err(e) => {
                    // one attempt per day; the next try is tomorrow's reminder
                    tracing::warn!("reminder to chat {} failed: {}", sub.chat_id, e);
                    report.failed += 1;
                    next.mark_attempted(today);
                }
            }
            if !self.store.compare_and_put(&sub, next) {
                tracing::debug!(
                    "subscription for chat {} changed during sweep; not advancing",
                    sub.chat_id
                );
            }
        }
        if report.due > 0 {
            tracing::info!(
                "reminder sweep: due={} sent={} failed={}",
                report.due,
                report.sent,
                report.failed
            );
        }
        report
    }

    /// Run `sweep_once` every `period` on a background task.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.sweep_once(Local::now().naive_local()).await;
            }
        })
    }
}
