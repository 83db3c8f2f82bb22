//! crates/eyecare_core/src/poller.rs
//!
//! One polling pass over a user's reminders: fetch the pending window, decide
//! which reminders are inside their notification window, and hand those to the
//! Notification Sink.
//!
//! A tick keeps no state between invocations. Everything is recomputed from the
//! wall-clock time it is given plus the persisted snooze and completion fields,
//! so a missed tick is corrected by the next one.

use crate::domain::PermissionState;
use crate::evaluator::{is_notification_due, notification_for};
use crate::ports::{NotificationSink, ReminderRepository};
use chrono::{DateTime, Duration, FixedOffset};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// How far ahead the pending window reaches by default.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 7;

/// Why a tick produced no notifications even though some reminders were due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PermissionDenied,
    PermissionNotRequested,
}

/// What a single tick observed and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fetched: usize,
    pub due: usize,
    pub notified: Vec<Uuid>,
    pub skipped: Option<SkipReason>,
}

pub struct NotificationPoller {
    repo: Arc<dyn ReminderRepository>,
    sink: Arc<dyn NotificationSink>,
    user_id: Uuid,
    lookahead_days: i64,
}

impl NotificationPoller {
    pub fn new(
        repo: Arc<dyn ReminderRepository>,
        sink: Arc<dyn NotificationSink>,
        user_id: Uuid,
    ) -> Self {
        Self {
            repo,
            sink,
            user_id,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }

    pub fn with_lookahead_days(mut self, days: i64) -> Self {
        self.lookahead_days = days.max(0);
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub async fn tick(&self, now: &DateTime<FixedOffset>) -> TickReport {
        let today = now.date_naive();
        // One day back covers reminders whose local date is yesterday in UTC terms.
        let from = today - Duration::days(1);
        // Reminders dated past `to` still come back when their lead time opens the window sooner.
        let to = today + Duration::days(self.lookahead_days);

        let reminders = match self.repo.list_pending_between(self.user_id, from, to).await {
            Ok(reminders) => reminders,
            Err(e) => {
                error!("Failed to fetch reminders for user {}: {:?}", self.user_id, e);
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let due: Vec<_> = reminders
            .iter()
            .filter(|r| is_notification_due(r, now))
            .filter(|r| seen.insert(r.id))
            .collect();

        let mut report = TickReport {
            fetched: reminders.len(),
            due: due.len(),
            ..TickReport::default()
        };
        if due.is_empty() {
            return report;
        }

        match self.sink.permission().await {
            PermissionState::Granted => {}
            PermissionState::Denied => {
                debug!("Notification permission denied for user {}", self.user_id);
                report.skipped = Some(SkipReason::PermissionDenied);
                return report;
            }
            PermissionState::Default => {
                debug!("Notification permission not yet granted for user {}", self.user_id);
                report.skipped = Some(SkipReason::PermissionNotRequested);
                return report;
            }
        }

        for reminder in due {
            match self.sink.show(&notification_for(reminder)).await {
                Ok(()) => report.notified.push(reminder.id),
                Err(e) => warn!("Failed to show notification for {}: {:?}", reminder.id, e),
            }
        }

        if !report.notified.is_empty() {
            info!(
                "Sent {} reminder notification(s) to user {}",
                report.notified.len(),
                self.user_id
            );
        }
        report
    }
}
