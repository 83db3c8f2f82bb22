//! crates/eyecare_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Snooze offset offered by the notification's "later" action.
pub const SNOOZE_ONE_HOUR: i64 = 60;

/// Snooze offset offered by the notification's "tomorrow" action.
pub const SNOOZE_ONE_DAY: i64 = 1440;

/// Where a notification click should take the user.
pub const REMINDERS_URL: &str = "/reminders";

//=========================================================================================
// Reminder
//=========================================================================================

/// Display priority of a reminder. No ordering is enforced by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
            RecurrencePattern::Yearly => "yearly",
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            other => Err(format!("unknown recurrence pattern '{}'", other)),
        }
    }
}

/// A repeat rule attached to a reminder.
///
/// Stored and returned as-is; only the reminder's own date is ever evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub interval: u32,
    pub end_date: Option<NaiveDate>,
}

/// A user-scheduled due-date record, optionally tied to a family-member profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `None` means the reminder is "general" rather than for one profile.
    pub profile_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: Option<String>,
    /// `None` only for malformed records; those are never scheduled.
    pub reminder_date: Option<NaiveDate>,
    /// `None` means "all day" (midnight).
    pub reminder_time: Option<NaiveTime>,
    pub priority: Priority,
    pub is_active: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub recurrence: Option<Recurrence>,
    pub browser_notification: bool,
    pub notification_minutes_before: i32,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub snooze_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Creates an active, all-day reminder with notifications off.
    pub fn new(user_id: Uuid, title: impl Into<String>, reminder_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            profile_id: None,
            title: title.into(),
            description: None,
            reminder_type: None,
            reminder_date: Some(reminder_date),
            reminder_time: None,
            priority: Priority::default(),
            is_active: true,
            is_completed: false,
            completed_at: None,
            recurrence: None,
            browser_notification: false,
            notification_minutes_before: 0,
            snoozed_until: None,
            snooze_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// True while a snooze set before `now` has not yet expired.
    pub fn is_snoozed_at(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until > now)
    }

    /// Whole days by which the notification window can open before `reminder_date`.
    pub fn lead_days(&self) -> i64 {
        (i64::from(self.notification_minutes_before.max(0)) + 1439) / 1440
    }

    /// Suppresses notifications until `now + minutes`. The due date is left alone.
    pub fn snooze(&mut self, minutes: i64, now: DateTime<Utc>) -> Result<(), EvaluationError> {
        if minutes <= 0 {
            return Err(EvaluationError::InvalidSnooze(minutes));
        }
        let offset =
            Duration::try_minutes(minutes).ok_or(EvaluationError::InvalidSnooze(minutes))?;
        let until = now
            .checked_add_signed(offset)
            .ok_or(EvaluationError::InvalidSnooze(minutes))?;

        self.snoozed_until = Some(until);
        self.snooze_count = self.snooze_count.saturating_add(1);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the reminder completed. Completing twice keeps the first timestamp.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        if self.is_completed {
            return;
        }
        self.is_completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Snooze duration must be a positive number of minutes, got {0}")]
    InvalidSnooze(i64),
}

//=========================================================================================
// Classification
//=========================================================================================

/// Where a reminder stands relative to "now". Variants are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Completed,
    Inactive,
    /// The record has no date, so no due instant can be computed.
    Undated,
    Today,
    Overdue,
    Upcoming,
    Scheduled,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Completed => "completed",
            ReminderStatus::Inactive => "inactive",
            ReminderStatus::Undated => "undated",
            ReminderStatus::Today => "today",
            ReminderStatus::Overdue => "overdue",
            ReminderStatus::Upcoming => "upcoming",
            ReminderStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Filtering
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Everything not completed.
    Active,
    Completed,
    Inactive,
    Upcoming,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            "inactive" => Ok(StatusFilter::Inactive),
            "upcoming" => Ok(StatusFilter::Upcoming),
            other => Err(format!("unknown status filter '{}'", other)),
        }
    }
}

/// Restricts a listing to one family member, or to reminders with no profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileScope {
    General,
    Profile(Uuid),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    pub status: StatusFilter,
    /// Case-insensitive match against title, description and type.
    pub query: Option<String>,
    pub profile: Option<ProfileScope>,
}

impl ReminderFilter {
    pub fn with_status(status: StatusFilter) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_profile(mut self, profile: ProfileScope) -> Self {
        self.profile = Some(profile);
        self
    }
}

//=========================================================================================
// Notifications
//=========================================================================================

/// Browser notification permission as reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    Granted,
    Denied,
    #[default]
    Default,
}

/// A request for the Notification Sink to display one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub reminder_id: Uuid,
    /// Deduplication tag: a second notification with the same tag replaces the first.
    pub tag: String,
    pub title: String,
    pub body: String,
    pub url: String,
}
