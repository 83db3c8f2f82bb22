//! services/api/src/web/dto.rs
//!
//! JSON shapes for the REST API and the backup document, and their conversions
//! to and from the core domain types.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use eyecare_core::domain::{
    Priority, Recurrence, RecurrencePattern, Reminder, ReminderStatus,
};
use eyecare_core::evaluator::EvaluatedReminder;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Enums
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityDto {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl From<PriorityDto> for Priority {
    fn from(dto: PriorityDto) -> Self {
        match dto {
            PriorityDto::Low => Priority::Low,
            PriorityDto::Medium => Priority::Medium,
            PriorityDto::High => Priority::High,
            PriorityDto::Urgent => Priority::Urgent,
        }
    }
}

impl From<Priority> for PriorityDto {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => PriorityDto::Low,
            Priority::Medium => PriorityDto::Medium,
            Priority::High => PriorityDto::High,
            Priority::Urgent => PriorityDto::Urgent,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePatternDto {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<RecurrencePatternDto> for RecurrencePattern {
    fn from(dto: RecurrencePatternDto) -> Self {
        match dto {
            RecurrencePatternDto::Daily => RecurrencePattern::Daily,
            RecurrencePatternDto::Weekly => RecurrencePattern::Weekly,
            RecurrencePatternDto::Monthly => RecurrencePattern::Monthly,
            RecurrencePatternDto::Yearly => RecurrencePattern::Yearly,
        }
    }
}

impl From<RecurrencePattern> for RecurrencePatternDto {
    fn from(pattern: RecurrencePattern) -> Self {
        match pattern {
            RecurrencePattern::Daily => RecurrencePatternDto::Daily,
            RecurrencePattern::Weekly => RecurrencePatternDto::Weekly,
            RecurrencePattern::Monthly => RecurrencePatternDto::Monthly,
            RecurrencePattern::Yearly => RecurrencePatternDto::Yearly,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatusDto {
    Completed,
    Inactive,
    Undated,
    Today,
    Overdue,
    Upcoming,
    Scheduled,
}

impl From<ReminderStatus> for ReminderStatusDto {
    fn from(status: ReminderStatus) -> Self {
        match status {
            ReminderStatus::Completed => ReminderStatusDto::Completed,
            ReminderStatus::Inactive => ReminderStatusDto::Inactive,
            ReminderStatus::Undated => ReminderStatusDto::Undated,
            ReminderStatus::Today => ReminderStatusDto::Today,
            ReminderStatus::Overdue => ReminderStatusDto::Overdue,
            ReminderStatus::Upcoming => ReminderStatusDto::Upcoming,
            ReminderStatus::Scheduled => ReminderStatusDto::Scheduled,
        }
    }
}

//=========================================================================================
// Reminder payloads
//=========================================================================================

/// A stored reminder as returned by the API and written to backups.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ReminderDto {
    pub id: Uuid,
    pub profile_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: Option<String>,
    pub reminder_date: Option<NaiveDate>,
    #[serde(default, with = "time_of_day")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub reminder_time: Option<NaiveTime>,
    #[serde(default)]
    pub priority: PriorityDto,
    pub is_active: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePatternDto>,
    pub recurrence_interval: Option<u32>,
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub browser_notification: bool,
    #[serde(default)]
    pub notification_minutes_before: i32,
    pub snoozed_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snooze_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Reminder> for ReminderDto {
    fn from(reminder: &Reminder) -> Self {
        let recurrence = reminder.recurrence.as_ref();
        Self {
            id: reminder.id,
            profile_id: reminder.profile_id,
            title: reminder.title.clone(),
            description: reminder.description.clone(),
            reminder_type: reminder.reminder_type.clone(),
            reminder_date: reminder.reminder_date,
            reminder_time: reminder.reminder_time,
            priority: reminder.priority.into(),
            is_active: reminder.is_active,
            is_completed: reminder.is_completed,
            completed_at: reminder.completed_at,
            is_recurring: recurrence.is_some(),
            recurrence_pattern: recurrence.map(|r| r.pattern.into()),
            recurrence_interval: recurrence.map(|r| r.interval),
            recurrence_end_date: recurrence.and_then(|r| r.end_date),
            browser_notification: reminder.browser_notification,
            notification_minutes_before: reminder.notification_minutes_before,
            snoozed_until: reminder.snoozed_until,
            snooze_count: reminder.snooze_count,
            created_at: reminder.created_at,
            updated_at: reminder.updated_at,
        }
    }
}

impl ReminderDto {
    /// Restores a backed-up reminder under a new id for `user_id`.
    pub fn into_domain(self, user_id: Uuid, id: Uuid) -> Result<Reminder, String> {
        let recurrence = recurrence_from(
            self.is_recurring,
            self.recurrence_pattern,
            self.recurrence_interval,
            self.recurrence_end_date,
        )?;
        Ok(Reminder {
            id,
            user_id,
            profile_id: self.profile_id,
            title: self.title,
            description: self.description,
            reminder_type: self.reminder_type,
            reminder_date: self.reminder_date,
            reminder_time: self.reminder_time,
            priority: self.priority.into(),
            is_active: self.is_active,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            recurrence,
            browser_notification: self.browser_notification,
            notification_minutes_before: self.notification_minutes_before,
            snoozed_until: self.snoozed_until,
            snooze_count: self.snooze_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A reminder together with its classification at request time.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct EvaluatedReminderDto {
    #[serde(flatten)]
    pub reminder: ReminderDto,
    pub status: ReminderStatusDto,
    /// The due instant in the caller's zone; absent for undated records.
    #[schema(value_type = Option<String>)]
    pub due_at: Option<DateTime<FixedOffset>>,
    /// Whether the reminder is inside its notification window right now.
    pub notify: bool,
}

impl From<&EvaluatedReminder> for EvaluatedReminderDto {
    fn from(evaluated: &EvaluatedReminder) -> Self {
        Self {
            reminder: ReminderDto::from(&evaluated.reminder),
            status: evaluated.status.into(),
            due_at: evaluated.due_at,
            notify: evaluated.notify,
        }
    }
}

/// The body of `POST /reminders` and `PUT /reminders/{id}`.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct ReminderInput {
    pub profile_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: Option<String>,
    pub reminder_date: NaiveDate,
    #[serde(default, with = "time_of_day")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub reminder_time: Option<NaiveTime>,
    #[serde(default)]
    pub priority: PriorityDto,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePatternDto>,
    pub recurrence_interval: Option<u32>,
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub browser_notification: bool,
    #[serde(default)]
    pub notification_minutes_before: i32,
}

fn default_true() -> bool {
    true
}

impl ReminderInput {
    /// Builds a fresh, uncompleted reminder from the form input.
    pub fn into_domain(self, user_id: Uuid, id: Uuid) -> Result<Reminder, String> {
        let recurrence = recurrence_from(
            self.is_recurring,
            self.recurrence_pattern,
            self.recurrence_interval,
            self.recurrence_end_date,
        )?;

        let mut reminder = Reminder::new(user_id, self.title, self.reminder_date);
        reminder.id = id;
        reminder.profile_id = self.profile_id;
        reminder.description = self.description;
        reminder.reminder_type = self.reminder_type;
        reminder.reminder_time = self.reminder_time;
        reminder.priority = self.priority.into();
        reminder.is_active = self.is_active;
        reminder.recurrence = recurrence;
        reminder.browser_notification = self.browser_notification;
        reminder.notification_minutes_before = self.notification_minutes_before;
        Ok(reminder)
    }
}

fn recurrence_from(
    is_recurring: bool,
    pattern: Option<RecurrencePatternDto>,
    interval: Option<u32>,
    end_date: Option<NaiveDate>,
) -> Result<Option<Recurrence>, String> {
    if !is_recurring {
        return Ok(None);
    }
    let pattern = pattern.ok_or("recurring reminders need a recurrence_pattern")?;
    Ok(Some(Recurrence {
        pattern: pattern.into(),
        interval: interval.unwrap_or(1),
        end_date,
    }))
}

//=========================================================================================
// Requests and responses
//=========================================================================================

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// One of `all`, `active`, `completed`, `inactive`, `upcoming`.
    pub status: Option<String>,
    /// Free-text match against title, description and type.
    pub q: Option<String>,
    /// Only reminders for this profile.
    pub profile_id: Option<Uuid>,
    /// Only reminders without a profile.
    pub general: Option<bool>,
    /// The caller's zone, in minutes east of UTC.
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ZoneQuery {
    /// The caller's zone, in minutes east of UTC.
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SnoozeRequest {
    /// Minutes from now; 60 and 1440 are the usual choices.
    pub minutes: i64,
}

/// Top-level metadata of a backup document.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct BackupMetadata {
    pub created_at: DateTime<Utc>,
    pub version: u32,
    pub record_count: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ReminderBackup {
    pub metadata: BackupMetadata,
    pub reminders: Vec<ReminderDto>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ImportResponse {
    pub imported: usize,
    pub skipped: usize,
}

//=========================================================================================
// "HH:MM" times
//=========================================================================================

/// Times of day travel as `"HH:MM"` (seconds accepted on input).
mod time_of_day {
    use chrono::{NaiveTime, Timelike};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) if t.second() == 0 => s.serialize_some(&t.format("%H:%M").to_string()),
            Some(t) => s.serialize_some(&t.format("%H:%M:%S").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| parse(&s).map_err(de::Error::custom)).transpose()
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| format!("invalid time of day '{}'", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_parses_form_payload() {
        let input: ReminderInput = serde_json::from_str(
            r#"{
                "title": "Eye drops",
                "reminder_date": "2024-06-10",
                "reminder_time": "09:00",
                "priority": "high",
                "browser_notification": true,
                "notification_minutes_before": 60
            }"#,
        )
        .unwrap();

        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        let reminder = input.into_domain(user, id).unwrap();

        assert_eq!(reminder.id, id);
        assert_eq!(reminder.user_id, user);
        assert_eq!(reminder.reminder_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(reminder.priority, Priority::High);
        assert!(reminder.is_active);
        assert!(!reminder.is_completed);
    }

    #[test]
    fn test_recurring_input_needs_pattern() {
        let input: ReminderInput = serde_json::from_str(
            r#"{"title": "Drops", "reminder_date": "2024-06-10", "is_recurring": true}"#,
        )
        .unwrap();
        assert!(input.into_domain(Uuid::new_v4(), Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let result = serde_json::from_str::<ReminderInput>(
            r#"{"title": "Drops", "reminder_date": "2024-06-10", "reminder_time": "9am"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dto_preserves_recurrence_and_time() {
        let mut reminder = Reminder::new(
            Uuid::new_v4(),
            "Replace contacts",
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        );
        reminder.reminder_time = NaiveTime::from_hms_opt(7, 30, 0);
        reminder.recurrence = Some(Recurrence {
            pattern: RecurrencePattern::Monthly,
            interval: 1,
            end_date: None,
        });

        let json = serde_json::to_value(ReminderDto::from(&reminder)).unwrap();
        assert_eq!(json["reminder_time"], "07:30");
        assert_eq!(json["recurrence_pattern"], "monthly");
        assert_eq!(json["is_recurring"], true);

        let restored: ReminderDto = serde_json::from_value(json).unwrap();
        let new_id = Uuid::new_v4();
        let copy = restored.into_domain(reminder.user_id, new_id).unwrap();
        assert_eq!(copy.id, new_id);
        assert_eq!(copy.recurrence, reminder.recurrence);
        assert_eq!(copy.reminder_time, reminder.reminder_time);
    }
}
