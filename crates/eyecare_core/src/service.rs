//! crates/eyecare_core/src/service.rs
//!
//! The reminder application service: evaluation-aware reads and the
//! snooze / complete mutations, on top of a `ReminderRepository`.

use crate::domain::{Reminder, ReminderFilter};
use crate::evaluator::{evaluate, filter_reminders, EvaluatedReminder};
use crate::ports::{PortError, PortResult, ReminderRepository};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct ReminderService {
    repo: Arc<dyn ReminderRepository>,
}

impl ReminderService {
    pub fn new(repo: Arc<dyn ReminderRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn ReminderRepository> {
        &self.repo
    }

    /// Lists the user's reminders matching `filter`, sorted by due instant.
    pub async fn list<Tz: TimeZone>(
        &self,
        user_id: Uuid,
        filter: &ReminderFilter,
        now: &DateTime<Tz>,
    ) -> PortResult<Vec<EvaluatedReminder>> {
        let reminders = self.repo.list_reminders(user_id).await?;
        Ok(filter_reminders(&reminders, filter, now))
    }

    pub async fn get<Tz: TimeZone>(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        now: &DateTime<Tz>,
    ) -> PortResult<EvaluatedReminder> {
        let reminder = self.repo.get_reminder(user_id, reminder_id).await?;
        Ok(evaluate(&reminder, now))
    }

    pub async fn create(&self, reminder: Reminder) -> PortResult<Reminder> {
        validate(&reminder)?;
        let created = self.repo.create_reminder(reminder).await?;
        info!("Created reminder {} for user {}", created.id, created.user_id);
        Ok(created)
    }

    /// Replaces the stored reminder. Completion and snooze state are kept from storage;
    /// they only change through `complete` and `snooze`.
    pub async fn update(&self, mut reminder: Reminder, now: DateTime<Utc>) -> PortResult<Reminder> {
        validate(&reminder)?;
        let stored = self.repo.get_reminder(reminder.user_id, reminder.id).await?;

        reminder.is_completed = stored.is_completed;
        reminder.completed_at = stored.completed_at;
        reminder.snoozed_until = stored.snoozed_until;
        reminder.snooze_count = stored.snooze_count;
        reminder.created_at = stored.created_at;
        reminder.updated_at = now;

        self.repo.update_reminder(&reminder).await?;
        Ok(reminder)
    }

    pub async fn delete(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()> {
        self.repo.delete_reminder(user_id, reminder_id).await?;
        info!("Deleted reminder {} for user {}", reminder_id, user_id);
        Ok(())
    }

    /// Suppresses notifications for `minutes` from `now`.
    pub async fn snooze(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> PortResult<Reminder> {
        let mut reminder = self.repo.get_reminder(user_id, reminder_id).await?;
        if reminder.is_completed {
            return Err(PortError::Invalid(format!(
                "Reminder {} is already completed",
                reminder_id
            )));
        }

        reminder.snooze(minutes, now)?;
        let until = reminder
            .snoozed_until
            .ok_or_else(|| PortError::Unexpected("snooze did not set an expiry".to_string()))?;
        self.repo
            .mark_snoozed(user_id, reminder_id, until, reminder.snooze_count)
            .await?;

        info!(
            "Snoozed reminder {} until {} ({} snoozes)",
            reminder_id, until, reminder.snooze_count
        );
        Ok(reminder)
    }

    /// Marks a reminder completed. Completing an already completed reminder is a no-op.
    pub async fn complete(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        now: DateTime<Utc>,
    ) -> PortResult<Reminder> {
        let mut reminder = self.repo.get_reminder(user_id, reminder_id).await?;
        if reminder.is_completed {
            return Ok(reminder);
        }

        reminder.complete(now);
        self.repo.mark_completed(user_id, reminder_id, now).await?;
        info!("Completed reminder {}", reminder_id);
        Ok(reminder)
    }
}

fn validate(reminder: &Reminder) -> PortResult<()> {
    if reminder.title.trim().is_empty() {
        return Err(PortError::Invalid("Reminder title must not be empty".to_string()));
    }
    if reminder.reminder_date.is_none() {
        return Err(PortError::Invalid("Reminder date is required".to_string()));
    }
    if let Some(recurrence) = &reminder.recurrence {
        if recurrence.interval == 0 {
            return Err(PortError::Invalid(
                "Recurrence interval must be at least 1".to_string(),
            ));
        }
        if i32::try_from(recurrence.interval).is_err() {
            return Err(PortError::Invalid(format!(
                "Recurrence interval {} is too large",
                recurrence.interval
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Recurrence, RecurrencePattern, ReminderStatus, StatusFilter, SNOOZE_ONE_HOUR,
    };
    use crate::memory::InMemoryReminderRepository;
    use chrono::{Duration, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    fn service_with(reminders: Vec<Reminder>) -> ReminderService {
        ReminderService::new(Arc::new(InMemoryReminderRepository::with_reminders(reminders)))
    }

    #[tokio::test]
    async fn test_snooze_persists_until_and_count() {
        let user = Uuid::new_v4();
        let reminder = Reminder::new(user, "Eye drops", date(2024, 6, 10));
        let service = service_with(vec![reminder.clone()]);

        service
            .snooze(user, reminder.id, SNOOZE_ONE_HOUR, now())
            .await
            .unwrap();
        let stored = service.repository().get_reminder(user, reminder.id).await.unwrap();

        assert_eq!(stored.snoozed_until, Some(now() + Duration::minutes(60)));
        assert_eq!(stored.snooze_count, 1);
        assert_eq!(stored.reminder_date, reminder.reminder_date);
    }

    #[tokio::test]
    async fn test_snooze_rejects_completed_and_bad_durations() {
        let user = Uuid::new_v4();
        let mut done = Reminder::new(user, "Done", date(2024, 6, 10));
        done.is_completed = true;
        let open = Reminder::new(user, "Open", date(2024, 6, 10));
        let service = service_with(vec![done.clone(), open.clone()]);

        let result = service.snooze(user, done.id, 60, now()).await;
        assert!(matches!(result, Err(PortError::Invalid(_))));

        let result = service.snooze(user, open.id, 0, now()).await;
        assert!(matches!(result, Err(PortError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let user = Uuid::new_v4();
        let reminder = Reminder::new(user, "Exam", date(2024, 6, 10));
        let service = service_with(vec![reminder.clone()]);

        service.complete(user, reminder.id, now()).await.unwrap();
        let again = service
            .complete(user, reminder.id, now() + Duration::days(1))
            .await
            .unwrap();

        assert!(again.is_completed);
        assert_eq!(again.completed_at, Some(now()));
    }

    #[tokio::test]
    async fn test_update_keeps_completion_and_snooze_state() {
        let user = Uuid::new_v4();
        let mut reminder = Reminder::new(user, "Exam", date(2024, 6, 10));
        reminder.snooze_count = 2;
        let service = service_with(vec![reminder.clone()]);

        let mut edited = reminder.clone();
        edited.title = "Annual exam".to_string();
        edited.snooze_count = 0;
        edited.is_completed = true;

        let updated = service.update(edited, now()).await.unwrap();
        assert_eq!(updated.title, "Annual exam");
        assert_eq!(updated.snooze_count, 2);
        assert!(!updated.is_completed);
    }

    #[tokio::test]
    async fn test_create_validates() {
        let user = Uuid::new_v4();
        let service = service_with(vec![]);

        let blank = Reminder::new(user, "  ", date(2024, 6, 10));
        assert!(matches!(service.create(blank).await, Err(PortError::Invalid(_))));

        let mut recurring = Reminder::new(user, "Drops", date(2024, 6, 10));
        recurring.recurrence = Some(Recurrence {
            pattern: RecurrencePattern::Daily,
            interval: 0,
            end_date: None,
        });
        assert!(matches!(
            service.create(recurring.clone()).await,
            Err(PortError::Invalid(_))
        ));

        recurring.recurrence = Some(Recurrence {
            pattern: RecurrencePattern::Weekly,
            interval: 3_000_000_000,
            end_date: None,
        });
        assert!(matches!(service.create(recurring).await, Err(PortError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_evaluates() {
        let user = Uuid::new_v4();
        let today = Reminder::new(user, "Today", date(2024, 6, 10));
        let soon = Reminder::new(user, "Soon", date(2024, 6, 12));
        let service = service_with(vec![soon, today]);

        let upcoming = service
            .list(user, &ReminderFilter::with_status(StatusFilter::Upcoming), &now())
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].reminder.title, "Soon");

        let all = service
            .list(user, &ReminderFilter::default(), &now())
            .await
            .unwrap();
        assert_eq!(all[0].status, ReminderStatus::Today);
    }
}
