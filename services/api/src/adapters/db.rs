//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ReminderRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use eyecare_core::domain::{Priority, Recurrence, RecurrencePattern, Reminder};
use eyecare_core::ports::{PortError, PortResult, ReminderRepository};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ReminderRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

const REMINDER_COLUMNS: &str = "id, user_id, profile_id, title, description, reminder_type, \
     reminder_date, reminder_time, priority, is_active, is_completed, completed_at, \
     is_recurring, recurrence_pattern, recurrence_interval, recurrence_end_date, \
     browser_notification, notification_minutes_before, snoozed_until, snooze_count, \
     created_at, updated_at";

#[derive(FromRow)]
struct ReminderRecord {
    id: Uuid,
    user_id: Uuid,
    profile_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    reminder_type: Option<String>,
    reminder_date: Option<NaiveDate>,
    reminder_time: Option<NaiveTime>,
    priority: String,
    is_active: bool,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    is_recurring: bool,
    recurrence_pattern: Option<String>,
    recurrence_interval: Option<i32>,
    recurrence_end_date: Option<NaiveDate>,
    browser_notification: bool,
    notification_minutes_before: i32,
    snoozed_until: Option<DateTime<Utc>>,
    snooze_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReminderRecord {
    fn to_domain(self) -> Reminder {
        let priority = self.priority.parse::<Priority>().unwrap_or_else(|e| {
            warn!("Reminder {}: {}; using default priority", self.id, e);
            Priority::default()
        });

        let recurrence = if self.is_recurring {
            self.recurrence_pattern
                .as_deref()
                .and_then(|p| p.parse::<RecurrencePattern>().ok())
                .map(|pattern| Recurrence {
                    pattern,
                    interval: self.recurrence_interval.unwrap_or(1).max(1) as u32,
                    end_date: self.recurrence_end_date,
                })
        } else {
            None
        };

        Reminder {
            id: self.id,
            user_id: self.user_id,
            profile_id: self.profile_id,
            title: self.title,
            description: self.description,
            reminder_type: self.reminder_type,
            reminder_date: self.reminder_date,
            reminder_time: self.reminder_time,
            priority,
            is_active: self.is_active,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            recurrence,
            browser_notification: self.browser_notification,
            notification_minutes_before: self.notification_minutes_before,
            snoozed_until: self.snoozed_until,
            snooze_count: self.snooze_count.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(reminder_id: Uuid) -> PortError {
    PortError::NotFound(format!("Reminder {} not found", reminder_id))
}

fn interval_column(recurrence: Option<&Recurrence>) -> PortResult<Option<i32>> {
    recurrence
        .map(|r| {
            i32::try_from(r.interval).map_err(|_| {
                PortError::Invalid(format!("Recurrence interval {} is too large", r.interval))
            })
        })
        .transpose()
}

fn snooze_count_column(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

//=========================================================================================
// `ReminderRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReminderRepository for DbAdapter {
    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>> {
        let sql = format!(
            "SELECT {} FROM reminders WHERE user_id = $1 ORDER BY created_at ASC",
            REMINDER_COLUMNS
        );
        let records = sqlx::query_as::<_, ReminderRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_pending_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Reminder>> {
        let sql = format!(
            "SELECT {} FROM reminders \
             WHERE user_id = $1 AND is_active AND NOT is_completed \
             AND reminder_date >= $2 \
             AND reminder_date \
                 - ((GREATEST(notification_minutes_before, 0)::BIGINT + 1439) / 1440)::INTEGER \
                 <= $3 \
             ORDER BY reminder_date ASC, reminder_time ASC NULLS FIRST",
            REMINDER_COLUMNS
        );
        let records = sqlx::query_as::<_, ReminderRecord>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<Reminder> {
        let sql = format!(
            "SELECT {} FROM reminders WHERE id = $1 AND user_id = $2",
            REMINDER_COLUMNS
        );
        let record = sqlx::query_as::<_, ReminderRecord>(&sql)
            .bind(reminder_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => not_found(reminder_id),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn create_reminder(&self, reminder: Reminder) -> PortResult<Reminder> {
        let sql = format!(
            "INSERT INTO reminders ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22) \
             RETURNING {}",
            REMINDER_COLUMNS, REMINDER_COLUMNS
        );
        let recurrence = reminder.recurrence.as_ref();
        let record = sqlx::query_as::<_, ReminderRecord>(&sql)
            .bind(reminder.id)
            .bind(reminder.user_id)
            .bind(reminder.profile_id)
            .bind(&reminder.title)
            .bind(&reminder.description)
            .bind(&reminder.reminder_type)
            .bind(reminder.reminder_date)
            .bind(reminder.reminder_time)
            .bind(reminder.priority.as_str())
            .bind(reminder.is_active)
            .bind(reminder.is_completed)
            .bind(reminder.completed_at)
            .bind(recurrence.is_some())
            .bind(recurrence.map(|r| r.pattern.as_str()))
            .bind(interval_column(recurrence)?)
            .bind(recurrence.and_then(|r| r.end_date))
            .bind(reminder.browser_notification)
            .bind(reminder.notification_minutes_before)
            .bind(reminder.snoozed_until)
            .bind(snooze_count_column(reminder.snooze_count))
            .bind(reminder.created_at)
            .bind(reminder.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    PortError::Invalid(format!("Reminder {} already exists", reminder.id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn update_reminder(&self, reminder: &Reminder) -> PortResult<()> {
        let recurrence = reminder.recurrence.as_ref();
        let result = sqlx::query(
            "UPDATE reminders SET profile_id = $3, title = $4, description = $5, \
             reminder_type = $6, reminder_date = $7, reminder_time = $8, priority = $9, \
             is_active = $10, is_recurring = $11, recurrence_pattern = $12, \
             recurrence_interval = $13, recurrence_end_date = $14, browser_notification = $15, \
             notification_minutes_before = $16, updated_at = $17 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(reminder.id)
        .bind(reminder.user_id)
        .bind(reminder.profile_id)
        .bind(&reminder.title)
        .bind(&reminder.description)
        .bind(&reminder.reminder_type)
        .bind(reminder.reminder_date)
        .bind(reminder.reminder_time)
        .bind(reminder.priority.as_str())
        .bind(reminder.is_active)
        .bind(recurrence.is_some())
        .bind(recurrence.map(|r| r.pattern.as_str()))
        .bind(interval_column(recurrence)?)
        .bind(recurrence.and_then(|r| r.end_date))
        .bind(reminder.browser_notification)
        .bind(reminder.notification_minutes_before)
        .bind(reminder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(not_found(reminder.id));
        }
        Ok(())
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND user_id = $2")
            .bind(reminder_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(not_found(reminder_id));
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE reminders SET is_completed = TRUE, completed_at = $3, updated_at = $3 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(reminder_id)
        .bind(user_id)
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(not_found(reminder_id));
        }
        Ok(())
    }

    async fn mark_snoozed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        snoozed_until: DateTime<Utc>,
        snooze_count: u32,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE reminders SET snoozed_until = $3, snooze_count = $4, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(reminder_id)
        .bind(user_id)
        .bind(snoozed_until)
        .bind(snooze_count_column(snooze_count))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(not_found(reminder_id));
        }
        Ok(())
    }
}
