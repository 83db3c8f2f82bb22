//! crates/eyecare_core/src/memory.rs
//!
//! An in-memory `ReminderRepository`, used by tests in place of the hosted store.

use crate::domain::Reminder;
use crate::ports::{PortError, PortResult, ReminderRepository};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryReminderRepository {
    reminders: Mutex<HashMap<Uuid, Reminder>>,
    fail_reads: AtomicBool,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.reminders.lock() {
            map.extend(reminders.into_iter().map(|r| (r.id, r)));
        }
        repo
    }

    /// Makes every subsequent read fail, to simulate an unreachable store.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, HashMap<Uuid, Reminder>>> {
        self.reminders
            .lock()
            .map_err(|_| PortError::Unexpected("reminder store lock poisoned".to_string()))
    }

    fn check_reads(&self) -> PortResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("record store unreachable".to_string()));
        }
        Ok(())
    }

    fn owned_mut<'a>(
        map: &'a mut HashMap<Uuid, Reminder>,
        user_id: Uuid,
        reminder_id: Uuid,
    ) -> PortResult<&'a mut Reminder> {
        map.get_mut(&reminder_id)
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Reminder {} not found", reminder_id)))
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>> {
        self.check_reads()?;
        let map = self.lock()?;
        let mut reminders: Vec<Reminder> = map
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.created_at);
        Ok(reminders)
    }

    async fn list_pending_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Reminder>> {
        self.check_reads()?;
        let map = self.lock()?;
        Ok(map
            .values()
            .filter(|r| r.user_id == user_id && r.is_active && !r.is_completed)
            .filter(|r| {
                r.reminder_date.is_some_and(|d| {
                    d >= from
                        && d.checked_sub_signed(Duration::days(r.lead_days()))
                            .is_none_or(|opens| opens <= to)
                })
            })
            .cloned()
            .collect())
    }

    async fn get_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<Reminder> {
        self.check_reads()?;
        let map = self.lock()?;
        map.get(&reminder_id)
            .filter(|r| r.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Reminder {} not found", reminder_id)))
    }

    async fn create_reminder(&self, reminder: Reminder) -> PortResult<Reminder> {
        let mut map = self.lock()?;
        if map.contains_key(&reminder.id) {
            return Err(PortError::Invalid(format!(
                "Reminder {} already exists",
                reminder.id
            )));
        }
        map.insert(reminder.id, reminder.clone());
        Ok(reminder)
    }

    async fn update_reminder(&self, reminder: &Reminder) -> PortResult<()> {
        let mut map = self.lock()?;
        let stored = Self::owned_mut(&mut map, reminder.user_id, reminder.id)?;
        *stored = reminder.clone();
        Ok(())
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()> {
        let mut map = self.lock()?;
        Self::owned_mut(&mut map, user_id, reminder_id)?;
        map.remove(&reminder_id);
        Ok(())
    }

    async fn mark_completed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut map = self.lock()?;
        let stored = Self::owned_mut(&mut map, user_id, reminder_id)?;
        stored.is_completed = true;
        stored.completed_at = Some(completed_at);
        stored.updated_at = completed_at;
        Ok(())
    }

    async fn mark_snoozed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        snoozed_until: DateTime<Utc>,
        snooze_count: u32,
    ) -> PortResult<()> {
        let mut map = self.lock()?;
        let stored = Self::owned_mut(&mut map, user_id, reminder_id)?;
        stored.snoozed_until = Some(snoozed_until);
        stored.snooze_count = snooze_count;
        stored.updated_at = Utc::now();
        Ok(())
    }
}
