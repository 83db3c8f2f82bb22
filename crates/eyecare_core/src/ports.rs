//! crates/eyecare_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or browsers.

use crate::domain::{EvaluationError, NotificationRequest, PermissionState, Reminder};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Invalid(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

impl From<EvaluationError> for PortError {
    fn from(error: EvaluationError) -> Self {
        PortError::Invalid(error.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The Record Store. Every call is scoped to the owning user.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn list_reminders(&self, user_id: Uuid) -> PortResult<Vec<Reminder>>;

    /// Active, non-completed reminders dated on or after `from` whose notification
    /// window opens on or before `to`. A reminder dated past `to` is still returned
    /// when its lead time reaches back into the range.
    async fn list_pending_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Reminder>>;

    async fn get_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<Reminder>;

    async fn create_reminder(&self, reminder: Reminder) -> PortResult<Reminder>;

    async fn update_reminder(&self, reminder: &Reminder) -> PortResult<()>;

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> PortResult<()>;

    async fn mark_completed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn mark_snoozed(
        &self,
        user_id: Uuid,
        reminder_id: Uuid,
        snoozed_until: DateTime<Utc>,
        snooze_count: u32,
    ) -> PortResult<()>;
}

/// The local notification capability of the user's browser.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// The permission state last reported by the client.
    async fn permission(&self) -> PermissionState;

    /// Asks the client to prompt for permission and returns the state known right now.
    async fn request_permission(&self) -> PortResult<PermissionState>;

    /// Displays a notification. Fire-and-forget: no acknowledgment is awaited.
    async fn show(&self, notification: &NotificationRequest) -> PortResult<()>;
}
