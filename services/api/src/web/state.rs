//! services/api/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use crate::adapters::BrowserNotificationSink;
use crate::config::{utc_offset_from_minutes, Config};
use chrono::FixedOffset;
use eyecare_core::ports::ReminderRepository;
use eyecare_core::service::ReminderService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn ReminderRepository>,
    pub reminders: ReminderService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<dyn ReminderRepository>, config: Arc<Config>) -> Self {
        Self {
            reminders: ReminderService::new(db.clone()),
            db,
            config,
        }
    }

    /// Resolves the caller's zone, falling back to the configured default.
    pub fn zone(&self, utc_offset_minutes: Option<i32>) -> Result<FixedOffset, String> {
        match utc_offset_minutes {
            Some(minutes) => utc_offset_from_minutes(minutes)
                .ok_or_else(|| format!("{} is not a valid UTC offset in minutes", minutes)),
            None => Ok(self.config.default_utc_offset),
        }
    }
}

//=========================================================================================
// ConnectionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active notification WebSocket.
pub struct ConnectionState {
    pub user_id: Uuid,
    pub zone: FixedOffset,
    pub sink: Arc<BrowserNotificationSink>,
    /// A token to stop the connection's polling task on teardown.
    pub cancellation_token: CancellationToken,
}

impl ConnectionState {
    pub fn new(user_id: Uuid, zone: FixedOffset, sink: Arc<BrowserNotificationSink>) -> Self {
        Self {
            user_id,
            zone,
            sink,
            cancellation_token: CancellationToken::new(),
        }
    }
}
