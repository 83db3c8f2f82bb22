//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for reminder notifications.

use eyecare_core::domain::PermissionState;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Browser notification permission, spelled the way `Notification.permission` reports it.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDto {
    Granted,
    Denied,
    Default,
}

impl From<PermissionDto> for PermissionState {
    fn from(dto: PermissionDto) -> Self {
        match dto {
            PermissionDto::Granted => PermissionState::Granted,
            PermissionDto::Denied => PermissionState::Denied,
            PermissionDto::Default => PermissionState::Default,
        }
    }
}

impl From<PermissionState> for PermissionDto {
    fn from(state: PermissionState) -> Self {
        match state {
            PermissionState::Granted => PermissionDto::Granted,
            PermissionState::Denied => PermissionDto::Denied,
            PermissionState::Default => PermissionDto::Default,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts the notification session. This must be the first message sent on the connection.
    Init {
        /// Minutes east of UTC, i.e. `-new Date().getTimezoneOffset()`.
        #[serde(default)]
        utc_offset_minutes: Option<i32>,
        permission: PermissionDto,
    },

    /// The user answered the permission prompt or changed it in browser settings.
    PermissionChanged { permission: PermissionDto },

    /// The "remind me later" action on a notification.
    Snooze { reminder_id: Uuid, minutes: i64 },

    /// The "done" action on a notification.
    Complete { reminder_id: Uuid },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the session is set up and reminders are being polled.
    SessionInitialized { user_id: Uuid },

    /// Asks the page to call `Notification.requestPermission()`.
    PermissionRequested,

    /// The page should show a notification. `tag` collapses repeats; a click opens `url`.
    Notification {
        reminder_id: Uuid,
        tag: String,
        title: String,
        body: String,
        url: String,
    },

    /// A reminder changed because of an action taken on this connection.
    ReminderUpdated { reminder_id: Uuid },

    /// Reports an error to the client, which should display an error message.
    Error { message: String },
}
