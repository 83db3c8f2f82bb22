//! services/api/src/adapters/browser_sink.rs
//!
//! The `NotificationSink` for one connected browser tab. Notifications are queued on
//! the connection's outbound channel; the WebSocket writer task delivers them and the
//! page shows them through the browser's Notification API.

use crate::web::protocol::{PermissionDto, ServerMessage};
use async_trait::async_trait;
use eyecare_core::domain::{NotificationRequest, PermissionState};
use eyecare_core::ports::{NotificationSink, PortError, PortResult};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

#[derive(Clone)]
pub struct BrowserNotificationSink {
    outbound: mpsc::UnboundedSender<ServerMessage>,
    permission: Arc<RwLock<PermissionState>>,
}

impl BrowserNotificationSink {
    pub fn new(outbound: mpsc::UnboundedSender<ServerMessage>, permission: PermissionState) -> Self {
        Self {
            outbound,
            permission: Arc::new(RwLock::new(permission)),
        }
    }

    /// Records the permission state most recently reported by the page.
    pub async fn set_permission(&self, permission: PermissionState) {
        *self.permission.write().await = permission;
    }

    fn send(&self, message: ServerMessage) -> PortResult<()> {
        self.outbound
            .send(message)
            .map_err(|_| PortError::Unavailable("browser connection closed".to_string()))
    }
}

#[async_trait]
impl NotificationSink for BrowserNotificationSink {
    async fn permission(&self) -> PermissionState {
        *self.permission.read().await
    }

    async fn request_permission(&self) -> PortResult<PermissionState> {
        let current = self.permission().await;
        // A denied permission cannot be re-prompted by the page.
        if current == PermissionState::Default {
            self.send(ServerMessage::PermissionRequested)?;
        }
        Ok(current)
    }

    async fn show(&self, notification: &NotificationRequest) -> PortResult<()> {
        match self.permission().await {
            PermissionState::Granted => {}
            other => {
                return Err(PortError::Unavailable(format!(
                    "notification permission is {:?}",
                    PermissionDto::from(other)
                )))
            }
        }
        self.send(ServerMessage::Notification {
            reminder_id: notification.reminder_id,
            tag: notification.tag.clone(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            url: notification.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> NotificationRequest {
        let reminder_id = Uuid::new_v4();
        NotificationRequest {
            reminder_id,
            tag: format!("reminder-{}", reminder_id),
            title: "Eye drops".to_string(),
            body: "Due Mon 10 Jun 2024 at 09:00".to_string(),
            url: "/reminders".to_string(),
        }
    }

    #[tokio::test]
    async fn test_show_queues_notification_when_granted() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = BrowserNotificationSink::new(tx, PermissionState::Granted);
        let request = request();

        sink.show(&request).await.unwrap();

        match rx.recv().await {
            Some(ServerMessage::Notification { tag, url, .. }) => {
                assert_eq!(tag, request.tag);
                assert_eq!(url, "/reminders");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_show_refuses_without_permission() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = BrowserNotificationSink::new(tx, PermissionState::Denied);

        let result = sink.show(&request()).await;

        assert!(matches!(result, Err(PortError::Unavailable(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_permission_prompts_only_when_undecided() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = BrowserNotificationSink::new(tx, PermissionState::Default);

        assert_eq!(sink.request_permission().await.unwrap(), PermissionState::Default);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::PermissionRequested)));

        sink.set_permission(PermissionState::Denied).await;
        assert_eq!(sink.request_permission().await.unwrap(), PermissionState::Denied);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_connection_is_unavailable() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = BrowserNotificationSink::new(tx, PermissionState::Granted);

        assert!(matches!(
            sink.show(&request()).await,
            Err(PortError::Unavailable(_))
        ));
    }
}
