//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a notification WebSocket.
//! It sets up the connection's sink and polling task, then handles the
//! notification actions the page sends back.

use crate::{
    adapters::BrowserNotificationSink,
    config::utc_offset_from_minutes,
    error::port_error_response,
    web::{
        poll_task::polling_process,
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, ConnectionState},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use chrono::{FixedOffset, Utc};
use eyecare_core::domain::PermissionState;
use eyecare_core::poller::NotificationPoller;
use eyecare_core::ports::{NotificationSink, PortResult};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("New notification connection established for user: {}", user_id);

    let (sender, mut receiver) = socket.split();

    // Everything bound for the browser goes through one queue, drained by this writer.
    let (outbound, outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let writer = tokio::spawn(write_process(sender, outbound_rx));

    // --- 1. Initialization Phase ---
    let (utc_offset_minutes, permission) = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => {
            match serde_json::from_str::<ClientMessage>(init_json.as_str()) {
                Ok(ClientMessage::Init {
                    utc_offset_minutes,
                    permission,
                }) => (utc_offset_minutes, PermissionState::from(permission)),
                _ => {
                    error!("First message was not a valid Init message.");
                    let _ = outbound.send(ServerMessage::Error {
                        message: "Expected an init message.".to_string(),
                    });
                    drop(outbound);
                    let _ = writer.await;
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Init message.");
            drop(outbound);
            let _ = writer.await;
            return;
        }
    };

    let zone = resolve_zone(utc_offset_minutes, app_state.config.default_utc_offset);
    let sink = Arc::new(BrowserNotificationSink::new(outbound.clone(), permission));
    let connection = ConnectionState::new(user_id, zone, sink);

    if outbound
        .send(ServerMessage::SessionInitialized { user_id })
        .is_err()
    {
        error!("Failed to send session initialized message.");
        return;
    }
    if permission == PermissionState::Default {
        if let Err(e) = connection.sink.request_permission().await {
            warn!("Failed to request notification permission: {:?}", e);
        }
    }

    // --- 2. Polling Task ---
    let poll_task = {
        let poller = NotificationPoller::new(
            app_state.db.clone(),
            connection.sink.clone(),
            connection.user_id,
        )
        .with_lookahead_days(app_state.config.lookahead_days);
        tokio::spawn(polling_process(
            poller,
            connection.zone,
            app_state.config.poll_interval,
            connection.cancellation_token.clone(),
        ))
    };

    // --- 3. Main Message Loop ---
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                let reply = handle_text_message(text.as_str(), &app_state, &connection).await;
                if let Some(reply) = reply {
                    if outbound.send(reply).is_err() {
                        break;
                    }
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket error for user {}: {}", user_id, e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    // --- 4. Cleanup ---
    connection.cancellation_token.cancel();
    if let Err(e) = poll_task.await {
        error!("Polling task ended abnormally: {:?}", e);
    }
    drop(connection);
    drop(outbound);
    let _ = writer.await;
    info!("Notification connection closed for user {}.", user_id);
}

/// Drains the outbound queue into the socket until every sender is gone.
async fn write_process(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(message) = outbound.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            error!("Failed to send message to client. Ending writer task.");
            break;
        }
    }
    let _ = sender.close().await;
}

fn resolve_zone(utc_offset_minutes: Option<i32>, default: FixedOffset) -> FixedOffset {
    match utc_offset_minutes {
        Some(minutes) => utc_offset_from_minutes(minutes).unwrap_or_else(|| {
            warn!("Ignoring invalid UTC offset {} from client.", minutes);
            default
        }),
        None => default,
    }
}

/// Handles one client message after initialization, returning the reply to send, if any.
async fn handle_text_message(
    text: &str,
    app_state: &Arc<AppState>,
    connection: &ConnectionState,
) -> Option<ServerMessage> {
    let client_msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return None;
        }
    };

    match client_msg {
        ClientMessage::PermissionChanged { permission } => {
            info!(
                "Notification permission for user {} is now {:?}.",
                connection.user_id, permission
            );
            connection.sink.set_permission(permission.into()).await;
            None
        }
        ClientMessage::Snooze {
            reminder_id,
            minutes,
        } => {
            let result = app_state
                .reminders
                .snooze(connection.user_id, reminder_id, minutes, Utc::now())
                .await;
            Some(action_reply(reminder_id, result.map(|_| ())))
        }
        ClientMessage::Complete { reminder_id } => {
            let result = app_state
                .reminders
                .complete(connection.user_id, reminder_id, Utc::now())
                .await;
            Some(action_reply(reminder_id, result.map(|_| ())))
        }
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
            None
        }
    }
}

fn action_reply(reminder_id: Uuid, result: PortResult<()>) -> ServerMessage {
    match result {
        Ok(()) => ServerMessage::ReminderUpdated { reminder_id },
        Err(e) => {
            warn!("Reminder action on {} failed: {:?}", reminder_id, e);
            let (_, message) = port_error_response(&e);
            ServerMessage::Error { message }
        }
    }
}
