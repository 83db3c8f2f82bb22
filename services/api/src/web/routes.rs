//! services/api/src/web/routes.rs
//!
//! Assembles the reminder routes behind the user-identification middleware.

use crate::web::{
    complete_reminder_handler, create_reminder_handler, delete_reminder_handler,
    export_handler, get_reminder_handler, import_handler, list_reminders_handler,
    require_user, snooze_reminder_handler, state::AppState, update_reminder_handler, ws_handler,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Every protected route, with state applied.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/reminders",
            get(list_reminders_handler).post(create_reminder_handler),
        )
        .route("/reminders/export", get(export_handler))
        .route("/reminders/import", post(import_handler))
        .route(
            "/reminders/{id}",
            get(get_reminder_handler)
                .put(update_reminder_handler)
                .delete(delete_reminder_handler),
        )
        .route("/reminders/{id}/snooze", post(snooze_reminder_handler))
        .route("/reminders/{id}/complete", post(complete_reminder_handler))
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn(require_user))
        .with_state(app_state)
}
