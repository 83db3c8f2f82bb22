pub mod backup;
pub mod dto;
pub mod middleware;
pub mod poll_task;
pub mod protocol;
pub mod rest;
pub mod routes;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the binary wires into the router.
pub use backup::{export_handler, import_handler};
pub use middleware::require_user;
pub use rest::{
    complete_reminder_handler, create_reminder_handler, delete_reminder_handler,
    get_reminder_handler, list_reminders_handler, snooze_reminder_handler,
    update_reminder_handler,
};
pub use ws_handler::ws_handler;
