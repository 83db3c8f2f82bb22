pub mod domain;
pub mod evaluator;
pub mod memory;
pub mod poller;
pub mod ports;
pub mod service;

pub use domain::{
    EvaluationError, NotificationRequest, PermissionState, Priority, ProfileScope, Recurrence,
    RecurrencePattern, Reminder, ReminderFilter, ReminderStatus, StatusFilter,
};
pub use evaluator::{classify, due_instant, filter_reminders, is_notification_due, EvaluatedReminder};
pub use poller::{NotificationPoller, SkipReason, TickReport};
pub use ports::{NotificationSink, PortError, PortResult, ReminderRepository};
pub use service::ReminderService;
