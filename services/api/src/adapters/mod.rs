pub mod browser_sink;
pub mod db;

pub use browser_sink::BrowserNotificationSink;
pub use db::DbAdapter;
