//! services/api/src/web/poll_task.rs
//!
//! The per-connection worker that periodically checks the user's reminders and
//! pushes due notifications to the browser.

use chrono::{FixedOffset, Utc};
use eyecare_core::poller::NotificationPoller;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs `poller` every `period` until `cancellation_token` fires.
///
/// The first check happens immediately so a freshly opened tab sees anything
/// already due.
pub async fn polling_process(
    poller: NotificationPoller,
    zone: FixedOffset,
    period: Duration,
    cancellation_token: CancellationToken,
) {
    info!(
        "Polling process started for user {} every {:?}.",
        poller.user_id(),
        period
    );

    let mut ticker = interval(period);
    // A tab that was asleep gets one check on wake, not a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Polling process cancelled for user {}.", poller.user_id());
                return;
            }
            _ = ticker.tick() => {
                let now = Utc::now().with_timezone(&zone);
                let report = poller.tick(&now).await;
                debug!(
                    "Reminder check for user {}: fetched {}, due {}, notified {}",
                    poller.user_id(),
                    report.fetched,
                    report.due,
                    report.notified.len()
                );
            }
        }
    }
}
