//! crates/eyecare_core/src/evaluator.rs
//!
//! Pure reminder evaluation: due instants, classification relative to "now",
//! the notification window, and filtering for display.
//!
//! Every function here is a pure function of its inputs. The caller supplies
//! "now" in the user's time zone; reminder dates and times are wall-clock values
//! interpreted in that same zone.

use crate::domain::{
    NotificationRequest, ProfileScope, Reminder, ReminderFilter, ReminderStatus, StatusFilter,
    REMINDERS_URL,
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use std::cmp::Ordering;

/// Reminders due within this many days of "now" are classified as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// A reminder together with everything derived from it at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedReminder {
    pub reminder: Reminder,
    pub status: ReminderStatus,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub notify: bool,
}

/// Combines the reminder's date and time (midnight when absent) into one instant in `tz`.
///
/// Returns `None` for records without a date. An ambiguous local time resolves to
/// the earlier instant; a local time skipped by a clock change moves forward an hour.
pub fn due_instant<Tz: TimeZone>(reminder: &Reminder, tz: &Tz) -> Option<DateTime<Tz>> {
    let date = reminder.reminder_date?;
    let local = date.and_time(reminder.reminder_time.unwrap_or_default());

    tz.from_local_datetime(&local).earliest().or_else(|| {
        local
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
    })
}

pub fn classify<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> ReminderStatus {
    if reminder.is_completed {
        return ReminderStatus::Completed;
    }
    if !reminder.is_active {
        return ReminderStatus::Inactive;
    }
    let Some(due) = due_instant(reminder, &now.timezone()) else {
        return ReminderStatus::Undated;
    };

    let today = now.date_naive();
    let due_date = due.date_naive();

    if due_date == today {
        ReminderStatus::Today
    } else if due_date < today {
        ReminderStatus::Overdue
    } else if due <= now.clone() + Duration::days(UPCOMING_WINDOW_DAYS) {
        ReminderStatus::Upcoming
    } else {
        ReminderStatus::Scheduled
    }
}

/// The closed interval `[due - minutes_before, due]` during which a notification may fire.
pub fn notification_window<Tz: TimeZone>(
    reminder: &Reminder,
    tz: &Tz,
) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    let due = due_instant(reminder, tz)?;
    let lead = Duration::minutes(i64::from(reminder.notification_minutes_before.max(0)));
    let opens = due.clone().checked_sub_signed(lead)?;
    Some((opens, due))
}

/// Whether a local notification should be shown for `reminder` at `now`.
pub fn is_notification_due<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> bool {
    match classify(reminder, now) {
        ReminderStatus::Completed | ReminderStatus::Inactive | ReminderStatus::Undated => {
            return false
        }
        _ => {}
    }
    if !reminder.browser_notification {
        return false;
    }
    if reminder.is_snoozed_at(now.with_timezone(&Utc)) {
        return false;
    }

    match notification_window(reminder, &now.timezone()) {
        Some((opens, closes)) => *now >= opens && *now <= closes,
        None => false,
    }
}

pub fn evaluate<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> EvaluatedReminder {
    EvaluatedReminder {
        reminder: reminder.clone(),
        status: classify(reminder, now),
        due_at: due_instant(reminder, &now.timezone()).map(|due| due.fixed_offset()),
        notify: is_notification_due(reminder, now),
    }
}

/// Builds the notification shown for a due reminder.
pub fn notification_for(reminder: &Reminder) -> NotificationRequest {
    let when = match (reminder.reminder_date, reminder.reminder_time) {
        (Some(date), Some(time)) => {
            format!("Due {} at {}", date.format("%a %d %b %Y"), time.format("%H:%M"))
        }
        (Some(date), None) => format!("Due {} (all day)", date.format("%a %d %b %Y")),
        (None, _) => "No due date".to_string(),
    };
    let body = match reminder.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => format!("{}\n{}", description, when),
        _ => when,
    };

    NotificationRequest {
        reminder_id: reminder.id,
        tag: format!("reminder-{}", reminder.id),
        title: reminder.title.clone(),
        body,
        url: REMINDERS_URL.to_string(),
    }
}

/// Applies `filter` and returns the matches sorted by due instant, undated last.
pub fn filter_reminders<Tz: TimeZone>(
    reminders: &[Reminder],
    filter: &ReminderFilter,
    now: &DateTime<Tz>,
) -> Vec<EvaluatedReminder> {
    let needle = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<EvaluatedReminder> = reminders
        .iter()
        .filter(|r| matches_profile(r, filter.profile))
        .filter(|r| needle.as_deref().is_none_or(|q| matches_text(r, q)))
        .map(|r| evaluate(r, now))
        .filter(|e| matches_status(e.status, filter.status))
        .collect();

    matched.sort_by(|a, b| match (&a.due_at, &b.due_at) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    matched
}

fn matches_status(status: ReminderStatus, filter: StatusFilter) -> bool {
    match filter {
        StatusFilter::All => true,
        StatusFilter::Active => status != ReminderStatus::Completed,
        StatusFilter::Completed => status == ReminderStatus::Completed,
        StatusFilter::Inactive => status == ReminderStatus::Inactive,
        StatusFilter::Upcoming => status == ReminderStatus::Upcoming,
    }
}

fn matches_profile(reminder: &Reminder, scope: Option<ProfileScope>) -> bool {
    match scope {
        None => true,
        Some(ProfileScope::General) => reminder.profile_id.is_none(),
        Some(ProfileScope::Profile(id)) => reminder.profile_id == Some(id),
    }
}

// `needle` is already lowercased.
fn matches_text(reminder: &Reminder, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(&reminder.title)
        || reminder.description.as_deref().is_some_and(contains)
        || reminder.reminder_type.as_deref().is_some_and(contains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, SNOOZE_ONE_HOUR};
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reminder_on(day: NaiveDate) -> Reminder {
        Reminder::new(Uuid::new_v4(), "Eye drops", day)
    }

    fn nine_am_reminder() -> Reminder {
        let mut reminder = reminder_on(date(2024, 6, 10));
        reminder.reminder_time = NaiveTime::from_hms_opt(9, 0, 0);
        reminder.notification_minutes_before = 60;
        reminder.browser_notification = true;
        reminder
    }

    #[test]
    fn test_due_instant_defaults_to_midnight() {
        let reminder = reminder_on(date(2024, 6, 10));
        assert_eq!(due_instant(&reminder, &tz()), Some(at(2024, 6, 10, 0, 0)));
    }

    #[test]
    fn test_due_instant_across_clock_changes() {
        let london = chrono_tz::Europe::London;
        let mut reminder = reminder_on(date(2024, 3, 31));
        reminder.reminder_time = NaiveTime::from_hms_opt(1, 30, 0);

        // 01:30 does not exist on the spring-forward day; it moves to 02:30 BST.
        let due = due_instant(&reminder, &london).unwrap();
        assert_eq!(
            due.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap()
        );

        // 01:30 happens twice on the fall-back day; the BST reading comes first.
        reminder.reminder_date = Some(date(2024, 10, 27));
        let due = due_instant(&reminder, &london).unwrap();
        assert_eq!(
            due.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_due_instant_missing_date_is_none() {
        let mut reminder = reminder_on(date(2024, 6, 10));
        reminder.reminder_date = None;
        assert_eq!(due_instant(&reminder, &tz()), None);
        assert_eq!(classify(&reminder, &at(2024, 6, 10, 8, 0)), ReminderStatus::Undated);
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 0)));
    }

    #[test]
    fn test_classify_relative_days() {
        let now = at(2024, 6, 10, 14, 30);

        assert_eq!(classify(&reminder_on(date(2024, 6, 10)), &now), ReminderStatus::Today);
        assert_eq!(classify(&reminder_on(date(2024, 6, 9)), &now), ReminderStatus::Overdue);
        assert_eq!(classify(&reminder_on(date(2024, 6, 13)), &now), ReminderStatus::Upcoming);
        assert_eq!(classify(&reminder_on(date(2024, 6, 17)), &now), ReminderStatus::Upcoming);
        assert_eq!(classify(&reminder_on(date(2024, 6, 20)), &now), ReminderStatus::Scheduled);
    }

    #[test]
    fn test_classify_uses_local_calendar_date() {
        // 23:30 UTC on the 9th is already the 10th at +02:00.
        let now = Utc
            .with_ymd_and_hms(2024, 6, 9, 23, 30, 0)
            .unwrap()
            .with_timezone(&tz());
        assert_eq!(classify(&reminder_on(date(2024, 6, 10)), &now), ReminderStatus::Today);

        let utc_now = Utc.with_ymd_and_hms(2024, 6, 9, 23, 30, 0).unwrap();
        assert_eq!(
            classify(&reminder_on(date(2024, 6, 10)), &utc_now),
            ReminderStatus::Upcoming
        );
    }

    #[test]
    fn test_completed_wins_over_everything() {
        let now = at(2024, 6, 10, 8, 30);
        for active in [true, false] {
            for notify in [true, false] {
                for day in [date(2024, 6, 9), date(2024, 6, 10), date(2024, 7, 1)] {
                    let mut reminder = nine_am_reminder();
                    reminder.reminder_date = Some(day);
                    reminder.is_active = active;
                    reminder.browser_notification = notify;
                    reminder.is_completed = true;

                    assert_eq!(classify(&reminder, &now), ReminderStatus::Completed);
                    assert!(!is_notification_due(&reminder, &now));
                }
            }
        }
    }

    #[test]
    fn test_inactive_is_never_notified() {
        let mut reminder = nine_am_reminder();
        reminder.is_active = false;
        let now = at(2024, 6, 10, 8, 30);

        assert_eq!(classify(&reminder, &now), ReminderStatus::Inactive);
        assert!(!is_notification_due(&reminder, &now));
    }

    #[test]
    fn test_notification_window_boundaries() {
        let reminder = nine_am_reminder();

        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 8, 0)));
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 7, 59)));
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 9, 1)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 9, 0)));
    }

    #[test]
    fn test_notification_requires_opt_in() {
        let mut reminder = nine_am_reminder();
        reminder.browser_notification = false;
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 30)));
    }

    #[test]
    fn test_negative_lead_time_means_at_due_instant() {
        let mut reminder = nine_am_reminder();
        reminder.notification_minutes_before = -30;

        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 59)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 9, 0)));
    }

    #[test]
    fn test_eligibility_is_pure() {
        let reminder = nine_am_reminder();
        let now = at(2024, 6, 10, 8, 15);
        let first = is_notification_due(&reminder, &now);
        let second = is_notification_due(&reminder, &now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snooze_suppresses_until_expiry() {
        let mut reminder = nine_am_reminder();
        let snoozed_at = at(2024, 6, 10, 8, 0);
        reminder
            .snooze(SNOOZE_ONE_HOUR / 2, snoozed_at.with_timezone(&Utc))
            .unwrap();

        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 0)));
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 29)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 8, 30)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 8, 45)));
        // Classification is unaffected by snoozing.
        assert_eq!(classify(&reminder, &at(2024, 6, 10, 8, 10)), ReminderStatus::Today);
    }

    #[test]
    fn test_one_hour_snooze_before_window_opens() {
        let mut reminder = nine_am_reminder();
        reminder
            .snooze(SNOOZE_ONE_HOUR, at(2024, 6, 10, 7, 30).with_timezone(&Utc))
            .unwrap();

        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 0)));
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 29)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 8, 30)));
        assert!(is_notification_due(&reminder, &at(2024, 6, 10, 9, 0)));
    }

    #[test]
    fn test_snooze_past_due_instant_never_fires() {
        let mut reminder = nine_am_reminder();
        reminder
            .snooze(SNOOZE_ONE_HOUR, at(2024, 6, 10, 8, 30).with_timezone(&Utc))
            .unwrap();

        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 8, 59)));
        assert!(!is_notification_due(&reminder, &at(2024, 6, 10, 9, 30)));
    }

    #[test]
    fn test_notification_for_builds_tagged_request() {
        let mut reminder = nine_am_reminder();
        reminder.description = Some("Left eye, two drops".to_string());

        let request = notification_for(&reminder);

        assert_eq!(request.tag, format!("reminder-{}", reminder.id));
        assert_eq!(request.title, "Eye drops");
        assert_eq!(request.body, "Left eye, two drops\nDue Mon 10 Jun 2024 at 09:00");
        assert_eq!(request.url, REMINDERS_URL);
    }

    #[test]
    fn test_notification_for_all_day_without_description() {
        let reminder = reminder_on(date(2024, 6, 10));
        assert_eq!(notification_for(&reminder).body, "Due Mon 10 Jun 2024 (all day)");
    }

    fn fixture() -> Vec<Reminder> {
        let user = Uuid::new_v4();
        let profile = Uuid::new_v4();

        let mut drops = Reminder::new(user, "Eye drops", date(2024, 6, 12));
        drops.reminder_type = Some("Medication".to_string());
        drops.profile_id = Some(profile);

        let mut exam = Reminder::new(user, "Annual exam", date(2024, 6, 11));
        exam.description = Some("Bring old glasses".to_string());
        exam.priority = Priority::High;

        let mut contacts = Reminder::new(user, "Replace contacts", date(2024, 7, 30));
        contacts.profile_id = Some(profile);

        let mut done = Reminder::new(user, "Order drops", date(2024, 6, 1));
        done.is_completed = true;

        let mut paused = Reminder::new(user, "Vision test", date(2024, 6, 13));
        paused.is_active = false;

        let mut broken = Reminder::new(user, "Broken drops record", date(2024, 6, 11));
        broken.reminder_date = None;

        vec![contacts, drops, done, broken, paused, exam]
    }

    fn titles(results: &[EvaluatedReminder]) -> Vec<&str> {
        results.iter().map(|e| e.reminder.title.as_str()).collect()
    }

    #[test]
    fn test_filter_all_sorted_by_due_instant_undated_last() {
        let now = at(2024, 6, 10, 12, 0);
        let results = filter_reminders(&fixture(), &ReminderFilter::default(), &now);

        assert_eq!(
            titles(&results),
            vec![
                "Order drops",
                "Annual exam",
                "Eye drops",
                "Vision test",
                "Replace contacts",
                "Broken drops record",
            ]
        );
    }

    #[test]
    fn test_filter_by_status() {
        let now = at(2024, 6, 10, 12, 0);
        let reminders = fixture();

        let upcoming = filter_reminders(
            &reminders,
            &ReminderFilter::with_status(StatusFilter::Upcoming),
            &now,
        );
        assert_eq!(titles(&upcoming), vec!["Annual exam", "Eye drops"]);

        let active = filter_reminders(
            &reminders,
            &ReminderFilter::with_status(StatusFilter::Active),
            &now,
        );
        assert_eq!(active.len(), 5);

        let completed = filter_reminders(
            &reminders,
            &ReminderFilter::with_status(StatusFilter::Completed),
            &now,
        );
        assert_eq!(titles(&completed), vec!["Order drops"]);

        let inactive = filter_reminders(
            &reminders,
            &ReminderFilter::with_status(StatusFilter::Inactive),
            &now,
        );
        assert_eq!(titles(&inactive), vec!["Vision test"]);
    }

    #[test]
    fn test_text_query_matches_title_description_and_type() {
        let now = at(2024, 6, 10, 12, 0);
        let reminders = fixture();

        let by_title = filter_reminders(&reminders, &ReminderFilter::default().with_query("DROPS"), &now);
        assert_eq!(titles(&by_title), vec!["Order drops", "Eye drops", "Broken drops record"]);

        let by_description =
            filter_reminders(&reminders, &ReminderFilter::default().with_query("glasses"), &now);
        assert_eq!(titles(&by_description), vec!["Annual exam"]);

        let by_type =
            filter_reminders(&reminders, &ReminderFilter::default().with_query("medication"), &now);
        assert_eq!(titles(&by_type), vec!["Eye drops"]);

        let blank = filter_reminders(&reminders, &ReminderFilter::default().with_query("   "), &now);
        assert_eq!(blank.len(), reminders.len());
    }

    #[test]
    fn test_query_narrows_status_filter() {
        let now = at(2024, 6, 10, 12, 0);
        let reminders = fixture();
        let upcoming = ReminderFilter::with_status(StatusFilter::Upcoming);

        let all_upcoming = filter_reminders(&reminders, &upcoming, &now);
        let narrowed = filter_reminders(&reminders, &upcoming.clone().with_query("eye"), &now);

        assert!(!narrowed.is_empty());
        assert!(narrowed.iter().all(|e| all_upcoming.contains(e)));
    }

    #[test]
    fn test_profile_scope() {
        let now = at(2024, 6, 10, 12, 0);
        let reminders = fixture();
        let profile = reminders[0].profile_id.unwrap();

        let scoped = filter_reminders(
            &reminders,
            &ReminderFilter::default().with_profile(ProfileScope::Profile(profile)),
            &now,
        );
        assert_eq!(titles(&scoped), vec!["Eye drops", "Replace contacts"]);

        let general = filter_reminders(
            &reminders,
            &ReminderFilter::default().with_profile(ProfileScope::General),
            &now,
        );
        assert_eq!(general.len(), 4);
    }

    #[test]
    fn test_evaluate_reports_due_at_in_callers_zone() {
        let reminder = nine_am_reminder();
        let evaluated = evaluate(&reminder, &at(2024, 6, 10, 8, 30));

        assert_eq!(evaluated.status, ReminderStatus::Today);
        assert_eq!(evaluated.due_at, Some(at(2024, 6, 10, 9, 0)));
        assert!(evaluated.notify);
    }
}
