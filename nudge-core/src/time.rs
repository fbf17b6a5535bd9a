//! Time utilities: lifecycle windows, the "no reminder" sentinel, and
//! timezone-aware parsing for the scheduling picker.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Grace window between acknowledging a reminder and "did you start?".
pub const COUNTDOWN: Duration = Duration::seconds(15);
/// Deferral after the second "not started" answer.
pub const SECOND_DECLINE_DEFERRAL: Duration = Duration::seconds(60);
/// Follow-up window before "are you done?".
pub const COMPLETION_FOLLOW_UP: Duration = Duration::minutes(10);
/// Snooze and unblock re-queue horizon.
pub const SNOOZE: Duration = Duration::minutes(5);
/// Lifetime of the celebration banner.
pub const CELEBRATION: Duration = Duration::seconds(4);

/// Offset of the canonical "no reminder" sentinel (100 years).
pub const NO_REMINDER_OFFSET_MS: i64 = 3_153_600_000_000;

/// Anything scheduled further out than this is treated as "no reminder".
pub const REMINDER_HORIZON: Duration = Duration::days(365);

/// The far-future timestamp used for tasks without a reminder.
pub fn no_reminder(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::milliseconds(NO_REMINDER_OFFSET_MS)
}

/// True when `scheduled` lies within the reminder horizon of `now`.
pub fn has_reminder(scheduled: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    scheduled - now <= REMINDER_HORIZON
}

/// `None` when the offset falls outside the representable date range.
pub fn minutes_from(now: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(minutes).and_then(|d| now.checked_add_signed(d))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("invalid timezone: {0}")]
    Timezone(String),
    #[error("could not read '{0}' as a date and time (expected YYYY-MM-DD HH:MM)")]
    Format(String),
    #[error("'{0}' does not exist or is ambiguous in {1}")]
    Ambiguous(String, String),
}

/// Parse a local date+time like "2026-02-20 23:59" (or "2026-02-20T23:59")
/// in an IANA tz like "America/Chicago", returning UTC.
pub fn parse_local_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let zone: Tz = tz
        .parse()
        .map_err(|_| TimeParseError::Timezone(tz.to_string()))?;

    let trimmed = local.trim();
    let ndt = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TimeParseError::Format(trimmed.to_string()))?;

    let local_dt = zone
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| TimeParseError::Ambiguous(trimmed.to_string(), tz.to_string()))?;

    Ok(local_dt.with_timezone(&Utc))
}
