//! Date utilities for daily reset hour handling.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

/// Get adjusted "today" for a local time, based on daily_reset_hour.
///
/// If the hour is before the reset hour, "today" is actually "yesterday"
/// from a study perspective. This allows users to study late at night and have
/// it count towards the previous day.
pub fn adjusted_date<Tz: TimeZone>(now: &DateTime<Tz>, daily_reset_hour: u32) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now.clone() - Duration::days(1)).date_naive()
    } else {
        now.date_naive()
    }
}

/// Half-open `[start, end)` bounds of the study day containing `now`.
///
/// The day starts at `daily_reset_hour` in `now`'s time zone. A reset hour
/// that falls into a DST gap is resolved to the earliest valid instant.
pub fn study_day_bounds<Tz: TimeZone>(
    now: &DateTime<Tz>,
    daily_reset_hour: u32,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let date = adjusted_date(now, daily_reset_hour);
    let start = local_instant(&tz, date, daily_reset_hour);
    let end = local_instant(&tz, date + Duration::days(1), daily_reset_hour);
    (start, end)
}

fn local_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive = date.and_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // Inside a DST gap: the wall-clock hour does not exist, step past it.
        None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive)),
    }
}
