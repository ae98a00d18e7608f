use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// This is the standard way of converting a date to a string in commitstreak.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar date of `instant` as seen by somebody living in `tz`.
pub fn local_date<Src: TimeZone, Tz: TimeZone>(instant: &DateTime<Src>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Returns the first instant of `date` in `tz`.
///
/// Some zones skip midnight when switching to daylight saving time. In that case the earliest
/// valid instant of the day is used, which is found by stepping forward in one hour increments.
pub fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let mut local = date.and_time(NaiveTime::MIN);
    loop {
        if let Some(start) = tz.from_local_datetime(&local).earliest() {
            return start;
        }
        local += Duration::hours(1);
        if local.date() != date {
            // No zone skips a whole day of wall clock time in practice, keep the result sane anyway
            return tz.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        }
    }
}

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    match date.succ_opt() {
        Some(next) => day_start(next, tz),
        None => day_start(date, tz) + Duration::days(1),
    }
}

/// A single local day expressed as a pair of UTC instants. Both ends are inclusive, so `end` is
/// one second before the next local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bounds of `date` in `tz` converted to UTC. Used to narrow down what the contribution source
/// returns, the caller still has to check local dates itself.
pub fn day_window<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DayWindow {
    let start = day_start(date, tz).with_timezone(&Utc);
    let end = next_day_start(date, tz).with_timezone(&Utc) - Duration::seconds(1);
    DayWindow { start, end }
}
