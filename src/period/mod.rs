//! Calendar-month windows used to select the current period's magazines.

use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Half-open UTC interval `[start, end)` covering one calendar month of a time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// The month containing the server's current wall-clock time.
    pub fn current() -> Option<Self> {
        Self::containing(&Local::now())
    }

    /// The month containing `now`, measured in `now`'s own time zone.
    ///
    /// Covers the first day at 00:00 through the last day at 23:59:59.999999.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<Self> {
        let tz = now.timezone();
        let local = now.naive_local();
        let first = NaiveDate::from_ymd_opt(local.year(), local.month(), 1)?;
        let next = first.checked_add_months(Months::new(1))?;

        let start = local_midnight(&tz, first)?;
        let end = local_midnight(&tz, next)?;

        Some(Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }
}

/// Midnight of `day` in `tz`; zones that skip midnight start the day an hour later.
fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> Option<DateTime<Tz>> {
    let midnight: NaiveDateTime = day.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_window_mid_month() {
        let window = MonthWindow::containing(&utc("2024-02-14T10:30:00Z")).unwrap();
        assert_eq!(window.start, utc("2024-02-01T00:00:00Z"));
        assert_eq!(window.end, utc("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn test_window_includes_whole_first_and_last_day() {
        let window = MonthWindow::containing(&utc("2024-02-14T10:30:00Z")).unwrap();
        assert!(window.contains(&utc("2024-02-01T00:00:00Z")));
        assert!(window.contains(&utc("2024-02-29T23:59:59.999999Z")));
        assert!(!window.contains(&utc("2024-01-31T23:59:59Z")));
        assert!(!window.contains(&utc("2024-03-01T00:00:00Z")));
    }

    #[test]
    fn test_window_december_rolls_into_next_year() {
        let window = MonthWindow::containing(&utc("2025-12-31T23:00:00Z")).unwrap();
        assert_eq!(window.start, utc("2025-12-01T00:00:00Z"));
        assert_eq!(window.end, utc("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_window_uses_local_calendar() {
        // 23:30 UTC on Jan 31 is already February in UTC+02:00
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = utc("2024-01-31T23:30:00Z").with_timezone(&offset);
        let window = MonthWindow::containing(&now).unwrap();
        assert_eq!(window.start, utc("2024-01-31T22:00:00Z"));
        assert_eq!(window.end, utc("2024-02-29T22:00:00Z"));
    }

    #[test]
    fn test_current_contains_now() {
        let window = MonthWindow::current().unwrap();
        assert!(window.contains(&Utc::now()));
    }
}
