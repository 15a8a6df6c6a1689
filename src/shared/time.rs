//! UTC calendar helpers for day and week buckets.
//!
//! All bucket boundaries are half-open: `[start, end)`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// `[00:00 of date, 00:00 of date + 1)`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date);
    (start, start + Duration::days(1))
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// `[Monday 00:00, next Monday 00:00)` for the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(week_start(date));
    (start, start + Duration::weeks(1))
}

/// Last day of the given month, `None` if the month is out of range.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_bounds_cover_24_hours() {
        let (start, end) = day_bounds(date(2025, 7, 8));
        assert_eq!(start.to_rfc3339(), "2025-07-08T00:00:00+00:00");
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-07-10 is a Thursday
        let monday = week_start(date(2025, 7, 10));
        assert_eq!(monday, date(2025, 7, 7));
        assert_eq!(monday.weekday(), Weekday::Mon);

        // A Monday is its own week start, a Sunday belongs to the previous Monday
        assert_eq!(week_start(date(2025, 7, 7)), date(2025, 7, 7));
        assert_eq!(week_start(date(2025, 7, 13)), date(2025, 7, 7));
    }

    #[test]
    fn week_bounds_span_seven_days() {
        let (start, end) = week_bounds(date(2025, 7, 10));
        assert_eq!(start, start_of_day(date(2025, 7, 7)));
        assert_eq!(end, start_of_day(date(2025, 7, 14)));
    }

    #[test]
    fn last_day_of_month_handles_december_and_leap_years() {
        assert_eq!(last_day_of_month(2025, 12), Some(date(2025, 12, 31)));
        assert_eq!(last_day_of_month(2024, 2), Some(date(2024, 2, 29)));
        assert_eq!(last_day_of_month(2025, 2), Some(date(2025, 2, 28)));
        assert_eq!(last_day_of_month(2025, 13), None);
    }
}
