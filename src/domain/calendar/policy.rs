//! Calendar policy: operating hours, break window, weekly closures, holidays.
//!
//! Pure and deterministic: the same date and policy always yield the same
//! windows. Times are wall-clock times interpreted in UTC.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use crate::domain::{DomainError, DomainResult};

/// A half-open bookable interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `other` lies entirely inside this window
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct CalendarPolicy {
    opening: NaiveTime,
    closing: NaiveTime,
    lunch_break: Option<(NaiveTime, NaiveTime)>,
    slot_length: Duration,
    closed_weekdays: Vec<Weekday>,
    holidays: BTreeSet<NaiveDate>,
}

impl CalendarPolicy {
    /// Opening hours sliced into `slot_length` windows, no break, open every day.
    pub fn new(opening: NaiveTime, closing: NaiveTime, slot_length: Duration) -> DomainResult<Self> {
        if opening >= closing {
            return Err(DomainError::Validation(format!(
                "opening time {} must be before closing time {}",
                opening, closing
            )));
        }
        if slot_length <= Duration::zero() {
            return Err(DomainError::Validation(
                "slot length must be positive".to_string(),
            ));
        }
        Ok(Self {
            opening,
            closing,
            lunch_break: None,
            slot_length,
            closed_weekdays: Vec::new(),
            holidays: BTreeSet::new(),
        })
    }

    pub fn with_break(mut self, start: NaiveTime, end: NaiveTime) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::Validation(format!(
                "break start {} must be before break end {}",
                start, end
            )));
        }
        self.lunch_break = Some((start, end));
        Ok(self)
    }

    pub fn with_closed_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.closed_weekdays = weekdays.into_iter().collect();
        self
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays = holidays.into_iter().collect();
        self
    }

    pub fn slot_length(&self) -> Duration {
        self.slot_length
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.closed_weekdays.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    /// Bookable windows for `date` in chronological order.
    ///
    /// Empty for non-working days. A window is dropped only when it lies
    /// entirely inside the break; the last window must end by closing time.
    pub fn daily_windows(&self, date: NaiveDate) -> Vec<TimeWindow> {
        if !self.is_working_day(date) {
            return Vec::new();
        }

        let closing = date.and_time(self.closing);
        let lunch_break = self.lunch_break.map(|(start, end)| TimeWindow {
            start: date.and_time(start).and_utc(),
            end: date.and_time(end).and_utc(),
        });

        let mut windows = Vec::new();
        let mut cursor = date.and_time(self.opening);
        while cursor + self.slot_length <= closing {
            let next = cursor + self.slot_length;
            let window = TimeWindow {
                start: cursor.and_utc(),
                end: next.and_utc(),
            };
            if !lunch_break.is_some_and(|b| b.contains(&window)) {
                windows.push(window);
            }
            cursor = next;
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn garage_policy() -> CalendarPolicy {
        CalendarPolicy::new(t(8, 0), t(18, 0), Duration::minutes(60))
            .unwrap()
            .with_break(t(12, 0), t(14, 0))
            .unwrap()
            .with_closed_weekdays([Weekday::Sun])
            .with_holidays([date(2025, 7, 14), date(2025, 8, 15)])
    }

    #[test]
    fn tuesday_yields_eight_hourly_windows_outside_break() {
        let tuesday = date(2025, 7, 8);
        assert_eq!(tuesday.weekday(), Weekday::Tue);

        let windows = garage_policy().daily_windows(tuesday);
        assert_eq!(windows.len(), 8);

        let lunch = TimeWindow {
            start: tuesday.and_time(t(12, 0)).and_utc(),
            end: tuesday.and_time(t(14, 0)).and_utc(),
        };
        for w in &windows {
            assert_eq!(w.end - w.start, Duration::hours(1));
            assert!(
                w.end <= lunch.start || w.start >= lunch.end,
                "window {:?} overlaps the break",
                w
            );
        }
        assert_eq!(windows[0].start, tuesday.and_time(t(8, 0)).and_utc());
        assert_eq!(windows[7].end, tuesday.and_time(t(18, 0)).and_utc());
    }

    #[test]
    fn windows_are_chronological_and_disjoint() {
        let windows = garage_policy().daily_windows(date(2025, 7, 9));
        for pair in windows.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn weekly_closure_yields_nothing() {
        let sunday = date(2025, 7, 13);
        let policy = garage_policy();
        assert!(!policy.is_working_day(sunday));
        assert!(policy.daily_windows(sunday).is_empty());
    }

    #[test]
    fn holiday_yields_nothing() {
        let bastille_day = date(2025, 7, 14);
        assert_eq!(bastille_day.weekday(), Weekday::Mon);
        let policy = garage_policy();
        assert!(!policy.is_working_day(bastille_day));
        assert!(policy.daily_windows(bastille_day).is_empty());
    }

    #[test]
    fn holidays_are_swappable() {
        let policy = garage_policy().with_holidays([date(2026, 1, 1)]);
        assert!(policy.is_working_day(date(2025, 7, 14)));
        assert!(!policy.is_working_day(date(2026, 1, 1)));
    }

    #[test]
    fn window_straddling_break_is_kept() {
        // 90-minute windows: 08:00, 09:30, 11:00-12:30 straddles the break start,
        // 12:30-14:00 is inside, 14:00, 15:30, 17:00 would end at 18:30.
        let policy = CalendarPolicy::new(t(8, 0), t(18, 0), Duration::minutes(90))
            .unwrap()
            .with_break(t(12, 0), t(14, 0))
            .unwrap();
        let starts: Vec<NaiveTime> = policy
            .daily_windows(date(2025, 7, 8))
            .iter()
            .map(|w| w.start.time())
            .collect();
        assert_eq!(starts, vec![t(8, 0), t(9, 30), t(11, 0), t(14, 0), t(15, 30)]);
    }

    #[test]
    fn rejects_inverted_hours_and_empty_slots() {
        assert!(CalendarPolicy::new(t(18, 0), t(8, 0), Duration::minutes(60)).is_err());
        assert!(CalendarPolicy::new(t(8, 0), t(18, 0), Duration::zero()).is_err());
        let policy = CalendarPolicy::new(t(8, 0), t(18, 0), Duration::minutes(60)).unwrap();
        assert!(policy.with_break(t(14, 0), t(12, 0)).is_err());
    }
}
