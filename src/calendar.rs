//! Pure calendar arithmetic. Weeks start on Sunday.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{DateRange, Day, WeekendDay};

pub fn truncate_to_day(at: NaiveDateTime) -> Day {
    at.date()
}

/// Inclusive range overlap.
pub fn days_overlap(a_start: Day, a_end: Day, b_start: Day, b_end: Day) -> bool {
    a_start <= b_end && b_start <= a_end
}

pub fn is_weekend_day(date: Day, day: WeekendDay) -> bool {
    date.weekday() == day.weekday()
}

/// The Sunday on or before `date`.
pub fn start_of_week(date: Day) -> Day {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// Sunday..Saturday containing `date`.
pub fn week_of(date: Day) -> DateRange {
    let start = start_of_week(date);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    DateRange::new(start, end)
}

pub fn month_of(date: Day) -> DateRange {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    DateRange::new(first, last)
}

/// The month of `date` padded out to whole Sunday-started weeks.
pub fn month_grid(date: Day) -> DateRange {
    let month = month_of(date);
    let start = start_of_week(month.start);
    let end = week_of(month.end).end;
    DateRange::new(start, end)
}

/// The first `weekday` on or after `from`.
fn next_weekday_on_or_after(from: Day, day: WeekendDay) -> Day {
    let target = day.weekday().num_days_from_sunday();
    let current = from.weekday().num_days_from_sunday();
    let ahead = (target + 7 - current) % 7;
    from.checked_add_days(Days::new(u64::from(ahead))).unwrap_or(from)
}

/// Duration toggles on a creation form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationOptions {
    pub include_friday: bool,
    pub include_saturday: bool,
    /// Book the whole calendar month of the start date. Overrides the weekend toggles.
    pub full_month: bool,
}

/// Suggested end for a new booking starting at `start`.
///
/// The default is a five-day working week (e.g. Sunday..Thursday). Including
/// Friday or Saturday stretches it to the next such day when that is later.
pub fn default_range(start: Day, options: DurationOptions) -> DateRange {
    if options.full_month {
        return month_of(start);
    }
    let mut end = start.checked_add_days(Days::new(4)).unwrap_or(start);
    if options.include_friday {
        end = end.max(next_weekday_on_or_after(start, WeekendDay::Friday));
    }
    if options.include_saturday {
        end = end.max(next_weekday_on_or_after(start, WeekendDay::Saturday));
    }
    DateRange::new(start, end)
}

pub fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> Day {
        ymd(2024, m, day).unwrap()
    }

    #[test]
    fn truncation_drops_time() {
        let at = d(3, 5).and_hms_opt(17, 45, 12).unwrap();
        assert_eq!(truncate_to_day(at), d(3, 5));
    }

    #[test]
    fn overlap_inclusive() {
        assert!(days_overlap(d(3, 1), d(3, 3), d(3, 3), d(3, 4)));
        assert!(!days_overlap(d(3, 1), d(3, 2), d(3, 3), d(3, 4)));
    }

    #[test]
    fn weekend_days() {
        // 2024-03-08 is a Friday.
        assert!(is_weekend_day(d(3, 8), WeekendDay::Friday));
        assert!(!is_weekend_day(d(3, 8), WeekendDay::Saturday));
        assert!(is_weekend_day(d(3, 9), WeekendDay::Saturday));
        assert!(!is_weekend_day(d(3, 10), WeekendDay::Friday));
    }

    #[test]
    fn week_starts_sunday() {
        // Wednesday 2024-03-06 → Sunday 03-03 .. Saturday 03-09
        assert_eq!(week_of(d(3, 6)), DateRange::new(d(3, 3), d(3, 9)));
        assert_eq!(week_of(d(3, 3)), DateRange::new(d(3, 3), d(3, 9)));
        assert_eq!(week_of(d(3, 9)), DateRange::new(d(3, 3), d(3, 9)));
    }

    #[test]
    fn month_and_grid() {
        assert_eq!(month_of(d(2, 14)), DateRange::new(d(2, 1), d(2, 29)));
        // March 2024 starts on Friday, ends on Sunday.
        assert_eq!(month_grid(d(3, 15)), DateRange::new(d(2, 25), d(4, 6)));
        assert_eq!(month_grid(d(3, 15)).len_days() % 7, 0);
    }

    #[test]
    fn default_range_is_five_days() {
        let r = default_range(d(3, 3), DurationOptions::default());
        assert_eq!(r, DateRange::new(d(3, 3), d(3, 7)));
    }

    #[test]
    fn default_range_extends_to_weekend() {
        let fri = DurationOptions { include_friday: true, ..Default::default() };
        assert_eq!(default_range(d(3, 3), fri).end, d(3, 8));

        let both = DurationOptions {
            include_friday: true,
            include_saturday: true,
            ..Default::default()
        };
        assert_eq!(default_range(d(3, 3), both).end, d(3, 9));

        // Starting Thursday: next Friday is tomorrow, but the five-day default is later.
        assert_eq!(default_range(d(3, 7), fri).end, d(3, 11));
    }

    #[test]
    fn full_month_overrides() {
        let opts = DurationOptions {
            include_friday: true,
            full_month: true,
            ..Default::default()
        };
        assert_eq!(default_range(d(4, 17), opts), DateRange::new(d(4, 1), d(4, 30)));
    }
}
