use chrono::{Datelike, Months, NaiveDate, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Pure date subtraction, `end - start` in calendar days.
pub fn calendar_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

/// Last day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// The `n`-th (1-based) occurrence of `weekday` in the month.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Last occurrence of `weekday` in the month.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(chrono::Days::new(back as u64))
}

/// Same calendar day `years` later, clamped to Feb 28 for leap days.
pub fn add_years(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(years.checked_mul(12)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_between_inclusive() {
        let days = get_days_between(d(2024, 2, 27), d(2024, 3, 1));
        assert_eq!(days.len(), 4);
        assert_eq!(days[2], d(2024, 2, 29));
        assert!(get_days_between(d(2024, 3, 2), d(2024, 3, 1)).is_empty());
    }

    #[test]
    fn test_calendar_days_between() {
        assert_eq!(calendar_days_between(d(2024, 1, 1), d(2024, 1, 8)), 7);
        assert_eq!(calendar_days_between(d(2024, 1, 8), d(2024, 1, 8)), 0);
    }

    #[test]
    fn test_month_helpers() {
        assert_eq!(last_day_of_month(2024, 2), Some(d(2024, 2, 29)));
        assert_eq!(last_day_of_month(2023, 12), Some(d(2023, 12, 31)));
        assert_eq!(
            nth_weekday_of_month(2024, 11, Weekday::Thu, 4),
            Some(d(2024, 11, 28))
        );
        assert_eq!(
            last_weekday_of_month(2024, 5, Weekday::Mon),
            Some(d(2024, 5, 27))
        );
        assert_eq!(
            last_weekday_of_month(2021, 5, Weekday::Mon),
            Some(d(2021, 5, 31))
        );
    }

    #[test]
    fn test_add_years_clamps_leap_day() {
        assert_eq!(add_years(d(2024, 2, 29), 1), Some(d(2025, 2, 28)));
        assert_eq!(add_years(d(2024, 6, 1), 40), Some(d(2064, 6, 1)));
    }
}
