//! Trading calendar domain models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::exchanges::{Exchange, HolidayCalendarSpec};
use crate::utils::time_utils::get_days_between;

/// Label stored for weekend days that are not also named holidays.
pub const WEEKEND_LABEL: &str = "Weekend";

/// One classified calendar date for an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingCalendarDay {
    pub exchange: Exchange,
    pub date: NaiveDate,
    pub is_trading_day: bool,
    pub holiday_label: Option<String>,
}

/// Inclusive range of dates a calendar has been built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarHorizon {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarHorizon {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn covers(&self, other: &CalendarHorizon) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Classifies every date in `from..=to` against the holiday spec.
///
/// Deterministic: the same spec and range always yield the same rows.
pub fn classify_days(
    spec: &HolidayCalendarSpec,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<TradingCalendarDay> {
    get_days_between(from, to)
        .into_iter()
        .map(|date| {
            let holiday = spec.holiday_label(date);
            let weekend = spec.is_weekend(date);
            let label = match (holiday, weekend) {
                (Some(label), _) => Some(label.to_string()),
                (None, true) => Some(WEEKEND_LABEL.to_string()),
                (None, false) => None,
            };
            TradingCalendarDay {
                exchange: spec.exchange,
                date,
                is_trading_day: label.is_none(),
                holiday_label: label,
            }
        })
        .collect()
}
