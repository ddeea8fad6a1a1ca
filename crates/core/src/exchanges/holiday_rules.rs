//! Holiday rules per exchange.
//!
//! LME follows the England & Wales bank holidays, COMEX the CME/NYSE metals
//! closures. SHFE only gets its fixed-date closures here; the lunar holidays
//! (Spring Festival, Qingming, Dragon Boat, Mid-Autumn) come from a holiday
//! file loaded with [`HolidayOverrides`], and the SHFE calendar never extends
//! past the date that file is valid until.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::errors::{Error, Result};
use crate::exchanges::Exchange;
use crate::utils::time_utils::{last_weekday_of_month, nth_weekday_of_month};

/// Everything needed to classify every day of an exchange's calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendarSpec {
    pub exchange: Exchange,
    pub weekend_days: Vec<Weekday>,
    pub holidays: BTreeMap<NaiveDate, String>,
    /// Last date this holiday list is authoritative for. Calendar builds
    /// never extend past it.
    pub valid_until: NaiveDate,
}

impl HolidayCalendarSpec {
    pub fn new(
        exchange: Exchange,
        weekend_days: Vec<Weekday>,
        holidays: BTreeMap<NaiveDate, String>,
        valid_until: NaiveDate,
    ) -> Self {
        Self {
            exchange,
            weekend_days,
            holidays,
            valid_until,
        }
    }

    /// Rule-based spec for `exchange` covering `from_year` through `valid_until`.
    pub fn for_exchange(exchange: Exchange, from_year: i32, valid_until: NaiveDate) -> Self {
        let holidays = rule_holidays(exchange, from_year, valid_until.year());
        debug!(
            "{} rule holidays {}..={}: {} dates",
            exchange,
            from_year,
            valid_until.year(),
            holidays.len()
        );
        Self::new(exchange, exchange.weekend_days(), holidays, valid_until)
    }

    /// Rule-based spec with the holiday file applied.
    ///
    /// `valid_until` is clamped to the file's own validity for the exchange.
    /// Exchanges whose holidays cannot be derived from rules are refused when
    /// the file does not cover them.
    pub fn from_sources(
        exchange: Exchange,
        from_year: i32,
        horizon_end: NaiveDate,
        overrides: &HolidayOverrides,
    ) -> Result<Self> {
        let valid_until = match overrides.valid_until(exchange) {
            Some(file_end) => file_end.min(horizon_end),
            None if exchange.requires_explicit_holidays() => {
                return Err(Error::Config(format!(
                    "{} needs an explicit holiday list with a validUntil date",
                    exchange
                )));
            }
            None => horizon_end,
        };
        if valid_until.year() < from_year {
            return Err(Error::Config(format!(
                "{} holiday list ends {} before the calendar start year {}",
                exchange, valid_until, from_year
            )));
        }
        Ok(Self::for_exchange(exchange, from_year, valid_until).with_overrides(overrides))
    }

    /// Merge explicit holidays over the rule set. Explicit labels win.
    pub fn with_overrides(mut self, overrides: &HolidayOverrides) -> Self {
        for entry in overrides.for_exchange(self.exchange) {
            if entry.date <= self.valid_until {
                self.holidays.insert(entry.date, entry.name.clone());
            }
        }
        self
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend_days.contains(&date.weekday())
    }

    pub fn holiday_label(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }
}

/// One explicit holiday from a holiday file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
}

/// Explicit holidays for one exchange, plus the last date the list is
/// complete for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidaySection {
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub holidays: Vec<HolidayEntry>,
}

/// Explicit holidays keyed by exchange.
///
/// ```json
/// {
///   "SHFE": {
///     "validUntil": "2025-12-31",
///     "holidays": [ { "date": "2025-01-29", "name": "Spring Festival" } ]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HolidayOverrides {
    sections: HashMap<Exchange, HolidaySection>,
}

impl HolidayOverrides {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, HolidaySection> = serde_json::from_str(json)?;
        let mut sections = HashMap::new();
        for (code, section) in raw {
            let exchange: Exchange = code.parse()?;
            sections.insert(exchange, section);
        }
        Ok(Self { sections })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn for_exchange(&self, exchange: Exchange) -> &[HolidayEntry] {
        self.sections
            .get(&exchange)
            .map(|section| section.holidays.as_slice())
            .unwrap_or_default()
    }

    /// Last date the file's list for `exchange` is complete for.
    pub fn valid_until(&self, exchange: Exchange) -> Option<NaiveDate> {
        self.sections.get(&exchange).and_then(|section| section.valid_until)
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(|section| section.holidays.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Western Easter Sunday (anonymous Gregorian algorithm).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Holidays produced by the built-in rules for every year in the range.
pub fn rule_holidays(exchange: Exchange, from_year: i32, to_year: i32) -> BTreeMap<NaiveDate, String> {
    let mut out = BTreeMap::new();
    for year in from_year..=to_year {
        match exchange {
            Exchange::Lme => uk_bank_holidays(year, &mut out),
            Exchange::Comex => cme_holidays(year, &mut out),
            Exchange::Shfe => shfe_fixed_holidays(year, &mut out),
        }
    }
    out
}

fn add(out: &mut BTreeMap<NaiveDate, String>, date: Option<NaiveDate>, label: &str) {
    if let Some(date) = date {
        out.entry(date).or_insert_with(|| label.to_string());
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

const UK_SPECIAL_CLOSURES: &[(i32, u32, u32, &str)] = &[
    (1999, 12, 31, "Millennium Celebrations"),
    (2002, 6, 3, "Golden Jubilee"),
    (2011, 4, 29, "Royal Wedding"),
    (2012, 6, 5, "Diamond Jubilee"),
    (2022, 6, 3, "Platinum Jubilee"),
    (2022, 9, 19, "State Funeral of Queen Elizabeth II"),
    (2023, 5, 8, "Coronation of King Charles III"),
];

fn uk_bank_holidays(year: i32, out: &mut BTreeMap<NaiveDate, String>) {
    if let Some(new_year) = ymd(year, 1, 1) {
        let observed = match new_year.weekday() {
            Weekday::Sat => new_year + Duration::days(2),
            Weekday::Sun => new_year + Duration::days(1),
            _ => new_year,
        };
        add(out, Some(observed), "New Year's Day");
    }

    if let Some(easter) = easter_sunday(year) {
        add(out, Some(easter - Duration::days(2)), "Good Friday");
        add(out, Some(easter + Duration::days(1)), "Easter Monday");
    }

    let early_may = match year {
        1995 | 2020 => ymd(year, 5, 8),
        y if y >= 1978 => nth_weekday_of_month(year, 5, Weekday::Mon, 1),
        _ => None,
    };
    add(out, early_may, "Early May Bank Holiday");

    let spring = match year {
        2002 | 2012 => ymd(year, 6, 4),
        2022 => ymd(year, 6, 2),
        _ => last_weekday_of_month(year, 5, Weekday::Mon),
    };
    add(out, spring, "Spring Bank Holiday");

    add(
        out,
        last_weekday_of_month(year, 8, Weekday::Mon),
        "Summer Bank Holiday",
    );

    if let Some(christmas) = ymd(year, 12, 25) {
        match christmas.weekday() {
            Weekday::Sat => {
                add(out, ymd(year, 12, 27), "Christmas Day (substitute)");
                add(out, ymd(year, 12, 28), "Boxing Day (substitute)");
            }
            Weekday::Sun => {
                add(out, ymd(year, 12, 26), "Boxing Day");
                add(out, ymd(year, 12, 27), "Christmas Day (substitute)");
            }
            Weekday::Fri => {
                add(out, Some(christmas), "Christmas Day");
                add(out, ymd(year, 12, 28), "Boxing Day (substitute)");
            }
            _ => {
                add(out, Some(christmas), "Christmas Day");
                add(out, ymd(year, 12, 26), "Boxing Day");
            }
        }
    }

    for &(y, m, d, label) in UK_SPECIAL_CLOSURES {
        if y == year {
            add(out, ymd(y, m, d), label);
        }
    }
}

const US_SPECIAL_CLOSURES: &[(i32, u32, u32, &str)] = &[
    (1994, 4, 27, "National Day of Mourning (Nixon)"),
    (2001, 9, 11, "September 11"),
    (2001, 9, 12, "September 11"),
    (2001, 9, 13, "September 11"),
    (2001, 9, 14, "September 11"),
    (2004, 6, 11, "National Day of Mourning (Reagan)"),
    (2007, 1, 2, "National Day of Mourning (Ford)"),
    (2012, 10, 29, "Hurricane Sandy"),
    (2012, 10, 30, "Hurricane Sandy"),
    (2018, 12, 5, "National Day of Mourning (Bush)"),
    (2025, 1, 9, "National Day of Mourning (Carter)"),
];

/// Saturday holidays are observed the Friday before, Sunday holidays the
/// Monday after.
fn us_observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn cme_holidays(year: i32, out: &mut BTreeMap<NaiveDate, String>) {
    // A Saturday New Year's Day is not observed on the preceding Friday.
    if let Some(new_year) = ymd(year, 1, 1) {
        match new_year.weekday() {
            Weekday::Sat => {}
            Weekday::Sun => add(out, Some(new_year + Duration::days(1)), "New Year's Day"),
            _ => add(out, Some(new_year), "New Year's Day"),
        }
    }

    if year >= 1998 {
        add(
            out,
            nth_weekday_of_month(year, 1, Weekday::Mon, 3),
            "Martin Luther King Jr. Day",
        );
    }
    add(
        out,
        nth_weekday_of_month(year, 2, Weekday::Mon, 3),
        "Presidents Day",
    );

    if let Some(easter) = easter_sunday(year) {
        add(out, Some(easter - Duration::days(2)), "Good Friday");
    }

    add(
        out,
        last_weekday_of_month(year, 5, Weekday::Mon),
        "Memorial Day",
    );
    if year >= 2022 {
        add(out, ymd(year, 6, 19).map(us_observed), "Juneteenth");
    }
    add(out, ymd(year, 7, 4).map(us_observed), "Independence Day");
    add(
        out,
        nth_weekday_of_month(year, 9, Weekday::Mon, 1),
        "Labor Day",
    );
    add(
        out,
        nth_weekday_of_month(year, 11, Weekday::Thu, 4),
        "Thanksgiving Day",
    );
    add(out, ymd(year, 12, 25).map(us_observed), "Christmas Day");

    for &(y, m, d, label) in US_SPECIAL_CLOSURES {
        if y == year {
            add(out, ymd(y, m, d), label);
        }
    }
}

fn shfe_fixed_holidays(year: i32, out: &mut BTreeMap<NaiveDate, String>) {
    add(out, ymd(year, 1, 1), "New Year's Day");
    for day in 1..=3 {
        add(out, ymd(year, 5, day), "Labour Day");
    }
    for day in 1..=7 {
        add(out, ymd(year, 10, day), "National Day");
    }
}
