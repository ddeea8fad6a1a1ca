//! Database models for trading calendars.

use diesel::prelude::*;

use cuprum_core::calendar::TradingCalendarDay;

use crate::errors::StorageError;
use crate::utils::{format_date, parse_date, parse_exchange};

/// Database model for one classified calendar day
#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::trading_calendar_days)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradingCalendarDayDB {
    pub exchange: String,
    pub calendar_date: String,
    pub is_trading_day: bool,
    pub holiday_label: Option<String>,
}

impl TryFrom<TradingCalendarDayDB> for TradingCalendarDay {
    type Error = StorageError;

    fn try_from(db: TradingCalendarDayDB) -> Result<Self, Self::Error> {
        Ok(Self {
            exchange: parse_exchange(&db.exchange)?,
            date: parse_date(&db.calendar_date)?,
            is_trading_day: db.is_trading_day,
            holiday_label: db.holiday_label,
        })
    }
}

impl From<TradingCalendarDay> for TradingCalendarDayDB {
    fn from(domain: TradingCalendarDay) -> Self {
        Self {
            exchange: domain.exchange.code().to_string(),
            calendar_date: format_date(domain.date),
            is_trading_day: domain.is_trading_day,
            holiday_label: domain.holiday_label,
        }
    }
}
