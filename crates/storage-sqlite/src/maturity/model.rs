use diesel::prelude::*;

use cuprum_core::maturity::MaturityFact;

use crate::errors::StorageError;
use crate::utils::{format_date, format_timestamp, parse_date, parse_exchange, parse_timestamp, to_u32};

#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::maturity_facts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MaturityFactDB {
    pub exchange: String,
    pub slot: i32,
    pub trade_date: String,
    pub concrete_ticker: String,
    pub last_tradeable_date: String,
    pub calendar_days_remaining: i64,
    pub trading_days_remaining: i64,
    pub holidays_in_window: i64,
    pub roll_due: bool,
    pub computed_at: String,
}

impl From<MaturityFact> for MaturityFactDB {
    fn from(domain: MaturityFact) -> Self {
        Self {
            exchange: domain.exchange.code().to_string(),
            slot: domain.slot as i32,
            trade_date: format_date(domain.trade_date),
            concrete_ticker: domain.concrete_ticker,
            last_tradeable_date: format_date(domain.last_tradeable_date),
            calendar_days_remaining: domain.calendar_days_remaining,
            trading_days_remaining: domain.trading_days_remaining,
            holidays_in_window: domain.holidays_in_window,
            roll_due: domain.roll_due,
            computed_at: format_timestamp(domain.computed_at),
        }
    }
}

impl TryFrom<MaturityFactDB> for MaturityFact {
    type Error = StorageError;

    fn try_from(db: MaturityFactDB) -> Result<Self, Self::Error> {
        Ok(Self {
            exchange: parse_exchange(&db.exchange)?,
            slot: to_u32(db.slot, "slot")?,
            trade_date: parse_date(&db.trade_date)?,
            concrete_ticker: db.concrete_ticker,
            last_tradeable_date: parse_date(&db.last_tradeable_date)?,
            calendar_days_remaining: db.calendar_days_remaining,
            trading_days_remaining: db.trading_days_remaining,
            holidays_in_window: db.holidays_in_window,
            roll_due: db.roll_due,
            computed_at: parse_timestamp(&db.computed_at)?,
        })
    }
}
