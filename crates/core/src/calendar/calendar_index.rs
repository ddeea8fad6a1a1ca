//! Dense in-memory trading-day index for one exchange.

use chrono::NaiveDate;

use crate::calendar::calendar_model::{CalendarHorizon, TradingCalendarDay};
use crate::errors::{Error, Result, ValidationError};
use crate::exchanges::Exchange;

/// One flag per calendar day plus a running count of trading days, so every
/// count query is two lookups.
#[derive(Debug, Clone)]
pub struct CalendarIndex {
    exchange: Exchange,
    start: NaiveDate,
    flags: Vec<bool>,
    /// `cumulative[i]` = trading days in `start..=start + i`.
    cumulative: Vec<u32>,
}

impl CalendarIndex {
    /// Builds the index from rows sorted by date. Rows must be contiguous.
    pub fn from_days(exchange: Exchange, days: &[TradingCalendarDay]) -> Result<Option<Self>> {
        let Some(first) = days.first() else {
            return Ok(None);
        };
        let start = first.date;
        let mut flags = Vec::with_capacity(days.len());
        let mut cumulative = Vec::with_capacity(days.len());
        let mut running = 0u32;

        for (expected, day) in start.iter_days().zip(days) {
            if day.date != expected {
                return Err(Error::Unexpected(format!(
                    "Calendar for {} is not contiguous: expected {}, found {}",
                    exchange, expected, day.date
                )));
            }
            if day.is_trading_day {
                running += 1;
            }
            flags.push(day.is_trading_day);
            cumulative.push(running);
        }

        Ok(Some(Self {
            exchange,
            start,
            flags,
            cumulative,
        }))
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn horizon(&self) -> CalendarHorizon {
        let len = self.flags.len().saturating_sub(1);
        CalendarHorizon {
            start: self.start,
            end: self.start + chrono::Duration::days(len as i64),
        }
    }

    fn offset(&self, date: NaiveDate) -> Result<usize> {
        let horizon = self.horizon();
        if !horizon.contains(date) {
            return Err(Error::CalendarGap {
                exchange: self.exchange,
                date,
                horizon_start: horizon.start,
                horizon_end: horizon.end,
            });
        }
        Ok((date - self.start).num_days() as usize)
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.flags[self.offset(date)?])
    }

    /// Trading days in `(start, end]`: start exclusive, end inclusive.
    pub fn trading_days_between(&self, start: NaiveDate, end: NaiveDate) -> Result<i64> {
        if end < start {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Trading day range end {} is before start {}",
                end, start
            ))));
        }
        let s = self.offset(start)?;
        let e = self.offset(end)?;
        Ok(i64::from(self.cumulative[e]) - i64::from(self.cumulative[s]))
    }

    /// Trading dates in `start..=end`, ascending.
    pub fn trading_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
        if end < start {
            return Ok(Vec::new());
        }
        let s = self.offset(start)?;
        let e = self.offset(end)?;
        Ok((s..=e)
            .filter(|&i| self.flags[i])
            .map(|i| self.start + chrono::Duration::days(i as i64))
            .collect())
    }
}
