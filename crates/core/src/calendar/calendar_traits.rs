use async_trait::async_trait;
use chrono::NaiveDate;

use crate::calendar::calendar_model::{CalendarHorizon, TradingCalendarDay};
use crate::errors::Result;
use crate::exchanges::{Exchange, HolidayCalendarSpec};

/// Trait for trading calendar persistence
#[async_trait]
pub trait CalendarRepositoryTrait: Send + Sync {
    /// All stored days for the exchange, ascending by date.
    fn load_days(&self, exchange: Exchange) -> Result<Vec<TradingCalendarDay>>;

    fn get_horizon(&self, exchange: Exchange) -> Result<Option<CalendarHorizon>>;

    /// Deletes every stored day in `from..=to` and inserts `days`, atomically.
    async fn replace_range(
        &self,
        exchange: Exchange,
        from: NaiveDate,
        to: NaiveDate,
        days: Vec<TradingCalendarDay>,
    ) -> Result<usize>;
}

/// Trait for trading calendar queries
#[async_trait]
pub trait TradingCalendarServiceTrait: Send + Sync {
    /// Populates `from..=to` from the holiday spec. Re-running with the same inputs
    /// produces identical rows.
    async fn build_calendar(
        &self,
        spec: &HolidayCalendarSpec,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize>;

    /// Builds whatever part of the configured horizon is missing.
    async fn ensure_calendar(&self, exchange: Exchange) -> Result<CalendarHorizon>;

    async fn horizon(&self, exchange: Exchange) -> Result<Option<CalendarHorizon>>;

    /// Fails with `CalendarGap` outside the built horizon.
    async fn is_trading_day(&self, exchange: Exchange, date: NaiveDate) -> Result<bool>;

    /// Trading days strictly after `start` up to and including `end`.
    async fn trading_days_between(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64>;

    /// `end - start` in calendar days.
    fn calendar_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64;

    /// Trading dates in `start..=end`, ascending.
    async fn trading_days_in_range(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;
}
