use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::calendar::calendar_index::CalendarIndex;
use crate::calendar::calendar_model::{classify_days, CalendarHorizon, TradingCalendarDay};
use crate::calendar::calendar_traits::{CalendarRepositoryTrait, TradingCalendarServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::exchanges::{Exchange, HolidayCalendarSpec};
use crate::utils::time_utils::calendar_days_between;

/// Trading calendar service.
///
/// Stored calendars are loaded once per exchange into a [`CalendarIndex`]
/// and answered from memory. A query that falls outside the loaded horizon
/// triggers one extended rebuild (up to the holiday spec's `valid_until`) before
/// the gap is surfaced.
pub struct TradingCalendarService {
    repository: Arc<dyn CalendarRepositoryTrait>,
    specs: HashMap<Exchange, HolidayCalendarSpec>,
    calendar_start: NaiveDate,
    cache: DashMap<Exchange, Arc<CalendarIndex>>,
}

impl TradingCalendarService {
    pub fn new(repository: Arc<dyn CalendarRepositoryTrait>, calendar_start: NaiveDate) -> Self {
        Self {
            repository,
            specs: HashMap::new(),
            calendar_start,
            cache: DashMap::new(),
        }
    }

    /// Registers the holiday spec used by `ensure_calendar` and by the
    /// extended rebuild on a gap.
    pub fn with_spec(mut self, spec: HolidayCalendarSpec) -> Self {
        self.specs.insert(spec.exchange, spec);
        self
    }

    pub fn spec(&self, exchange: Exchange) -> Option<&HolidayCalendarSpec> {
        self.specs.get(&exchange)
    }

    fn load_index(&self, exchange: Exchange) -> Result<Option<Arc<CalendarIndex>>> {
        if let Some(index) = self.cache.get(&exchange) {
            return Ok(Some(index.clone()));
        }
        let days = self.repository.load_days(exchange)?;
        match CalendarIndex::from_days(exchange, &days)? {
            Some(index) => {
                let index = Arc::new(index);
                self.cache.insert(exchange, index.clone());
                Ok(Some(index))
            }
            None => Ok(None),
        }
    }

    fn invalidate(&self, exchange: Exchange) {
        self.cache.remove(&exchange);
    }

    fn query<T, F>(&self, exchange: Exchange, queried: NaiveDate, f: &F) -> Result<T>
    where
        F: Fn(&CalendarIndex) -> Result<T>,
    {
        match self.load_index(exchange)? {
            Some(index) => f(&index),
            // Nothing built yet: an empty horizon.
            None => Err(Error::CalendarGap {
                exchange,
                date: queried,
                horizon_start: self.calendar_start,
                horizon_end: self.calendar_start - Duration::days(1),
            }),
        }
    }

    /// Brings stored days in line with the holiday spec: days past its
    /// validity are dropped and days whose classification changed are
    /// rewritten. Returns the number of days touched.
    async fn reconcile(
        &self,
        spec: &HolidayCalendarSpec,
        existing: CalendarHorizon,
        target: CalendarHorizon,
    ) -> Result<usize> {
        let exchange = spec.exchange;
        let mut touched = 0;

        if existing.end > target.end {
            let from = std::cmp::max(existing.start, target.end + Duration::days(1));
            warn!(
                "{}: dropping stored days {}..={} past the holiday list validity",
                exchange, from, existing.end
            );
            self.repository
                .replace_range(exchange, from, existing.end, Vec::new())
                .await?;
            touched += (calendar_days_between(from, existing.end) + 1) as usize;
        }

        let from = std::cmp::max(existing.start, target.start);
        let to = std::cmp::min(existing.end, target.end);
        if from <= to {
            let stored: HashMap<NaiveDate, TradingCalendarDay> = self
                .repository
                .load_days(exchange)?
                .into_iter()
                .filter(|day| from <= day.date && day.date <= to)
                .map(|day| (day.date, day))
                .collect();
            let expected = classify_days(spec, from, to);
            let changed: Vec<usize> = expected
                .iter()
                .enumerate()
                .filter(|(_, day)| stored.get(&day.date) != Some(*day))
                .map(|(i, _)| i)
                .collect();
            if let (Some(&first), Some(&last)) = (changed.first(), changed.last()) {
                info!(
                    "{}: {} stored days changed classification between {} and {}",
                    exchange,
                    changed.len(),
                    expected[first].date,
                    expected[last].date
                );
                let rows = expected[first..=last].to_vec();
                self.repository
                    .replace_range(exchange, rows[0].date, rows[rows.len() - 1].date, rows)
                    .await?;
                touched += changed.len();
            }
        }

        if touched > 0 {
            self.invalidate(exchange);
        }
        Ok(touched)
    }

    /// Runs `f` against the index; on a gap, rebuilds once and retries.
    async fn with_extension<T, F>(&self, exchange: Exchange, queried: NaiveDate, f: F) -> Result<T>
    where
        F: Fn(&CalendarIndex) -> Result<T> + Send + Sync,
        T: Send,
    {
        match self.query(exchange, queried, &f) {
            Err(Error::CalendarGap { date, .. }) => {
                info!(
                    "{}: {} is outside the loaded calendar, attempting extended rebuild",
                    exchange, date
                );
                self.invalidate(exchange);
                if self.specs.contains_key(&exchange) {
                    self.ensure_calendar(exchange).await?;
                } else {
                    warn!("{}: no holiday spec registered, cannot extend", exchange);
                }
                self.query(exchange, queried, &f)
            }
            other => other,
        }
    }
}

#[async_trait]
impl TradingCalendarServiceTrait for TradingCalendarService {
    async fn build_calendar(
        &self,
        spec: &HolidayCalendarSpec,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize> {
        if to < from {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Calendar range end {} is before start {}",
                to, from
            ))));
        }
        if to > spec.valid_until {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} holiday list is only valid until {}, cannot build through {}",
                spec.exchange, spec.valid_until, to
            ))));
        }
        if let Some(existing) = self.repository.get_horizon(spec.exchange)? {
            let touches = from <= existing.end + Duration::days(1)
                && to >= existing.start - Duration::days(1);
            if !touches {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "{} range {}..={} would leave a hole next to the stored calendar {}..={}",
                    spec.exchange, from, to, existing.start, existing.end
                ))));
            }
        }

        let days = classify_days(spec, from, to);
        let trading = days.iter().filter(|d| d.is_trading_day).count();
        let written = self
            .repository
            .replace_range(spec.exchange, from, to, days)
            .await?;
        self.invalidate(spec.exchange);

        debug!(
            "{} calendar built {}..={}: {} days, {} trading",
            spec.exchange, from, to, written, trading
        );
        Ok(written)
    }

    async fn ensure_calendar(&self, exchange: Exchange) -> Result<CalendarHorizon> {
        let spec = self.specs.get(&exchange).ok_or_else(|| {
            Error::Config(format!("No holiday calendar configured for {}", exchange))
        })?;
        let target = CalendarHorizon {
            start: self.calendar_start,
            end: spec.valid_until,
        };
        if target.end < target.start {
            return Err(Error::Config(format!(
                "{} calendar start {} is after its validity end {}",
                exchange, target.start, target.end
            )));
        }

        let mut built = 0;
        if let Some(existing) = self.repository.get_horizon(exchange)? {
            built += self.reconcile(spec, existing, target).await?;
        }
        match self.repository.get_horizon(exchange)? {
            Some(existing) if existing.covers(&target) && built == 0 => return Ok(existing),
            Some(existing) => {
                if target.start < existing.start {
                    built += self
                        .build_calendar(spec, target.start, existing.start - Duration::days(1))
                        .await?;
                }
                if existing.end < target.end {
                    built += self
                        .build_calendar(spec, existing.end + Duration::days(1), target.end)
                        .await?;
                }
            }
            None => {
                built += self
                    .build_calendar(spec, target.start, target.end)
                    .await?;
            }
        }

        let horizon = self.repository.get_horizon(exchange)?.ok_or_else(|| {
            Error::Unexpected(format!("{} calendar is still empty after build", exchange))
        })?;
        info!(
            "{} calendar covers {}..={} ({} days built)",
            exchange, horizon.start, horizon.end, built
        );
        Ok(horizon)
    }

    async fn horizon(&self, exchange: Exchange) -> Result<Option<CalendarHorizon>> {
        Ok(self.load_index(exchange)?.map(|index| index.horizon()))
    }

    async fn is_trading_day(&self, exchange: Exchange, date: NaiveDate) -> Result<bool> {
        self.with_extension(exchange, date, |index| index.is_trading_day(date))
            .await
    }

    async fn trading_days_between(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        self.with_extension(exchange, end, |index| {
            index.trading_days_between(start, end)
        })
        .await
    }

    fn calendar_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        calendar_days_between(start, end)
    }

    async fn trading_days_in_range(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        self.with_extension(exchange, end, |index| {
            index.trading_days_in_range(start, end)
        })
        .await
    }
}
