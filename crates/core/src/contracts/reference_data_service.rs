//! Reference-data refresh.
//!
//! Creates and refreshes [`ConcreteContract`](super::ConcreteContract) rows
//! from the vendor's static reference fields. Runs strictly before mapping
//! resolution in a batch so the resolver always reads a committed catalogue.

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use cuprum_market_data::{
    fetch_with_retry, FetchPolicy, HistoricalField, HistoricalRow, MarketDataProvider,
    ReferenceField, ReferenceRow,
};

use crate::constants::{DEFAULT_REFERENCE_MONTHS_AHEAD, REFERENCE_BATCH_SIZE};
use crate::contracts::contracts_model::NewConcreteContract;
use crate::contracts::contracts_traits::{
    ConcreteContractRepositoryTrait, ReferenceDataServiceTrait,
};
use crate::contracts::month_code::{ContractTicker, MonthCode};
use crate::errors::{Error, Result, ValidationError};
use crate::exchanges::Exchange;

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub requested: usize,
    pub stored: usize,
    /// Tickers the vendor did not return.
    pub unknown: usize,
    /// Stored without a last-tradeable-date.
    pub missing_last_tradeable: usize,
    /// Returned but rejected as implausible.
    pub rejected: usize,
}

/// Monthly contract tickers for every month from `first`'s month through
/// `last`'s month.
pub fn candidate_tickers(exchange: Exchange, first: NaiveDate, last: NaiveDate) -> Vec<ContractTicker> {
    let mut tickers = Vec::new();
    let Some(mut cursor) = first.with_day(1) else {
        return tickers;
    };
    while cursor <= last {
        if let Some(code) = MonthCode::from_month(cursor.month()) {
            tickers.push(ContractTicker::new(exchange, cursor.year(), code));
        }
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    tickers
}

/// Turns one vendor row into an upsert, or `None` if it fails validation.
fn contract_from_row(
    exchange: Exchange,
    ticker: &ContractTicker,
    row: &ReferenceRow,
) -> Option<NewConcreteContract> {
    let mut contract = NewConcreteContract::copper(exchange, ticker);
    contract.last_tradeable_date = row.date(ReferenceField::LastTradeableDate);
    contract.final_delivery_date = row.date(ReferenceField::FinalDeliveryDate);
    contract.contract_size = row.decimal(ReferenceField::ContractSize);
    contract.tick_size = row.decimal(ReferenceField::TickSize);

    match contract.validate() {
        Ok(()) => Some(contract),
        Err(e) => {
            warn!("{}: rejecting reference row: {}", exchange, e);
            None
        }
    }
}

/// Service for refreshing concrete contracts from the market-data vendor
pub struct ReferenceDataService {
    provider: Arc<dyn MarketDataProvider>,
    contracts: Arc<dyn ConcreteContractRepositoryTrait>,
    policy: FetchPolicy,
    months_ahead: u32,
}

impl ReferenceDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        contracts: Arc<dyn ConcreteContractRepositoryTrait>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            provider,
            contracts,
            policy,
            months_ahead: DEFAULT_REFERENCE_MONTHS_AHEAD,
        }
    }

    pub fn with_months_ahead(mut self, months_ahead: u32) -> Self {
        self.months_ahead = months_ahead;
        self
    }

    async fn fetch_reference(&self, tickers: &[String]) -> Result<Vec<ReferenceRow>> {
        let mut rows = Vec::with_capacity(tickers.len());
        for chunk in tickers.chunks(REFERENCE_BATCH_SIZE) {
            let batch = fetch_with_retry(self.provider.id(), &self.policy, || {
                self.provider.get_reference(chunk, &ReferenceField::ALL)
            })
            .await?;
            rows.extend(batch);
        }
        Ok(rows)
    }
}

#[async_trait]
impl ReferenceDataServiceTrait for ReferenceDataService {
    async fn refresh(&self, exchange: Exchange, as_of: NaiveDate) -> Result<RefreshSummary> {
        self.refresh_between(exchange, as_of, as_of).await
    }

    async fn refresh_between(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RefreshSummary> {
        if end < start {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Refresh range end {} is before start {}",
                end, start
            ))));
        }

        // A contract can stop trading in the month before its delivery month.
        let first = start.checked_sub_months(Months::new(1)).unwrap_or(start);
        let last = end
            .checked_add_months(Months::new(self.months_ahead))
            .unwrap_or(end);
        let candidates: HashMap<String, ContractTicker> = candidate_tickers(exchange, first, last)
            .into_iter()
            .map(|t| (t.to_string(), t))
            .collect();
        let mut tickers: Vec<String> = candidates.keys().cloned().collect();
        tickers.sort();

        debug!(
            "{}: requesting reference data for {} tickers ({}..={})",
            exchange,
            tickers.len(),
            first,
            last
        );
        let rows = self.fetch_reference(&tickers).await?;

        let mut summary = RefreshSummary {
            requested: tickers.len(),
            ..Default::default()
        };
        let mut upserts = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(ticker) = candidates.get(&row.ticker) else {
                warn!("{}: vendor returned unrequested ticker {}", exchange, row.ticker);
                continue;
            };
            match contract_from_row(exchange, ticker, row) {
                Some(contract) => {
                    if contract.last_tradeable_date.is_none() {
                        warn!(
                            "{}: {} has no last tradeable date, storing without it",
                            exchange, contract.ticker
                        );
                        summary.missing_last_tradeable += 1;
                    }
                    upserts.push(contract);
                }
                None => summary.rejected += 1,
            }
        }
        summary.unknown = summary.requested.saturating_sub(rows.len());

        summary.stored = if upserts.is_empty() {
            0
        } else {
            self.contracts.upsert_contracts(upserts).await?
        };

        info!(
            "{}: reference refresh stored {} of {} requested contracts ({} unknown, {} without last tradeable date, {} rejected)",
            exchange,
            summary.stored,
            summary.requested,
            summary.unknown,
            summary.missing_last_tradeable,
            summary.rejected
        );
        Ok(summary)
    }

    async fn fetch_settlements(
        &self,
        exchange: Exchange,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalRow>> {
        let rows = fetch_with_retry(self.provider.id(), &self.policy, || {
            self.provider
                .get_historical(tickers, &[HistoricalField::Settle], start, end)
        })
        .await?;
        debug!(
            "{}: fetched {} settlement rows for {} tickers",
            exchange,
            rows.len(),
            tickers.len()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::contracts_model::ConcreteContract;
    use cuprum_market_data::{FieldValue, MarketDataError};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use std::time::Duration;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // =========================================================================
    // Mocks
    // =========================================================================

    /// Serves reference rows for a fixed set of tickers. Fails the first
    /// `transient_failures` calls with a rate limit.
    #[derive(Default)]
    struct MockProvider {
        known: HashMap<String, ReferenceRow>,
        transient_failures: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl MockProvider {
        fn with_rows(rows: Vec<ReferenceRow>) -> Self {
            Self {
                known: rows.into_iter().map(|r| (r.ticker.clone(), r)).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn get_historical(
            &self,
            tickers: &[String],
            _fields: &[HistoricalField],
            start: NaiveDate,
            _end: NaiveDate,
        ) -> std::result::Result<Vec<HistoricalRow>, MarketDataError> {
            Ok(tickers
                .iter()
                .map(|t| HistoricalRow {
                    ticker: t.clone(),
                    date: start,
                    fields: HashMap::from([("PX_SETTLE".to_string(), dec!(9500.5))]),
                })
                .collect())
        }

        async fn get_reference(
            &self,
            tickers: &[String],
            _fields: &[ReferenceField],
        ) -> std::result::Result<Vec<ReferenceRow>, MarketDataError> {
            *self.calls.lock().unwrap() += 1;
            {
                let mut remaining = self.transient_failures.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(MarketDataError::RateLimited {
                        provider: "MOCK".to_string(),
                    });
                }
            }
            Ok(tickers
                .iter()
                .filter_map(|t| self.known.get(t).cloned())
                .collect())
        }
    }

    #[derive(Default)]
    struct MockContractRepository {
        stored: Mutex<Vec<NewConcreteContract>>,
    }

    #[async_trait]
    impl ConcreteContractRepositoryTrait for MockContractRepository {
        fn list_for_exchange(
            &self,
            _exchange: Exchange,
            _instrument_family: &str,
        ) -> Result<Vec<ConcreteContract>> {
            Ok(Vec::new())
        }

        fn get_by_ticker(&self, _ticker: &str) -> Result<Option<ConcreteContract>> {
            Ok(None)
        }

        async fn upsert_contracts(&self, contracts: Vec<NewConcreteContract>) -> Result<usize> {
            let count = contracts.len();
            self.stored.lock().unwrap().extend(contracts);
            Ok(count)
        }
    }

    fn reference_row(ticker: &str, ltd: Option<&str>) -> ReferenceRow {
        let mut row = ReferenceRow::new(ticker)
            .with(ReferenceField::ContractSize, FieldValue::Number(dec!(25000)))
            .with(ReferenceField::TickSize, FieldValue::Number(dec!(0.0005)));
        if let Some(ltd) = ltd {
            row = row.with(
                ReferenceField::LastTradeableDate,
                FieldValue::Text(ltd.to_string()),
            );
        }
        row
    }

    fn fast_policy() -> FetchPolicy {
        FetchPolicy::new(Duration::from_secs(1), 2).with_retry_pause(Duration::from_millis(1))
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[test]
    fn test_candidate_tickers_span_months() {
        let tickers = candidate_tickers(Exchange::Comex, d(2024, 11, 15), d(2025, 2, 3));
        let names: Vec<String> = tickers.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec!["HGX24 Comdty", "HGZ24 Comdty", "HGF25 Comdty", "HGG25 Comdty"]
        );
    }

    #[tokio::test]
    async fn test_refresh_stores_known_contracts() {
        let provider = Arc::new(MockProvider::with_rows(vec![
            reference_row("HGH25 Comdty", Some("2025-03-27")),
            reference_row("HGK25 Comdty", Some("2025-05-28")),
            reference_row("HGN25 Comdty", None),
        ]));
        let repo = Arc::new(MockContractRepository::default());
        let service = ReferenceDataService::new(provider, repo.clone(), fast_policy())
            .with_months_ahead(6);

        let summary = service.refresh(Exchange::Comex, d(2025, 3, 3)).await.unwrap();

        // Feb 2025 through Sep 2025.
        assert_eq!(summary.requested, 8);
        assert_eq!(summary.stored, 3);
        assert_eq!(summary.unknown, 5);
        assert_eq!(summary.missing_last_tradeable, 1);

        let stored = repo.stored.lock().unwrap();
        let h25 = stored.iter().find(|c| c.ticker == "HGH25 Comdty").unwrap();
        assert_eq!(h25.contract_month, 3);
        assert_eq!(h25.month_code, MonthCode::H);
        assert_eq!(h25.last_tradeable_date, Some(d(2025, 3, 27)));
        assert_eq!(h25.contract_size, Some(dec!(25000)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_implausible_rows() {
        let provider = Arc::new(MockProvider::with_rows(vec![reference_row(
            "CUF25 Comdty",
            Some("2027-01-15"),
        )]));
        let repo = Arc::new(MockContractRepository::default());
        let service = ReferenceDataService::new(provider, repo.clone(), fast_policy())
            .with_months_ahead(1);

        let summary = service.refresh(Exchange::Shfe, d(2025, 1, 2)).await.unwrap();
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.stored, 0);
        assert!(repo.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_retries_transient_failures() {
        let provider = MockProvider::with_rows(vec![reference_row("LPH25 Comdty", Some("2025-03-17"))]);
        *provider.transient_failures.lock().unwrap() = 2;
        let provider = Arc::new(provider);
        let repo = Arc::new(MockContractRepository::default());
        let service = ReferenceDataService::new(provider.clone(), repo, fast_policy())
            .with_months_ahead(0);

        let summary = service.refresh(Exchange::Lme, d(2025, 3, 3)).await.unwrap();
        assert_eq!(summary.stored, 1);
        assert_eq!(*provider.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_refresh_surfaces_exhausted_retries() {
        let provider = MockProvider::default();
        *provider.transient_failures.lock().unwrap() = 10;
        let service = ReferenceDataService::new(
            Arc::new(provider),
            Arc::new(MockContractRepository::default()),
            fast_policy(),
        );

        let err = service
            .refresh(Exchange::Lme, d(2025, 3, 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MarketData(MarketDataError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_settlements_passes_through() {
        let service = ReferenceDataService::new(
            Arc::new(MockProvider::default()),
            Arc::new(MockContractRepository::default()),
            fast_policy(),
        );
        let tickers = vec!["HGH25 Comdty".to_string()];
        let rows = service
            .fetch_settlements(Exchange::Comex, &tickers, d(2025, 3, 3), d(2025, 3, 3))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value(HistoricalField::Settle), Some(dec!(9500.5)));
    }
}
