use async_trait::async_trait;
use chrono::NaiveDate;
use cuprum_market_data::HistoricalRow;

use crate::contracts::contracts_model::{
    ConcreteContract, GenericContractDefinition, NewConcreteContract,
    NewGenericContractDefinition, SlotKey,
};
use crate::contracts::reference_data_service::RefreshSummary;
use crate::errors::Result;
use crate::exchanges::Exchange;

/// Trait for generic contract slot repository operations
#[async_trait]
pub trait GenericContractRepositoryTrait: Send + Sync {
    /// Every slot of the exchange, active or not, ordered by slot.
    fn list_for_exchange(&self, exchange: Exchange) -> Result<Vec<GenericContractDefinition>>;

    fn get_by_key(&self, key: &SlotKey) -> Result<Option<GenericContractDefinition>>;

    /// Upserts keyed by `(exchange, slot)`; existing ids are preserved.
    async fn upsert_definitions(&self, definitions: Vec<NewGenericContractDefinition>)
        -> Result<usize>;
}

/// Trait for concrete contract repository operations
#[async_trait]
pub trait ConcreteContractRepositoryTrait: Send + Sync {
    fn list_for_exchange(
        &self,
        exchange: Exchange,
        instrument_family: &str,
    ) -> Result<Vec<ConcreteContract>>;

    fn get_by_ticker(&self, ticker: &str) -> Result<Option<ConcreteContract>>;

    /// Upserts keyed by ticker; existing ids are preserved.
    async fn upsert_contracts(&self, contracts: Vec<NewConcreteContract>) -> Result<usize>;
}

/// Trait for generic slot catalogue operations
#[async_trait]
pub trait ContractCatalogServiceTrait: Send + Sync {
    /// Seeds the default slots when the exchange has none. Returns the
    /// number of rows written.
    async fn seed_default_definitions(&self, exchange: Exchange) -> Result<usize>;

    /// Active slots after validating the exchange's slot sequence.
    fn active_definitions(&self, exchange: Exchange) -> Result<Vec<GenericContractDefinition>>;

    fn get_definition(&self, key: &SlotKey) -> Result<Option<GenericContractDefinition>>;
}

/// Trait for reference-data refresh operations
#[async_trait]
pub trait ReferenceDataServiceTrait: Send + Sync {
    /// Refreshes contracts listed from `as_of`'s month onward.
    async fn refresh(&self, exchange: Exchange, as_of: NaiveDate) -> Result<RefreshSummary>;

    /// Refreshes every contract month needed to resolve trade dates in
    /// `start..=end`.
    async fn refresh_between(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RefreshSummary>;

    async fn fetch_settlements(
        &self,
        exchange: Exchange,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalRow>>;
}
