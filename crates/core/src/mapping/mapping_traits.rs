use async_trait::async_trait;
use chrono::NaiveDate;

use crate::contracts::SlotKey;
use crate::errors::Result;
use crate::exchanges::Exchange;
use crate::mapping::mapping_model::{GenericContractMapping, ResolvedMapping};

/// Trait for mapping persistence
#[async_trait]
pub trait MappingRepositoryTrait: Send + Sync {
    fn load_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>>;

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>>;

    /// Inserts rows whose `(exchange, slot, trade_date)` is not stored yet;
    /// existing rows are left untouched.
    async fn insert_missing(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize>;

    /// Deletes every row of the date and inserts `rows`, atomically.
    async fn replace_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize>;
}

/// Trait for contract resolution
#[async_trait]
pub trait ContractResolverTrait: Send + Sync {
    /// Resolves and persists the mapping of every active slot of the
    /// exchange on `trade_date`.
    async fn resolve_mapping(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<ResolvedMapping>;

    fn get_mappings(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>>;
}
