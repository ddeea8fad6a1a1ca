use async_trait::async_trait;
use chrono::NaiveDate;

use crate::contracts::{GenericContractDefinition, SlotKey};
use crate::errors::Result;
use crate::exchanges::Exchange;
use crate::mapping::GenericContractMapping;
use crate::maturity::maturity_model::{MaturityFact, MaturityRun};

/// Trait for maturity fact persistence
#[async_trait]
pub trait MaturityRepositoryTrait: Send + Sync {
    fn load_for_date(&self, exchange: Exchange, trade_date: NaiveDate)
        -> Result<Vec<MaturityFact>>;

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MaturityFact>>;

    /// Deletes every fact of the date and inserts `facts`, atomically.
    async fn replace_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        facts: Vec<MaturityFact>,
    ) -> Result<usize>;
}

/// Trait for maturity computation
#[async_trait]
pub trait MaturityCalculatorTrait: Send + Sync {
    /// Computes one fact. Does not persist.
    async fn compute_maturity(
        &self,
        mapping: &GenericContractMapping,
        definition: &GenericContractDefinition,
    ) -> Result<MaturityFact>;

    /// Computes and stores facts for every mapping of the date. Slot-level
    /// failures are returned in the run; an invariant violation fails the
    /// whole date and nothing is stored.
    async fn compute_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        mappings: &[GenericContractMapping],
    ) -> Result<MaturityRun>;

    fn get_facts(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Vec<MaturityFact>>;
}
