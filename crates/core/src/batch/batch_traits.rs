use async_trait::async_trait;
use chrono::NaiveDate;

use crate::batch::batch_model::BatchProgress;
use crate::errors::Result;
use crate::exchanges::Exchange;

/// Trait for resumable batch progress
#[async_trait]
pub trait ProgressRepositoryTrait: Send + Sync {
    fn get(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Option<BatchProgress>>;

    /// Dates in `start..=end` whose status is completed or partial.
    fn processed_dates(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;

    /// Latest date whose status is completed or partial.
    fn last_processed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>>;

    /// Earliest date whose last attempt failed.
    fn earliest_failed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>>;

    /// Upserts keyed by `(exchange, trade_date)`.
    async fn record(&self, progress: BatchProgress) -> Result<()>;
}
