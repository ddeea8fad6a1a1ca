//! Market data provider trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{HistoricalField, HistoricalRow, ReferenceField, ReferenceRow};

/// Trait for market data providers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use cuprum_market_data::{MarketDataProvider, ReferenceField, ReferenceRow};
///
/// struct SnapshotProvider {
///     rows: Vec<ReferenceRow>,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for SnapshotProvider {
///     fn id(&self) -> &'static str {
///         "SNAPSHOT"
///     }
///
///     // ... implement get_historical / get_reference
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Fetch time-series rows for a set of tickers.
    ///
    /// # Arguments
    ///
    /// * `tickers` - Vendor tickers
    /// * `fields` - Requested fields
    /// * `start` - Start of the date range (inclusive)
    /// * `end` - End of the date range (inclusive)
    ///
    /// Rows should be ordered by ticker, then date ascending.
    async fn get_historical(
        &self,
        tickers: &[String],
        fields: &[HistoricalField],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalRow>, MarketDataError>;

    /// Fetch static reference attributes for a set of tickers.
    ///
    /// Tickers the vendor does not recognise are omitted from the result
    /// rather than failing the whole request. A row may lack some of the
    /// requested fields.
    async fn get_reference(
        &self,
        tickers: &[String],
        fields: &[ReferenceField],
    ) -> Result<Vec<ReferenceRow>, MarketDataError>;
}
