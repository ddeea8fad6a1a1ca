//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while talking to the market-data vendor.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which decides whether
/// [`fetch_with_retry`](crate::fetch::fetch_with_retry) tries again.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The vendor does not know the requested ticker.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// The vendor rejected a field mnemonic.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The ticker exists but has no rows in the requested period.
    #[error("No data for date range")]
    NoDataForRange,

    /// The vendor rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The call did not finish within the configured timeout.
    #[error("Timeout after {after_ms}ms: {provider}")]
    Timeout { provider: String, after_ms: u64 },

    /// The vendor answered with an error.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The vendor answered but the payload could not be understood.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Every attempt allowed by the fetch policy failed.
    #[error("Retries exhausted for {provider} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        provider: String,
        attempts: u32,
        last_error: String,
    },

    /// A network error occurred while communicating with the vendor.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// Only transient conditions are retried: timeouts, rate limiting and
    /// network failures that never reached the vendor.
    ///
    /// ```
    /// use cuprum_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::Timeout { provider: "BRIDGE".to_string(), after_ms: 100 };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::TickerNotFound("HGZ99 Comdty".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            Self::Network(e) if e.is_timeout() || e.is_connect() => RetryClass::WithBackoff,

            Self::TickerNotFound(_)
            | Self::UnknownField(_)
            | Self::NoDataForRange
            | Self::ProviderError { .. }
            | Self::InvalidResponse { .. }
            | Self::RetriesExhausted { .. }
            | Self::Network(_) => RetryClass::Never,
        }
    }
}
