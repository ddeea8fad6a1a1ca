//! Cuprum Market Data Crate
//!
//! Provider-agnostic access to the market-data vendor that supplies
//! copper futures time series and static reference fields.
//!
//! # Overview
//!
//! The resolver and maturity calculator never talk to a vendor directly.
//! This crate is consumed by the reference-data refresh step only:
//!
//! ```text
//! +--------------------+     +---------------------+
//! | ReferenceDataSvc   | --> | fetch_with_retry    |  (timeout + bounded retry)
//! +--------------------+     +---------------------+
//!                                     |
//!                                     v
//!                          +---------------------+
//!                          | MarketDataProvider  |  (HTTP bridge, test doubles)
//!                          +---------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketDataProvider`] - `get_historical` / `get_reference` contract
//! - [`ReferenceField`] / [`HistoricalField`] - vendor field mnemonics
//! - [`ReferenceRow`] / [`HistoricalRow`] - rows returned by the vendor
//! - [`FetchPolicy`] - per-call timeout and retry budget

pub mod errors;
pub mod fetch;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use fetch::{fetch_with_retry, FetchPolicy};
pub use models::{FieldValue, HistoricalField, HistoricalRow, ReferenceField, ReferenceRow};
pub use provider::http_bridge::HttpBridgeProvider;
pub use provider::MarketDataProvider;
