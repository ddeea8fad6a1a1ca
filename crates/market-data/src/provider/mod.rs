//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait every vendor adapter implements
//! - The HTTP bridge adapter used in production
//!
//! Providers receive fully formed vendor tickers (for example `HGZ24 Comdty`);
//! building those tickers from exchange and contract month happens in core.

pub mod http_bridge;
mod traits;

pub use traits::MarketDataProvider;
