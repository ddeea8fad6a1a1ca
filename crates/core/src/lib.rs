//! Cuprum Core - copper futures calendars, contract resolution and maturity.
//!
//! This crate contains the domain logic. It is database-agnostic and
//! defines repository traits that are implemented by the `storage-sqlite`
//! crate.
//!
//! Data flows one way: the trading calendar is built first and queried by
//! the [`mapping::ContractResolver`] and the [`maturity::MaturityCalculator`];
//! the resolver writes one mapping row per (trade date, generic slot) and the
//! calculator derives maturity facts from those rows.

pub mod batch;
pub mod calendar;
pub mod constants;
pub mod contracts;
pub mod errors;
pub mod exchanges;
pub mod mapping;
pub mod maturity;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use exchanges::Exchange;
