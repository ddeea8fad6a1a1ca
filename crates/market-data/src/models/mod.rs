//! Wire models exchanged with the market-data vendor.

mod historical;
mod reference;

pub use historical::{HistoricalField, HistoricalRow};
pub use reference::{FieldValue, ReferenceField, ReferenceRow};
