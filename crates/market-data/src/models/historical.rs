use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Time-series fields available from the vendor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoricalField {
    Settle,
    Last,
    Volume,
    OpenInterest,
}

impl HistoricalField {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            HistoricalField::Settle => "PX_SETTLE",
            HistoricalField::Last => "PX_LAST",
            HistoricalField::Volume => "PX_VOLUME",
            HistoricalField::OpenInterest => "OPEN_INT",
        }
    }
}

/// One dated observation for one ticker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRow {
    pub ticker: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub fields: HashMap<String, Decimal>,
}

impl HistoricalRow {
    pub fn value(&self, field: HistoricalField) -> Option<Decimal> {
        self.fields.get(field.mnemonic()).copied()
    }
}
