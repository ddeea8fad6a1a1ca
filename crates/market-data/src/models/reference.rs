use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static reference fields requested for a concrete futures contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceField {
    LastTradeableDate,
    FinalDeliveryDate,
    ContractSize,
    TickSize,
}

impl ReferenceField {
    /// Every field the reference refresh asks for.
    pub const ALL: [ReferenceField; 4] = [
        ReferenceField::LastTradeableDate,
        ReferenceField::FinalDeliveryDate,
        ReferenceField::ContractSize,
        ReferenceField::TickSize,
    ];

    /// Vendor mnemonic for the field.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ReferenceField::LastTradeableDate => "LAST_TRADEABLE_DT",
            ReferenceField::FinalDeliveryDate => "FUT_DLV_DT_LAST",
            ReferenceField::ContractSize => "FUT_CONT_SIZE",
            ReferenceField::TickSize => "FUT_TICK_SIZE",
        }
    }
}

impl fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A single value returned by the vendor.
///
/// Dates travel as `YYYY-MM-DD` text and are parsed on access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(Decimal),
    Text(String),
}

impl FieldValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(d) => Some(*d),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Static attributes for one ticker, keyed by vendor mnemonic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub ticker: String,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

impl ReferenceRow {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, field: ReferenceField, value: FieldValue) -> Self {
        self.fields.insert(field.mnemonic().to_string(), value);
        self
    }

    pub fn get(&self, field: ReferenceField) -> Option<&FieldValue> {
        self.fields.get(field.mnemonic())
    }

    pub fn date(&self, field: ReferenceField) -> Option<NaiveDate> {
        self.get(field).and_then(FieldValue::as_date)
    }

    pub fn decimal(&self, field: ReferenceField) -> Option<Decimal> {
        self.get(field).and_then(FieldValue::as_decimal)
    }
}
