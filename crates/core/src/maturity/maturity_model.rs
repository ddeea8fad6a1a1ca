use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::contracts::SlotKey;
use crate::exchanges::Exchange;
use crate::mapping::SlotFailure;

/// Derived maturity view for one generic slot on one trade date.
///
/// Always recomputed from the mapping and the calendar, never edited.
/// `calendar_days_remaining == trading_days_remaining + holidays_in_window`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityFact {
    pub exchange: Exchange,
    pub slot: u32,
    pub trade_date: NaiveDate,
    pub concrete_ticker: String,
    pub last_tradeable_date: NaiveDate,
    pub calendar_days_remaining: i64,
    pub trading_days_remaining: i64,
    pub holidays_in_window: i64,
    pub roll_due: bool,
    pub computed_at: NaiveDateTime,
}

impl MaturityFact {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.exchange, self.slot)
    }
}

/// Facts computed and stored for one (exchange, trade date).
#[derive(Debug)]
pub struct MaturityRun {
    pub exchange: Exchange,
    pub trade_date: NaiveDate,
    pub facts: Vec<MaturityFact>,
    pub failures: Vec<SlotFailure>,
    pub written: usize,
}
