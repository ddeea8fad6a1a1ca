//! Generic-to-concrete mapping models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::contracts::SlotKey;
use crate::errors::Error;
use crate::exchanges::Exchange;

/// Which concrete contract a generic slot referred to on a trade date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericContractMapping {
    pub exchange: Exchange,
    pub slot: u32,
    pub trade_date: NaiveDate,
    pub concrete_contract_id: String,
    pub concrete_ticker: String,
    /// `None` when the contract had no last-tradeable-date at resolution.
    pub last_tradeable_date: Option<NaiveDate>,
    /// Calendar days from the trade date to the last-tradeable-date.
    pub days_to_last_trade: Option<i64>,
    pub resolved_at: NaiveDateTime,
}

impl GenericContractMapping {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.exchange, self.slot)
    }

    /// Same contract and reference data, ignoring `resolved_at`.
    pub fn same_assignment(&self, other: &GenericContractMapping) -> bool {
        self.exchange == other.exchange
            && self.slot == other.slot
            && self.trade_date == other.trade_date
            && self.concrete_contract_id == other.concrete_contract_id
            && self.concrete_ticker == other.concrete_ticker
            && self.last_tradeable_date == other.last_tradeable_date
            && self.days_to_last_trade == other.days_to_last_trade
    }
}

/// How a date's mapping rows are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingWriteMode {
    /// Past trade date: existing rows are frozen, only missing slots are added.
    WriteOnce,
    /// Today or a future date: the date's rows are deleted and reinserted.
    Replace,
}

/// A slot that could not be resolved.
#[derive(Debug)]
pub struct SlotFailure {
    pub slot: u32,
    pub error: Error,
}

/// Pure slot assignment for one (exchange, trade date).
#[derive(Debug)]
pub struct SlotAssignment {
    pub mappings: Vec<GenericContractMapping>,
    pub failures: Vec<SlotFailure>,
    /// Unexpired contracts that were available to assign.
    pub available: usize,
}

/// Result of `resolve_mapping`.
#[derive(Debug)]
pub struct ResolvedMapping {
    pub exchange: Exchange,
    pub trade_date: NaiveDate,
    pub write_mode: MappingWriteMode,
    /// Effective rows for every resolvable active slot, ordered by slot.
    pub mappings: Vec<GenericContractMapping>,
    pub failures: Vec<SlotFailure>,
    /// Rows written by this call.
    pub written: usize,
}

impl ResolvedMapping {
    pub fn mapping_for_slot(&self, slot: u32) -> Option<&GenericContractMapping> {
        self.mappings.iter().find(|m| m.slot == slot)
    }

    pub fn failure_for_slot(&self, slot: u32) -> Option<&SlotFailure> {
        self.failures.iter().find(|f| f.slot == slot)
    }
}
