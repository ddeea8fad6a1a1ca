//! Contract domain models.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{COPPER_FAMILY, DEFAULT_ROLL_OFFSET_DAYS};
use crate::contracts::month_code::{generic_ticker, ContractTicker, MonthCode};
use crate::errors::{Error, Result, ValidationError};
use crate::exchanges::Exchange;
use crate::utils::time_utils::last_day_of_month;

/// Exchange-scoped address of a generic slot.
///
/// This, never the storage id, is what the resolver and the maturity
/// calculator key on: two exchanges both have a slot 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub exchange: Exchange,
    pub slot: u32,
}

impl SlotKey {
    pub fn new(exchange: Exchange, slot: u32) -> Self {
        Self { exchange, slot }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.exchange, self.slot)
    }
}

/// Domain model representing a generic ("Nth nearby") contract slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenericContractDefinition {
    /// Storage identifier. Opaque to business logic.
    pub id: String,
    pub exchange: Exchange,
    /// 1-based nearby number within the exchange.
    pub slot: u32,
    pub ticker: String,
    pub instrument_family: String,
    /// Trading days before last-tradeable-date at which a roll is due.
    pub roll_offset_days: u32,
    pub is_active: bool,
}

impl GenericContractDefinition {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.exchange, self.slot)
    }
}

/// Input model for creating or updating a generic contract slot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewGenericContractDefinition {
    pub id: Option<String>,
    pub exchange: Exchange,
    pub slot: u32,
    pub ticker: String,
    pub instrument_family: String,
    pub roll_offset_days: u32,
    pub is_active: bool,
}

impl NewGenericContractDefinition {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.exchange, self.slot)
    }
}

/// Default copper slots for an exchange: `<ROOT>1 .. <ROOT>N`.
pub fn default_generic_definitions(exchange: Exchange) -> Vec<NewGenericContractDefinition> {
    (1..=exchange.default_generic_slots())
        .map(|slot| NewGenericContractDefinition {
            id: None,
            exchange,
            slot,
            ticker: generic_ticker(exchange, slot),
            instrument_family: COPPER_FAMILY.to_string(),
            roll_offset_days: DEFAULT_ROLL_OFFSET_DAYS,
            is_active: true,
        })
        .collect()
}

/// Checks that slots are unique within the exchange and run 1..=N with no
/// gaps.
pub fn validate_slot_sequence(
    exchange: Exchange,
    definitions: &[GenericContractDefinition],
) -> Result<()> {
    let mut slots: Vec<u32> = definitions
        .iter()
        .filter(|d| d.exchange == exchange)
        .map(|d| d.slot)
        .collect();
    slots.sort_unstable();

    for (i, slot) in slots.iter().enumerate() {
        let expected = i as u32 + 1;
        if *slot != expected {
            let detail = if i > 0 && slots[i - 1] == *slot {
                format!("slot {} is defined more than once", slot)
            } else {
                format!("expected slot {} but found {}", expected, slot)
            };
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} generic slots are not a 1..N sequence: {}",
                exchange, detail
            ))));
        }
    }
    Ok(())
}

/// Domain model representing a concrete, dated futures contract
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConcreteContract {
    pub id: String,
    pub exchange: Exchange,
    pub instrument_family: String,
    pub contract_year: i32,
    pub contract_month: u32,
    pub month_code: MonthCode,
    pub ticker: String,
    pub last_tradeable_date: Option<NaiveDate>,
    pub final_delivery_date: Option<NaiveDate>,
    pub contract_size: Option<Decimal>,
    pub tick_size: Option<Decimal>,
}

impl ConcreteContract {
    /// Last calendar day of the delivery month. Used to order contracts
    /// whose last-tradeable-date is unknown.
    pub fn contract_month_end(&self) -> Option<NaiveDate> {
        last_day_of_month(self.contract_year, self.contract_month)
    }

    pub fn require_last_tradeable_date(&self) -> Result<NaiveDate> {
        self.last_tradeable_date
            .ok_or_else(|| Error::ReferenceDataMissing {
                ticker: self.ticker.clone(),
                field: "last_tradeable_date".to_string(),
            })
    }
}

/// Input model for upserting a concrete contract, keyed by ticker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewConcreteContract {
    pub id: Option<String>,
    pub exchange: Exchange,
    pub instrument_family: String,
    pub contract_year: i32,
    pub contract_month: u32,
    pub month_code: MonthCode,
    pub ticker: String,
    pub last_tradeable_date: Option<NaiveDate>,
    pub final_delivery_date: Option<NaiveDate>,
    pub contract_size: Option<Decimal>,
    pub tick_size: Option<Decimal>,
}

impl NewConcreteContract {
    /// A copper contract with no reference fields yet.
    pub fn copper(exchange: Exchange, ticker: &ContractTicker) -> Self {
        Self {
            id: None,
            exchange,
            instrument_family: COPPER_FAMILY.to_string(),
            contract_year: ticker.year,
            contract_month: ticker.contract_month(),
            month_code: ticker.month,
            ticker: ticker.to_string(),
            last_tradeable_date: None,
            final_delivery_date: None,
            contract_size: None,
            tick_size: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if MonthCode::from_month(self.contract_month) != Some(self.month_code) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{}: month code {} does not match contract month {}",
                self.ticker, self.month_code, self.contract_month
            ))));
        }
        if let (Some(ltd), Some(delivery)) = (self.last_tradeable_date, self.final_delivery_date) {
            if delivery < ltd {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "{}: final delivery {} precedes last tradeable date {}",
                    self.ticker, delivery, ltd
                ))));
            }
        }
        if let Some(ltd) = self.last_tradeable_date {
            // Copper contracts stop trading within a few months of delivery.
            let months_apart = (ltd.year() - self.contract_year) * 12 + ltd.month() as i32
                - self.contract_month as i32;
            if !(-3..=1).contains(&months_apart) {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "{}: last tradeable date {} is implausible for {}-{:02}",
                    self.ticker, ltd, self.contract_year, self.contract_month
                ))));
            }
        }
        Ok(())
    }
}
