//! Database models for contracts.

use diesel::prelude::*;
use std::str::FromStr;

use cuprum_core::contracts::{
    ConcreteContract, GenericContractDefinition, MonthCode, NewConcreteContract,
    NewGenericContractDefinition,
};

use crate::errors::StorageError;
use crate::utils::{format_date, parse_exchange, parse_optional_date, parse_optional_decimal, to_u32};

/// Database model for generic contract slots
#[derive(Queryable, Insertable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::generic_contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GenericContractDB {
    pub id: String,
    pub exchange: String,
    pub slot: i32,
    pub ticker: String,
    pub instrument_family: String,
    pub roll_offset_days: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl GenericContractDB {
    /// Row for `new`, stamped with `now`. The id must already be resolved.
    pub fn from_new(id: String, new: NewGenericContractDefinition, now: &str) -> Self {
        Self {
            id,
            exchange: new.exchange.code().to_string(),
            slot: new.slot as i32,
            ticker: new.ticker,
            instrument_family: new.instrument_family,
            roll_offset_days: new.roll_offset_days as i32,
            is_active: new.is_active,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

impl TryFrom<GenericContractDB> for GenericContractDefinition {
    type Error = StorageError;

    fn try_from(db: GenericContractDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            exchange: parse_exchange(&db.exchange)?,
            slot: to_u32(db.slot, "slot")?,
            ticker: db.ticker,
            instrument_family: db.instrument_family,
            roll_offset_days: to_u32(db.roll_offset_days, "roll_offset_days")?,
            is_active: db.is_active,
        })
    }
}

/// Database model for concrete contracts
#[derive(Queryable, Insertable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::concrete_contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ConcreteContractDB {
    pub id: String,
    pub exchange: String,
    pub instrument_family: String,
    pub contract_year: i32,
    pub contract_month: i32,
    pub month_code: String,
    pub ticker: String,
    pub last_tradeable_date: Option<String>,
    pub final_delivery_date: Option<String>,
    pub contract_size: Option<String>,
    pub tick_size: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ConcreteContractDB {
    /// Row for `new`, stamped with `now`. The id must already be resolved.
    pub fn from_new(id: String, new: NewConcreteContract, now: &str) -> Self {
        Self {
            id,
            exchange: new.exchange.code().to_string(),
            instrument_family: new.instrument_family,
            contract_year: new.contract_year,
            contract_month: new.contract_month as i32,
            month_code: new.month_code.to_string(),
            ticker: new.ticker,
            last_tradeable_date: new.last_tradeable_date.map(format_date),
            final_delivery_date: new.final_delivery_date.map(format_date),
            contract_size: new.contract_size.map(|v| v.to_string()),
            tick_size: new.tick_size.map(|v| v.to_string()),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}

impl TryFrom<ConcreteContractDB> for ConcreteContract {
    type Error = StorageError;

    fn try_from(db: ConcreteContractDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            exchange: parse_exchange(&db.exchange)?,
            instrument_family: db.instrument_family,
            contract_year: db.contract_year,
            contract_month: to_u32(db.contract_month, "contract_month")?,
            month_code: MonthCode::from_str(&db.month_code)
                .map_err(|_| StorageError::CorruptValue(format!("month code '{}'", db.month_code)))?,
            ticker: db.ticker,
            last_tradeable_date: parse_optional_date(db.last_tradeable_date.as_deref())?,
            final_delivery_date: parse_optional_date(db.final_delivery_date.as_deref())?,
            contract_size: parse_optional_decimal(db.contract_size.as_deref())?,
            tick_size: parse_optional_decimal(db.tick_size.as_deref())?,
        })
    }
}
