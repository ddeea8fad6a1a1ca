//! Database models for mappings.

use diesel::prelude::*;

use cuprum_core::mapping::GenericContractMapping;

use crate::errors::StorageError;
use crate::utils::{
    format_date, format_timestamp, parse_date, parse_exchange, parse_optional_date,
    parse_timestamp, to_u32,
};

/// Database model for one (exchange, slot, trade date) mapping
#[derive(Queryable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::generic_contract_mappings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GenericContractMappingDB {
    pub exchange: String,
    pub slot: i32,
    pub trade_date: String,
    pub concrete_contract_id: String,
    pub concrete_ticker: String,
    pub last_tradeable_date: Option<String>,
    pub days_to_last_trade: Option<i64>,
    pub resolved_at: String,
}

impl From<GenericContractMapping> for GenericContractMappingDB {
    fn from(domain: GenericContractMapping) -> Self {
        Self {
            exchange: domain.exchange.code().to_string(),
            slot: domain.slot as i32,
            trade_date: format_date(domain.trade_date),
            concrete_contract_id: domain.concrete_contract_id,
            concrete_ticker: domain.concrete_ticker,
            last_tradeable_date: domain.last_tradeable_date.map(format_date),
            days_to_last_trade: domain.days_to_last_trade,
            resolved_at: format_timestamp(domain.resolved_at),
        }
    }
}

impl TryFrom<GenericContractMappingDB> for GenericContractMapping {
    type Error = StorageError;

    fn try_from(db: GenericContractMappingDB) -> Result<Self, Self::Error> {
        Ok(Self {
            exchange: parse_exchange(&db.exchange)?,
            slot: to_u32(db.slot, "slot")?,
            trade_date: parse_date(&db.trade_date)?,
            concrete_contract_id: db.concrete_contract_id,
            concrete_ticker: db.concrete_ticker,
            last_tradeable_date: parse_optional_date(db.last_tradeable_date.as_deref())?,
            days_to_last_trade: db.days_to_last_trade,
            resolved_at: parse_timestamp(&db.resolved_at)?,
        })
    }
}
