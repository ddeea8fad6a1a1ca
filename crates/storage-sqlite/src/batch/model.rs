use diesel::prelude::*;
use std::str::FromStr;

use cuprum_core::batch::{BatchProgress, ProgressStatus};

use crate::errors::StorageError;
use crate::utils::{format_date, format_timestamp, parse_date, parse_exchange, parse_timestamp, to_u32};

/// Database model for one (exchange, trade date) progress record
#[derive(Queryable, Insertable, Selectable, AsChangeset, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::batch_progress)]
#[diesel(primary_key(exchange, trade_date))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchProgressDB {
    pub exchange: String,
    pub trade_date: String,
    pub status: String,
    pub mapped_slots: i32,
    pub failed_slots: i32,
    pub last_error: Option<String>,
    pub updated_at: String,
}

impl From<BatchProgress> for BatchProgressDB {
    fn from(domain: BatchProgress) -> Self {
        Self {
            exchange: domain.exchange.code().to_string(),
            trade_date: format_date(domain.trade_date),
            status: domain.status.as_str().to_string(),
            mapped_slots: domain.mapped_slots as i32,
            failed_slots: domain.failed_slots as i32,
            last_error: domain.last_error,
            updated_at: format_timestamp(domain.updated_at),
        }
    }
}

impl TryFrom<BatchProgressDB> for BatchProgress {
    type Error = StorageError;

    fn try_from(db: BatchProgressDB) -> Result<Self, Self::Error> {
        let status = ProgressStatus::from_str(&db.status)
            .map_err(|_| StorageError::CorruptValue(format!("progress status '{}'", db.status)))?;
        Ok(Self {
            exchange: parse_exchange(&db.exchange)?,
            trade_date: parse_date(&db.trade_date)?,
            status,
            mapped_slots: to_u32(db.mapped_slots, "mapped_slots")?,
            failed_slots: to_u32(db.failed_slots, "failed_slots")?,
            last_error: db.last_error,
            updated_at: parse_timestamp(&db.updated_at)?,
        })
    }
}
