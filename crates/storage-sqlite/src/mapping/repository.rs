use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use cuprum_core::contracts::SlotKey;
use cuprum_core::mapping::{GenericContractMapping, MappingRepositoryTrait};
use cuprum_core::{Exchange, Result};

use super::model::GenericContractMappingDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::generic_contract_mappings;
use crate::utils::format_date;

pub struct MappingRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl MappingRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        MappingRepository { pool, writer }
    }
}

fn to_domain(rows: Vec<GenericContractMappingDB>) -> Result<Vec<GenericContractMapping>> {
    rows.into_iter()
        .map(|row| GenericContractMapping::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl MappingRepositoryTrait for MappingRepository {
    fn load_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = generic_contract_mappings::table
            .filter(generic_contract_mappings::exchange.eq(exchange.code()))
            .filter(generic_contract_mappings::trade_date.eq(format_date(trade_date)))
            .order(generic_contract_mappings::slot.asc())
            .select(GenericContractMappingDB::as_select())
            .load::<GenericContractMappingDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = generic_contract_mappings::table
            .filter(generic_contract_mappings::exchange.eq(key.exchange.code()))
            .filter(generic_contract_mappings::slot.eq(key.slot as i32))
            .filter(generic_contract_mappings::trade_date.ge(format_date(start)))
            .filter(generic_contract_mappings::trade_date.le(format_date(end)))
            .order(generic_contract_mappings::trade_date.asc())
            .select(GenericContractMappingDB::as_select())
            .load::<GenericContractMappingDB>(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn insert_missing(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize> {
        let date_text = format_date(trade_date);
        let rows: Vec<GenericContractMappingDB> = rows
            .into_iter()
            .map(GenericContractMappingDB::from)
            .filter(|row| row.exchange == exchange.code() && row.trade_date == date_text)
            .collect();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut inserted = 0;
                for row in rows {
                    inserted += diesel::insert_into(generic_contract_mappings::table)
                        .values(&row)
                        .on_conflict((
                            generic_contract_mappings::exchange,
                            generic_contract_mappings::slot,
                            generic_contract_mappings::trade_date,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(inserted)
            })
            .await
    }

    async fn replace_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize> {
        let date_text = format_date(trade_date);
        let rows: Vec<GenericContractMappingDB> = rows.into_iter().map(Into::into).collect();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    generic_contract_mappings::table
                        .filter(generic_contract_mappings::exchange.eq(exchange.code()))
                        .filter(generic_contract_mappings::trade_date.eq(&date_text)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                if rows.is_empty() {
                    return Ok(0);
                }
                diesel::insert_into(generic_contract_mappings::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(|e| StorageError::from(e).into())
            })
            .await
    }
}
