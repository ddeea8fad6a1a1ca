use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use cuprum_core::batch::{BatchProgress, ProgressRepositoryTrait, ProgressStatus};
use cuprum_core::{Exchange, Result};

use super::model::BatchProgressDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::batch_progress;
use crate::utils::{format_date, parse_date};

const PROCESSED_STATUSES: [ProgressStatus; 2] = [ProgressStatus::Completed, ProgressStatus::Partial];

fn processed_status_codes() -> Vec<&'static str> {
    PROCESSED_STATUSES.iter().map(ProgressStatus::as_str).collect()
}

pub struct ProgressRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ProgressRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProgressRepository { pool, writer }
    }
}

#[async_trait]
impl ProgressRepositoryTrait for ProgressRepository {
    fn get(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Option<BatchProgress>> {
        let mut conn = get_connection(&self.pool)?;
        let row = batch_progress::table
            .find((exchange.code(), format_date(trade_date)))
            .select(BatchProgressDB::as_select())
            .first::<BatchProgressDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(|r| BatchProgress::try_from(r).map_err(Into::into))
            .transpose()
    }

    fn processed_dates(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let dates = batch_progress::table
            .filter(batch_progress::exchange.eq(exchange.code()))
            .filter(batch_progress::trade_date.ge(format_date(start)))
            .filter(batch_progress::trade_date.le(format_date(end)))
            .filter(batch_progress::status.eq_any(processed_status_codes()))
            .order(batch_progress::trade_date.asc())
            .select(batch_progress::trade_date)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        dates
            .iter()
            .map(|date| parse_date(date).map_err(Into::into))
            .collect()
    }

    fn last_processed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let last = batch_progress::table
            .filter(batch_progress::exchange.eq(exchange.code()))
            .filter(batch_progress::status.eq_any(processed_status_codes()))
            .select(max(batch_progress::trade_date))
            .first::<Option<String>>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(last.as_deref().map(parse_date).transpose()?)
    }

    fn earliest_failed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let first = batch_progress::table
            .filter(batch_progress::exchange.eq(exchange.code()))
            .filter(batch_progress::status.eq(ProgressStatus::Failed.as_str()))
            .select(min(batch_progress::trade_date))
            .first::<Option<String>>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(first.as_deref().map(parse_date).transpose()?)
    }

    async fn record(&self, progress: BatchProgress) -> Result<()> {
        let row = BatchProgressDB::from(progress);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(batch_progress::table)
                    .values(&row)
                    .on_conflict((batch_progress::exchange, batch_progress::trade_date))
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
