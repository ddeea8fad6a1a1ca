use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use cuprum_core::contracts::SlotKey;
use cuprum_core::maturity::{MaturityFact, MaturityRepositoryTrait};
use cuprum_core::{Exchange, Result};

use super::model::MaturityFactDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::maturity_facts;
use crate::schema::maturity_facts::dsl::*;
use crate::utils::format_date;

pub struct MaturityRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl MaturityRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        MaturityRepository { pool, writer }
    }
}

#[async_trait]
impl MaturityRepositoryTrait for MaturityRepository {
    fn load_for_date(
        &self,
        for_exchange: Exchange,
        for_date: NaiveDate,
    ) -> Result<Vec<MaturityFact>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = maturity_facts
            .filter(exchange.eq(for_exchange.code()))
            .filter(trade_date.eq(format_date(for_date)))
            .order(slot.asc())
            .select(MaturityFactDB::as_select())
            .load::<MaturityFactDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| MaturityFact::try_from(row).map_err(Into::into))
            .collect()
    }

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MaturityFact>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = maturity_facts
            .filter(exchange.eq(key.exchange.code()))
            .filter(slot.eq(key.slot as i32))
            .filter(trade_date.ge(format_date(start)))
            .filter(trade_date.le(format_date(end)))
            .order(trade_date.asc())
            .select(MaturityFactDB::as_select())
            .load::<MaturityFactDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| MaturityFact::try_from(row).map_err(Into::into))
            .collect()
    }

    async fn replace_for_date(
        &self,
        for_exchange: Exchange,
        for_date: NaiveDate,
        facts: Vec<MaturityFact>,
    ) -> Result<usize> {
        let rows: Vec<MaturityFactDB> = facts.into_iter().map(Into::into).collect();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    maturity_facts::table
                        .filter(exchange.eq(for_exchange.code()))
                        .filter(trade_date.eq(format_date(for_date))),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                if rows.is_empty() {
                    return Ok(0);
                }
                Ok(diesel::insert_into(maturity_facts::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn create_test_repository() -> (MaturityRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (MaturityRepository::new(Arc::clone(&pool), writer), temp_dir)
    }

    fn fact(fact_slot: u32, date: NaiveDate, trading: i64, holidays: i64) -> MaturityFact {
        MaturityFact {
            exchange: Exchange::Shfe,
            slot: fact_slot,
            trade_date: date,
            concrete_ticker: "CUK25 Comdty".to_string(),
            last_tradeable_date: d(2025, 5, 15),
            calendar_days_remaining: trading + holidays,
            trading_days_remaining: trading,
            holidays_in_window: holidays,
            roll_due: trading <= 5,
            computed_at: date.and_hms_opt(18, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_replace_for_date_round_trips_facts() {
        let (repo, _temp_dir) = create_test_repository().await;
        let date = d(2025, 5, 6);
        let facts = vec![fact(2, date, 7, 2), fact(1, date, 4, 5)];

        assert_eq!(repo.replace_for_date(Exchange::Shfe, date, facts.clone()).await.unwrap(), 2);

        let stored = repo.load_for_date(Exchange::Shfe, date).unwrap();
        assert_eq!(stored, vec![facts[1].clone(), facts[0].clone()]);
        assert!(stored[0].roll_due);
        assert!(repo.load_for_date(Exchange::Lme, date).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recompute_replaces_previous_facts() {
        let (repo, _temp_dir) = create_test_repository().await;
        let date = d(2025, 5, 6);
        repo.replace_for_date(Exchange::Shfe, date, vec![fact(1, date, 4, 5), fact(2, date, 7, 2)])
            .await
            .unwrap();

        repo.replace_for_date(Exchange::Shfe, date, vec![fact(1, date, 3, 6)])
            .await
            .unwrap();

        let stored = repo.load_for_date(Exchange::Shfe, date).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].trading_days_remaining, 3);
        assert_eq!(stored[0].holidays_in_window, 6);
    }

    #[tokio::test]
    async fn test_load_for_slot_is_bounded_and_ordered() {
        let (repo, _temp_dir) = create_test_repository().await;
        for day in [7, 5, 6] {
            let date = d(2025, 5, day);
            repo.replace_for_date(Exchange::Shfe, date, vec![fact(1, date, 10 - day as i64, 0)])
                .await
                .unwrap();
        }

        let history = repo
            .load_for_slot(&SlotKey::new(Exchange::Shfe, 1), d(2025, 5, 5), d(2025, 5, 6))
            .unwrap();
        let trading: Vec<_> = history.iter().map(|f| f.trading_days_remaining).collect();
        assert_eq!(trading, vec![5, 4]);
    }
}
