use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use cuprum_core::calendar::{CalendarHorizon, CalendarRepositoryTrait, TradingCalendarDay};
use cuprum_core::{Exchange, Result};

use super::model::TradingCalendarDayDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::trading_calendar_days;
use crate::schema::trading_calendar_days::dsl::*;
use crate::utils::{chunk_for_sqlite, format_date, parse_date};

pub struct CalendarRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CalendarRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        CalendarRepository { pool, writer }
    }
}

#[async_trait]
impl CalendarRepositoryTrait for CalendarRepository {
    fn load_days(&self, for_exchange: Exchange) -> Result<Vec<TradingCalendarDay>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = trading_calendar_days
            .filter(exchange.eq(for_exchange.code()))
            .order(calendar_date.asc())
            .select(TradingCalendarDayDB::as_select())
            .load::<TradingCalendarDayDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| TradingCalendarDay::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_horizon(&self, for_exchange: Exchange) -> Result<Option<CalendarHorizon>> {
        let mut conn = get_connection(&self.pool)?;
        let (first, last) = trading_calendar_days
            .filter(exchange.eq(for_exchange.code()))
            .select((min(calendar_date), max(calendar_date)))
            .first::<(Option<String>, Option<String>)>(&mut conn)
            .map_err(StorageError::from)?;
        match (first, last) {
            (Some(first), Some(last)) => Ok(Some(CalendarHorizon {
                start: parse_date(&first)?,
                end: parse_date(&last)?,
            })),
            _ => Ok(None),
        }
    }

    async fn replace_range(
        &self,
        for_exchange: Exchange,
        from: NaiveDate,
        to: NaiveDate,
        days: Vec<TradingCalendarDay>,
    ) -> Result<usize> {
        let rows: Vec<TradingCalendarDayDB> = days.into_iter().map(Into::into).collect();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    trading_calendar_days::table
                        .filter(exchange.eq(for_exchange.code()))
                        .filter(calendar_date.ge(format_date(from)))
                        .filter(calendar_date.le(format_date(to))),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                let mut inserted = 0;
                for chunk in chunk_for_sqlite(&rows) {
                    inserted += diesel::insert_into(trading_calendar_days::table)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(inserted)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use cuprum_core::calendar::{TradingCalendarService, TradingCalendarServiceTrait};
    use cuprum_core::exchanges::HolidayCalendarSpec;
    use chrono::Weekday;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    async fn create_test_repository() -> (CalendarRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (CalendarRepository::new(Arc::clone(&pool), writer), temp_dir)
    }

    fn day(date: NaiveDate, trading: bool, label: Option<&str>) -> TradingCalendarDay {
        TradingCalendarDay {
            exchange: Exchange::Lme,
            date,
            is_trading_day: trading,
            holiday_label: label.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_replace_range_and_horizon() {
        let (repo, _temp_dir) = create_test_repository().await;
        assert!(repo.get_horizon(Exchange::Lme).unwrap().is_none());

        let days = vec![
            day(d(2025, 12, 24), true, None),
            day(d(2025, 12, 25), false, Some("Christmas Day")),
            day(d(2025, 12, 26), false, Some("Boxing Day")),
        ];
        let written = repo
            .replace_range(Exchange::Lme, d(2025, 12, 24), d(2025, 12, 26), days.clone())
            .await
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(repo.load_days(Exchange::Lme).unwrap(), days);
        assert_eq!(
            repo.get_horizon(Exchange::Lme).unwrap(),
            Some(CalendarHorizon {
                start: d(2025, 12, 24),
                end: d(2025, 12, 26),
            })
        );
        assert!(repo.load_days(Exchange::Comex).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_range_overwrites_only_the_range() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.replace_range(
            Exchange::Lme,
            d(2025, 12, 24),
            d(2025, 12, 26),
            vec![
                day(d(2025, 12, 24), true, None),
                day(d(2025, 12, 25), true, None),
                day(d(2025, 12, 26), true, None),
            ],
        )
        .await
        .unwrap();

        repo.replace_range(
            Exchange::Lme,
            d(2025, 12, 25),
            d(2025, 12, 25),
            vec![day(d(2025, 12, 25), false, Some("Christmas Day"))],
        )
        .await
        .unwrap();

        let stored = repo.load_days(Exchange::Lme).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored[0].is_trading_day);
        assert_eq!(stored[1].holiday_label.as_deref(), Some("Christmas Day"));
        assert!(stored[2].is_trading_day);
    }

    #[tokio::test]
    async fn test_replace_range_with_no_days_deletes_the_range() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.replace_range(
            Exchange::Lme,
            d(2025, 12, 30),
            d(2026, 1, 2),
            vec![
                day(d(2025, 12, 30), true, None),
                day(d(2025, 12, 31), true, None),
                day(d(2026, 1, 1), false, Some("New Year's Day")),
                day(d(2026, 1, 2), true, None),
            ],
        )
        .await
        .unwrap();

        let written = repo
            .replace_range(Exchange::Lme, d(2026, 1, 1), d(2026, 1, 2), Vec::new())
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(
            repo.get_horizon(Exchange::Lme).unwrap(),
            Some(CalendarHorizon {
                start: d(2025, 12, 30),
                end: d(2025, 12, 31)
            })
        );
    }

    #[tokio::test]
    async fn test_service_counts_over_sqlite_calendar() {
        let (repo, _temp_dir) = create_test_repository().await;
        let mut holidays = BTreeMap::new();
        holidays.insert(d(2025, 4, 18), "Good Friday".to_string());
        holidays.insert(d(2025, 4, 21), "Easter Monday".to_string());
        let spec = HolidayCalendarSpec::new(
            Exchange::Lme,
            vec![Weekday::Sat, Weekday::Sun],
            holidays,
            d(2025, 12, 31),
        );
        let service =
            TradingCalendarService::new(Arc::new(repo), d(2025, 1, 1)).with_spec(spec);

        let horizon = service.ensure_calendar(Exchange::Lme).await.unwrap();
        assert_eq!(horizon.start, d(2025, 1, 1));
        assert_eq!(horizon.end, d(2025, 12, 31));

        let trading = service
            .trading_days_between(Exchange::Lme, d(2025, 4, 14), d(2025, 4, 22))
            .await
            .unwrap();
        assert_eq!(trading, 4);
        assert!(!service.is_trading_day(Exchange::Lme, d(2025, 4, 21)).await.unwrap());
    }
}
