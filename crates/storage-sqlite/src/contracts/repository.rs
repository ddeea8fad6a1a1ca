use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use cuprum_core::contracts::{
    ConcreteContract, ConcreteContractRepositoryTrait, GenericContractDefinition,
    GenericContractRepositoryTrait, NewConcreteContract, NewGenericContractDefinition, SlotKey,
};
use cuprum_core::{Exchange, Result};

use super::model::{ConcreteContractDB, GenericContractDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{concrete_contracts, generic_contracts};
use crate::utils::format_timestamp;

fn now_text() -> String {
    format_timestamp(Utc::now().naive_utc())
}

// =============================================================================
// Generic contract slots
// =============================================================================

pub struct GenericContractRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GenericContractRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GenericContractRepository { pool, writer }
    }
}

#[async_trait]
impl GenericContractRepositoryTrait for GenericContractRepository {
    fn list_for_exchange(&self, exchange: Exchange) -> Result<Vec<GenericContractDefinition>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = generic_contracts::table
            .filter(generic_contracts::exchange.eq(exchange.code()))
            .order(generic_contracts::slot.asc())
            .select(GenericContractDB::as_select())
            .load::<GenericContractDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| GenericContractDefinition::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_by_key(&self, key: &SlotKey) -> Result<Option<GenericContractDefinition>> {
        let mut conn = get_connection(&self.pool)?;
        let row = generic_contracts::table
            .filter(generic_contracts::exchange.eq(key.exchange.code()))
            .filter(generic_contracts::slot.eq(key.slot as i32))
            .select(GenericContractDB::as_select())
            .first::<GenericContractDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(|r| GenericContractDefinition::try_from(r).map_err(Into::into))
            .transpose()
    }

    async fn upsert_definitions(
        &self,
        definitions: Vec<NewGenericContractDefinition>,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let now = now_text();
                let mut affected_rows = 0;
                for new in definitions {
                    let existing = generic_contracts::table
                        .filter(generic_contracts::exchange.eq(new.exchange.code()))
                        .filter(generic_contracts::slot.eq(new.slot as i32))
                        .select(GenericContractDB::as_select())
                        .first::<GenericContractDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    affected_rows += match existing {
                        Some(current) => {
                            let mut row = GenericContractDB::from_new(current.id.clone(), new, &now);
                            row.created_at = current.created_at;
                            diesel::update(generic_contracts::table.find(current.id))
                                .set(&row)
                                .execute(conn)
                                .map_err(StorageError::from)?
                        }
                        None => {
                            let id = new
                                .id
                                .clone()
                                .unwrap_or_else(|| Uuid::new_v4().to_string());
                            diesel::insert_into(generic_contracts::table)
                                .values(GenericContractDB::from_new(id, new, &now))
                                .execute(conn)
                                .map_err(StorageError::from)?
                        }
                    };
                }
                Ok(affected_rows)
            })
            .await
    }
}

// =============================================================================
// Concrete contracts
// =============================================================================

pub struct ConcreteContractRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ConcreteContractRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ConcreteContractRepository { pool, writer }
    }
}

#[async_trait]
impl ConcreteContractRepositoryTrait for ConcreteContractRepository {
    fn list_for_exchange(
        &self,
        exchange: Exchange,
        instrument_family: &str,
    ) -> Result<Vec<ConcreteContract>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = concrete_contracts::table
            .filter(concrete_contracts::exchange.eq(exchange.code()))
            .filter(concrete_contracts::instrument_family.eq(instrument_family))
            .order((
                concrete_contracts::contract_year.asc(),
                concrete_contracts::contract_month.asc(),
            ))
            .select(ConcreteContractDB::as_select())
            .load::<ConcreteContractDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| ConcreteContract::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_by_ticker(&self, ticker: &str) -> Result<Option<ConcreteContract>> {
        let mut conn = get_connection(&self.pool)?;
        let row = concrete_contracts::table
            .filter(concrete_contracts::ticker.eq(ticker))
            .select(ConcreteContractDB::as_select())
            .first::<ConcreteContractDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(|r| ConcreteContract::try_from(r).map_err(Into::into))
            .transpose()
    }

    /// Reference fields the provider did not return keep their stored value.
    async fn upsert_contracts(&self, contracts: Vec<NewConcreteContract>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let now = now_text();
                let mut affected_rows = 0;
                for new in contracts {
                    let existing = concrete_contracts::table
                        .filter(concrete_contracts::ticker.eq(new.ticker.as_str()))
                        .select(ConcreteContractDB::as_select())
                        .first::<ConcreteContractDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;

                    affected_rows += match existing {
                        Some(current) => {
                            let mut row =
                                ConcreteContractDB::from_new(current.id.clone(), new, &now);
                            row.created_at = current.created_at;
                            row.last_tradeable_date =
                                row.last_tradeable_date.or(current.last_tradeable_date);
                            row.final_delivery_date =
                                row.final_delivery_date.or(current.final_delivery_date);
                            row.contract_size = row.contract_size.or(current.contract_size);
                            row.tick_size = row.tick_size.or(current.tick_size);
                            diesel::update(concrete_contracts::table.find(current.id))
                                .set(&row)
                                .execute(conn)
                                .map_err(StorageError::from)?
                        }
                        None => {
                            let id = new
                                .id
                                .clone()
                                .unwrap_or_else(|| Uuid::new_v4().to_string());
                            diesel::insert_into(concrete_contracts::table)
                                .values(ConcreteContractDB::from_new(id, new, &now))
                                .execute(conn)
                                .map_err(StorageError::from)?
                        }
                    };
                }
                Ok(affected_rows)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::NaiveDate;
    use cuprum_core::contracts::{
        default_generic_definitions, ContractCatalogService, ContractCatalogServiceTrait,
        ContractTicker, MonthCode,
    };
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn create_test_repositories() -> (
        GenericContractRepository,
        ConcreteContractRepository,
        tempfile::TempDir,
    ) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (
            GenericContractRepository::new(Arc::clone(&pool), writer.clone()),
            ConcreteContractRepository::new(Arc::clone(&pool), writer),
            temp_dir,
        )
    }

    fn hg(year: i32, month: MonthCode) -> NewConcreteContract {
        NewConcreteContract::copper(Exchange::Comex, &ContractTicker::new(Exchange::Comex, year, month))
    }

    #[tokio::test]
    async fn test_seeding_defaults_is_idempotent() {
        let (generic, _concrete, _temp_dir) = create_test_repositories().await;
        let catalog = ContractCatalogService::new(Arc::new(generic));

        assert_eq!(catalog.seed_default_definitions(Exchange::Lme).await.unwrap(), 24);
        assert_eq!(catalog.seed_default_definitions(Exchange::Lme).await.unwrap(), 0);

        let active = catalog.active_definitions(Exchange::Lme).unwrap();
        assert_eq!(active.len(), 24);
        assert_eq!(active[0].ticker, "LP1 Comdty");
        assert_eq!(active[23].slot, 24);
        assert!(catalog.active_definitions(Exchange::Shfe).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_definition_keeps_id() {
        let (generic, _concrete, _temp_dir) = create_test_repositories().await;
        generic
            .upsert_definitions(default_generic_definitions(Exchange::Shfe))
            .await
            .unwrap();
        let key = SlotKey::new(Exchange::Shfe, 3);
        let before = generic.get_by_key(&key).unwrap().unwrap();

        let mut changed = default_generic_definitions(Exchange::Shfe)[2].clone();
        changed.roll_offset_days = 2;
        changed.is_active = false;
        generic.upsert_definitions(vec![changed]).await.unwrap();

        let after = generic.get_by_key(&key).unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.roll_offset_days, 2);
        assert!(!after.is_active);
        assert_eq!(generic.list_for_exchange(Exchange::Shfe).unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_concrete_upsert_merges_reference_fields() {
        let (_generic, concrete, _temp_dir) = create_test_repositories().await;
        let mut first = hg(2025, MonthCode::H);
        first.last_tradeable_date = NaiveDate::from_ymd_opt(2025, 3, 27);
        first.contract_size = Some(dec!(25000));
        concrete.upsert_contracts(vec![first]).await.unwrap();
        let stored = concrete.get_by_ticker("HGH25 Comdty").unwrap().unwrap();

        // A later refresh without reference fields must not erase them.
        let mut refresh = hg(2025, MonthCode::H);
        refresh.tick_size = Some(dec!(0.0005));
        concrete.upsert_contracts(vec![refresh, hg(2025, MonthCode::K)]).await.unwrap();

        let merged = concrete.get_by_ticker("HGH25 Comdty").unwrap().unwrap();
        assert_eq!(merged.id, stored.id);
        assert_eq!(merged.last_tradeable_date, NaiveDate::from_ymd_opt(2025, 3, 27));
        assert_eq!(merged.contract_size, Some(dec!(25000)));
        assert_eq!(merged.tick_size, Some(dec!(0.0005)));

        let listed = concrete.list_for_exchange(Exchange::Comex, "COPPER").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].ticker, "HGK25 Comdty");
        assert_eq!(listed[1].last_tradeable_date, None);
        assert!(concrete.list_for_exchange(Exchange::Lme, "COPPER").unwrap().is_empty());
    }
}
