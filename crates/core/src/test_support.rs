//! In-memory repositories and a wired-up service harness shared by the
//! resolver, maturity and batch tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::batch::{BatchProgress, ProgressRepositoryTrait, ProgressStatus};
use crate::calendar::{
    CalendarHorizon, CalendarRepositoryTrait, TradingCalendarDay, TradingCalendarService,
};
use crate::constants::COPPER_FAMILY;
use crate::contracts::{
    generic_ticker, ConcreteContract, ConcreteContractRepositoryTrait, ContractCatalogService,
    ContractTicker, GenericContractDefinition, GenericContractRepositoryTrait, MonthCode,
    NewConcreteContract, NewGenericContractDefinition, SlotKey,
};
use crate::errors::Result;
use crate::exchanges::{Exchange, HolidayCalendarSpec};
use crate::mapping::{ContractResolver, GenericContractMapping, MappingRepositoryTrait};
use crate::maturity::{MaturityCalculator, MaturityFact, MaturityRepositoryTrait};
use crate::utils::FixedClock;

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A copper contract for `year`/`month` with the given last-tradeable-date.
pub fn concrete(
    exchange: Exchange,
    year: i32,
    month: u32,
    last_tradeable_date: Option<NaiveDate>,
) -> ConcreteContract {
    let month_code = MonthCode::from_month(month).unwrap();
    let ticker = ContractTicker::new(exchange, year, month_code).to_string();
    ConcreteContract {
        id: format!("id-{}", ticker),
        exchange,
        instrument_family: COPPER_FAMILY.to_string(),
        contract_year: year,
        contract_month: month,
        month_code,
        ticker,
        last_tradeable_date,
        final_delivery_date: None,
        contract_size: None,
        tick_size: None,
    }
}

pub fn definition(exchange: Exchange, slot: u32, roll_offset_days: u32) -> GenericContractDefinition {
    GenericContractDefinition {
        id: format!("{}-{}", exchange.code(), slot),
        exchange,
        slot,
        ticker: generic_ticker(exchange, slot),
        instrument_family: COPPER_FAMILY.to_string(),
        roll_offset_days,
        is_active: true,
    }
}

/// Saturday/Sunday weekends plus `holidays`, valid through 2030.
pub fn weekend_spec(exchange: Exchange, holidays: &[(NaiveDate, &str)]) -> HolidayCalendarSpec {
    HolidayCalendarSpec::new(
        exchange,
        vec![Weekday::Sat, Weekday::Sun],
        holidays
            .iter()
            .map(|(date, name)| (*date, name.to_string()))
            .collect(),
        d(2030, 12, 31),
    )
}

// =========================================================================
// In-memory repositories
// =========================================================================

#[derive(Clone, Default)]
pub struct InMemoryCalendarRepository {
    days: Arc<Mutex<BTreeMap<(Exchange, NaiveDate), TradingCalendarDay>>>,
}

#[async_trait]
impl CalendarRepositoryTrait for InMemoryCalendarRepository {
    fn load_days(&self, exchange: Exchange) -> Result<Vec<TradingCalendarDay>> {
        Ok(self
            .days
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.exchange == exchange)
            .cloned()
            .collect())
    }

    fn get_horizon(&self, exchange: Exchange) -> Result<Option<CalendarHorizon>> {
        let days = self.load_days(exchange)?;
        Ok(match (days.first(), days.last()) {
            (Some(first), Some(last)) => Some(CalendarHorizon {
                start: first.date,
                end: last.date,
            }),
            _ => None,
        })
    }

    async fn replace_range(
        &self,
        exchange: Exchange,
        from: NaiveDate,
        to: NaiveDate,
        days: Vec<TradingCalendarDay>,
    ) -> Result<usize> {
        let mut store = self.days.lock().unwrap();
        store.retain(|(ex, date), _| !(*ex == exchange && *date >= from && *date <= to));
        let count = days.len();
        for day in days {
            store.insert((day.exchange, day.date), day);
        }
        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGenericRepository {
    definitions: Arc<Mutex<BTreeMap<SlotKey, GenericContractDefinition>>>,
}

impl InMemoryGenericRepository {
    pub fn insert(&self, definition: GenericContractDefinition) {
        self.definitions
            .lock()
            .unwrap()
            .insert(definition.key(), definition);
    }

    pub fn seed(&self, exchange: Exchange, slots: u32, roll_offset_days: u32) {
        for slot in 1..=slots {
            self.insert(definition(exchange, slot, roll_offset_days));
        }
    }
}

#[async_trait]
impl GenericContractRepositoryTrait for InMemoryGenericRepository {
    fn list_for_exchange(&self, exchange: Exchange) -> Result<Vec<GenericContractDefinition>> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.exchange == exchange)
            .cloned()
            .collect())
    }

    fn get_by_key(&self, key: &SlotKey) -> Result<Option<GenericContractDefinition>> {
        Ok(self.definitions.lock().unwrap().get(key).cloned())
    }

    async fn upsert_definitions(
        &self,
        definitions: Vec<NewGenericContractDefinition>,
    ) -> Result<usize> {
        let mut store = self.definitions.lock().unwrap();
        let count = definitions.len();
        for new in definitions {
            let key = new.key();
            let id = store
                .get(&key)
                .map(|existing| existing.id.clone())
                .or_else(|| new.id.clone())
                .unwrap_or_else(|| format!("{}-{}", new.exchange.code(), new.slot));
            store.insert(
                key,
                GenericContractDefinition {
                    id,
                    exchange: new.exchange,
                    slot: new.slot,
                    ticker: new.ticker,
                    instrument_family: new.instrument_family,
                    roll_offset_days: new.roll_offset_days,
                    is_active: new.is_active,
                },
            );
        }
        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryConcreteRepository {
    contracts: Arc<Mutex<BTreeMap<String, ConcreteContract>>>,
}

impl InMemoryConcreteRepository {
    pub fn insert(&self, contract: ConcreteContract) {
        self.contracts
            .lock()
            .unwrap()
            .insert(contract.ticker.clone(), contract);
    }
}

#[async_trait]
impl ConcreteContractRepositoryTrait for InMemoryConcreteRepository {
    fn list_for_exchange(
        &self,
        exchange: Exchange,
        instrument_family: &str,
    ) -> Result<Vec<ConcreteContract>> {
        Ok(self
            .contracts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.exchange == exchange && c.instrument_family == instrument_family)
            .cloned()
            .collect())
    }

    fn get_by_ticker(&self, ticker: &str) -> Result<Option<ConcreteContract>> {
        Ok(self.contracts.lock().unwrap().get(ticker).cloned())
    }

    async fn upsert_contracts(&self, contracts: Vec<NewConcreteContract>) -> Result<usize> {
        let mut store = self.contracts.lock().unwrap();
        let count = contracts.len();
        for new in contracts {
            let id = store
                .get(&new.ticker)
                .map(|existing| existing.id.clone())
                .or(new.id)
                .unwrap_or_else(|| format!("id-{}", new.ticker));
            store.insert(
                new.ticker.clone(),
                ConcreteContract {
                    id,
                    exchange: new.exchange,
                    instrument_family: new.instrument_family,
                    contract_year: new.contract_year,
                    contract_month: new.contract_month,
                    month_code: new.month_code,
                    ticker: new.ticker,
                    last_tradeable_date: new.last_tradeable_date,
                    final_delivery_date: new.final_delivery_date,
                    contract_size: new.contract_size,
                    tick_size: new.tick_size,
                },
            );
        }
        Ok(count)
    }
}

type MappingKey = (Exchange, NaiveDate, u32);

#[derive(Clone, Default)]
pub struct InMemoryMappingRepository {
    rows: Arc<Mutex<BTreeMap<MappingKey, GenericContractMapping>>>,
    writes: Arc<Mutex<usize>>,
}

impl InMemoryMappingRepository {
    pub fn insert(&self, row: GenericContractMapping) {
        self.rows
            .lock()
            .unwrap()
            .insert((row.exchange, row.trade_date, row.slot), row);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Number of write calls that reached the store.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl MappingRepositoryTrait for InMemoryMappingRepository {
    fn load_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.exchange == exchange && m.trade_date == trade_date)
            .cloned()
            .collect())
    }

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.key() == *key && m.trade_date >= start && m.trade_date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.trade_date);
        Ok(rows)
    }

    async fn insert_missing(
        &self,
        _exchange: Exchange,
        _trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize> {
        *self.writes.lock().unwrap() += 1;
        let mut store = self.rows.lock().unwrap();
        let mut inserted = 0;
        for row in rows {
            let key = (row.exchange, row.trade_date, row.slot);
            if !store.contains_key(&key) {
                store.insert(key, row);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn replace_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        rows: Vec<GenericContractMapping>,
    ) -> Result<usize> {
        *self.writes.lock().unwrap() += 1;
        let mut store = self.rows.lock().unwrap();
        store.retain(|(ex, date, _), _| !(*ex == exchange && *date == trade_date));
        let count = rows.len();
        for row in rows {
            store.insert((row.exchange, row.trade_date, row.slot), row);
        }
        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMaturityRepository {
    facts: Arc<Mutex<BTreeMap<MappingKey, MaturityFact>>>,
}

#[async_trait]
impl MaturityRepositoryTrait for InMemoryMaturityRepository {
    fn load_for_date(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Vec<MaturityFact>> {
        Ok(self
            .facts
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.exchange == exchange && f.trade_date == trade_date)
            .cloned()
            .collect())
    }

    fn load_for_slot(
        &self,
        key: &SlotKey,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MaturityFact>> {
        let mut facts: Vec<_> = self
            .facts
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.key() == *key && f.trade_date >= start && f.trade_date <= end)
            .cloned()
            .collect();
        facts.sort_by_key(|f| f.trade_date);
        Ok(facts)
    }

    async fn replace_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        facts: Vec<MaturityFact>,
    ) -> Result<usize> {
        let mut store = self.facts.lock().unwrap();
        store.retain(|(ex, date, _), _| !(*ex == exchange && *date == trade_date));
        let count = facts.len();
        for fact in facts {
            store.insert((fact.exchange, fact.trade_date, fact.slot), fact);
        }
        Ok(count)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProgressRepository {
    records: Arc<Mutex<BTreeMap<(Exchange, NaiveDate), BatchProgress>>>,
}

impl InMemoryProgressRepository {
    pub fn all_for(&self, exchange: Exchange) -> Vec<BatchProgress> {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.exchange == exchange)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProgressRepositoryTrait for InMemoryProgressRepository {
    fn get(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Option<BatchProgress>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(exchange, trade_date))
            .cloned())
    }

    fn processed_dates(
        &self,
        exchange: Exchange,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        Ok(self
            .all_for(exchange)
            .into_iter()
            .filter(|p| p.status.is_processed() && p.trade_date >= start && p.trade_date <= end)
            .map(|p| p.trade_date)
            .collect())
    }

    fn last_processed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>> {
        Ok(self
            .all_for(exchange)
            .into_iter()
            .filter(|p| p.status.is_processed())
            .map(|p| p.trade_date)
            .max())
    }

    fn earliest_failed_date(&self, exchange: Exchange) -> Result<Option<NaiveDate>> {
        Ok(self
            .all_for(exchange)
            .into_iter()
            .filter(|p| p.status == ProgressStatus::Failed)
            .map(|p| p.trade_date)
            .min())
    }

    async fn record(&self, progress: BatchProgress) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert((progress.exchange, progress.trade_date), progress);
        Ok(())
    }
}

// =========================================================================
// Harness
// =========================================================================

/// Every service wired over in-memory storage with a fixed clock.
pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub calendar_repo: InMemoryCalendarRepository,
    pub generic: InMemoryGenericRepository,
    pub contracts: InMemoryConcreteRepository,
    pub mappings: InMemoryMappingRepository,
    pub facts: InMemoryMaturityRepository,
    pub progress: InMemoryProgressRepository,
    pub calendar: Arc<TradingCalendarService>,
    pub catalog: Arc<ContractCatalogService>,
    pub resolver: Arc<ContractResolver>,
    pub maturity: Arc<MaturityCalculator>,
}

impl Harness {
    /// Weekend-only calendars for every exchange.
    pub fn new(today: NaiveDate) -> Self {
        let specs = Exchange::ALL
            .iter()
            .map(|exchange| weekend_spec(*exchange, &[]))
            .collect();
        Self::with_specs(today, specs)
    }

    pub fn with_specs(today: NaiveDate, specs: Vec<HolidayCalendarSpec>) -> Self {
        let clock = Arc::new(FixedClock::at_date(today));
        let calendar_repo = InMemoryCalendarRepository::default();
        let generic = InMemoryGenericRepository::default();
        let contracts = InMemoryConcreteRepository::default();
        let mappings = InMemoryMappingRepository::default();
        let facts = InMemoryMaturityRepository::default();
        let progress = InMemoryProgressRepository::default();

        let calendar = specs.into_iter().fold(
            TradingCalendarService::new(Arc::new(calendar_repo.clone()), d(2020, 1, 1)),
            |service, spec| service.with_spec(spec),
        );
        let calendar = Arc::new(calendar);
        let catalog = Arc::new(ContractCatalogService::new(Arc::new(generic.clone())));
        let resolver = Arc::new(ContractResolver::new(
            catalog.clone(),
            Arc::new(contracts.clone()),
            Arc::new(mappings.clone()),
            clock.clone(),
        ));
        let maturity = Arc::new(MaturityCalculator::new(
            calendar.clone(),
            catalog.clone(),
            Arc::new(facts.clone()),
            clock.clone(),
        ));

        Self {
            clock,
            calendar_repo,
            generic,
            contracts,
            mappings,
            facts,
            progress,
            calendar,
            catalog,
            resolver,
            maturity,
        }
    }

    /// Monthly contracts from `first` for `count` months, each with its
    /// last-tradeable-date on the 15th of the delivery month.
    pub fn list_monthly(&self, exchange: Exchange, first: (i32, u32), count: u32) {
        let (mut year, mut month) = first;
        for _ in 0..count {
            self.contracts
                .insert(concrete(exchange, year, month, Some(d(year, month, 15))));
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }
}
