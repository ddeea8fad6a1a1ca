//! End-to-end batch runs over a real SQLite database.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::tempdir;

use cuprum_core::batch::{BatchRunner, ProgressRepositoryTrait, ProgressStatus, RunMode};
use cuprum_core::calendar::TradingCalendarService;
use cuprum_core::contracts::{
    ConcreteContractRepositoryTrait, ContractCatalogService, ContractCatalogServiceTrait,
    ContractTicker, MonthCode, NewConcreteContract, SlotKey,
};
use cuprum_core::exchanges::HolidayCalendarSpec;
use cuprum_core::mapping::{ContractResolver, ContractResolverTrait, MappingRepositoryTrait};
use cuprum_core::maturity::{MaturityCalculator, MaturityCalculatorTrait};
use cuprum_core::utils::FixedClock;
use cuprum_core::Exchange;
use cuprum_storage_sqlite::batch::ProgressRepository;
use cuprum_storage_sqlite::calendar::CalendarRepository;
use cuprum_storage_sqlite::contracts::{ConcreteContractRepository, GenericContractRepository};
use cuprum_storage_sqlite::mapping::MappingRepository;
use cuprum_storage_sqlite::maturity::MaturityRepository;
use cuprum_storage_sqlite::{create_pool, run_migrations, spawn_writer};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct Pipeline {
    runner: BatchRunner,
    resolver: Arc<ContractResolver>,
    maturity: Arc<MaturityCalculator>,
    mappings: Arc<MappingRepository>,
    progress: Arc<ProgressRepository>,
    _temp_dir: tempfile::TempDir,
}

/// LME only, Easter 2025 closed, monthly contracts from April 2025 with the
/// last-tradeable-date on the 15th.
async fn pipeline(today: NaiveDate) -> Pipeline {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("pipeline.db");
    let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");
    let writer = spawn_writer((*pool).clone());

    let clock = Arc::new(FixedClock::at_date(today));
    let calendar_repo = Arc::new(CalendarRepository::new(pool.clone(), writer.clone()));
    let generic_repo = Arc::new(GenericContractRepository::new(pool.clone(), writer.clone()));
    let concrete_repo = Arc::new(ConcreteContractRepository::new(pool.clone(), writer.clone()));
    let mappings = Arc::new(MappingRepository::new(pool.clone(), writer.clone()));
    let facts = Arc::new(MaturityRepository::new(pool.clone(), writer.clone()));
    let progress = Arc::new(ProgressRepository::new(pool.clone(), writer.clone()));

    let catalog = Arc::new(ContractCatalogService::new(generic_repo));
    catalog.seed_default_definitions(Exchange::Lme).await.unwrap();

    let mut listed = Vec::new();
    let mut month_start = d(2025, 4, 1);
    for _ in 0..30 {
        let code = MonthCode::from_month(month_start.month()).unwrap();
        let ticker = ContractTicker::new(Exchange::Lme, month_start.year(), code);
        let mut contract = NewConcreteContract::copper(Exchange::Lme, &ticker);
        contract.last_tradeable_date = month_start.with_day(15);
        listed.push(contract);
        month_start = month_start.checked_add_months(chrono::Months::new(1)).unwrap();
    }
    concrete_repo.upsert_contracts(listed).await.unwrap();

    let mut holidays = BTreeMap::new();
    holidays.insert(d(2025, 4, 18), "Good Friday".to_string());
    holidays.insert(d(2025, 4, 21), "Easter Monday".to_string());
    let spec = HolidayCalendarSpec::new(
        Exchange::Lme,
        vec![Weekday::Sat, Weekday::Sun],
        holidays,
        d(2030, 12, 31),
    );
    let calendar =
        Arc::new(TradingCalendarService::new(calendar_repo, d(2025, 1, 1)).with_spec(spec));

    let resolver = Arc::new(ContractResolver::new(
        catalog.clone(),
        concrete_repo,
        mappings.clone(),
        clock.clone(),
    ));
    let maturity = Arc::new(MaturityCalculator::new(
        calendar.clone(),
        catalog,
        facts,
        clock.clone(),
    ));
    let runner = BatchRunner::new(
        calendar,
        resolver.clone(),
        maturity.clone(),
        progress.clone(),
        clock,
    )
    .with_exchanges(vec![Exchange::Lme]);

    Pipeline {
        runner,
        resolver,
        maturity,
        mappings,
        progress,
        _temp_dir: temp_dir,
    }
}

#[tokio::test]
async fn test_initial_run_over_easter() {
    let p = pipeline(d(2025, 4, 22)).await;

    let report = p
        .runner
        .run(RunMode::Initial {
            start: d(2025, 4, 14),
            end: d(2025, 4, 22),
        })
        .await
        .unwrap();

    // 14..17 and 22; Good Friday, Easter Monday and the weekend are closed.
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.processed, 5);

    let before_roll = p.resolver.get_mappings(Exchange::Lme, d(2025, 4, 14)).unwrap();
    assert_eq!(before_roll.len(), 24);
    assert_eq!(before_roll[0].concrete_ticker, "LPJ25 Comdty");
    assert_eq!(before_roll[1].concrete_ticker, "LPK25 Comdty");

    let after_roll = p.resolver.get_mappings(Exchange::Lme, d(2025, 4, 16)).unwrap();
    assert_eq!(after_roll[0].concrete_ticker, "LPK25 Comdty");

    let facts = p.maturity.get_facts(Exchange::Lme, d(2025, 4, 14)).unwrap();
    assert_eq!(facts.len(), 24);
    assert_eq!(facts[0].calendar_days_remaining, 1);
    assert_eq!(facts[0].trading_days_remaining, 1);
    assert!(facts[0].roll_due);

    // 17 April to 15 May: 28 calendar days, Good Friday and Easter Monday
    // plus eight weekend days fall in the window.
    let thursday = p.maturity.get_facts(Exchange::Lme, d(2025, 4, 17)).unwrap();
    assert_eq!(thursday[0].concrete_ticker, "LPK25 Comdty");
    assert_eq!(thursday[0].calendar_days_remaining, 28);
    assert_eq!(thursday[0].holidays_in_window, 10);
    assert_eq!(thursday[0].trading_days_remaining, 18);
    assert!(!thursday[0].roll_due);

    let status = p.progress.get(Exchange::Lme, d(2025, 4, 17)).unwrap().unwrap();
    assert_eq!(status.status, ProgressStatus::Completed);
    assert_eq!(status.mapped_slots, 24);
}

#[tokio::test]
async fn test_rerun_skips_completed_past_dates() {
    let p = pipeline(d(2025, 4, 22)).await;
    let mode = RunMode::Initial {
        start: d(2025, 4, 14),
        end: d(2025, 4, 22),
    };
    p.runner.run(mode).await.unwrap();
    let first = p.mappings.load_for_date(Exchange::Lme, d(2025, 4, 15)).unwrap();

    let report = p.runner.run(mode).await.unwrap();

    assert_eq!(report.skipped, 4);
    assert_eq!(report.processed, 1);
    assert_eq!(
        p.mappings.load_for_date(Exchange::Lme, d(2025, 4, 15)).unwrap(),
        first
    );
}

#[tokio::test]
async fn test_daily_run_resumes_after_last_processed_date() {
    let p = pipeline(d(2025, 4, 22)).await;
    p.runner
        .run(RunMode::Initial {
            start: d(2025, 4, 14),
            end: d(2025, 4, 15),
        })
        .await
        .unwrap();

    let report = p
        .runner
        .run(RunMode::Daily {
            today: d(2025, 4, 22),
        })
        .await
        .unwrap();

    // 16, 17 and 22.
    assert_eq!(report.processed, 3);
    assert_eq!(
        p.progress.last_processed_date(Exchange::Lme).unwrap(),
        Some(d(2025, 4, 22))
    );
    let history = p
        .mappings
        .load_for_slot(&SlotKey::new(Exchange::Lme, 1), d(2025, 4, 1), d(2025, 4, 30))
        .unwrap();
    assert_eq!(history.len(), 5);
}

#[tokio::test]
async fn test_daily_run_twice_for_the_same_date() {
    let p = pipeline(d(2025, 4, 22)).await;
    let daily = RunMode::Daily {
        today: d(2025, 4, 22),
    };

    p.runner.run(daily).await.unwrap();
    let first = p.mappings.load_for_date(Exchange::Lme, d(2025, 4, 22)).unwrap();
    let second_report = p.runner.run(daily).await.unwrap();
    let second = p.mappings.load_for_date(Exchange::Lme, d(2025, 4, 22)).unwrap();

    // Last processed is today, so the second daily run has nothing pending.
    assert_eq!(second_report.processed, 0);
    assert_eq!(first.len(), 24);
    assert_eq!(first, second);

    // Forcing the date again replaces today's rows with identical values.
    p.runner
        .run(RunMode::Initial {
            start: d(2025, 4, 22),
            end: d(2025, 4, 22),
        })
        .await
        .unwrap();
    assert_eq!(
        p.mappings.load_for_date(Exchange::Lme, d(2025, 4, 22)).unwrap(),
        first
    );
}
