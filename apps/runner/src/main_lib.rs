use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use cuprum_core::{
    batch::BatchRunner,
    calendar::TradingCalendarService,
    contracts::{ContractCatalogService, ContractCatalogServiceTrait, ReferenceDataService},
    exchanges::{HolidayCalendarSpec, HolidayOverrides},
    mapping::ContractResolver,
    maturity::MaturityCalculator,
    utils::{time_utils::add_years, Clock, SystemClock},
    Exchange,
};
use cuprum_market_data::{FetchPolicy, HttpBridgeProvider};
use cuprum_storage_sqlite::{
    batch::ProgressRepository,
    calendar::CalendarRepository,
    contracts::{ConcreteContractRepository, GenericContractRepository},
    db::{self, write_actor},
    mapping::MappingRepository,
    maturity::MaturityRepository,
};

use crate::config::Config;

pub struct AppState {
    pub db_path: String,
    pub clock: Arc<dyn Clock>,
    pub calendar_service: Arc<TradingCalendarService>,
    pub resolver: Arc<ContractResolver>,
    pub maturity_calculator: Arc<MaturityCalculator>,
    pub progress_repository: Arc<ProgressRepository>,
    pub reference_service: Option<Arc<ReferenceDataService>>,
}

impl AppState {
    /// Batch runner over every service, restricted to `exchanges` when given.
    pub fn batch_runner(&self, exchanges: &[Exchange]) -> BatchRunner {
        let mut runner = BatchRunner::new(
            self.calendar_service.clone(),
            self.resolver.clone(),
            self.maturity_calculator.clone(),
            self.progress_repository.clone(),
            self.clock.clone(),
        );
        if let Some(reference) = &self.reference_service {
            runner = runner.with_reference_data(reference.clone());
        }
        if !exchanges.is_empty() {
            runner = runner.with_exchanges(exchanges.to_vec());
        }
        runner
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("CUPRUM_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the run report.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Holiday specs for every exchange the holiday sources can cover.
///
/// An exchange whose spec cannot be built is left without one. The batch then
/// reports that exchange as unavailable while the others proceed.
pub fn holiday_specs(
    config: &Config,
    today: NaiveDate,
) -> anyhow::Result<Vec<HolidayCalendarSpec>> {
    let overrides = match &config.holiday_file {
        Some(path) => HolidayOverrides::from_path(path)
            .with_context(|| format!("Failed to load holiday file {}", path.display()))?,
        None => HolidayOverrides::default(),
    };
    tracing::info!("Loaded {} explicit holidays", overrides.len());

    let horizon_end = add_years(today, config.horizon_years)
        .with_context(|| format!("Horizon of {} years overflows", config.horizon_years))?;
    let mut specs = Vec::with_capacity(Exchange::ALL.len());
    for exchange in Exchange::ALL {
        match HolidayCalendarSpec::from_sources(
            exchange,
            config.calendar_start.year(),
            horizon_end,
            &overrides,
        ) {
            Ok(spec) => {
                if spec.valid_until < horizon_end {
                    tracing::warn!(
                        "{}: holiday list only valid until {}; later dates are calendar gaps",
                        exchange,
                        spec.valid_until
                    );
                }
                specs.push(spec);
            }
            Err(e) => tracing::error!("{}: no trading calendar can be built: {}", exchange, e),
        }
    }
    Ok(specs)
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let calendar_repository = Arc::new(CalendarRepository::new(pool.clone(), writer.clone()));
    let generic_repository = Arc::new(GenericContractRepository::new(pool.clone(), writer.clone()));
    let concrete_repository =
        Arc::new(ConcreteContractRepository::new(pool.clone(), writer.clone()));
    let mapping_repository = Arc::new(MappingRepository::new(pool.clone(), writer.clone()));
    let maturity_repository = Arc::new(MaturityRepository::new(pool.clone(), writer.clone()));
    let progress_repository = Arc::new(ProgressRepository::new(pool.clone(), writer.clone()));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let catalog_service = Arc::new(ContractCatalogService::new(generic_repository));
    for exchange in Exchange::ALL {
        let seeded = catalog_service.seed_default_definitions(exchange).await?;
        if seeded > 0 {
            tracing::info!("{}: seeded {} generic contracts", exchange, seeded);
        }
    }

    let calendar_service = holiday_specs(config, clock.today())?.into_iter().fold(
        TradingCalendarService::new(calendar_repository, config.calendar_start),
        |service, spec| service.with_spec(spec),
    );
    let calendar_service = Arc::new(calendar_service);

    let resolver = Arc::new(ContractResolver::new(
        catalog_service.clone(),
        concrete_repository.clone(),
        mapping_repository,
        clock.clone(),
    ));
    let maturity_calculator = Arc::new(MaturityCalculator::new(
        calendar_service.clone(),
        catalog_service.clone(),
        maturity_repository,
        clock.clone(),
    ));

    let reference_service = config.provider_url.as_ref().map(|url| {
        tracing::info!("Reference data provider: {}", url);
        let provider = HttpBridgeProvider::with_timeout(url.clone(), config.fetch_timeout);
        let policy = FetchPolicy::new(config.fetch_timeout, config.fetch_max_retries);
        Arc::new(
            ReferenceDataService::new(Arc::new(provider), concrete_repository.clone(), policy)
                .with_months_ahead(config.reference_months_ahead),
        )
    });
    if reference_service.is_none() {
        tracing::info!("CUPRUM_PROVIDER_URL not set; reference refresh is skipped");
    }

    Ok(Arc::new(AppState {
        db_path,
        clock,
        calendar_service,
        resolver,
        maturity_calculator,
        progress_repository,
        reference_service,
    }))
}
