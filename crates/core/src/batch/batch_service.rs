//! Batch runner for the initial and daily modes.
//!
//! A run is three strictly ordered steps:
//!
//! 1. reference-data refresh for every exchange (when a provider is set),
//! 2. calendar coverage check for every exchange,
//! 3. one task per exchange resolving its trade dates in ascending order.
//!
//! Failures are collected per (exchange, date, slot); one exchange or date
//! failing never stops the others.

use chrono::{Duration, NaiveDate};
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::batch::batch_model::{
    BatchFailure, BatchProgress, BatchReport, CancellationFlag, ProgressStatus, RunMode,
};
use crate::batch::batch_traits::ProgressRepositoryTrait;
use crate::calendar::TradingCalendarServiceTrait;
use crate::contracts::ReferenceDataServiceTrait;
use crate::errors::{Error, ErrorKind, Result, ValidationError};
use crate::exchanges::Exchange;
use crate::mapping::ContractResolverTrait;
use crate::maturity::MaturityCalculatorTrait;
use crate::utils::Clock;

#[derive(Debug, Default)]
struct ExchangeOutcome {
    processed: usize,
    skipped: usize,
    cancelled: bool,
    failures: Vec<BatchFailure>,
}

/// Processes one exchange's trade dates. Cloned into its own task.
#[derive(Clone)]
struct ExchangeWorker {
    resolver: Arc<dyn ContractResolverTrait>,
    maturity: Arc<dyn MaturityCalculatorTrait>,
    progress: Arc<dyn ProgressRepositoryTrait>,
    clock: Arc<dyn Clock>,
    cancel: CancellationFlag,
}

impl ExchangeWorker {
    async fn run(self, exchange: Exchange, dates: Vec<NaiveDate>) -> ExchangeOutcome {
        let mut outcome = ExchangeOutcome::default();
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return outcome;
        };

        let done: HashSet<NaiveDate> = match self.progress.processed_dates(exchange, first, last) {
            Ok(dates) => dates.into_iter().collect(),
            Err(e) => {
                outcome
                    .failures
                    .push(BatchFailure::from_error(exchange, None, None, &e));
                return outcome;
            }
        };
        let today = self.clock.today();

        for date in dates {
            if self.cancel.is_cancelled() {
                info!("{}: run cancelled before {}", exchange, date);
                outcome.cancelled = true;
                break;
            }
            if date < today && done.contains(&date) {
                outcome.skipped += 1;
                continue;
            }

            match self.process_date(exchange, date).await {
                Ok(failures) => {
                    outcome.processed += 1;
                    outcome.failures.extend(failures);
                }
                Err(e) => {
                    if e.kind() == ErrorKind::MappingInvariantViolation {
                        error!("{} {}: needs manual review: {}", exchange, date, e);
                    } else {
                        warn!("{} {}: date failed: {}", exchange, date, e);
                    }
                    outcome
                        .failures
                        .push(BatchFailure::from_error(exchange, Some(date), None, &e));
                    self.record_failed(exchange, date, &e).await;
                }
            }
        }

        debug!(
            "{}: {} processed, {} skipped, {} failures",
            exchange,
            outcome.processed,
            outcome.skipped,
            outcome.failures.len()
        );
        outcome
    }

    async fn process_date(&self, exchange: Exchange, date: NaiveDate) -> Result<Vec<BatchFailure>> {
        let resolved = self.resolver.resolve_mapping(exchange, date).await?;
        let maturity = self
            .maturity
            .compute_for_date(exchange, date, &resolved.mappings)
            .await?;

        let failures: Vec<BatchFailure> = resolved
            .failures
            .iter()
            .chain(maturity.failures.iter())
            .map(|f| BatchFailure::from_error(exchange, Some(date), Some(f.slot), &f.error))
            .collect();
        let failed_slots: BTreeSet<u32> = failures.iter().filter_map(|f| f.slot).collect();

        let progress = BatchProgress {
            exchange,
            trade_date: date,
            status: if failures.is_empty() {
                ProgressStatus::Completed
            } else {
                ProgressStatus::Partial
            },
            mapped_slots: resolved.mappings.len() as u32,
            failed_slots: failed_slots.len() as u32,
            last_error: failures.first().map(|f| f.message.clone()),
            updated_at: self.clock.now(),
        };
        self.progress.record(progress).await?;
        Ok(failures)
    }

    async fn record_failed(&self, exchange: Exchange, date: NaiveDate, e: &Error) {
        let progress = BatchProgress {
            exchange,
            trade_date: date,
            status: ProgressStatus::Failed,
            mapped_slots: 0,
            failed_slots: 0,
            last_error: Some(e.to_string()),
            updated_at: self.clock.now(),
        };
        if let Err(record_err) = self.progress.record(progress).await {
            warn!(
                "{} {}: could not record failed progress: {}",
                exchange, date, record_err
            );
        }
    }
}

/// Runs the resolver and the maturity calculator over a date range.
pub struct BatchRunner {
    calendar: Arc<dyn TradingCalendarServiceTrait>,
    reference: Option<Arc<dyn ReferenceDataServiceTrait>>,
    worker: ExchangeWorker,
    exchanges: Vec<Exchange>,
}

impl BatchRunner {
    pub fn new(
        calendar: Arc<dyn TradingCalendarServiceTrait>,
        resolver: Arc<dyn ContractResolverTrait>,
        maturity: Arc<dyn MaturityCalculatorTrait>,
        progress: Arc<dyn ProgressRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            reference: None,
            worker: ExchangeWorker {
                resolver,
                maturity,
                progress,
                clock,
                cancel: CancellationFlag::new(),
            },
            exchanges: Exchange::ALL.to_vec(),
        }
    }

    pub fn with_reference_data(mut self, reference: Arc<dyn ReferenceDataServiceTrait>) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_exchanges(mut self, exchanges: Vec<Exchange>) -> Self {
        self.exchanges = exchanges;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.worker.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationFlag {
        self.worker.cancel.clone()
    }

    /// Date window the mode covers for `exchange`, or `None` if nothing is
    /// pending.
    fn window(&self, exchange: Exchange, mode: RunMode) -> Result<Option<(NaiveDate, NaiveDate)>> {
        match mode {
            RunMode::Initial { start, end } => Ok(Some((start, end))),
            RunMode::Daily { today } => {
                let resume = match self.worker.progress.last_processed_date(exchange)? {
                    Some(last) => last + Duration::days(1),
                    None => today,
                };
                // Failed dates are retried; processed dates in between are skipped.
                let start = match self.worker.progress.earliest_failed_date(exchange)? {
                    Some(failed) if failed < resume => {
                        info!("{}: retrying failed dates from {}", exchange, failed);
                        failed
                    }
                    _ => resume,
                };
                Ok((start <= today).then_some((start, today)))
            }
        }
    }

    pub async fn run(&self, mode: RunMode) -> Result<BatchReport> {
        if let RunMode::Initial { start, end } = mode {
            if end < start {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Initial run end {} is before start {}",
                    end, start
                ))));
            }
        }

        let cancel = &self.worker.cancel;
        let mut report = BatchReport::new(mode, self.worker.clock.now());
        info!("Starting {} run for {} exchanges", mode, self.exchanges.len());

        let mut windows = Vec::new();
        for &exchange in &self.exchanges {
            match self.window(exchange, mode) {
                Ok(Some(window)) => windows.push((exchange, window)),
                Ok(None) => debug!("{}: nothing pending", exchange),
                Err(e) => report
                    .failures
                    .push(BatchFailure::from_error(exchange, None, None, &e)),
            }
        }

        // Step 1: the catalogue must be committed before any resolution.
        if let Some(reference) = &self.reference {
            for (exchange, (start, end)) in &windows {
                if cancel.is_cancelled() {
                    break;
                }
                if let Err(e) = reference.refresh_between(*exchange, *start, *end).await {
                    warn!("{}: reference refresh failed: {}", exchange, e);
                    report
                        .failures
                        .push(BatchFailure::from_error(*exchange, None, None, &e));
                }
            }
        }

        // Step 2: calendars.
        let mut ready = Vec::with_capacity(windows.len());
        for (exchange, (start, end)) in windows {
            if cancel.is_cancelled() {
                break;
            }
            let dates = match self.calendar.ensure_calendar(exchange).await {
                Ok(_) => self.calendar.trading_days_in_range(exchange, start, end).await,
                Err(e) => Err(e),
            };
            match dates {
                Ok(dates) => ready.push((exchange, dates)),
                Err(e) => {
                    warn!("{}: calendar unavailable: {}", exchange, e);
                    report
                        .failures
                        .push(BatchFailure::from_error(exchange, None, None, &e));
                }
            }
        }

        // Step 3: one task per exchange.
        let handles: Vec<_> = ready
            .into_iter()
            .map(|(exchange, dates)| {
                let worker = self.worker.clone();
                (exchange, tokio::spawn(worker.run(exchange, dates)))
            })
            .collect();
        let (exchanges, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();

        for (exchange, joined) in exchanges.into_iter().zip(join_all(tasks).await) {
            match joined {
                Ok(outcome) => {
                    report.processed += outcome.processed;
                    report.skipped += outcome.skipped;
                    report.cancelled |= outcome.cancelled;
                    report.failures.extend(outcome.failures);
                }
                Err(join_err) => {
                    error!("{}: worker task failed: {}", exchange, join_err);
                    report.failures.push(BatchFailure::from_error(
                        exchange,
                        None,
                        None,
                        &Error::Unexpected(join_err.to_string()),
                    ));
                }
            }
        }

        report.cancelled |= cancel.is_cancelled();
        report.finished_at = self.worker.clock.now();
        info!(
            "Finished {} run: {} dates processed, {} skipped, {} failures{}",
            mode,
            report.processed,
            report.skipped,
            report.failures.len(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }
}
