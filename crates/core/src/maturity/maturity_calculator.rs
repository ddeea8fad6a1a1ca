use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

use crate::calendar::TradingCalendarServiceTrait;
use crate::contracts::{ContractCatalogServiceTrait, GenericContractDefinition};
use crate::errors::{Error, Result};
use crate::exchanges::Exchange;
use crate::mapping::{GenericContractMapping, SlotFailure};
use crate::maturity::maturity_model::{MaturityFact, MaturityRun};
use crate::maturity::maturity_traits::{MaturityCalculatorTrait, MaturityRepositoryTrait};
use crate::utils::Clock;

/// Assembles a fact from day counts, enforcing the non-negative holiday
/// count.
pub fn derive_fact(
    mapping: &GenericContractMapping,
    last_tradeable_date: NaiveDate,
    calendar_days_remaining: i64,
    trading_days_remaining: i64,
    roll_offset_days: u32,
    computed_at: NaiveDateTime,
) -> Result<MaturityFact> {
    let holidays_in_window = calendar_days_remaining - trading_days_remaining;
    if trading_days_remaining < 0 || holidays_in_window < 0 {
        return Err(Error::MappingInvariantViolation {
            exchange: mapping.exchange,
            trade_date: mapping.trade_date,
            detail: format!(
                "slot {} ({}): {} calendar days but {} trading days remaining",
                mapping.slot,
                mapping.concrete_ticker,
                calendar_days_remaining,
                trading_days_remaining
            ),
        });
    }

    Ok(MaturityFact {
        exchange: mapping.exchange,
        slot: mapping.slot,
        trade_date: mapping.trade_date,
        concrete_ticker: mapping.concrete_ticker.clone(),
        last_tradeable_date,
        calendar_days_remaining,
        trading_days_remaining,
        holidays_in_window,
        roll_due: trading_days_remaining <= i64::from(roll_offset_days),
        computed_at,
    })
}

/// Computes calendar days, trading days, holidays and roll flags per slot.
pub struct MaturityCalculator {
    calendar: Arc<dyn TradingCalendarServiceTrait>,
    catalog: Arc<dyn ContractCatalogServiceTrait>,
    facts: Arc<dyn MaturityRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl MaturityCalculator {
    pub fn new(
        calendar: Arc<dyn TradingCalendarServiceTrait>,
        catalog: Arc<dyn ContractCatalogServiceTrait>,
        facts: Arc<dyn MaturityRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calendar,
            catalog,
            facts,
            clock,
        }
    }
}

#[async_trait]
impl MaturityCalculatorTrait for MaturityCalculator {
    async fn compute_maturity(
        &self,
        mapping: &GenericContractMapping,
        definition: &GenericContractDefinition,
    ) -> Result<MaturityFact> {
        let ltd = mapping
            .last_tradeable_date
            .ok_or_else(|| Error::ReferenceDataMissing {
                ticker: mapping.concrete_ticker.clone(),
                field: "last_tradeable_date".to_string(),
            })?;
        if ltd < mapping.trade_date {
            return Err(Error::MappingInvariantViolation {
                exchange: mapping.exchange,
                trade_date: mapping.trade_date,
                detail: format!(
                    "slot {} maps to {} which stopped trading on {}",
                    mapping.slot, mapping.concrete_ticker, ltd
                ),
            });
        }

        let calendar_days = self.calendar.calendar_days_between(mapping.trade_date, ltd);
        let trading_days = self
            .calendar
            .trading_days_between(mapping.exchange, mapping.trade_date, ltd)
            .await?;

        derive_fact(
            mapping,
            ltd,
            calendar_days,
            trading_days,
            definition.roll_offset_days,
            self.clock.now(),
        )
    }

    async fn compute_for_date(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        mappings: &[GenericContractMapping],
    ) -> Result<MaturityRun> {
        let definitions: HashMap<u32, GenericContractDefinition> = self
            .catalog
            .active_definitions(exchange)?
            .into_iter()
            .map(|d| (d.slot, d))
            .collect();

        let mut facts = Vec::with_capacity(mappings.len());
        let mut failures = Vec::new();
        for mapping in mappings {
            let Some(definition) = definitions.get(&mapping.slot) else {
                debug!(
                    "{} {}: slot {} is no longer active, skipping",
                    exchange, trade_date, mapping.slot
                );
                continue;
            };
            match self.compute_maturity(mapping, definition).await {
                Ok(fact) => facts.push(fact),
                Err(e) if e.aborts_date() => {
                    error!("{} {}: maturity aborted: {}", exchange, trade_date, e);
                    return Err(e);
                }
                Err(e) => failures.push(SlotFailure {
                    slot: mapping.slot,
                    error: e,
                }),
            }
        }

        let written = self
            .facts
            .replace_for_date(exchange, trade_date, facts.clone())
            .await?;

        Ok(MaturityRun {
            exchange,
            trade_date,
            facts,
            failures,
            written,
        })
    }

    fn get_facts(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<Vec<MaturityFact>> {
        self.facts.load_for_date(exchange, trade_date)
    }
}
