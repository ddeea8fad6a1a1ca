use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::contracts::{ConcreteContractRepositoryTrait, ContractCatalogServiceTrait};
use crate::errors::{Error, Result, ValidationError};
use crate::exchanges::Exchange;
use crate::mapping::mapping_model::{
    GenericContractMapping, MappingWriteMode, ResolvedMapping, SlotAssignment,
};
use crate::mapping::mapping_traits::{ContractResolverTrait, MappingRepositoryTrait};
use crate::mapping::slot_assignment::{assign_slots, check_distinct_assignment};
use crate::utils::Clock;

/// Resolves generic slots to concrete contracts and persists the result.
///
/// Mappings for past trade dates are write-once. Today and future dates are
/// recomputed on every call; rows whose assignment did not change keep their
/// original `resolved_at`, so re-runs are byte-stable.
pub struct ContractResolver {
    catalog: Arc<dyn ContractCatalogServiceTrait>,
    contracts: Arc<dyn ConcreteContractRepositoryTrait>,
    mappings: Arc<dyn MappingRepositoryTrait>,
    clock: Arc<dyn Clock>,
}

impl ContractResolver {
    pub fn new(
        catalog: Arc<dyn ContractCatalogServiceTrait>,
        contracts: Arc<dyn ConcreteContractRepositoryTrait>,
        mappings: Arc<dyn MappingRepositoryTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            contracts,
            mappings,
            clock,
        }
    }

    fn assign(&self, exchange: Exchange, trade_date: NaiveDate) -> Result<SlotAssignment> {
        let definitions = self.catalog.active_definitions(exchange)?;
        let Some(first) = definitions.first() else {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} has no active generic contract slots",
                exchange
            ))));
        };
        let family = first.instrument_family.clone();
        if definitions.iter().any(|d| d.instrument_family != family) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "{} mixes instrument families across generic slots",
                exchange
            ))));
        }

        let contracts = self.contracts.list_for_exchange(exchange, &family)?;
        assign_slots(
            exchange,
            trade_date,
            &definitions,
            &contracts,
            self.clock.now(),
        )
    }

    /// Past date: keep every stored row, add rows only for slots that have none.
    async fn write_once(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        fresh: SlotAssignment,
    ) -> Result<ResolvedMapping> {
        let mut frozen: HashMap<u32, _> = self
            .mappings
            .load_for_date(exchange, trade_date)?
            .into_iter()
            .map(|m| (m.slot, m))
            .collect();

        let mut effective = Vec::with_capacity(fresh.mappings.len());
        let mut to_insert = Vec::new();
        for row in fresh.mappings {
            match frozen.remove(&row.slot) {
                Some(existing) => {
                    if !existing.same_assignment(&row) {
                        warn!(
                            "{} {} slot {}: frozen mapping {} differs from current resolution {}",
                            exchange,
                            trade_date,
                            row.slot,
                            existing.concrete_ticker,
                            row.concrete_ticker
                        );
                    }
                    effective.push(existing);
                }
                None => {
                    to_insert.push(row.clone());
                    effective.push(row);
                }
            }
        }

        let mut failures = Vec::new();
        for failure in fresh.failures {
            match frozen.remove(&failure.slot) {
                Some(existing) => effective.push(existing),
                None => failures.push(failure),
            }
        }
        effective.sort_by_key(|m| m.slot);
        check_distinct_assignment(exchange, trade_date, &effective)?;

        let written = if to_insert.is_empty() {
            0
        } else {
            self.mappings
                .insert_missing(exchange, trade_date, to_insert)
                .await?
        };

        Ok(ResolvedMapping {
            exchange,
            trade_date,
            write_mode: MappingWriteMode::WriteOnce,
            mappings: effective,
            failures,
            written,
        })
    }

    /// Today or later: replace the date's rows.
    async fn replace(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
        mut fresh: SlotAssignment,
    ) -> Result<ResolvedMapping> {
        let previous: HashMap<u32, _> = self
            .mappings
            .load_for_date(exchange, trade_date)?
            .into_iter()
            .map(|m| (m.slot, m))
            .collect();
        for row in &mut fresh.mappings {
            if let Some(prev) = previous.get(&row.slot) {
                if prev.same_assignment(row) {
                    row.resolved_at = prev.resolved_at;
                }
            }
        }

        let written = self
            .mappings
            .replace_for_date(exchange, trade_date, fresh.mappings.clone())
            .await?;

        Ok(ResolvedMapping {
            exchange,
            trade_date,
            write_mode: MappingWriteMode::Replace,
            mappings: fresh.mappings,
            failures: fresh.failures,
            written,
        })
    }
}

#[async_trait]
impl ContractResolverTrait for ContractResolver {
    async fn resolve_mapping(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<ResolvedMapping> {
        let fresh = self.assign(exchange, trade_date)?;
        debug!(
            "{} {}: {} live contracts for {} slots",
            exchange,
            trade_date,
            fresh.available,
            fresh.mappings.len() + fresh.failures.len()
        );

        let resolved = if trade_date < self.clock.today() {
            self.write_once(exchange, trade_date, fresh).await?
        } else {
            self.replace(exchange, trade_date, fresh).await?
        };

        if !resolved.failures.is_empty() {
            info!(
                "{} {}: {} slots resolved, {} unresolved",
                exchange,
                trade_date,
                resolved.mappings.len(),
                resolved.failures.len()
            );
        }
        Ok(resolved)
    }

    fn get_mappings(
        &self,
        exchange: Exchange,
        trade_date: NaiveDate,
    ) -> Result<Vec<GenericContractMapping>> {
        self.mappings.load_for_date(exchange, trade_date)
    }
}
