//! Pure slot assignment: orders the live contracts of an exchange and hands
//! them out to slots 1..N.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use std::collections::HashMap;

use crate::contracts::{ConcreteContract, GenericContractDefinition};
use crate::errors::{Error, Result};
use crate::exchanges::Exchange;
use crate::mapping::mapping_model::{GenericContractMapping, SlotAssignment, SlotFailure};
use crate::utils::time_utils::calendar_days_between;

/// Expiry used for ordering: the last-tradeable-date, or the end of the
/// delivery month when the date is unknown.
fn sort_date(contract: &ConcreteContract) -> Option<NaiveDate> {
    contract
        .last_tradeable_date
        .or_else(|| contract.contract_month_end())
}

/// Unexpired contracts on `trade_date`, nearest expiry first.
///
/// Identical last-tradeable-dates are ordered by contract year and month and
/// logged; they point at bad reference data.
pub fn order_live_contracts<'a>(
    exchange: Exchange,
    trade_date: NaiveDate,
    contracts: &'a [ConcreteContract],
) -> Vec<&'a ConcreteContract> {
    let mut live: Vec<(NaiveDate, &ConcreteContract)> = contracts
        .iter()
        .filter_map(|c| match sort_date(c) {
            Some(date) => Some((date, c)),
            None => {
                warn!("{}: {} has no usable expiry, skipping", exchange, c.ticker);
                None
            }
        })
        .filter(|(date, _)| *date >= trade_date)
        .collect();

    live.sort_by(|(da, a), (db, b)| {
        da.cmp(db)
            .then(a.contract_year.cmp(&b.contract_year))
            .then(a.contract_month.cmp(&b.contract_month))
            .then(a.ticker.cmp(&b.ticker))
    });

    for pair in live.windows(2) {
        let (a, b) = (pair[0].1, pair[1].1);
        if a.last_tradeable_date.is_some() && a.last_tradeable_date == b.last_tradeable_date {
            warn!(
                "{} {}: {} and {} share last tradeable date {}, ordering by contract month",
                exchange,
                trade_date,
                a.ticker,
                b.ticker,
                pair[0].0
            );
        }
    }

    live.into_iter().map(|(_, c)| c).collect()
}

/// No two slots may point at the same contract.
pub fn check_distinct_assignment(
    exchange: Exchange,
    trade_date: NaiveDate,
    mappings: &[GenericContractMapping],
) -> Result<()> {
    let mut by_id: HashMap<&str, u32> = HashMap::new();
    let mut by_ticker: HashMap<&str, u32> = HashMap::new();
    for m in mappings {
        let clash = by_id
            .insert(m.concrete_contract_id.as_str(), m.slot)
            .or_else(|| by_ticker.insert(m.concrete_ticker.as_str(), m.slot));
        if let Some(other) = clash {
            return Err(Error::MappingInvariantViolation {
                exchange,
                trade_date,
                detail: format!(
                    "slots {} and {} both resolve to {}",
                    other, m.slot, m.concrete_ticker
                ),
            });
        }
    }
    Ok(())
}

/// Assigns the k-th live contract to slot k for every definition.
///
/// Slots beyond the live contract count fail individually with
/// `InsufficientContracts`; the remaining slots still resolve.
pub fn assign_slots(
    exchange: Exchange,
    trade_date: NaiveDate,
    definitions: &[GenericContractDefinition],
    contracts: &[ConcreteContract],
    resolved_at: NaiveDateTime,
) -> Result<SlotAssignment> {
    let live = order_live_contracts(exchange, trade_date, contracts);

    let mut slots: Vec<u32> = definitions
        .iter()
        .filter(|d| d.exchange == exchange)
        .map(|d| d.slot)
        .collect();
    slots.sort_unstable();

    let mut mappings = Vec::with_capacity(slots.len());
    let mut failures = Vec::new();
    for slot in slots {
        let contract = slot
            .checked_sub(1)
            .and_then(|i| live.get(i as usize).copied());
        match contract {
            Some(c) => mappings.push(GenericContractMapping {
                exchange,
                slot,
                trade_date,
                concrete_contract_id: c.id.clone(),
                concrete_ticker: c.ticker.clone(),
                last_tradeable_date: c.last_tradeable_date,
                days_to_last_trade: c
                    .last_tradeable_date
                    .map(|ltd| calendar_days_between(trade_date, ltd)),
                resolved_at,
            }),
            None => failures.push(SlotFailure {
                slot,
                error: Error::InsufficientContracts {
                    exchange,
                    slot,
                    trade_date,
                    available: live.len(),
                },
            }),
        }
    }

    check_distinct_assignment(exchange, trade_date, &mappings)?;

    Ok(SlotAssignment {
        mappings,
        failures,
        available: live.len(),
    })
}
