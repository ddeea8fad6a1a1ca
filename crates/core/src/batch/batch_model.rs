//! Batch run models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::{Error, ErrorKind, ValidationError};
use crate::exchanges::Exchange;

/// Which trade dates a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RunMode {
    /// Every trading day in `start..=end`.
    Initial { start: NaiveDate, end: NaiveDate },
    /// Every trading day after the last processed date, through `today`,
    /// plus earlier dates whose last attempt failed.
    Daily { today: NaiveDate },
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Initial { .. } => "initial",
            RunMode::Daily { .. } => "daily",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Initial { start, end } => write!(f, "initial {}..={}", start, end),
            RunMode::Daily { today } => write!(f, "daily through {}", today),
        }
    }
}

/// Outcome recorded per (exchange, trade date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    /// Every active slot resolved and got a maturity fact.
    Completed,
    /// Some slots failed individually; the rest are stored.
    Partial,
    /// The date was aborted; nothing new is stored for it.
    Failed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Completed => "COMPLETED",
            ProgressStatus::Partial => "PARTIAL",
            ProgressStatus::Failed => "FAILED",
        }
    }

    /// Completed and partial dates are not reprocessed once past.
    pub fn is_processed(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Partial)
    }
}

impl FromStr for ProgressStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLETED" => Ok(ProgressStatus::Completed),
            "PARTIAL" => Ok(ProgressStatus::Partial),
            "FAILED" => Ok(ProgressStatus::Failed),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown progress status '{}'",
                other
            )))),
        }
    }
}

/// Resumable-progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub exchange: Exchange,
    pub trade_date: NaiveDate,
    pub status: ProgressStatus,
    pub mapped_slots: u32,
    pub failed_slots: u32,
    pub last_error: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// One failure reported by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub exchange: Exchange,
    /// `None` for exchange-level failures (reference refresh, calendar).
    pub trade_date: Option<NaiveDate>,
    /// `None` when the whole date or exchange failed.
    pub slot: Option<u32>,
    pub kind: ErrorKind,
    pub message: String,
}

impl BatchFailure {
    pub fn from_error(
        exchange: Exchange,
        trade_date: Option<NaiveDate>,
        slot: Option<u32>,
        error: &Error,
    ) -> Self {
        Self {
            exchange,
            trade_date,
            slot,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Structured summary of a run. Partial success is normal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub mode: RunMode,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    /// (exchange, date) pairs resolved in this run.
    pub processed: usize,
    /// Past dates skipped because they were already processed.
    pub skipped: usize,
    pub cancelled: bool,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn new(mode: RunMode, started_at: NaiveDateTime) -> Self {
        Self {
            mode,
            started_at,
            finished_at: started_at,
            processed: 0,
            skipped: 0,
            cancelled: false,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn failure_counts(&self) -> HashMap<ErrorKind, usize> {
        let mut counts = HashMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Shared stop signal. Once set, no new per-date jobs start; committed rows
/// stay valid.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
