//! Core error types for Cuprum.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::{NaiveDate, ParseError as ChronoParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::exchanges::Exchange;
use cuprum_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
///
/// The first four variants are the domain failures the resolver and the
/// maturity calculator can raise. Each is scoped: a calendar gap fails one
/// query, an insufficient-contracts error fails one slot, a missing
/// reference field fails one contract. Only a mapping invariant violation
/// aborts a whole (exchange, trade date).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Calendar gap on {exchange}: {date} is outside the built horizon {horizon_start}..={horizon_end}")]
    CalendarGap {
        exchange: Exchange,
        date: NaiveDate,
        horizon_start: NaiveDate,
        horizon_end: NaiveDate,
    },

    #[error("Insufficient contracts on {exchange} for slot {slot} on {trade_date}: only {available} unexpired")]
    InsufficientContracts {
        exchange: Exchange,
        slot: u32,
        trade_date: NaiveDate,
        available: usize,
    },

    #[error("Mapping invariant violated on {exchange} for {trade_date}: {detail}")]
    MappingInvariantViolation {
        exchange: Exchange,
        trade_date: NaiveDate,
        detail: String,
    },

    #[error("Reference data missing for {ticker}: {field}")]
    ReferenceDataMissing { ticker: String, field: String },

    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Coarse classification used in batch reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CalendarGap { .. } => ErrorKind::CalendarGap,
            Error::InsufficientContracts { .. } => ErrorKind::InsufficientContracts,
            Error::MappingInvariantViolation { .. } => ErrorKind::MappingInvariantViolation,
            Error::ReferenceDataMissing { .. } => ErrorKind::ReferenceDataMissing,
            Error::MarketData(_) => ErrorKind::External,
            Error::Database(_) => ErrorKind::Storage,
            Error::Validation(_) | Error::Config(_) => ErrorKind::Validation,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Unexpected(_) => ErrorKind::Internal,
        }
    }

    /// Whether this error invalidates the whole (exchange, trade date)
    /// rather than a single slot.
    pub fn aborts_date(&self) -> bool {
        !matches!(
            self,
            Error::CalendarGap { .. }
                | Error::InsufficientContracts { .. }
                | Error::ReferenceDataMissing { .. }
        )
    }
}

/// Serialisable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    CalendarGap,
    InsufficientContracts,
    MappingInvariantViolation,
    ReferenceDataMissing,
    External,
    Storage,
    Validation,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CalendarGap => "CALENDAR_GAP",
            ErrorKind::InsufficientContracts => "INSUFFICIENT_CONTRACTS",
            ErrorKind::MappingInvariantViolation => "MAPPING_INVARIANT_VIOLATION",
            ErrorKind::ReferenceDataMissing => "REFERENCE_DATA_MISSING",
            ErrorKind::External => "EXTERNAL",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated (e.g., duplicate key).
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Validation errors for input and reference data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

// === From implementations for common error types ===

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
