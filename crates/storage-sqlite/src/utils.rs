//! Utility functions for SQLite storage operations.
//!
//! Dates, timestamps, decimals and enums are stored as TEXT. ISO dates
//! compare correctly as strings, which the range queries rely on.

use chrono::{NaiveDate, NaiveDateTime};
use cuprum_core::Exchange;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;

/// Maximum number of rows per multi-row INSERT.
///
/// SQLite limits the number of bound parameters per statement. Calendar
/// rows carry four parameters each, so 500 rows stay well inside the limit.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Chunk a slice into batches of `SQLITE_MAX_PARAMS_CHUNK` items.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| StorageError::CorruptValue(format!("date '{}': {}", value, e)))
}

pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, StorageError> {
    value.map(parse_date).transpose()
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, StorageError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| StorageError::CorruptValue(format!("timestamp '{}': {}", value, e)))
}

pub fn parse_exchange(value: &str) -> Result<Exchange, StorageError> {
    Exchange::from_str(value)
        .map_err(|_| StorageError::CorruptValue(format!("exchange '{}'", value)))
}

pub fn parse_optional_decimal(value: Option<&str>) -> Result<Option<Decimal>, StorageError> {
    value
        .map(|v| {
            Decimal::from_str(v)
                .map_err(|e| StorageError::CorruptValue(format!("decimal '{}': {}", v, e)))
        })
        .transpose()
}

/// Converts a stored INTEGER that must be non-negative.
pub fn to_u32(value: i32, column: &str) -> Result<u32, StorageError> {
    u32::try_from(value)
        .map_err(|_| StorageError::CorruptValue(format!("{} is negative: {}", column, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i32> = (0..1200).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), SQLITE_MAX_PARAMS_CHUNK);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn test_timestamp_keeps_subseconds() {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_micro_opt(9, 15, 0, 250_000)
            .unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn test_whole_second_timestamp_parses() {
        let ts = parse_timestamp("2025-03-03T00:00:00").unwrap();
        assert_eq!(format_timestamp(ts), "2025-03-03T00:00:00");
    }

    #[test]
    fn test_iso_dates_sort_as_text() {
        let a = format_date(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        let b = format_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert!(a < b);
    }

    #[test]
    fn test_bad_values_are_corrupt() {
        assert!(matches!(parse_date("03/03/2025"), Err(StorageError::CorruptValue(_))));
        assert!(matches!(parse_exchange("NYMEX"), Err(StorageError::CorruptValue(_))));
        assert!(matches!(to_u32(-1, "slot"), Err(StorageError::CorruptValue(_))));
    }
}
