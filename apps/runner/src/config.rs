use anyhow::Context;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use cuprum_core::constants::{
    DEFAULT_CALENDAR_START_YEAR, DEFAULT_HORIZON_YEARS, DEFAULT_REFERENCE_MONTHS_AHEAD,
};

pub struct Config {
    pub db_path: String,
    pub calendar_start: NaiveDate,
    pub horizon_years: u32,
    pub holiday_file: Option<PathBuf>,
    pub provider_url: Option<String>,
    pub fetch_timeout: Duration,
    pub fetch_max_retries: u32,
    pub reference_months_ahead: u32,
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let db_path = env_opt("CUPRUM_DB_PATH").unwrap_or_else(|| "./db/cuprum.db".into());
        let default_start = NaiveDate::from_ymd_opt(DEFAULT_CALENDAR_START_YEAR, 1, 1)
            .context("Invalid default calendar start")?;
        let calendar_start = env_or("CUPRUM_CALENDAR_START", default_start)?;
        let horizon_years = env_or("CUPRUM_HORIZON_YEARS", DEFAULT_HORIZON_YEARS)?;
        let holiday_file = env_opt("CUPRUM_HOLIDAY_FILE").map(PathBuf::from);
        let provider_url = env_opt("CUPRUM_PROVIDER_URL");
        let timeout_ms: u64 = env_or("CUPRUM_FETCH_TIMEOUT_MS", 30_000)?;
        let fetch_max_retries = env_or("CUPRUM_FETCH_MAX_RETRIES", 3)?;
        let reference_months_ahead =
            env_or("CUPRUM_REFERENCE_MONTHS_AHEAD", DEFAULT_REFERENCE_MONTHS_AHEAD)?;
        Ok(Self {
            db_path,
            calendar_start,
            horizon_years,
            holiday_file,
            provider_url,
            fetch_timeout: Duration::from_millis(timeout_ms),
            fetch_max_retries,
            reference_months_ahead,
        })
    }
}
