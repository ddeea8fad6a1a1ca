//! Command-line interface for the runner.
//!
//! Usage:
//!   cuprum-runner initial 2024-01-02 2024-12-31 --exchange LME,COMEX
//!   cuprum-runner daily [2025-03-07]
//!
//! Daily runs resume after the last processed date and also retry any
//! earlier date whose last attempt failed.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use cuprum_core::batch::RunMode;
use cuprum_core::Exchange;

#[derive(Parser, Debug)]
#[command(name = "cuprum-runner")]
#[command(about = "Resolve generic copper futures slots and their maturity facts")]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,

    /// Exchanges to process (comma-separated, default: all)
    #[arg(
        long,
        short,
        global = true,
        env = "CUPRUM_EXCHANGES",
        value_delimiter = ',',
        value_parser = parse_exchange
    )]
    pub exchange: Vec<Exchange>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Process every trading day in START..=END
    Initial { start: NaiveDate, end: NaiveDate },
    /// Process pending trading days through TODAY (default: the current date)
    Daily { today: Option<NaiveDate> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub mode: RunMode,
    /// Empty means every exchange.
    pub exchanges: Vec<Exchange>,
}

fn parse_exchange(value: &str) -> Result<Exchange, String> {
    value.parse::<Exchange>().map_err(|e| e.to_string())
}

impl Cli {
    /// `today` fills in a daily run without an explicit date.
    pub fn into_command(self, today: NaiveDate) -> Command {
        let mode = match self.mode {
            Mode::Initial { start, end } => RunMode::Initial { start, end },
            Mode::Daily { today: pinned } => RunMode::Daily {
                today: pinned.unwrap_or(today),
            },
        };
        let mut exchanges = Vec::with_capacity(self.exchange.len());
        for exchange in self.exchange {
            if !exchanges.contains(&exchange) {
                exchanges.push(exchange);
            }
        }
        Command { mode, exchanges }
    }
}
