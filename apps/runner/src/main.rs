mod cli;
mod config;
mod main_lib;
mod scheduler;

use clap::Parser;
use cli::Cli;
use config::Config;
use cuprum_core::utils::{Clock, SystemClock};
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = Cli::parse().into_command(SystemClock.today());
    let config = Config::from_env()?;
    init_tracing();

    let state = build_state(&config).await?;
    let report = scheduler::run_batch(state, command).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.cancelled {
        std::process::exit(130);
    }
    Ok(())
}
