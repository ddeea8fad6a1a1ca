//! Executes one batch run and reports it.
//!
//! Ctrl-C sets the run's cancellation flag: dates already committed stay
//! valid and no new date is started.

use std::sync::Arc;
use tracing::{info, warn};

use cuprum_core::batch::BatchReport;

use crate::cli::Command;
use crate::main_lib::AppState;

pub async fn run_batch(state: Arc<AppState>, command: Command) -> anyhow::Result<BatchReport> {
    let runner = state.batch_runner(&command.exchanges);

    let cancel = runner.cancellation();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing in-flight dates and stopping");
            cancel.cancel();
        }
    });

    info!("Running {} against {}", command.mode, state.db_path);
    let result = runner.run(command.mode).await;
    signal_task.abort();

    let report = result?;
    log_summary(&report);
    Ok(report)
}

fn log_summary(report: &BatchReport) {
    info!(
        "{} run finished: {} processed, {} skipped, {} failures",
        report.mode.name(),
        report.processed,
        report.skipped,
        report.failures.len()
    );
    if report.cancelled {
        warn!("Run was cancelled before every date was processed");
    }
    for (kind, count) in report.failure_counts() {
        warn!("{:?}: {}", kind, count);
    }
}
