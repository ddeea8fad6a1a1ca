//! Batch module - initial and daily runs with resumable progress.

mod batch_model;
mod batch_service;
mod batch_traits;


pub use batch_model::{
    BatchFailure, BatchProgress, BatchReport, CancellationFlag, ProgressStatus, RunMode,
};
pub use batch_service::BatchRunner;
pub use batch_traits::ProgressRepositoryTrait;
