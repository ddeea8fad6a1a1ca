//! SQLite storage implementation for resumable batch progress.

mod model;
mod repository;

pub use model::BatchProgressDB;
pub use repository::ProgressRepository;
