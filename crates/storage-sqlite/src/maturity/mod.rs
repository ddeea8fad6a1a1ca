//! SQLite storage implementation for maturity facts.

mod model;
mod repository;

pub use model::MaturityFactDB;
pub use repository::MaturityRepository;
