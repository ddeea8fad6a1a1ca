//! SQLite storage implementation for generic slots and concrete contracts.

mod model;
mod repository;

pub use model::{ConcreteContractDB, GenericContractDB};
pub use repository::{ConcreteContractRepository, GenericContractRepository};
