//! SQLite storage implementation for generic-to-concrete mappings.

mod model;
mod repository;

pub use model::GenericContractMappingDB;
pub use repository::MappingRepository;
