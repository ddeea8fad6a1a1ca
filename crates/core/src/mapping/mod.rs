//! Mapping module - resolves generic slots to concrete contracts per trade date.

mod mapping_model;
mod mapping_traits;
mod resolver_service;
mod slot_assignment;


pub use mapping_model::{
    GenericContractMapping, MappingWriteMode, ResolvedMapping, SlotAssignment, SlotFailure,
};
pub use mapping_traits::{ContractResolverTrait, MappingRepositoryTrait};
pub use resolver_service::ContractResolver;
pub use slot_assignment::{assign_slots, check_distinct_assignment, order_live_contracts};
