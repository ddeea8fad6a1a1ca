//! Contracts module - generic slots, concrete contracts, tickers and
//! reference-data refresh.

mod contracts_model;
mod contracts_service;
mod contracts_traits;
mod month_code;
mod reference_data_service;

pub use contracts_model::{
    default_generic_definitions, validate_slot_sequence, ConcreteContract,
    GenericContractDefinition, NewConcreteContract, NewGenericContractDefinition, SlotKey,
};
pub use contracts_service::ContractCatalogService;
pub use contracts_traits::{
    ConcreteContractRepositoryTrait, ContractCatalogServiceTrait, GenericContractRepositoryTrait,
    ReferenceDataServiceTrait,
};
pub use month_code::{generic_ticker, ContractTicker, MonthCode};
pub use reference_data_service::{candidate_tickers, ReferenceDataService, RefreshSummary};
