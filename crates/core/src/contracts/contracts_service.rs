use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::contracts::contracts_model::{
    default_generic_definitions, validate_slot_sequence, GenericContractDefinition, SlotKey,
};
use crate::contracts::contracts_traits::{
    ContractCatalogServiceTrait, GenericContractRepositoryTrait,
};
use crate::errors::Result;
use crate::exchanges::Exchange;

/// Service for the generic slot catalogue
pub struct ContractCatalogService {
    repository: Arc<dyn GenericContractRepositoryTrait>,
}

impl ContractCatalogService {
    pub fn new(repository: Arc<dyn GenericContractRepositoryTrait>) -> Self {
        ContractCatalogService { repository }
    }
}

#[async_trait]
impl ContractCatalogServiceTrait for ContractCatalogService {
    async fn seed_default_definitions(&self, exchange: Exchange) -> Result<usize> {
        if !self.repository.list_for_exchange(exchange)?.is_empty() {
            return Ok(0);
        }
        let defaults = default_generic_definitions(exchange);
        let written = self.repository.upsert_definitions(defaults).await?;
        info!("{}: seeded {} generic contract slots", exchange, written);
        Ok(written)
    }

    fn active_definitions(&self, exchange: Exchange) -> Result<Vec<GenericContractDefinition>> {
        let definitions = self.repository.list_for_exchange(exchange)?;
        validate_slot_sequence(exchange, &definitions)?;
        Ok(definitions.into_iter().filter(|d| d.is_active).collect())
    }

    fn get_definition(&self, key: &SlotKey) -> Result<Option<GenericContractDefinition>> {
        self.repository.get_by_key(key)
    }
}
