//! In-memory stores for tests and embedding.
//!
//! Behavior mirrors the file-backed stores, including `NotFound` semantics
//! and stable listing order. The warehouse can be told to fail canonical
//! writes, which is how tests exercise the certified-but-unpublished case.
use crate::aspect::DraftAspect;
use crate::entity::{DatasetScope, EntityKey};
use crate::error::{Result, ScribeError};
use crate::store::{AspectFilter, MetadataAspectStore, WarehouseStore};
use std::collections::{BTreeMap, BTreeSet};

/// Catalog keyed by aspect type and entity, sorted for stable listings.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    aspect_types: BTreeSet<String>,
    records: BTreeMap<(String, EntityKey), DraftAspect>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }
}

impl MetadataAspectStore for MemoryCatalog {
    fn get(&self, entity: &EntityKey, aspect_type: &str) -> Result<Option<DraftAspect>> {
        Ok(self
            .records
            .get(&(aspect_type.to_string(), entity.clone()))
            .cloned())
    }

    fn put(
        &mut self,
        entity: &EntityKey,
        aspect_type: &str,
        aspect: &DraftAspect,
        create_if_missing: bool,
    ) -> Result<()> {
        let key = (aspect_type.to_string(), entity.clone());
        if !create_if_missing && !self.records.contains_key(&key) {
            return Err(ScribeError::not_found(format!(
                "no {aspect_type} aspect for {entity}"
            )));
        }
        self.records.insert(key, aspect.clone());
        Ok(())
    }

    fn list(
        &self,
        scope: &DatasetScope,
        aspect_type: &str,
        filter: AspectFilter,
    ) -> Result<Vec<EntityKey>> {
        Ok(self
            .records
            .iter()
            .filter(|((record_type, entity), aspect)| {
                record_type == aspect_type && scope.contains(entity) && filter.matches(aspect)
            })
            .map(|((_, entity), _)| entity.clone())
            .collect())
    }

    fn ensure_aspect_type_exists(&mut self, aspect_type: &str) -> Result<()> {
        self.aspect_types.insert(aspect_type.to_string());
        Ok(())
    }
}

/// Warehouse over a vector so discovery order is registration order.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    tables: Vec<(EntityKey, Option<String>)>,
    fail_description_updates: bool,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        MemoryWarehouse::default()
    }

    pub fn register(&mut self, entity: &EntityKey) {
        if !self.tables.iter().any(|(key, _)| key == entity) {
            self.tables.push((entity.clone(), None));
        }
    }

    pub fn register_with_description(&mut self, entity: &EntityKey, description: &str) {
        self.register(entity);
        if let Some(slot) = self.tables.iter_mut().find(|(key, _)| key == entity) {
            slot.1 = Some(description.to_string());
        }
    }

    /// Make every subsequent canonical write fail with a `Store` error.
    pub fn fail_description_updates(&mut self, fail: bool) {
        self.fail_description_updates = fail;
    }

    fn slot(&self, entity: &EntityKey) -> Result<&(EntityKey, Option<String>)> {
        self.tables
            .iter()
            .find(|(key, _)| key == entity)
            .ok_or_else(|| {
                ScribeError::not_found(format!("{entity} is not registered in the warehouse"))
            })
    }
}

impl WarehouseStore for MemoryWarehouse {
    fn list_entities(&self, scope: &DatasetScope) -> Result<Vec<EntityKey>> {
        Ok(self
            .tables
            .iter()
            .filter(|(key, _)| scope.contains(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn description(&self, entity: &EntityKey) -> Result<Option<String>> {
        Ok(self.slot(entity)?.1.clone())
    }

    fn update_description(&mut self, entity: &EntityKey, description: &str) -> Result<()> {
        if self.fail_description_updates {
            return Err(ScribeError::store("warehouse unavailable"));
        }
        self.slot(entity)?;
        if let Some(slot) = self.tables.iter_mut().find(|(key, _)| key == entity) {
            slot.1 = Some(description.to_string());
        }
        Ok(())
    }
}
