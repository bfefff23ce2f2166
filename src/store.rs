//! Store contracts for the metadata catalog and the primary warehouse.
//!
//! Both are external collaborators behind narrow traits. Single-aspect writes
//! are assumed atomic; there is no cross-aspect or cross-store transaction,
//! so callers must tolerate partially applied batch state after a failure.
use crate::aspect::DraftAspect;
use crate::entity::{DatasetScope, EntityKey};
use crate::error::Result;

pub mod file;
pub mod memory;

/// Predicate applied by [`MetadataAspectStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectFilter {
    /// Every entity holding an aspect of the requested type.
    Any,
    /// Only entities whose aspect has the regeneration flag set.
    PendingRegeneration,
}

impl AspectFilter {
    pub fn matches(&self, aspect: &DraftAspect) -> bool {
        match self {
            AspectFilter::Any => true,
            AspectFilter::PendingRegeneration => aspect.to_be_regenerated,
        }
    }
}

/// Entity-scoped metadata records in the external catalog.
pub trait MetadataAspectStore {
    /// Fetch the aspect of `aspect_type` attached to `entity`, if any.
    fn get(&self, entity: &EntityKey, aspect_type: &str) -> Result<Option<DraftAspect>>;

    /// Write the aspect attached to `entity`. With `create_if_missing`
    /// false, writing to an entity without an existing aspect is a
    /// `NotFound` error.
    fn put(
        &mut self,
        entity: &EntityKey,
        aspect_type: &str,
        aspect: &DraftAspect,
        create_if_missing: bool,
    ) -> Result<()>;

    /// Entities in `scope` holding an aspect of `aspect_type` that passes
    /// `filter`, in a stable order.
    fn list(
        &self,
        scope: &DatasetScope,
        aspect_type: &str,
        filter: AspectFilter,
    ) -> Result<Vec<EntityKey>>;

    /// Create the aspect type if it does not exist yet. Idempotent.
    fn ensure_aspect_type_exists(&mut self, aspect_type: &str) -> Result<()>;
}

/// The primary data warehouse: entity discovery and the canonical
/// (user-visible) description field that `accept` publishes into.
pub trait WarehouseStore {
    /// Entities under `scope` in the warehouse's own stable order; tables
    /// first, each followed by its columns.
    fn list_entities(&self, scope: &DatasetScope) -> Result<Vec<EntityKey>>;

    /// Current canonical description, `None` when the entity has none.
    /// `NotFound` when the entity itself is unknown.
    fn description(&self, entity: &EntityKey) -> Result<Option<String>>;

    /// Overwrite the canonical description.
    fn update_description(&mut self, entity: &EntityKey, description: &str) -> Result<()>;
}
