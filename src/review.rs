//! Read-only review listing for human curators.
//!
//! Each entity with a draft aspect becomes one review item pairing the
//! canonical description with the pending draft, plus the comment history a
//! reviewer needs to judge it.
use crate::aspect::{Comment, DRAFT_ASPECT_TYPE};
use crate::entity::{DatasetScope, EntityKey};
use crate::error::{Result, ScribeError};
use crate::lifecycle::DraftLifecycleManager;
use crate::store::{AspectFilter, MetadataAspectStore, WarehouseStore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One entry in the review queue.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Stable identifier, `fqn#table` or `fqn#column#name`.
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub name: String,
    /// Canonical description at the warehouse, empty if none exists.
    pub current_description: String,
    pub draft_description: String,
    /// `"current"` once certified, `"draft"` while pending review.
    pub status: &'static str,
    pub last_modified: DateTime<Utc>,
    pub comments: Vec<Comment>,
    pub marked_for_regeneration: bool,
}

/// Build the review queue for every drafted entity in `scope`.
pub fn list_review_items<S, W>(
    manager: &DraftLifecycleManager<S, W>,
    scope: &DatasetScope,
) -> Result<Vec<ReviewItem>>
where
    S: MetadataAspectStore,
    W: WarehouseStore,
{
    let entities = manager
        .store()
        .list(scope, DRAFT_ASPECT_TYPE, AspectFilter::Any)?;
    let mut items = Vec::with_capacity(entities.len());
    for entity in entities {
        if let Some(item) = review_item(manager, &entity)? {
            items.push(item);
        }
    }
    Ok(items)
}

fn review_item<S, W>(
    manager: &DraftLifecycleManager<S, W>,
    entity: &EntityKey,
) -> Result<Option<ReviewItem>>
where
    S: MetadataAspectStore,
    W: WarehouseStore,
{
    let Some(aspect) = manager.store().get(entity, DRAFT_ASPECT_TYPE)? else {
        return Ok(None);
    };
    // Entities missing from the warehouse still get an item; the canonical
    // side is simply blank.
    let current_description = match manager.warehouse().description(entity) {
        Ok(current) => current.unwrap_or_default(),
        Err(ScribeError::NotFound(_)) => String::new(),
        Err(err) => return Err(err),
    };
    let mut comments = aspect.human_comments.clone();
    comments.extend(aspect.negative_examples.iter().cloned());
    Ok(Some(ReviewItem {
        id: entity.review_id(),
        item_type: if entity.is_column() { "column" } else { "table" },
        name: entity.table_fqn(),
        current_description,
        draft_description: aspect.contents.clone(),
        status: if aspect.certified { "current" } else { "draft" },
        last_modified: aspect.certified_at.unwrap_or(aspect.generated_at),
        comments,
        marked_for_regeneration: aspect.to_be_regenerated,
    }))
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
