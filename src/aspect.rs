//! Draft aspect data model.
//!
//! The catalog stores one draft aspect per entity per aspect type as a flat
//! key/value record. The original payloads were untyped maps mutated in
//! place; here the shape is an explicit tagged record and the store boundary
//! is the single point of (de)serialization.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aspect type holding generated description drafts.
pub const DRAFT_ASPECT_TYPE: &str = "description-drafts";

/// Origin of a review comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    Human,
    Ai,
    Negative,
}

/// A single review comment. Comment lists are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub kind: CommentKind,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(text: &str, kind: CommentKind) -> Self {
        Comment {
            id: Uuid::new_v4(),
            text: text.to_string(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// The per-entity draft record.
///
/// Created lazily on first generation and never destroyed; publishing updates
/// the canonical description elsewhere and leaves this record in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DraftAspect {
    pub contents: String,
    pub certified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certified_at: Option<DateTime<Utc>>,
    pub generated_at: DateTime<Utc>,
    pub to_be_regenerated: bool,
    #[serde(default)]
    pub human_comments: Vec<Comment>,
    #[serde(default)]
    pub negative_examples: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_document_uri: Option<String>,
}

impl DraftAspect {
    /// Fresh, uncertified draft with empty comment history.
    pub fn new(contents: &str) -> Self {
        DraftAspect {
            contents: contents.to_string(),
            certified: false,
            certified_by: None,
            certified_at: None,
            generated_at: Utc::now(),
            to_be_regenerated: false,
            human_comments: Vec::new(),
            negative_examples: Vec::new(),
            external_document_uri: None,
        }
    }

    /// Drop certification, e.g. when a published draft is reopened.
    pub fn decertify(&mut self) {
        self.certified = false;
        self.certified_by = None;
        self.certified_at = None;
    }

    pub fn state(&self) -> DraftState {
        if self.to_be_regenerated {
            DraftState::RegenPending
        } else if self.certified {
            DraftState::Accepted
        } else {
            DraftState::Drafted
        }
    }
}

/// Lifecycle position of an entity's draft.
///
/// There is no terminal state: an accepted draft can be reopened by marking
/// it for regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftState {
    Unset,
    Drafted,
    RegenPending,
    Accepted,
}

impl DraftState {
    pub fn of(aspect: Option<&DraftAspect>) -> Self {
        aspect.map_or(DraftState::Unset, DraftAspect::state)
    }
}
