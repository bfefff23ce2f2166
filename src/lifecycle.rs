//! Draft lifecycle over per-entity description aspects.
//!
//! One manager owns every transition: `UNSET -> DRAFTED -> REGEN_PENDING ->
//! DRAFTED -> ACCEPTED -> REGEN_PENDING -> ...`. The original carried two
//! near-duplicate copies of this flow (a client object and a table-operations
//! object); both the batch orchestrator and the single-entity CLI entry
//! points go through this one implementation.
//!
//! Failure semantics are deliberate: a store or model error is fatal to the
//! single call and propagates; nothing already written is rolled back.
use crate::aspect::{Comment, CommentKind, DraftAspect, DraftState, DRAFT_ASPECT_TYPE};
use crate::entity::{DatasetScope, EntityKey};
use crate::error::{Result, ScribeError};
use crate::lm::{DescriptionModel, GenerationRequest};
use crate::merge::{combine, with_disclaimer, DescriptionHandling};
use crate::retry::RetryPolicy;
use crate::store::{AspectFilter, MetadataAspectStore, WarehouseStore};
use chrono::Utc;

/// Knobs shared by every lifecycle operation.
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Merge policy used at draft time and again at promotion time.
    pub handling: DescriptionHandling,
    /// Prefix model output with the AI disclaimer clause.
    pub add_ai_disclaimer: bool,
    /// Recorded as `certified-by` on accept.
    pub certifier: String,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        LifecycleOptions {
            handling: DescriptionHandling::Append,
            add_ai_disclaimer: true,
            certifier: "dscribe".to_string(),
        }
    }
}

/// Owner of the per-entity draft state machine.
pub struct DraftLifecycleManager<S, W> {
    store: S,
    warehouse: W,
    options: LifecycleOptions,
}

impl<S: MetadataAspectStore, W: WarehouseStore> DraftLifecycleManager<S, W> {
    pub fn new(store: S, warehouse: W, options: LifecycleOptions) -> Self {
        DraftLifecycleManager {
            store,
            warehouse,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    pub fn options(&self) -> &LifecycleOptions {
        &self.options
    }

    fn load(&self, entity: &EntityKey) -> Result<Option<DraftAspect>> {
        self.store.get(entity, DRAFT_ASPECT_TYPE)
    }

    fn require(&self, entity: &EntityKey) -> Result<DraftAspect> {
        self.load(entity)?.ok_or_else(|| {
            ScribeError::not_found(format!(
                "no draft aspect for {entity}, generate a description first"
            ))
        })
    }

    pub fn state(&self, entity: &EntityKey) -> Result<DraftState> {
        Ok(DraftState::of(self.load(entity)?.as_ref()))
    }

    /// Whether `generate` would produce new text for `entity`, or skip.
    ///
    /// A current draft (exists, not flagged, regeneration not forced) is
    /// skipped before any model call is made.
    pub fn should_generate(&self, entity: &EntityKey, regenerate_requested: bool) -> Result<bool> {
        Ok(match self.load(entity)? {
            None => true,
            Some(aspect) => regenerate_requested || aspect.to_be_regenerated,
        })
    }

    /// Fold `new_text` into the entity's draft and transition to `DRAFTED`.
    ///
    /// Idempotent skip: if a draft exists, is not flagged for regeneration,
    /// and regeneration was not requested, the existing draft is returned
    /// unchanged. Comment history always survives.
    pub fn generate(
        &mut self,
        entity: &EntityKey,
        new_text: &str,
        regenerate_requested: bool,
    ) -> Result<DraftAspect> {
        self.apply_generated(entity, new_text, regenerate_requested, None)
    }

    fn apply_generated(
        &mut self,
        entity: &EntityKey,
        new_text: &str,
        regenerate_requested: bool,
        document_uri: Option<&str>,
    ) -> Result<DraftAspect> {
        self.store.ensure_aspect_type_exists(DRAFT_ASPECT_TYPE)?;
        let existing = self.load(entity)?;
        if let Some(mut aspect) = existing {
            if !aspect.to_be_regenerated && !regenerate_requested {
                tracing::debug!(entity = %entity, "draft is current, skipping generation");
                return Ok(aspect);
            }
            aspect.contents = combine(&aspect.contents, new_text, self.options.handling);
            aspect.generated_at = Utc::now();
            aspect.to_be_regenerated = false;
            aspect.decertify();
            if document_uri.is_some() {
                aspect.external_document_uri = document_uri.map(str::to_string);
            }
            self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, false)?;
            tracing::info!(entity = %entity, "regenerated draft description");
            Ok(aspect)
        } else {
            let mut aspect = DraftAspect::new(&combine("", new_text, self.options.handling));
            aspect.external_document_uri = document_uri.map(str::to_string);
            self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, true)?;
            tracing::info!(entity = %entity, "created draft description");
            Ok(aspect)
        }
    }

    /// Call the text-generation port (under `retry`) and fold the output
    /// into the draft. The skip check runs first so a current draft never
    /// costs a model call.
    pub fn generate_from_model<M: DescriptionModel>(
        &mut self,
        model: &M,
        retry: &RetryPolicy,
        entity: &EntityKey,
        document_uri: Option<&str>,
        regenerate_requested: bool,
    ) -> Result<DraftAspect> {
        if !self.should_generate(entity, regenerate_requested)? {
            tracing::debug!(entity = %entity, "draft is current, model call skipped");
            return self.require(entity);
        }
        let history = self.load(entity)?;
        let (comments, negatives) = match &history {
            Some(aspect) => (
                aspect.human_comments.as_slice(),
                aspect.negative_examples.as_slice(),
            ),
            None => (&[][..], &[][..]),
        };
        let request = GenerationRequest::new(entity, document_uri, comments, negatives);
        let text = retry.run("text-generation", || model.generate(&request))?;
        let text = if self.options.add_ai_disclaimer {
            with_disclaimer(&text)
        } else {
            text
        };
        self.apply_generated(entity, &text, regenerate_requested, document_uri)
    }

    /// Manual overwrite: replace the draft wholesale without reading prior
    /// state. Resets certification and the regeneration flag.
    pub fn stage(&mut self, entity: &EntityKey, text: &str) -> Result<DraftAspect> {
        self.store.ensure_aspect_type_exists(DRAFT_ASPECT_TYPE)?;
        let aspect = DraftAspect::new(text);
        self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, true)?;
        tracing::info!(entity = %entity, "staged manual draft description");
        Ok(aspect)
    }

    /// Flag the entity so the next regeneration batch recomputes it.
    /// Idempotent; reopening an accepted draft drops its certification so
    /// `certified` and `to-be-regenerated` are never both set.
    pub fn mark_for_regeneration(&mut self, entity: &EntityKey) -> Result<DraftAspect> {
        let mut aspect = self.require(entity)?;
        if !aspect.to_be_regenerated {
            aspect.to_be_regenerated = true;
            aspect.decertify();
            self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, false)?;
            tracing::info!(entity = %entity, "marked for regeneration");
        }
        Ok(aspect)
    }

    pub fn add_comment(&mut self, entity: &EntityKey, text: &str) -> Result<Comment> {
        self.append_comment(entity, text, CommentKind::Human)
    }

    pub fn add_negative_example(&mut self, entity: &EntityKey, text: &str) -> Result<Comment> {
        self.append_comment(entity, text, CommentKind::Negative)
    }

    fn append_comment(
        &mut self,
        entity: &EntityKey,
        text: &str,
        kind: CommentKind,
    ) -> Result<Comment> {
        let mut aspect = self.require(entity)?;
        let comment = Comment::new(text, kind);
        match kind {
            CommentKind::Negative => aspect.negative_examples.push(comment.clone()),
            CommentKind::Human | CommentKind::Ai => aspect.human_comments.push(comment.clone()),
        }
        self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, false)?;
        tracing::info!(entity = %entity, kind = ?kind, "appended review comment");
        Ok(comment)
    }

    /// Operator override of the draft text. Certification is untouched.
    pub fn edit(&mut self, entity: &EntityKey, text: &str) -> Result<DraftAspect> {
        let mut aspect = self.require(entity)?;
        aspect.contents = text.to_string();
        self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, false)?;
        tracing::info!(entity = %entity, "edited draft description");
        Ok(aspect)
    }

    /// Promote the draft: certify the aspect, then merge the draft contents
    /// into the canonical description at the warehouse.
    ///
    /// The aspect is certified before the canonical write is attempted; if
    /// that write fails the entity is left certified but unpublished, and
    /// the error propagates with nothing rolled back.
    pub fn accept(&mut self, entity: &EntityKey) -> Result<DraftAspect> {
        let mut aspect = self.require(entity)?;
        aspect.certified = true;
        aspect.to_be_regenerated = false;
        aspect.certified_by = Some(self.options.certifier.clone());
        aspect.certified_at = Some(Utc::now());
        self.store.put(entity, DRAFT_ASPECT_TYPE, &aspect, false)?;

        let current = self.warehouse.description(entity)?.unwrap_or_default();
        let combined = combine(&current, &aspect.contents, self.options.handling);
        self.warehouse.update_description(entity, &combined)?;
        tracing::info!(entity = %entity, "accepted draft into canonical description");
        Ok(aspect)
    }

    /// Entities in `scope` whose drafts are flagged for regeneration.
    pub fn regeneration_candidates(&self, scope: &DatasetScope) -> Result<Vec<EntityKey>> {
        self.store
            .list(scope, DRAFT_ASPECT_TYPE, AspectFilter::PendingRegeneration)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
