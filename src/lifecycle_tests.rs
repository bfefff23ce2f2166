use super::{DraftLifecycleManager, LifecycleOptions};
use crate::aspect::DraftState;
use crate::entity::EntityKey;
use crate::error::ScribeError;
use crate::lm::{DescriptionModel, GenerationRequest};
use crate::merge::{combine, with_disclaimer, DescriptionHandling, AI_DISCLAIMER};
use crate::retry::RetryPolicy;
use crate::store::memory::{MemoryCatalog, MemoryWarehouse};
use crate::store::WarehouseStore;
use std::cell::RefCell;

type Manager = DraftLifecycleManager<MemoryCatalog, MemoryWarehouse>;

fn entity() -> EntityKey {
    EntityKey::parse_table("proj.ds.t1").expect("test entity")
}

fn manager() -> Manager {
    let mut warehouse = MemoryWarehouse::new();
    warehouse.register(&entity());
    DraftLifecycleManager::new(MemoryCatalog::new(), warehouse, LifecycleOptions::default())
}

/// Model that replays queued responses and records requests.
struct ScriptedModel {
    responses: RefCell<Vec<String>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: &[&str]) -> Self {
        ScriptedModel {
            responses: RefCell::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl DescriptionModel for ScriptedModel {
    fn generate(&self, request: &GenerationRequest<'_>) -> crate::error::Result<String> {
        self.requests
            .borrow_mut()
            .push(serde_json::to_string(request).expect("serialize request"));
        self.responses
            .borrow_mut()
            .pop()
            .ok_or_else(|| ScribeError::transient("scripted model exhausted"))
    }
}

fn no_wait() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: std::time::Duration::ZERO,
    }
}

#[test]
fn first_generate_creates_a_draft() {
    let mut manager = manager();
    let aspect = manager
        .generate(&entity(), "Revenue table.", false)
        .expect("generate");
    assert_eq!(aspect.contents, "Revenue table.");
    assert!(!aspect.certified);
    assert!(!aspect.to_be_regenerated);
    assert_eq!(aspect.state(), DraftState::Drafted);
    assert_eq!(
        manager.state(&entity()).expect("state"),
        DraftState::Drafted
    );
}

#[test]
fn generate_on_a_current_draft_is_an_idempotent_skip() {
    let mut manager = manager();
    manager
        .generate(&entity(), "first", false)
        .expect("generate");
    let unchanged = manager
        .generate(&entity(), "second", false)
        .expect("generate");
    assert_eq!(unchanged.contents, "first");
    assert!(!manager
        .should_generate(&entity(), false)
        .expect("should_generate"));
}

#[test]
fn forced_generate_merges_per_append_policy() {
    let mut manager = manager();
    manager
        .generate(&entity(), &with_disclaimer("first"), false)
        .expect("generate");
    let aspect = manager
        .generate(&entity(), &with_disclaimer("second"), true)
        .expect("regenerate");
    assert_eq!(aspect.contents, with_disclaimer("second"));
    assert_eq!(aspect.contents.matches(AI_DISCLAIMER).count(), 1);
}

#[test]
fn mark_then_generate_clears_the_flag_and_returns_to_drafted() {
    let mut manager = manager();
    manager.generate(&entity(), "draft", false).expect("generate");
    let flagged = manager.mark_for_regeneration(&entity()).expect("mark");
    assert!(flagged.to_be_regenerated);
    assert_eq!(flagged.state(), DraftState::RegenPending);

    let aspect = manager
        .generate(&entity(), " more", true)
        .expect("regenerate");
    assert!(!aspect.to_be_regenerated);
    assert_eq!(aspect.state(), DraftState::Drafted);
    assert_eq!(aspect.contents, "draft more");
}

#[test]
fn mark_for_regeneration_is_idempotent_and_requires_an_aspect() {
    let mut manager = manager();
    assert!(matches!(
        manager.mark_for_regeneration(&entity()),
        Err(ScribeError::NotFound(_))
    ));
    manager.generate(&entity(), "draft", false).expect("generate");
    manager.mark_for_regeneration(&entity()).expect("mark once");
    let again = manager.mark_for_regeneration(&entity()).expect("mark twice");
    assert!(again.to_be_regenerated);
}

#[test]
fn comments_append_in_order_and_survive_regeneration() {
    let mut manager = manager();
    manager.generate(&entity(), "draft", false).expect("generate");
    let first = manager.add_comment(&entity(), "a").expect("comment a");
    let second = manager.add_comment(&entity(), "b").expect("comment b");
    assert_ne!(first.id, second.id);
    manager
        .add_negative_example(&entity(), "not this")
        .expect("negative");

    let aspect = manager
        .generate(&entity(), "again", true)
        .expect("regenerate");
    let texts: Vec<&str> = aspect
        .human_comments
        .iter()
        .map(|comment| comment.text.as_str())
        .collect();
    assert_eq!(texts, ["a", "b"]);
    assert_eq!(aspect.negative_examples.len(), 1);
}

#[test]
fn comments_require_an_existing_aspect() {
    let mut manager = manager();
    assert!(matches!(
        manager.add_comment(&entity(), "early"),
        Err(ScribeError::NotFound(_))
    ));
    assert!(matches!(
        manager.add_negative_example(&entity(), "early"),
        Err(ScribeError::NotFound(_))
    ));
}

#[test]
fn edit_overrides_contents_without_touching_certification() {
    let mut manager = manager();
    manager.generate(&entity(), "draft", false).expect("generate");
    manager.accept(&entity()).expect("accept");
    let aspect = manager.edit(&entity(), "fixed wording").expect("edit");
    assert_eq!(aspect.contents, "fixed wording");
    assert!(aspect.certified);
}

#[test]
fn stage_overwrites_without_reading_prior_state() {
    let mut manager = manager();
    manager.generate(&entity(), "draft", false).expect("generate");
    manager.add_comment(&entity(), "note").expect("comment");
    manager.accept(&entity()).expect("accept");

    let staged = manager.stage(&entity(), "manual text").expect("stage");
    assert_eq!(staged.contents, "manual text");
    assert!(!staged.certified);
    assert!(!staged.to_be_regenerated);
}

#[test]
fn accept_certifies_and_merges_into_the_canonical_description() {
    let mut warehouse = MemoryWarehouse::new();
    warehouse.register_with_description(&entity(), "Curated intro. ");
    let mut manager = DraftLifecycleManager::new(
        MemoryCatalog::new(),
        warehouse,
        LifecycleOptions::default(),
    );
    manager
        .generate(&entity(), &with_disclaimer("Generated."), false)
        .expect("generate");
    let aspect = manager.accept(&entity()).expect("accept");

    assert!(aspect.certified);
    assert!(!aspect.to_be_regenerated);
    assert_eq!(aspect.certified_by.as_deref(), Some("dscribe"));
    assert!(aspect.certified_at.is_some());
    assert_eq!(aspect.state(), DraftState::Accepted);

    let canonical = manager
        .warehouse()
        .description(&entity())
        .expect("canonical")
        .expect("present");
    assert_eq!(
        canonical,
        combine(
            "Curated intro. ",
            &with_disclaimer("Generated."),
            DescriptionHandling::Append
        )
    );
}

#[test]
fn failed_canonical_write_leaves_a_certified_unpublished_aspect() {
    let mut warehouse = MemoryWarehouse::new();
    warehouse.register(&entity());
    warehouse.fail_description_updates(true);
    let mut manager = DraftLifecycleManager::new(
        MemoryCatalog::new(),
        warehouse,
        LifecycleOptions::default(),
    );
    manager.generate(&entity(), "draft", false).expect("generate");
    assert!(matches!(
        manager.accept(&entity()),
        Err(ScribeError::Store(_))
    ));
    // The aspect was certified before the canonical write was attempted.
    assert_eq!(
        manager.state(&entity()).expect("state"),
        DraftState::Accepted
    );
}

#[test]
fn reopening_an_accepted_draft_drops_certification() {
    let mut manager = manager();
    manager.generate(&entity(), "draft", false).expect("generate");
    manager.accept(&entity()).expect("accept");
    let aspect = manager.mark_for_regeneration(&entity()).expect("mark");
    assert!(aspect.to_be_regenerated);
    assert!(!aspect.certified);
    assert_eq!(aspect.certified_by, None);
}

#[test]
fn generate_from_model_skips_current_drafts_without_a_model_call() {
    let mut manager = manager();
    manager.generate(&entity(), "existing", false).expect("generate");
    let model = ScriptedModel::new(&[]);
    let aspect = manager
        .generate_from_model(&model, &no_wait(), &entity(), None, false)
        .expect("skip");
    assert_eq!(aspect.contents, "existing");
    assert!(model.requests.borrow().is_empty());
}

#[test]
fn generate_from_model_prefixes_the_disclaimer_and_passes_comments() {
    let mut manager = manager();
    manager.generate(&entity(), "seed", false).expect("generate");
    manager.add_comment(&entity(), "mention currency").expect("comment");
    manager.mark_for_regeneration(&entity()).expect("mark");

    let model = ScriptedModel::new(&["Fresh text"]);
    let aspect = manager
        .generate_from_model(&model, &no_wait(), &entity(), Some("docs/t1.pdf"), false)
        .expect("generate");
    assert!(aspect.contents.ends_with(&with_disclaimer("Fresh text")));
    assert_eq!(aspect.external_document_uri.as_deref(), Some("docs/t1.pdf"));

    let requests = model.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("mention currency"));
    assert!(requests[0].contains("docs/t1.pdf"));
}

#[test]
fn generate_from_model_retries_transient_failures() {
    let mut manager = manager();
    let failing_then_ok = FlakyModel {
        failures: RefCell::new(2),
    };
    let aspect = manager
        .generate_from_model(&failing_then_ok, &no_wait(), &entity(), None, false)
        .expect("generate after retries");
    assert!(aspect.contents.contains("eventually"));
}

struct FlakyModel {
    failures: RefCell<u32>,
}

impl DescriptionModel for FlakyModel {
    fn generate(&self, _request: &GenerationRequest<'_>) -> crate::error::Result<String> {
        let mut failures = self.failures.borrow_mut();
        if *failures > 0 {
            *failures -= 1;
            return Err(ScribeError::transient("model busy"));
        }
        Ok("eventually".to_string())
    }
}
