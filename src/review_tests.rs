use super::list_review_items;
use crate::entity::{DatasetScope, EntityKey};
use crate::lifecycle::{DraftLifecycleManager, LifecycleOptions};
use crate::store::memory::{MemoryCatalog, MemoryWarehouse};

type Manager = DraftLifecycleManager<MemoryCatalog, MemoryWarehouse>;

fn table(name: &str) -> EntityKey {
    EntityKey::parse_table(&format!("proj.ds.{name}")).expect("test entity")
}

fn scope() -> DatasetScope {
    "proj.ds".parse().expect("test scope")
}

fn manager() -> Manager {
    let mut warehouse = MemoryWarehouse::new();
    warehouse.register_with_description(&table("t1"), "Existing summary.");
    warehouse.register(&table("t2"));
    DraftLifecycleManager::new(MemoryCatalog::new(), warehouse, LifecycleOptions::default())
}

#[test]
fn drafted_entities_appear_with_both_description_sides() {
    let mut manager = manager();
    manager.generate(&table("t1"), "New draft.", false).expect("draft");
    let items = list_review_items(&manager, &scope()).expect("review");
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.id, "proj.ds.t1#table");
    assert_eq!(item.item_type, "table");
    assert_eq!(item.current_description, "Existing summary.");
    assert_eq!(item.draft_description, "New draft.");
    assert_eq!(item.status, "draft");
    assert!(!item.marked_for_regeneration);
}

#[test]
fn accepted_drafts_report_current_status_and_certification_time() {
    let mut manager = manager();
    manager.generate(&table("t2"), "draft", false).expect("draft");
    let accepted = manager.accept(&table("t2")).expect("accept");
    let items = list_review_items(&manager, &scope()).expect("review");
    let item = &items[0];
    assert_eq!(item.status, "current");
    assert_eq!(Some(item.last_modified), accepted.certified_at);
}

#[test]
fn comments_and_negative_examples_are_merged_into_one_history() {
    let mut manager = manager();
    manager.generate(&table("t1"), "draft", false).expect("draft");
    manager.add_comment(&table("t1"), "too terse").expect("comment");
    manager
        .add_negative_example(&table("t1"), "marketing fluff")
        .expect("negative");
    let items = list_review_items(&manager, &scope()).expect("review");
    let texts: Vec<&str> = items[0]
        .comments
        .iter()
        .map(|comment| comment.text.as_str())
        .collect();
    assert_eq!(texts, ["too terse", "marketing fluff"]);
}

#[test]
fn column_items_use_column_ids_and_tolerate_missing_canonical_data() {
    let mut manager = manager();
    let column = table("t3").with_column("amount").expect("column");
    manager.generate(&column, "Column draft.", false).expect("draft");
    let items = list_review_items(&manager, &scope()).expect("review");
    let item = &items[0];
    assert_eq!(item.id, "proj.ds.t3#column#amount");
    assert_eq!(item.item_type, "column");
    assert_eq!(item.current_description, "");
}

#[test]
fn review_items_serialize_with_camel_case_keys() {
    let mut manager = manager();
    manager.generate(&table("t1"), "draft", false).expect("draft");
    manager.mark_for_regeneration(&table("t1")).expect("mark");
    let items = list_review_items(&manager, &scope()).expect("review");
    let json = serde_json::to_value(&items).expect("serialize");
    assert_eq!(json[0]["type"], "table");
    assert_eq!(json[0]["markedForRegeneration"], true);
    assert!(json[0]["currentDescription"].is_string());
    assert!(json[0]["draftDescription"].is_string());
}
