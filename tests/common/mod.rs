//! Shared test infrastructure for integration tests.

use dataset_scribe::entity::EntityKey;
use dataset_scribe::error::{Result, ScribeError};
use dataset_scribe::lifecycle::{DraftLifecycleManager, LifecycleOptions};
use dataset_scribe::lm::{DescriptionModel, GenerationRequest};
use dataset_scribe::retry::RetryPolicy;
use dataset_scribe::store::file::{FileCatalog, FileWarehouse};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub type FileManager = DraftLifecycleManager<FileCatalog, FileWarehouse>;

/// Catalog directory plus a lifecycle manager over the file-backed stores.
///
/// The temp dir must outlive the manager, so both travel together.
pub struct TestCatalog {
    dir: TempDir,
    pub manager: FileManager,
}

impl TestCatalog {
    /// Fresh catalog with the named tables registered under `proj.sales`.
    pub fn with_tables(names: &[&str]) -> Self {
        let dir = TempDir::new().expect("create temp catalog");
        let mut warehouse = FileWarehouse::open(dir.path()).expect("open warehouse");
        for name in names {
            warehouse.register(&table(name)).expect("register table");
        }
        let catalog = FileCatalog::open(dir.path()).expect("open catalog");
        TestCatalog {
            dir,
            manager: DraftLifecycleManager::new(catalog, warehouse, LifecycleOptions::default()),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Reopen the stores from disk, proving state survived the manager.
    pub fn reopen(&self) -> FileManager {
        let catalog = FileCatalog::open(self.dir.path()).expect("reopen catalog");
        let warehouse = FileWarehouse::open(self.dir.path()).expect("reopen warehouse");
        DraftLifecycleManager::new(catalog, warehouse, LifecycleOptions::default())
    }
}

pub fn table(name: &str) -> EntityKey {
    EntityKey::parse_table(&format!("proj.sales.{name}")).expect("test entity")
}

pub fn no_wait() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::ZERO,
    }
}

/// Model that replays queued responses and records serialized requests.
pub struct ScriptedModel {
    responses: RefCell<Vec<String>>,
    pub requests: RefCell<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Self {
        ScriptedModel {
            responses: RefCell::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl DescriptionModel for ScriptedModel {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        self.requests
            .borrow_mut()
            .push(serde_json::to_string(request).expect("serialize request"));
        self.responses
            .borrow_mut()
            .pop()
            .ok_or_else(|| ScribeError::transient("scripted model exhausted"))
    }
}
