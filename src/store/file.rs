//! File-backed catalog and warehouse.
//!
//! Stands in for the external services so the CLI and integration tests have
//! a durable store: one pretty-printed JSON document per aspect record, and a
//! single manifest for the warehouse side. Writes go through a temp file and
//! rename so a crashed process never leaves a half-written record.
use crate::aspect::DraftAspect;
use crate::entity::{DatasetScope, EntityKey};
use crate::error::{Result, ScribeError};
use crate::store::{AspectFilter, MetadataAspectStore, WarehouseStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn store_err(action: &str, path: &Path, err: impl std::fmt::Display) -> ScribeError {
    ScribeError::store(format!("{action} {}: {err}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| store_err("create", parent, err))?;
    }
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|err| store_err("serialize", path, err))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("record");
    let tmp_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, &bytes).map_err(|err| store_err("write", &tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| store_err("write", path, err))?;
    Ok(())
}

/// Aspect records laid out as
/// `aspects/{type}/{project}/{dataset}/{table}/table.json` plus
/// `.../columns/{column}.json` for column-level records.
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|err| store_err("create", root, err))?;
        Ok(FileCatalog {
            root: root.to_path_buf(),
        })
    }

    fn type_root(&self, aspect_type: &str) -> PathBuf {
        self.root.join("aspects").join(aspect_type)
    }

    fn record_path(&self, entity: &EntityKey, aspect_type: &str) -> PathBuf {
        let table_root = self
            .type_root(aspect_type)
            .join(&entity.project)
            .join(&entity.dataset)
            .join(&entity.table);
        match &entity.column {
            Some(column) => table_root.join("columns").join(format!("{column}.json")),
            None => table_root.join("table.json"),
        }
    }

    fn read_record(&self, path: &Path) -> Result<DraftAspect> {
        let bytes = fs::read(path).map_err(|err| store_err("read", path, err))?;
        serde_json::from_slice(&bytes).map_err(|err| store_err("parse", path, err))
    }

    fn sorted_entries(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if !dir.exists() {
            return Ok(names);
        }
        for entry in fs::read_dir(dir).map_err(|err| store_err("read", dir, err))? {
            let entry = entry.map_err(|err| store_err("read", dir, err))?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl MetadataAspectStore for FileCatalog {
    fn get(&self, entity: &EntityKey, aspect_type: &str) -> Result<Option<DraftAspect>> {
        let path = self.record_path(entity, aspect_type);
        if !path.exists() {
            return Ok(None);
        }
        self.read_record(&path).map(Some)
    }

    fn put(
        &mut self,
        entity: &EntityKey,
        aspect_type: &str,
        aspect: &DraftAspect,
        create_if_missing: bool,
    ) -> Result<()> {
        let path = self.record_path(entity, aspect_type);
        if !create_if_missing && !path.exists() {
            return Err(ScribeError::not_found(format!(
                "no {aspect_type} aspect for {entity}"
            )));
        }
        write_json_atomic(&path, aspect)?;
        tracing::debug!(entity = %entity, aspect_type, "wrote aspect record");
        Ok(())
    }

    fn list(
        &self,
        scope: &DatasetScope,
        aspect_type: &str,
        filter: AspectFilter,
    ) -> Result<Vec<EntityKey>> {
        let dataset_root = self
            .type_root(aspect_type)
            .join(&scope.project)
            .join(&scope.dataset);
        let mut entities = Vec::new();
        for table in Self::sorted_entries(&dataset_root)? {
            let table_key = EntityKey {
                project: scope.project.clone(),
                dataset: scope.dataset.clone(),
                table,
                column: None,
            };
            let table_path = self.record_path(&table_key, aspect_type);
            if table_path.exists() && filter.matches(&self.read_record(&table_path)?) {
                entities.push(table_key.clone());
            }
            let columns_dir = table_path.with_file_name("columns");
            for file_name in Self::sorted_entries(&columns_dir)? {
                let Some(column) = file_name.strip_suffix(".json") else {
                    continue;
                };
                let mut column_key = table_key.clone();
                column_key.column = Some(column.to_string());
                let record = self.read_record(&columns_dir.join(&file_name))?;
                if filter.matches(&record) {
                    entities.push(column_key);
                }
            }
        }
        Ok(entities)
    }

    fn ensure_aspect_type_exists(&mut self, aspect_type: &str) -> Result<()> {
        let dir = self.type_root(aspect_type);
        fs::create_dir_all(&dir).map_err(|err| store_err("create", &dir, err))?;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WarehouseFile {
    #[serde(default)]
    tables: Vec<TableRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    columns: Vec<ColumnRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Warehouse manifest: registered entities and their canonical descriptions,
/// kept in registration order so `NAIVE` listings are stable.
pub struct FileWarehouse {
    path: PathBuf,
    manifest: WarehouseFile,
}

impl FileWarehouse {
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join("warehouse.json");
        let manifest = if path.exists() {
            let bytes = fs::read(&path).map_err(|err| store_err("read", &path, err))?;
            serde_json::from_slice(&bytes).map_err(|err| store_err("parse", &path, err))?
        } else {
            WarehouseFile::default()
        };
        Ok(FileWarehouse { path, manifest })
    }

    fn persist(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.manifest)
    }

    fn table_index(&self, fqn: &str) -> Result<usize> {
        self.manifest
            .tables
            .iter()
            .position(|record| record.name == fqn)
            .ok_or_else(|| {
                ScribeError::not_found(format!("table {fqn} is not registered in the warehouse"))
            })
    }

    /// Register an entity so batch runs discover it. Idempotent.
    pub fn register(&mut self, entity: &EntityKey) -> Result<()> {
        let fqn = entity.table_fqn();
        let index = match self.table_index(&fqn) {
            Ok(index) => index,
            Err(_) => {
                self.manifest.tables.push(TableRecord {
                    name: fqn,
                    description: None,
                    columns: Vec::new(),
                });
                self.manifest.tables.len() - 1
            }
        };
        if let Some(column) = &entity.column {
            let columns = &mut self.manifest.tables[index].columns;
            if !columns.iter().any(|record| &record.name == column) {
                columns.push(ColumnRecord {
                    name: column.clone(),
                    description: None,
                });
            }
        }
        self.persist()
    }
}

impl WarehouseStore for FileWarehouse {
    fn list_entities(&self, scope: &DatasetScope) -> Result<Vec<EntityKey>> {
        let mut entities = Vec::new();
        for record in &self.manifest.tables {
            let key = EntityKey::parse_table(&record.name)
                .map_err(|err| ScribeError::store(format!("warehouse manifest: {err}")))?;
            if !scope.contains(&key) {
                continue;
            }
            entities.push(key.clone());
            for column in &record.columns {
                let mut column_key = key.clone();
                column_key.column = Some(column.name.clone());
                entities.push(column_key);
            }
        }
        Ok(entities)
    }

    fn description(&self, entity: &EntityKey) -> Result<Option<String>> {
        let index = self.table_index(&entity.table_fqn())?;
        let record = &self.manifest.tables[index];
        match &entity.column {
            Some(column) => record
                .columns
                .iter()
                .find(|candidate| &candidate.name == column)
                .map(|candidate| candidate.description.clone())
                .ok_or_else(|| ScribeError::not_found(format!("{entity} is not registered"))),
            None => Ok(record.description.clone()),
        }
    }

    fn update_description(&mut self, entity: &EntityKey, description: &str) -> Result<()> {
        let index = self.table_index(&entity.table_fqn())?;
        let record = &mut self.manifest.tables[index];
        match &entity.column {
            Some(column) => {
                let column_record = record
                    .columns
                    .iter_mut()
                    .find(|candidate| &candidate.name == column)
                    .ok_or_else(|| {
                        ScribeError::not_found(format!("{entity} is not registered"))
                    })?;
                column_record.description = Some(description.to_string());
            }
            None => record.description = Some(description.to_string()),
        }
        self.persist()
    }
}
