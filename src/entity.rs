//! Entity addressing for tables and columns.
//!
//! Tables are identified by `project.dataset.table`; a column is addressed by
//! a separate field, never folded into the dotted name. Aspect records are
//! keyed `{project}.global.{aspect-type}` with an `@Schema.{column}` suffix
//! for column-level records.
use crate::error::{Result, ScribeError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("static pattern"))
}

fn validate_id(value: &str, label: &str) -> Result<()> {
    if id_pattern().is_match(value) {
        Ok(())
    } else {
        Err(ScribeError::validation(format!(
            "invalid {label} identifier {value:?}"
        )))
    }
}

/// A table or column being documented.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub project: String,
    pub dataset: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl EntityKey {
    /// Parse a table key from its `project.dataset.table` textual form.
    pub fn parse_table(fqn: &str) -> Result<Self> {
        let parts: Vec<&str> = fqn.split('.').collect();
        let [project, dataset, table] = parts[..] else {
            return Err(ScribeError::validation(format!(
                "malformed table name {fqn:?}, expected project.dataset.table"
            )));
        };
        validate_id(project, "project")?;
        validate_id(dataset, "dataset")?;
        validate_id(table, "table")?;
        Ok(EntityKey {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
            column: None,
        })
    }

    /// Address a column of this table.
    pub fn with_column(&self, column: &str) -> Result<Self> {
        validate_id(column, "column")?;
        let mut key = self.clone();
        key.column = Some(column.to_string());
        Ok(key)
    }

    /// The table's fully-qualified name. Columns share their table's FQN.
    pub fn table_fqn(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.table)
    }

    pub fn is_column(&self) -> bool {
        self.column.is_some()
    }

    /// Name of this entity's aspect record within the catalog entry.
    pub fn aspect_record_name(&self, aspect_type: &str) -> String {
        match &self.column {
            Some(column) => format!("{}.global.{aspect_type}@Schema.{column}", self.project),
            None => format!("{}.global.{aspect_type}", self.project),
        }
    }

    /// Stable review-queue identifier, `fqn#table` or `fqn#column#name`.
    pub fn review_id(&self) -> String {
        match &self.column {
            Some(column) => format!("{}#column#{column}", self.table_fqn()),
            None => format!("{}#table", self.table_fqn()),
        }
    }

    pub fn scope(&self) -> DatasetScope {
        DatasetScope {
            project: self.project.clone(),
            dataset: self.dataset.clone(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "{} column {column}", self.table_fqn()),
            None => f.write_str(&self.table_fqn()),
        }
    }
}

/// Scope of a batch run: every entity under `project.dataset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetScope {
    pub project: String,
    pub dataset: String,
}

impl DatasetScope {
    pub fn contains(&self, entity: &EntityKey) -> bool {
        entity.project == self.project && entity.dataset == self.dataset
    }
}

impl FromStr for DatasetScope {
    type Err = ScribeError;

    fn from_str(fqn: &str) -> Result<Self> {
        let parts: Vec<&str> = fqn.split('.').collect();
        let [project, dataset] = parts[..] else {
            return Err(ScribeError::validation(format!(
                "malformed dataset name {fqn:?}, expected project.dataset"
            )));
        };
        validate_id(project, "project")?;
        validate_id(dataset, "dataset")?;
        Ok(DatasetScope {
            project: project.to_string(),
            dataset: dataset.to_string(),
        })
    }
}

impl fmt::Display for DatasetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.dataset)
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
