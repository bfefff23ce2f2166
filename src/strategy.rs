//! Batch generation strategies and the sequential orchestrator.
//!
//! A batch run selects and orders the entities of a dataset, then feeds each
//! one through the lifecycle manager strictly sequentially. The first failure
//! aborts the remaining batch and propagates; entities already processed keep
//! their committed state. That no-partial-continuation behavior is a
//! deliberate trade-off, not an oversight.
use crate::entity::{DatasetScope, EntityKey};
use crate::error::{Result, ScribeError};
use crate::lifecycle::DraftLifecycleManager;
use crate::lm::DescriptionModel;
use crate::retry::RetryPolicy;
use crate::store::{MetadataAspectStore, WarehouseStore};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Entity selection and ordering policy for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Full listing in discovery order.
    Naive,
    /// Full listing, uniformly shuffled. Unseeded, so runs are not
    /// reproducible; callers wanting determinism pick another strategy.
    Random,
    /// Full listing, lexicographic by fully-qualified name.
    Alphabetical,
    /// Only entities named by the documentation mapping, in mapping order.
    Documented,
    /// Mapping entries first, then the remaining discovered entities in
    /// discovery order without document URIs.
    DocumentedThenRest,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Naive => "NAIVE",
            Strategy::Random => "RANDOM",
            Strategy::Alphabetical => "ALPHABETICAL",
            Strategy::Documented => "DOCUMENTED",
            Strategy::DocumentedThenRest => "DOCUMENTED_THEN_REST",
        }
    }

    fn requires_mapping(&self) -> bool {
        matches!(self, Strategy::Documented | Strategy::DocumentedThenRest)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ScribeError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "NAIVE" => Ok(Strategy::Naive),
            "RANDOM" => Ok(Strategy::Random),
            "ALPHABETICAL" => Ok(Strategy::Alphabetical),
            "DOCUMENTED" => Ok(Strategy::Documented),
            "DOCUMENTED_THEN_REST" => Ok(Strategy::DocumentedThenRest),
            other => Err(ScribeError::validation(format!(
                "unknown strategy {other:?}, expected NAIVE, RANDOM, ALPHABETICAL, \
                 DOCUMENTED, or DOCUMENTED_THEN_REST"
            ))),
        }
    }
}

/// Whether a run drafts everything or only flagged entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Initial,
    Regenerate,
}

/// Entity-to-document mapping loaded from a two-column `fqn,uri` file.
#[derive(Debug, Clone, Default)]
pub struct DocumentMapping {
    entries: Vec<(EntityKey, String)>,
}

impl DocumentMapping {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            ScribeError::validation(format!(
                "read documentation mapping {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&text)
    }

    /// Parse mapping rows. Blank lines are skipped; a row without both
    /// columns is rejected before any store call happens.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((fqn, uri)) = line.split_once(',') else {
                return Err(ScribeError::validation(format!(
                    "documentation mapping line {}: expected \"fqn,uri\", got {line:?}",
                    number + 1
                )));
            };
            let entity = EntityKey::parse_table(fqn.trim())?;
            entries.push((entity, uri.trim().to_string()));
        }
        Ok(DocumentMapping { entries })
    }

    pub fn entries(&self) -> &[(EntityKey, String)] {
        &self.entries
    }

    pub fn uri_for(&self, entity: &EntityKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == entity)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn contains(&self, entity: &EntityKey) -> bool {
        self.uri_for(entity).is_some()
    }
}

/// What a batch run did, for logging and the CLI summary.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub generated: Vec<EntityKey>,
    pub skipped: Vec<EntityKey>,
}

/// Select, order, and run the entities of one batch.
pub struct GenerationStrategyOrchestrator<'a, S, W, M> {
    manager: &'a mut DraftLifecycleManager<S, W>,
    model: &'a M,
    retry: RetryPolicy,
}

impl<'a, S, W, M> GenerationStrategyOrchestrator<'a, S, W, M>
where
    S: MetadataAspectStore,
    W: WarehouseStore,
    M: DescriptionModel,
{
    pub fn new(
        manager: &'a mut DraftLifecycleManager<S, W>,
        model: &'a M,
        retry: RetryPolicy,
    ) -> Self {
        GenerationStrategyOrchestrator {
            manager,
            model,
            retry,
        }
    }

    /// Run one batch. Entities are processed strictly sequentially; the
    /// first failure aborts the rest of the batch.
    pub fn run(
        &mut self,
        scope: &DatasetScope,
        strategy: Strategy,
        mode: GenerationMode,
        mapping: Option<&DocumentMapping>,
    ) -> Result<BatchReport> {
        if strategy.requires_mapping() && mapping.is_none() {
            return Err(ScribeError::validation(format!(
                "a documentation mapping is required for the {strategy} strategy"
            )));
        }
        let discovered = match mode {
            GenerationMode::Initial => self.manager.warehouse().list_entities(scope)?,
            GenerationMode::Regenerate => self.manager.regeneration_candidates(scope)?,
        };
        tracing::info!(
            scope = %scope,
            %strategy,
            mode = ?mode,
            discovered = discovered.len(),
            "starting batch generation"
        );
        let plan = plan_entities(scope, strategy, mode, &discovered, mapping)?;

        let regenerate_requested = matches!(mode, GenerationMode::Regenerate);
        let mut report = BatchReport::default();
        for (entity, document_uri) in plan {
            if self
                .manager
                .should_generate(&entity, regenerate_requested)?
            {
                self.manager.generate_from_model(
                    self.model,
                    &self.retry,
                    &entity,
                    document_uri.as_deref(),
                    regenerate_requested,
                )?;
                report.generated.push(entity);
            } else {
                report.skipped.push(entity);
            }
        }
        tracing::info!(
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            "batch generation finished"
        );
        Ok(report)
    }
}

/// Produce the ordered `(entity, document URI)` work list for a batch.
pub fn plan_entities(
    scope: &DatasetScope,
    strategy: Strategy,
    mode: GenerationMode,
    discovered: &[EntityKey],
    mapping: Option<&DocumentMapping>,
) -> Result<Vec<(EntityKey, Option<String>)>> {
    match strategy {
        Strategy::Naive => Ok(bare(discovered.to_vec())),
        Strategy::Random => {
            let mut shuffled = discovered.to_vec();
            shuffled.shuffle(&mut rand::rng());
            Ok(bare(shuffled))
        }
        Strategy::Alphabetical => {
            let mut sorted = discovered.to_vec();
            sorted.sort();
            Ok(bare(sorted))
        }
        Strategy::Documented => documented_plan(scope, mode, discovered, required(mapping)?),
        Strategy::DocumentedThenRest => {
            let mapping = required(mapping)?;
            let mut plan = documented_plan(scope, mode, discovered, mapping)?;
            if matches!(mode, GenerationMode::Initial) {
                for entity in discovered {
                    if !mapping.contains(entity) {
                        plan.push((entity.clone(), None));
                    }
                }
            }
            Ok(plan)
        }
    }
}

fn required(mapping: Option<&DocumentMapping>) -> Result<&DocumentMapping> {
    mapping.ok_or_else(|| ScribeError::validation("documentation mapping missing"))
}

fn bare(entities: Vec<EntityKey>) -> Vec<(EntityKey, Option<String>)> {
    entities.into_iter().map(|entity| (entity, None)).collect()
}

fn documented_plan(
    scope: &DatasetScope,
    mode: GenerationMode,
    discovered: &[EntityKey],
    mapping: &DocumentMapping,
) -> Result<Vec<(EntityKey, Option<String>)>> {
    match mode {
        GenerationMode::Initial => {
            let mut plan = Vec::new();
            for (entity, uri) in mapping.entries() {
                if !discovered.contains(entity) {
                    return Err(ScribeError::validation(format!(
                        "entity {} from the documentation mapping was not found in {scope}",
                        entity.table_fqn()
                    )));
                }
                plan.push((entity.clone(), Some(uri.clone())));
            }
            Ok(plan)
        }
        GenerationMode::Regenerate => {
            // `discovered` is already restricted to flagged entities; every
            // one of them must be documented.
            let mut plan = Vec::new();
            for entity in discovered {
                let Some(uri) = mapping.uri_for(entity) else {
                    return Err(ScribeError::validation(format!(
                        "flagged entity {} is missing from the documentation mapping",
                        entity.table_fqn()
                    )));
                };
                plan.push((entity.clone(), Some(uri.to_string())));
            }
            Ok(plan)
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
