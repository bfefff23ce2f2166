use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dataset_scribe::cli::{
    AcceptArgs, BatchArgs, Command, CommentArgs, EditArgs, EntityArgs, GenerateArgs, RegisterArgs,
    ReviewArgs, RootArgs,
};
use dataset_scribe::entity::{DatasetScope, EntityKey};
use dataset_scribe::lifecycle::{DraftLifecycleManager, LifecycleOptions};
use dataset_scribe::lm::{CommandModel, LM_COMMAND_ENV};
use dataset_scribe::retry::RetryPolicy;
use dataset_scribe::review::list_review_items;
use dataset_scribe::store::file::{FileCatalog, FileWarehouse};
use dataset_scribe::strategy::{
    DocumentMapping, GenerationMode, GenerationStrategyOrchestrator, Strategy,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type Manager = DraftLifecycleManager<FileCatalog, FileWarehouse>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dataset_scribe=info,dscribe=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    let root = catalog_root(args.catalog)?;

    match args.command {
        Command::Register(register) => cmd_register(&root, register),
        Command::Generate(generate) => cmd_generate(&root, generate),
        Command::Batch(batch) => cmd_batch(&root, batch),
        Command::Mark(entity) => cmd_mark(&root, entity),
        Command::Comment(comment) => cmd_comment(&root, comment),
        Command::Edit(edit) => cmd_edit(&root, edit),
        Command::Accept(accept) => cmd_accept(&root, accept),
        Command::Review(review) => cmd_review(&root, review),
        Command::Pending(dataset) => cmd_pending(&root, &dataset.dataset),
    }
}

fn catalog_root(catalog: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = catalog {
        return Ok(root);
    }
    dirs::data_dir()
        .map(|dir| dir.join("dataset-scribe"))
        .ok_or_else(|| anyhow!("no platform data directory, pass --catalog"))
}

fn open_manager(root: &Path, options: LifecycleOptions) -> Result<Manager> {
    let catalog = FileCatalog::open(root).context("open aspect catalog")?;
    let warehouse = FileWarehouse::open(root).context("open warehouse manifest")?;
    Ok(DraftLifecycleManager::new(catalog, warehouse, options))
}

fn parse_entity(args: &EntityArgs) -> Result<EntityKey> {
    let table = EntityKey::parse_table(&args.entity)?;
    match &args.column {
        Some(column) => Ok(table.with_column(column)?),
        None => Ok(table),
    }
}

fn parse_scope(dataset: &str) -> Result<DatasetScope> {
    Ok(dataset.parse()?)
}

fn require_model() -> Result<CommandModel> {
    CommandModel::from_env()?
        .ok_or_else(|| anyhow!("set {LM_COMMAND_ENV} to a model command, or pass --text"))
}

fn cmd_register(root: &Path, args: RegisterArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let mut warehouse = FileWarehouse::open(root).context("open warehouse manifest")?;
    warehouse.register(&entity)?;
    println!("Registered {entity}.");
    Ok(())
}

fn cmd_generate(root: &Path, args: GenerateArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let options = LifecycleOptions {
        handling: args.handling.parse()?,
        add_ai_disclaimer: !args.no_disclaimer,
        ..LifecycleOptions::default()
    };
    let mut manager = open_manager(root, options)?;
    let aspect = match &args.text {
        Some(text) => manager.generate(&entity, text, args.force)?,
        None => {
            let model = require_model()?;
            manager.generate_from_model(
                &model,
                &RetryPolicy::default(),
                &entity,
                args.doc.as_deref(),
                args.force,
            )?
        }
    };
    println!("{}", aspect.contents);
    Ok(())
}

fn cmd_batch(root: &Path, args: BatchArgs) -> Result<()> {
    let scope = parse_scope(&args.dataset)?;
    let strategy: Strategy = args.strategy.parse()?;
    let mapping = args
        .mapping
        .as_deref()
        .map(DocumentMapping::load)
        .transpose()?;
    let mode = if args.regenerate {
        GenerationMode::Regenerate
    } else {
        GenerationMode::Initial
    };
    let options = LifecycleOptions {
        handling: args.handling.parse()?,
        add_ai_disclaimer: !args.no_disclaimer,
        ..LifecycleOptions::default()
    };
    let mut manager = open_manager(root, options)?;
    let model = require_model()?;
    let mut orchestrator =
        GenerationStrategyOrchestrator::new(&mut manager, &model, RetryPolicy::default());
    let report = orchestrator.run(&scope, strategy, mode, mapping.as_ref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Drafted {} entities, skipped {} with current drafts.",
            report.generated.len(),
            report.skipped.len()
        );
    }
    Ok(())
}

fn cmd_mark(root: &Path, args: EntityArgs) -> Result<()> {
    let entity = parse_entity(&args)?;
    let mut manager = open_manager(root, LifecycleOptions::default())?;
    manager.mark_for_regeneration(&entity)?;
    println!("Marked {entity} for regeneration.");
    Ok(())
}

fn cmd_comment(root: &Path, args: CommentArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let mut manager = open_manager(root, LifecycleOptions::default())?;
    if args.negative {
        manager.add_negative_example(&entity, &args.text)?;
        println!("Recorded negative example on {entity}.");
    } else {
        manager.add_comment(&entity, &args.text)?;
        println!("Recorded comment on {entity}.");
    }
    Ok(())
}

fn cmd_edit(root: &Path, args: EditArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let mut manager = open_manager(root, LifecycleOptions::default())?;
    if args.stage {
        manager.stage(&entity, &args.text)?;
        println!("Staged replacement draft for {entity}.");
    } else {
        manager.edit(&entity, &args.text)?;
        println!("Edited draft for {entity}.");
    }
    Ok(())
}

fn cmd_accept(root: &Path, args: AcceptArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let mut options = LifecycleOptions::default();
    if let Some(certifier) = args.certifier {
        options.certifier = certifier;
    }
    let mut manager = open_manager(root, options)?;
    let aspect = manager.accept(&entity)?;
    println!(
        "Accepted draft for {entity}, certified by {}.",
        aspect.certified_by.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

fn cmd_review(root: &Path, args: ReviewArgs) -> Result<()> {
    let scope = parse_scope(&args.dataset)?;
    let manager = open_manager(root, LifecycleOptions::default())?;
    let items = list_review_items(&manager, &scope)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No drafts to review in {scope}.");
        return Ok(());
    }
    for item in items {
        let flag = if item.marked_for_regeneration {
            " [regeneration pending]"
        } else {
            ""
        };
        println!("{} ({}){flag}", item.id, item.status);
        println!("  draft: {}", item.draft_description);
        if !item.current_description.is_empty() {
            println!("  current: {}", item.current_description);
        }
        for comment in &item.comments {
            println!("  note: {}", comment.text);
        }
    }
    Ok(())
}

fn cmd_pending(root: &Path, dataset: &str) -> Result<()> {
    let scope = parse_scope(dataset)?;
    let manager = open_manager(root, LifecycleOptions::default())?;
    let candidates = manager.regeneration_candidates(&scope)?;
    if candidates.is_empty() {
        println!("Nothing is flagged for regeneration in {scope}.");
        return Ok(());
    }
    for entity in candidates {
        println!("{entity}");
    }
    Ok(())
}
