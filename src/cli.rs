//! CLI argument parsing for the drafting workflow.
//!
//! The CLI is intentionally thin: every command maps onto one lifecycle or
//! orchestrator call, so the same core logic can be embedded elsewhere.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the description-drafting workflow.
#[derive(Parser, Debug)]
#[command(
    name = "dscribe",
    version,
    about = "Draft, review, and publish dataset descriptions",
    after_help = "Examples:\n  dscribe register --entity proj.sales.orders --column amount\n  dscribe generate --entity proj.sales.orders --doc docs/orders.pdf\n  dscribe batch --dataset proj.sales --strategy ALPHABETICAL\n  dscribe mark --entity proj.sales.orders\n  dscribe comment --entity proj.sales.orders --text \"mention currency\"\n  dscribe accept --entity proj.sales.orders --certifier alice\n  dscribe review --dataset proj.sales --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Catalog root holding aspect records and the warehouse manifest
    /// (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a table or column so batch runs discover it
    Register(RegisterArgs),
    /// Draft a description for one entity
    Generate(GenerateArgs),
    /// Draft descriptions for a whole dataset
    Batch(BatchArgs),
    /// Flag an entity for the next regeneration batch
    Mark(EntityArgs),
    /// Attach a review comment or negative example to a draft
    Comment(CommentArgs),
    /// Overwrite a draft's text by hand
    Edit(EditArgs),
    /// Certify a draft and publish it to the canonical description
    Accept(AcceptArgs),
    /// List the review queue for a dataset
    Review(ReviewArgs),
    /// List entities flagged for regeneration
    Pending(DatasetArgs),
}

/// Entity selector shared by the single-entity commands.
#[derive(Parser, Debug)]
pub struct EntityArgs {
    /// Table in project.dataset.table form
    #[arg(long, value_name = "FQN")]
    pub entity: String,

    /// Column of the table, for column-level drafts
    #[arg(long, value_name = "NAME")]
    pub column: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Register a table or column in the warehouse manifest")]
pub struct RegisterArgs {
    #[command(flatten)]
    pub entity: EntityArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Draft a description for one entity")]
pub struct GenerateArgs {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// Use this text instead of calling the model command
    #[arg(long, value_name = "TEXT", conflicts_with = "doc")]
    pub text: Option<String>,

    /// Document URI passed to the model as grounding material
    #[arg(long, value_name = "URI")]
    pub doc: Option<String>,

    /// Regenerate even if a current draft exists
    #[arg(long)]
    pub force: bool,

    /// Merge policy for regenerated text: APPEND, PREPEND, or REPLACE
    #[arg(long, value_name = "POLICY", default_value = "APPEND")]
    pub handling: String,

    /// Skip the AI disclaimer prefix on model output
    #[arg(long)]
    pub no_disclaimer: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Draft descriptions for every entity of a dataset")]
pub struct BatchArgs {
    /// Dataset in project.dataset form
    #[arg(long, value_name = "FQN")]
    pub dataset: String,

    /// Ordering strategy: NAIVE, RANDOM, ALPHABETICAL, DOCUMENTED,
    /// or DOCUMENTED_THEN_REST
    #[arg(long, value_name = "NAME", default_value = "NAIVE")]
    pub strategy: String,

    /// Documentation mapping file with one "fqn,uri" row per entity
    #[arg(long, value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Regenerate flagged entities instead of drafting new ones
    #[arg(long)]
    pub regenerate: bool,

    /// Merge policy for regenerated text: APPEND, PREPEND, or REPLACE
    #[arg(long, value_name = "POLICY", default_value = "APPEND")]
    pub handling: String,

    /// Skip the AI disclaimer prefix on model output
    #[arg(long)]
    pub no_disclaimer: bool,

    /// Emit the batch report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Attach a review comment or negative example to a draft")]
pub struct CommentArgs {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// Comment text
    #[arg(long, value_name = "TEXT")]
    pub text: String,

    /// Record the text as a negative example instead of a comment
    #[arg(long)]
    pub negative: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Overwrite a draft's text by hand")]
pub struct EditArgs {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// Replacement draft text
    #[arg(long, value_name = "TEXT")]
    pub text: String,

    /// Replace the whole draft record, discarding comments and history
    #[arg(long)]
    pub stage: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Certify a draft and publish it to the canonical description")]
pub struct AcceptArgs {
    #[command(flatten)]
    pub entity: EntityArgs,

    /// Recorded as the certifying reviewer
    #[arg(long, value_name = "NAME")]
    pub certifier: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "List the review queue for a dataset")]
pub struct ReviewArgs {
    /// Dataset in project.dataset form
    #[arg(long, value_name = "FQN")]
    pub dataset: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct DatasetArgs {
    /// Dataset in project.dataset form
    #[arg(long, value_name = "FQN")]
    pub dataset: String,
}
