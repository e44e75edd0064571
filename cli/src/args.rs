//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use coursesync_pipeline::ContentKind;

#[derive(Parser, Debug)]
#[command(name = "coursesync")]
#[command(about = "Restyle Canvas course content through a language model, with review")]
#[command(version)]
pub struct Cli {
    /// Pipeline tuning file (TOML)
    #[arg(long, global = true, env = "COURSESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest a course and list its items
    Inspect {
        /// Course id
        #[arg(long)]
        course: String,
    },

    /// Harvest, rewrite, approve and optionally commit
    Rewrite(RewriteArgs),
}

#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Course id
    #[arg(long)]
    pub course: String,

    #[command(flatten)]
    pub model: ModelSource,

    /// Per-kind cap when harvesting the model course
    #[arg(long)]
    pub max_model_items: Option<usize>,

    /// Free-text instructions for every item
    #[arg(long, default_value = "")]
    pub instructions: String,

    /// Approve every item that received a rewrite
    #[arg(long, conflicts_with = "approve")]
    pub approve_all: bool,

    /// Approve one item, as `kind:id` (for example `page:12`)
    #[arg(long, value_parser = parse_item_ref)]
    pub approve: Vec<ItemRef>,

    /// Write approved rewrites back to Canvas
    #[arg(long)]
    pub commit: bool,

    /// Write the reviewed items as JSON
    #[arg(long)]
    pub review_out: Option<PathBuf>,
}

/// At most one corpus source.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct ModelSource {
    /// Model context given inline
    #[arg(long)]
    pub model_text: Option<String>,

    /// Model context read from a file
    #[arg(long)]
    pub model_file: Option<PathBuf>,

    /// Model context harvested from another course
    #[arg(long)]
    pub model_course: Option<String>,
}

/// Identity of one item on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub kind: ContentKind,
    pub remote_id: String,
}

fn parse_item_ref(s: &str) -> Result<ItemRef, String> {
    let (kind, id) = s
        .split_once(':')
        .ok_or_else(|| format!("expected kind:id, got {s:?}"))?;
    let kind = match kind {
        "page" => ContentKind::Page,
        "assignment" => ContentKind::Assignment,
        "discussion" => ContentKind::Discussion,
        other => return Err(format!("unknown kind {other:?}")),
    };
    if id.is_empty() {
        return Err("empty id".to_string());
    }
    Ok(ItemRef {
        kind,
        remote_id: id.to_string(),
    })
}
