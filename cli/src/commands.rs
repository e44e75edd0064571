//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use coursesync_canvas::{CanvasClient, CanvasConfig};
use coursesync_pipeline::{
    ContentItem, ModelContextBuilder, PipelineConfig, RewriteOutcome, SyncSession,
    WriteBackReport,
};
use coursesync_transform::OpenAIProvider;

use crate::args::{Cli, Command, ModelSource, RewriteArgs};

/// Run one invocation. Returns `false` when any write-back failed.
pub async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref()).await?;
    match cli.command {
        Command::Inspect { course } => {
            inspect(config, &course).await?;
            Ok(true)
        }
        Command::Rewrite(args) => rewrite(config, args).await,
    }
}

async fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .await
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn canvas_client(config: &PipelineConfig) -> Result<CanvasClient> {
    let canvas = CanvasConfig::from_env()
        .context("Canvas settings")?
        .with_per_page(config.per_page)
        .with_detail_concurrency(config.detail_concurrency);
    Ok(CanvasClient::new(canvas)?)
}

async fn inspect(config: PipelineConfig, course: &str) -> Result<()> {
    let client = canvas_client(&config)?;
    let mut session = SyncSession::new(config);
    let snapshot = session.harvest(&client, course).await?;

    println!(
        "{} ({})",
        snapshot.course_name().unwrap_or("unnamed course"),
        snapshot.course_id()
    );
    for item in snapshot.items() {
        println!(
            "{:<12} {:>8}  {}  ({} chars)",
            item.kind(),
            item.remote_id(),
            item.title(),
            item.original_html().chars().count()
        );
    }
    let stats = session.stats();
    println!(
        "{} pages, {} assignments, {} discussions",
        stats.pages, stats.assignments, stats.discussions
    );
    Ok(())
}

async fn rewrite(mut config: PipelineConfig, args: RewriteArgs) -> Result<bool> {
    if let Some(n) = args.max_model_items {
        config = config.with_model_max_items(n);
    }
    // Missing settings for either service must fail before the first request.
    let client = canvas_client(&config)?;
    let provider = OpenAIProvider::from_env().context("OpenAI settings")?;

    let mut session = SyncSession::new(config);
    session.harvest(&client, &args.course).await?;
    load_corpus(&mut session, &client, &args.model).await?;

    let total = session.items().len();
    let report = session
        .rewrite_all(&provider, &args.instructions, |p| {
            info!("Rewrite progress {}/{total}", p.index + 1);
        })
        .await?;

    for (item, outcome) in session.items().iter().zip(&report.outcomes) {
        match outcome {
            RewriteOutcome::Rewritten => println!("rewritten  {}", item.label()),
            RewriteOutcome::Skipped => println!("skipped    {} (no HTML)", item.label()),
            RewriteOutcome::Failed(message) => println!("failed     {}: {message}", item.label()),
        }
    }

    if args.approve_all {
        session.approve_all_rewritten();
    }
    for item_ref in &args.approve {
        session.set_approval(item_ref.kind, &item_ref.remote_id, true)?;
    }
    if report.stale_approvals > 0 {
        warn!(
            "{} approved items failed to rewrite and still hold an earlier rewrite",
            report.stale_approvals
        );
    }

    if let Some(path) = &args.review_out {
        write_review(path, session.items()).await?;
    }

    if !args.commit {
        println!(
            "{} items approved; run again with --commit to write them back",
            session.stats().approved
        );
        return Ok(true);
    }

    let written = session.commit(&client).await?;
    print_write_back(&written);
    Ok(written.is_success())
}

async fn load_corpus(
    session: &mut SyncSession,
    client: &CanvasClient,
    model: &ModelSource,
) -> Result<()> {
    if let Some(text) = &model.model_text {
        session.set_corpus(ModelContextBuilder::from_text(text.as_str()));
    } else if let Some(path) = &model.model_file {
        let corpus = ModelContextBuilder::from_file(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        session.set_corpus(corpus);
    } else if let Some(course) = &model.model_course {
        session.load_model_course(client, course).await?;
    }

    if let Some(preview) = session.corpus_preview() {
        info!("Model context preview:\n{preview}");
    }
    Ok(())
}

#[derive(Serialize)]
struct Review<'a> {
    items: &'a [ContentItem],
}

async fn write_review(path: &Path, items: &[ContentItem]) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("review output path is empty");
    }
    let json = serde_json::to_string_pretty(&Review { items })?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote review of {} items to {}", items.len(), path.display());
    Ok(())
}

fn print_write_back(report: &WriteBackReport) {
    println!(
        "Wrote {} of {} approved items",
        report.succeeded.len(),
        report.attempted
    );
    for failure in &report.failures {
        println!("  failed: {}: {}", failure.title, failure.message);
    }
}
