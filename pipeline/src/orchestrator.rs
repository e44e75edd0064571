//! Batch rewrite with per-item failure isolation.
//!
//! Every item in the batch is attempted and gets exactly one outcome. A
//! failed provider call is recorded on the item and the batch moves on.

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use coursesync_transform::TransformProvider;

use crate::item::ContentItem;
use crate::prompt::PromptCompiler;

/// Result of rewriting one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum RewriteOutcome {
    /// Provider returned text; it is now the item's `rewritten_html`.
    Rewritten,
    /// No original HTML, so nothing was sent.
    Skipped,
    /// Provider failed; the message is stored in `rewrite_error`.
    Failed(String),
}

/// Progress after one item completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewriteProgress {
    /// Zero-based index of the completed item.
    pub index: usize,
    /// Batch size.
    pub total: usize,
}

impl RewriteProgress {
    /// `(index + 1) / total`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.index + 1) as f64 / self.total as f64
        }
    }
}

/// Per-item outcomes of one batch, in registry order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteReport {
    pub outcomes: Vec<RewriteOutcome>,
    /// Items still approved whose latest attempt failed. Committing them
    /// sends the previous successful rewrite.
    pub stale_approvals: usize,
}

impl RewriteReport {
    pub fn rewritten(&self) -> usize {
        self.count(|o| matches!(o, RewriteOutcome::Rewritten))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RewriteOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RewriteOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&RewriteOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Drives the provider over every item.
#[derive(Debug, Clone)]
pub struct RewriteOrchestrator {
    compiler: PromptCompiler,
    concurrency: usize,
}

impl Default for RewriteOrchestrator {
    fn default() -> Self {
        Self::new(PromptCompiler::new())
    }
}

impl RewriteOrchestrator {
    /// Create a sequential orchestrator.
    pub fn new(compiler: PromptCompiler) -> Self {
        Self {
            compiler,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` provider calls in flight. Outcomes are
    /// still applied and reported in item order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Rewrite every item in place.
    ///
    /// `on_progress` is called once per item, after its outcome is applied,
    /// with a strictly increasing index.
    pub async fn run_all<F>(
        &self,
        items: &mut [ContentItem],
        corpus: &str,
        instructions: &str,
        provider: &dyn TransformProvider,
        mut on_progress: F,
    ) -> RewriteReport
    where
        F: FnMut(RewriteProgress),
    {
        let total = items.len();
        info!(
            "Rewriting {total} items with {} ({})",
            provider.model(),
            provider.name()
        );

        let payloads: Vec<Option<String>> = items
            .iter()
            .map(|item| {
                (!item.original_html().is_empty())
                    .then(|| self.compiler.compile(item, corpus, instructions))
            })
            .collect();

        let mut results = futures::stream::iter(payloads)
            .map(|payload| async move {
                match payload {
                    Some(payload) => Some(provider.transform(&payload).await),
                    None => None,
                }
            })
            .buffered(self.concurrency);

        let mut report = RewriteReport {
            outcomes: Vec::with_capacity(total),
            stale_approvals: 0,
        };

        let mut index = 0;
        while let Some(result) = results.next().await {
            let item = &mut items[index];
            let outcome = match result {
                None => {
                    debug!("Skipping {}: no HTML body", item.label());
                    item.rewritten_html.clear();
                    RewriteOutcome::Skipped
                }
                Some(Ok(text)) => {
                    item.rewritten_html = text.trim().to_string();
                    item.rewrite_error = None;
                    RewriteOutcome::Rewritten
                }
                Some(Err(e)) => {
                    let message = e.to_string();
                    warn!("Rewrite failed for {}: {message}", item.label());
                    item.rewrite_error = Some(message.clone());
                    if item.is_ready_to_commit() {
                        report.stale_approvals += 1;
                    }
                    RewriteOutcome::Failed(message)
                }
            };
            report.outcomes.push(outcome);
            on_progress(RewriteProgress { index, total });
            index += 1;
        }

        info!(
            "Rewrite complete: {} rewritten, {} skipped, {} failed",
            report.rewritten(),
            report.skipped(),
            report.failed()
        );
        report
    }
}
