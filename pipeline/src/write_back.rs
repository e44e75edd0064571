//! Commit approved rewrites back to Canvas.
//!
//! Only items that are approved *and* have a non-empty rewrite are sent.
//! A failed update is recorded and the batch continues; item state is left
//! alone so re-running `commit` retries exactly the items that are still
//! approved.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use coursesync_canvas::{CanvasClient, CanvasError};

use crate::error::{Result, SyncError};
use crate::item::{ContentItem, ItemTarget};

/// Type-specific update calls.
#[async_trait]
pub trait ContentWriter: Send + Sync {
    /// Replace a page body, addressed by slug.
    async fn update_page(&self, course_id: &str, slug: &str, html: &str)
    -> std::result::Result<(), CanvasError>;

    /// Replace an assignment description.
    async fn update_assignment(
        &self,
        course_id: &str,
        assignment_id: &str,
        html: &str,
    ) -> std::result::Result<(), CanvasError>;

    /// Replace a discussion topic message.
    async fn update_discussion(
        &self,
        course_id: &str,
        topic_id: &str,
        html: &str,
    ) -> std::result::Result<(), CanvasError>;
}

#[async_trait]
impl ContentWriter for CanvasClient {
    async fn update_page(
        &self,
        course_id: &str,
        slug: &str,
        html: &str,
    ) -> std::result::Result<(), CanvasError> {
        CanvasClient::update_page(self, course_id, slug, html).await
    }

    async fn update_assignment(
        &self,
        course_id: &str,
        assignment_id: &str,
        html: &str,
    ) -> std::result::Result<(), CanvasError> {
        CanvasClient::update_assignment(self, course_id, assignment_id, html).await
    }

    async fn update_discussion(
        &self,
        course_id: &str,
        topic_id: &str,
        html: &str,
    ) -> std::result::Result<(), CanvasError> {
        CanvasClient::update_discussion(self, course_id, topic_id, html).await
    }
}

/// One item that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub title: String,
    pub message: String,
}

/// Outcome of one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteBackReport {
    /// Items that passed selection and were sent.
    pub attempted: usize,
    /// Titles written successfully, in registry order.
    pub succeeded: Vec<String>,
    /// Items whose update failed, in registry order.
    pub failures: Vec<WriteFailure>,
}

impl WriteBackReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sends approved rewrites through the matching update call.
pub struct WriteBackCoordinator;

impl WriteBackCoordinator {
    /// Items `commit` would send.
    pub fn select(items: &[ContentItem]) -> Vec<&ContentItem> {
        items
            .iter()
            .filter(|item| item.is_ready_to_commit())
            .collect()
    }

    /// Write every selected item.
    ///
    /// Returns `Err` only for a contract violation (a selected item missing
    /// the identifier its update needs), detected before any call is made.
    /// Remote failures are collected in the report.
    pub async fn commit(
        course_id: &str,
        items: &[ContentItem],
        writer: &dyn ContentWriter,
    ) -> Result<WriteBackReport> {
        let selected = Self::select(items);
        for item in &selected {
            check_identifiers(item)?;
        }

        info!(
            "Writing {} approved items back to course {course_id}",
            selected.len()
        );

        let mut report = WriteBackReport {
            attempted: selected.len(),
            ..WriteBackReport::default()
        };

        for item in selected {
            let html = item.rewritten_html();
            let result = match item.target() {
                ItemTarget::Page { slug, .. } => writer.update_page(course_id, slug, html).await,
                ItemTarget::Assignment { id } => {
                    writer.update_assignment(course_id, id, html).await
                }
                ItemTarget::Discussion { id } => {
                    writer.update_discussion(course_id, id, html).await
                }
            };

            match result {
                Ok(()) => report.succeeded.push(item.title().to_string()),
                Err(e) => {
                    warn!("Write-back failed for {}: {e}", item.label());
                    report.failures.push(WriteFailure {
                        title: item.title().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Write-back complete: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

fn check_identifiers(item: &ContentItem) -> Result<()> {
    let missing = match item.target() {
        ItemTarget::Page { slug, .. } => slug.trim().is_empty().then_some("slug"),
        ItemTarget::Assignment { id } | ItemTarget::Discussion { id } => {
            id.trim().is_empty().then_some("id")
        }
    };
    match missing {
        Some(field) => Err(SyncError::ContractViolation(format!(
            "{} has no {field} for its update call",
            item.label()
        ))),
        None => Ok(()),
    }
}
