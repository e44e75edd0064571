//! Reference corpus used to steer rewrites.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coursesync_canvas::CanvasClient;

use crate::error::Result;
use crate::item::ContentKind;

/// Where a corpus came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CorpusSource {
    /// Text supplied directly by the operator.
    Pasted,
    /// Contents of an uploaded file.
    Uploaded { file_name: String },
    /// Built from another Canvas course.
    HarvestedCourse { course_id: String },
}

/// Reference text plus provenance. Opaque to everything but the prompt
/// compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCorpus {
    text: String,
    source: CorpusSource,
}

impl ModelCorpus {
    pub fn new(text: impl Into<String>, source: CorpusSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &CorpusSource {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First `max_chars` characters, for display.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((cut, _)) => &self.text[..cut],
            None => &self.text,
        }
    }
}

/// Builds a [`ModelCorpus`] from one of its three sources.
pub struct ModelContextBuilder;

impl ModelContextBuilder {
    /// Use literal text.
    pub fn from_text(text: impl Into<String>) -> ModelCorpus {
        ModelCorpus::new(text, CorpusSource::Pasted)
    }

    /// Use uploaded bytes. Invalid UTF-8 is replaced rather than rejected.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> ModelCorpus {
        ModelCorpus::new(
            String::from_utf8_lossy(bytes).into_owned(),
            CorpusSource::Uploaded {
                file_name: file_name.into(),
            },
        )
    }

    /// Read an uploaded file from disk.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<ModelCorpus> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Loaded {} bytes of model context from {file_name}", bytes.len());
        Ok(Self::from_bytes(file_name, &bytes))
    }

    /// Harvest pages, assignments and discussions of a model course, each
    /// bounded by `max_items`, into labeled blocks.
    pub async fn from_harvest(
        client: &CanvasClient,
        course_id: &str,
        max_items: usize,
    ) -> Result<ModelCorpus> {
        let cap = Some(max_items);
        let pages = client.list_pages(course_id, cap).await?;
        let assignments = client.list_assignments(course_id, cap).await?;
        let discussions = client.list_discussions(course_id, cap).await?;

        let blocks: Vec<String> = pages
            .iter()
            .map(|p| labeled_block(ContentKind::Page, &p.title, &p.body))
            .chain(
                assignments
                    .iter()
                    .map(|a| labeled_block(ContentKind::Assignment, &a.name, &a.description)),
            )
            .chain(
                discussions
                    .iter()
                    .map(|d| labeled_block(ContentKind::Discussion, &d.title, &d.message)),
            )
            .collect();

        info!(
            "Built model context from course {course_id}: {} pages, {} assignments, {} discussions",
            pages.len(),
            assignments.len(),
            discussions.len()
        );

        Ok(ModelCorpus::new(
            blocks.join("\n\n"),
            CorpusSource::HarvestedCourse {
                course_id: course_id.to_string(),
            },
        ))
    }
}

fn labeled_block(kind: ContentKind, title: &str, body: &str) -> String {
    format!("[{kind}] {title}\n{body}")
}
