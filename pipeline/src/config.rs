//! Tuning for a sync session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::prompt::DEFAULT_MAX_CORPUS_CHARS;

/// Tuning knobs for harvest, rewrite and the model corpus.
///
/// Connection settings (base URLs, tokens) are not here; they come from
/// the environment through `CanvasConfig` and `OpenAIConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records requested per listing page.
    pub per_page: u32,

    /// Detail fetches in flight per listing page.
    pub detail_concurrency: usize,

    /// Provider calls in flight during a rewrite batch.
    pub rewrite_concurrency: usize,

    /// Corpus characters embedded in each prompt.
    pub max_corpus_chars: usize,

    /// Per-kind cap when harvesting a model course.
    pub model_max_items: usize,

    /// Characters of corpus shown in previews.
    pub preview_chars: usize,

    /// Instructions used when none are given on the command line.
    pub instructions: Option<String>,

    /// Editing rules that open every prompt, replacing the built-in block.
    pub base_rules: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            detail_concurrency: 4,
            rewrite_concurrency: 1,
            max_corpus_chars: DEFAULT_MAX_CORPUS_CHARS,
            model_max_items: 10,
            preview_chars: 4000,
            instructions: None,
            base_rules: None,
        }
    }
}

impl PipelineConfig {
    /// Parse TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    /// Set the model course cap.
    pub fn with_model_max_items(mut self, n: usize) -> Self {
        self.model_max_items = n;
        self
    }
}
