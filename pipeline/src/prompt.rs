//! Prompt compilation.
//!
//! `compile` is pure: the same item, corpus and instructions always produce
//! the same payload. The corpus is capped before it is spliced in, so the
//! payload size is bounded by the cap plus the item itself.

use crate::item::ContentItem;

/// Default ceiling on corpus characters embedded in a prompt.
pub const DEFAULT_MAX_CORPUS_CHARS: usize = 12_000;

/// Appended to a corpus that was cut at the ceiling.
pub const TRUNCATION_MARKER: &str = "\n\n[Model context truncated for length.]";

/// Used when the operator leaves the instructions blank.
pub const DEFAULT_INSTRUCTIONS: &str =
    "If no additional instructions, just clean up structure and align with the model course style.";

/// Editing rules that open every prompt.
pub const DEFAULT_BASE_RULES: &str = "\
You are an expert Canvas HTML editor. Preserve links and anchors/IDs.

Requirements:
- Preserve semantics and learning intent of the original.
- Follow the policy. Return only HTML, no explanations.
- Reformat the HTML using DesignPLUS styling.
- Do not change the written content of the page, only the design.
- Use Colorado State University branding colors.
- Use the DesignPLUS theme from the model provided.
- Place all iframes within DesignPLUS accordions.
- The focus is on styling, structure, and accessibility, not on changing the content.";

/// Renders transformation payloads.
#[derive(Debug, Clone)]
pub struct PromptCompiler {
    max_corpus_chars: usize,
    base_rules: String,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptCompiler {
    /// Create a compiler with the default rules and a 12,000 character corpus cap.
    pub fn new() -> Self {
        Self {
            max_corpus_chars: DEFAULT_MAX_CORPUS_CHARS,
            base_rules: DEFAULT_BASE_RULES.to_string(),
        }
    }

    /// Set the corpus ceiling.
    pub fn with_max_corpus_chars(mut self, max: usize) -> Self {
        self.max_corpus_chars = max;
        self
    }

    /// Replace the opening rules block.
    pub fn with_base_rules(mut self, rules: impl Into<String>) -> Self {
        self.base_rules = rules.into();
        self
    }

    /// Trim and cap a corpus, marking the cut.
    pub fn bound_corpus(&self, corpus: &str) -> String {
        let corpus = corpus.trim();
        match corpus.char_indices().nth(self.max_corpus_chars) {
            Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &corpus[..cut]),
            None => corpus.to_string(),
        }
    }

    /// Render the payload for one item.
    pub fn compile(&self, item: &ContentItem, corpus: &str, instructions: &str) -> String {
        let corpus = self.bound_corpus(corpus);
        let instructions = if instructions.trim().is_empty() {
            DEFAULT_INSTRUCTIONS
        } else {
            instructions
        };

        format!(
            "{rules}\n\n\
             ### Global instructions from the user\n{instructions}\n\n\
             ### Model course/style examples\n{corpus}\n\n\
             ### Target item metadata\n\
             - Type: {kind}\n\
             - Title: {title}\n\n\
             ### Original HTML\n{html}\n\n\
             ### Output\n\
             Rewrite the HTML above according to the global instructions and style of the model course.\n\
             Return ONLY the rewritten HTML.",
            rules = self.base_rules.trim(),
            kind = item.kind(),
            title = item.title(),
            html = item.original_html(),
        )
    }
}
