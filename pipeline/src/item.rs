//! Content items under management.

use std::fmt;

use serde::{Deserialize, Serialize};

use coursesync_canvas::{AssignmentRecord, DiscussionRecord, PageRecord};

/// Kind of Canvas content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Wiki page.
    Page,
    /// Assignment description.
    Assignment,
    /// Discussion topic message.
    Discussion,
}

impl ContentKind {
    /// Lowercase label used in prompts, corpora and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Assignment => "assignment",
            Self::Discussion => "discussion",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Remote identity of an item, carrying exactly the identifiers its update
/// call needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemTarget {
    /// Pages are updated by slug; `page_id` is kept as the opaque identity.
    Page { page_id: String, slug: String },
    /// Assignments are updated by id.
    Assignment { id: String },
    /// Discussion topics are updated by id.
    Discussion { id: String },
}

impl ItemTarget {
    /// Kind of the target.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Page { .. } => ContentKind::Page,
            Self::Assignment { .. } => ContentKind::Assignment,
            Self::Discussion { .. } => ContentKind::Discussion,
        }
    }

    /// Opaque remote identifier, unique per (course, kind).
    pub fn remote_id(&self) -> &str {
        match self {
            Self::Page { page_id, .. } => page_id,
            Self::Assignment { id } | Self::Discussion { id } => id,
        }
    }
}

/// One remote content object and its local rewrite/approval state.
///
/// `original_html` is fixed at harvest time. `rewritten_html` and
/// `rewrite_error` change only through the rewrite orchestrator and
/// `approved` only through [`ApprovalStateMachine`](crate::ApprovalStateMachine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    target: ItemTarget,
    title: String,
    original_html: String,
    pub(crate) rewritten_html: String,
    pub(crate) rewrite_error: Option<String>,
    pub(crate) approved: bool,
}

impl ContentItem {
    /// Create an unrewritten, unapproved item.
    pub fn new(target: ItemTarget, title: impl Into<String>, original_html: impl Into<String>) -> Self {
        Self {
            target,
            title: title.into(),
            original_html: original_html.into(),
            rewritten_html: String::new(),
            rewrite_error: None,
            approved: false,
        }
    }

    /// Create a page item.
    pub fn page(
        page_id: impl Into<String>,
        slug: impl Into<String>,
        title: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self::new(
            ItemTarget::Page {
                page_id: page_id.into(),
                slug: slug.into(),
            },
            title,
            html,
        )
    }

    /// Create an assignment item.
    pub fn assignment(id: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(ItemTarget::Assignment { id: id.into() }, title, html)
    }

    /// Create a discussion item.
    pub fn discussion(id: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(ItemTarget::Discussion { id: id.into() }, title, html)
    }

    pub fn target(&self) -> &ItemTarget {
        &self.target
    }

    pub fn kind(&self) -> ContentKind {
        self.target.kind()
    }

    pub fn remote_id(&self) -> &str {
        self.target.remote_id()
    }

    /// Page slug; `None` for other kinds.
    pub fn slug(&self) -> Option<&str> {
        match &self.target {
            ItemTarget::Page { slug, .. } => Some(slug),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn original_html(&self) -> &str {
        &self.original_html
    }

    pub fn rewritten_html(&self) -> &str {
        &self.rewritten_html
    }

    pub fn rewrite_error(&self) -> Option<&str> {
        self.rewrite_error.as_deref()
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    /// Whether a non-empty rewrite is available.
    pub fn has_rewrite(&self) -> bool {
        !self.rewritten_html.is_empty()
    }

    /// Whether write-back would send this item.
    pub fn is_ready_to_commit(&self) -> bool {
        self.approved && self.has_rewrite()
    }

    /// `[kind] title`, as shown in reports.
    pub fn label(&self) -> String {
        format!("[{}] {}", self.kind(), self.title)
    }
}

impl From<PageRecord> for ContentItem {
    fn from(record: PageRecord) -> Self {
        Self::page(record.page_id, record.url, record.title, record.body)
    }
}

impl From<AssignmentRecord> for ContentItem {
    fn from(record: AssignmentRecord) -> Self {
        Self::assignment(record.id, record.name, record.description)
    }
}

impl From<DiscussionRecord> for ContentItem {
    fn from(record: DiscussionRecord) -> Self {
        Self::discussion(record.id, record.title, record.message)
    }
}
