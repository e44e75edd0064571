//! The in-memory table of content items for the active course.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::item::{ContentItem, ContentKind};

/// One harvested course: id, display name and items in harvest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSnapshot {
    course_id: String,
    course_name: Option<String>,
    items: Vec<ContentItem>,
}

impl CourseSnapshot {
    /// Build a snapshot. Duplicate `(kind, remote_id)` pairs keep the first
    /// occurrence; listings can repeat a record when it moves between pages
    /// mid-walk.
    pub fn new(
        course_id: impl Into<String>,
        course_name: Option<String>,
        items: Vec<ContentItem>,
    ) -> Self {
        let course_id = course_id.into();
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert((item.kind(), item.remote_id().to_string())) {
                unique.push(item);
            } else {
                warn!(
                    "Dropping duplicate {} {} in course {course_id}",
                    item.kind(),
                    item.remote_id()
                );
            }
        }
        Self {
            course_id,
            course_name,
            items: unique,
        }
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn course_name(&self) -> Option<&str> {
        self.course_name.as_deref()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }
}

/// Counts over the registry, for status lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub pages: usize,
    pub assignments: usize,
    pub discussions: usize,
    pub rewritten: usize,
    pub failed: usize,
    pub approved: usize,
}

impl RegistryStats {
    pub fn total(&self) -> usize {
        self.pages + self.assignments + self.discussions
    }
}

/// Owner of all [`ContentItem`]s for one course session.
///
/// Pipeline stages borrow the item slice from here; there are no copies, so a
/// mutation by one stage is what the next stage reads.
#[derive(Debug, Default)]
pub struct ContentItemRegistry {
    snapshot: Option<CourseSnapshot>,
}

impl ContentItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot wholesale. Returns the previous one.
    pub fn replace(&mut self, snapshot: CourseSnapshot) -> Option<CourseSnapshot> {
        info!(
            "Registry now holds {} items for course {}",
            snapshot.items.len(),
            snapshot.course_id
        );
        self.snapshot.replace(snapshot)
    }

    pub fn snapshot(&self) -> Option<&CourseSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn course_id(&self) -> Option<&str> {
        self.snapshot.as_ref().map(CourseSnapshot::course_id)
    }

    /// Items in harvest order; empty when nothing is loaded.
    pub fn items(&self) -> &[ContentItem] {
        match self.snapshot.as_ref() {
            Some(snapshot) => snapshot.items.as_slice(),
            None => &[],
        }
    }

    /// Mutable items in harvest order; empty when nothing is loaded.
    pub fn items_mut(&mut self) -> &mut [ContentItem] {
        match self.snapshot.as_mut() {
            Some(snapshot) => snapshot.items.as_mut_slice(),
            None => &mut [],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Look up an item by identity.
    pub fn find(&self, kind: ContentKind, remote_id: &str) -> Option<&ContentItem> {
        self.items()
            .iter()
            .find(|item| item.kind() == kind && item.remote_id() == remote_id)
    }

    /// Mutable lookup by identity.
    pub fn find_mut(&mut self, kind: ContentKind, remote_id: &str) -> Option<&mut ContentItem> {
        self.items_mut()
            .iter_mut()
            .find(|item| item.kind() == kind && item.remote_id() == remote_id)
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for item in self.items() {
            match item.kind() {
                ContentKind::Page => stats.pages += 1,
                ContentKind::Assignment => stats.assignments += 1,
                ContentKind::Discussion => stats.discussions += 1,
            }
            if item.has_rewrite() {
                stats.rewritten += 1;
            }
            if item.rewrite_error().is_some() {
                stats.failed += 1;
            }
            if item.is_approved() {
                stats.approved += 1;
            }
        }
        stats
    }
}
