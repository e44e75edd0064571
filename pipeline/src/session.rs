//! Session driver tying the pipeline stages together.

use tracing::info;

use coursesync_canvas::CanvasClient;
use coursesync_transform::TransformProvider;

use crate::approval::ApprovalStateMachine;
use crate::config::PipelineConfig;
use crate::corpus::{ModelContextBuilder, ModelCorpus};
use crate::error::{Result, SyncError};
use crate::item::{ContentItem, ContentKind};
use crate::orchestrator::{RewriteOrchestrator, RewriteProgress, RewriteReport};
use crate::prompt::PromptCompiler;
use crate::registry::{ContentItemRegistry, CourseSnapshot, RegistryStats};
use crate::write_back::{ContentWriter, WriteBackCoordinator, WriteBackReport};

/// One operator's pipeline state: the active course, the model corpus and
/// the tuning in effect.
///
/// Every stage takes `&mut self`, so stages cannot overlap.
pub struct SyncSession {
    /// Tuning.
    config: PipelineConfig,

    /// Items of the active course.
    registry: ContentItemRegistry,

    /// Reference corpus for prompts.
    corpus: Option<ModelCorpus>,

    /// Rewrite driver built from `config`.
    orchestrator: RewriteOrchestrator,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl SyncSession {
    /// Create an empty session.
    pub fn new(config: PipelineConfig) -> Self {
        let mut compiler = PromptCompiler::new().with_max_corpus_chars(config.max_corpus_chars);
        if let Some(rules) = &config.base_rules {
            compiler = compiler.with_base_rules(rules.as_str());
        }
        let orchestrator =
            RewriteOrchestrator::new(compiler).with_concurrency(config.rewrite_concurrency);
        Self {
            config,
            registry: ContentItemRegistry::new(),
            corpus: None,
            orchestrator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ContentItemRegistry {
        &self.registry
    }

    /// Items of the active course, in harvest order.
    pub fn items(&self) -> &[ContentItem] {
        self.registry.items()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Load a course into the registry.
    ///
    /// The course is looked up first, then pages, assignments and
    /// discussions are collected in that order. Any failure leaves the
    /// previous snapshot in place.
    pub async fn harvest(&mut self, client: &CanvasClient, course_id: &str) -> Result<&CourseSnapshot> {
        let course_id = course_id.trim();
        if course_id.is_empty() {
            return Err(SyncError::Configuration("course id is empty".to_string()));
        }

        info!("Harvesting course {course_id}");
        let course = client.get_course(course_id).await?;
        let pages = client.list_pages(course_id, None).await?;
        let assignments = client.list_assignments(course_id, None).await?;
        let discussions = client.list_discussions(course_id, None).await?;

        let items: Vec<ContentItem> = pages
            .into_iter()
            .map(ContentItem::from)
            .chain(assignments.into_iter().map(ContentItem::from))
            .chain(discussions.into_iter().map(ContentItem::from))
            .collect();

        self.registry
            .replace(CourseSnapshot::new(course_id, course.name, items));
        self.registry.snapshot().ok_or(SyncError::NoCourseLoaded)
    }

    pub fn corpus(&self) -> Option<&ModelCorpus> {
        self.corpus.as_ref()
    }

    /// Corpus text cut to `preview_chars`.
    pub fn corpus_preview(&self) -> Option<&str> {
        self.corpus
            .as_ref()
            .map(|corpus| corpus.preview(self.config.preview_chars))
    }

    /// Replace the corpus. Returns the previous one.
    pub fn set_corpus(&mut self, corpus: ModelCorpus) -> Option<ModelCorpus> {
        info!(
            "Model context set from {:?} ({} chars)",
            corpus.source(),
            corpus.text().chars().count()
        );
        self.corpus.replace(corpus)
    }

    /// Harvest a model course into the corpus, capped at `model_max_items`
    /// per kind.
    pub async fn load_model_course(
        &mut self,
        client: &CanvasClient,
        course_id: &str,
    ) -> Result<&ModelCorpus> {
        let corpus =
            ModelContextBuilder::from_harvest(client, course_id, self.config.model_max_items)
                .await?;
        self.set_corpus(corpus);
        self.corpus.as_ref().ok_or(SyncError::NoCourseLoaded)
    }

    /// Rewrite every item of the active course.
    ///
    /// Blank `instructions` fall back to the configured instructions, then
    /// to the built-in default.
    pub async fn rewrite_all<F>(
        &mut self,
        provider: &dyn TransformProvider,
        instructions: &str,
        on_progress: F,
    ) -> Result<RewriteReport>
    where
        F: FnMut(RewriteProgress),
    {
        if self.registry.snapshot().is_none() {
            return Err(SyncError::NoCourseLoaded);
        }

        let instructions = if instructions.trim().is_empty() {
            self.config.instructions.as_deref().unwrap_or_default()
        } else {
            instructions
        };
        let corpus = self.corpus.as_ref().map(ModelCorpus::text).unwrap_or_default();

        let report = self
            .orchestrator
            .run_all(
                self.registry.items_mut(),
                corpus,
                instructions,
                provider,
                on_progress,
            )
            .await;
        Ok(report)
    }

    /// Approve every item with proposed HTML.
    pub fn approve_all_rewritten(&mut self) -> usize {
        ApprovalStateMachine::approve_all_rewritten(self.registry.items_mut())
    }

    /// Unapprove every item.
    pub fn clear_approvals(&mut self) -> usize {
        ApprovalStateMachine::clear_all(self.registry.items_mut())
    }

    /// Set one item's approval.
    pub fn set_approval(&mut self, kind: ContentKind, remote_id: &str, value: bool) -> Result<()> {
        if self.registry.snapshot().is_none() {
            return Err(SyncError::NoCourseLoaded);
        }
        let item = self.registry.find_mut(kind, remote_id).ok_or_else(|| {
            SyncError::ContractViolation(format!("no {kind} with id {remote_id} in this course"))
        })?;
        ApprovalStateMachine::toggle(item, value);
        Ok(())
    }

    /// Write approved rewrites to the active course.
    pub async fn commit(&self, writer: &dyn ContentWriter) -> Result<WriteBackReport> {
        let snapshot = self.registry.snapshot().ok_or(SyncError::NoCourseLoaded)?;
        WriteBackCoordinator::commit(snapshot.course_id(), snapshot.items(), writer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursesync_transform::Result as TransformResult;
    use pretty_assertions::assert_eq;

    struct EchoProvider;

    #[async_trait::async_trait]
    impl TransformProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn transform(&self, payload: &str) -> TransformResult<String> {
            Ok(payload.to_string())
        }
    }

    fn loaded_session(config: PipelineConfig) -> SyncSession {
        let mut session = SyncSession::new(config);
        session.registry.replace(CourseSnapshot::new(
            "5",
            Some("Biology".to_string()),
            vec![
                ContentItem::page("1", "home", "Home", "<p>h</p>"),
                ContentItem::assignment("2", "Lab", "<p>l</p>"),
            ],
        ));
        session
    }

    #[tokio::test]
    async fn test_stages_need_a_course() {
        let mut session = SyncSession::default();

        let err = session.rewrite_all(&EchoProvider, "", |_| {}).await.unwrap_err();
        assert!(matches!(err, SyncError::NoCourseLoaded));
        assert!(matches!(
            session.set_approval(ContentKind::Page, "1", true),
            Err(SyncError::NoCourseLoaded)
        ));
    }

    #[tokio::test]
    async fn test_rewrite_uses_corpus_and_configured_instructions() {
        let config = PipelineConfig {
            instructions: Some("Add alt text".to_string()),
            ..PipelineConfig::default()
        };
        let mut session = loaded_session(config);
        session.set_corpus(ModelContextBuilder::from_text("MODEL-STYLE"));

        let report = session.rewrite_all(&EchoProvider, "  ", |_| {}).await.unwrap();

        assert_eq!(report.rewritten(), 2);
        let payload = session.items()[0].rewritten_html();
        assert!(payload.contains("MODEL-STYLE"));
        assert!(payload.contains("### Global instructions from the user\nAdd alt text\n"));
    }

    #[tokio::test]
    async fn test_configured_base_rules_reach_payload() {
        let config = PipelineConfig {
            base_rules: Some("House rules: keep headings flat.".to_string()),
            ..PipelineConfig::default()
        };
        let mut session = loaded_session(config);

        session.rewrite_all(&EchoProvider, "", |_| {}).await.unwrap();

        let payload = session.items()[0].rewritten_html();
        assert!(payload.starts_with("House rules: keep headings flat.\n\n"));
        assert!(!payload.contains("DesignPLUS"));
    }

    #[tokio::test]
    async fn test_approve_then_toggle_one() {
        let mut session = loaded_session(PipelineConfig::default());
        session.rewrite_all(&EchoProvider, "", |_| {}).await.unwrap();

        assert_eq!(session.approve_all_rewritten(), 2);
        session.set_approval(ContentKind::Assignment, "2", false).unwrap();
        assert_eq!(session.stats().approved, 1);

        assert!(matches!(
            session.set_approval(ContentKind::Discussion, "2", true),
            Err(SyncError::ContractViolation(_))
        ));
        assert_eq!(session.clear_approvals(), 1);
    }

    #[test]
    fn test_corpus_preview_uses_config() {
        let config = PipelineConfig {
            preview_chars: 5,
            ..PipelineConfig::default()
        };
        let mut session = SyncSession::new(config);
        assert_eq!(session.corpus_preview(), None);

        session.set_corpus(ModelContextBuilder::from_text("<h1>Model</h1>"));
        assert_eq!(session.config().preview_chars, 5);
        assert_eq!(session.corpus().map(ModelCorpus::text), Some("<h1>Model</h1>"));
        assert_eq!(session.corpus_preview(), Some("<h1>M"));
    }
}
