//! # Course sync pipeline
//!
//! Harvests the content of a Canvas course, rewrites each item through a
//! [`TransformProvider`](coursesync_transform::TransformProvider), tracks
//! operator approval, and writes approved rewrites back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            SyncSession                               │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  CanvasClient ──► ContentItemRegistry ◄── ModelContextBuilder        │
//! │                          │                                            │
//! │                          ▼                                            │
//! │        PromptCompiler + RewriteOrchestrator  (mutates items)          │
//! │                          │                                            │
//! │                          ▼                                            │
//! │              ApprovalStateMachine  (mutates items)                    │
//! │                          │                                            │
//! │                          ▼                                            │
//! │              WriteBackCoordinator  (reads items)                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Batch-level failures are [`SyncError`]s. Per-item failures during rewrite
//! and write-back are reported as values and never stop the batch.

pub mod approval;
pub mod config;
pub mod corpus;
pub mod error;
pub mod item;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod write_back;

pub use approval::ApprovalStateMachine;
pub use config::PipelineConfig;
pub use corpus::{CorpusSource, ModelContextBuilder, ModelCorpus};
pub use error::{Result, SyncError};
pub use item::{ContentItem, ContentKind, ItemTarget};
pub use orchestrator::{RewriteOrchestrator, RewriteOutcome, RewriteProgress, RewriteReport};
pub use prompt::{
    DEFAULT_BASE_RULES, DEFAULT_INSTRUCTIONS, DEFAULT_MAX_CORPUS_CHARS, PromptCompiler,
    TRUNCATION_MARKER,
};
pub use registry::{ContentItemRegistry, CourseSnapshot, RegistryStats};
pub use session::SyncSession;
pub use write_back::{ContentWriter, WriteBackCoordinator, WriteBackReport, WriteFailure};
