//! # Canvas client
//!
//! REST access to a Canvas LMS course for the course sync pipeline.
//!
//! ## Features
//!
//! - **Cursor pagination**: follows `Link: rel="next"` headers to the end of a listing
//! - **Detail enrichment**: optional per-record fetch for listings that omit bodies
//! - **Typed records**: pages, assignments and discussion topics
//! - **Write paths**: one `PUT` per content kind
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Canvas Client                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  CanvasConfig ──► CanvasClient ──► PaginatedCollector           │
//! │                        │                  │                     │
//! │                        ▼                  ▼                     │
//! │               update_page/...      DetailEndpoint               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod records;

pub use client::CanvasClient;
pub use config::{CANVAS_API_TOKEN, CANVAS_BASE_URL, CanvasConfig};
pub use error::{CanvasError, Result};
pub use pagination::{DetailEndpoint, PaginatedCollector, next_link};
pub use records::{AssignmentRecord, Course, DiscussionRecord, PageRecord};
