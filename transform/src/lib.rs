//! # Transform
//!
//! Content transformation providers for the course sync pipeline.
//!
//! The pipeline compiles one self-contained prompt per content item and hands
//! it to a [`TransformProvider`]; the provider returns the rewritten HTML.

pub mod config;
pub mod error;
pub mod provider;

pub use config::{OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_MODEL, OpenAIConfig};
pub use error::{Result, TransformError};
pub use provider::{OpenAIProvider, TransformProvider};
