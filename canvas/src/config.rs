//! Connection settings for the Canvas client.

use std::time::Duration;

use crate::error::{CanvasError, Result};

/// Environment variable holding the Canvas instance URL.
pub const CANVAS_BASE_URL: &str = "CANVAS_BASE_URL";

/// Environment variable holding the Canvas API token.
pub const CANVAS_API_TOKEN: &str = "CANVAS_API_TOKEN";

/// Configuration for [`CanvasClient`](crate::CanvasClient).
#[derive(Clone)]
pub struct CanvasConfig {
    /// Instance URL without trailing slash, e.g. `https://school.instructure.com`.
    pub base_url: String,

    /// Bearer token sent on every request.
    pub api_token: String,

    /// `per_page` sent on the first request of every listing.
    pub per_page: u32,

    /// Maximum number of detail fetches in flight.
    pub detail_concurrency: usize,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl CanvasConfig {
    /// Create a configuration with default tuning.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            per_page: 100,
            detail_concurrency: 4,
            timeout: Duration::from_secs(30),
        }
    }

    /// Read `CANVAS_BASE_URL` and `CANVAS_API_TOKEN` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(CanvasError::MissingSetting(key))
        };
        let base_url = get(CANVAS_BASE_URL)?;
        let api_token = get(CANVAS_API_TOKEN)?;
        Ok(Self::new(base_url, api_token))
    }

    /// Set the listing page size.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Set the detail-fetch pool size.
    pub fn with_detail_concurrency(mut self, concurrency: usize) -> Self {
        self.detail_concurrency = concurrency.max(1);
        self
    }
}

impl std::fmt::Debug for CanvasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("per_page", &self.per_page)
            .field("detail_concurrency", &self.detail_concurrency)
            .field("timeout", &self.timeout)
            .finish()
    }
}
