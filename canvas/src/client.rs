//! Canvas REST client.
//!
//! Read paths go through the [`PaginatedCollector`]; write paths are one `PUT`
//! per content kind.

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::CanvasConfig;
use crate::error::{CanvasError, Result};
use crate::pagination::{DetailEndpoint, PaginatedCollector};
use crate::records::{AssignmentRecord, Course, DiscussionRecord, PageRecord};

/// Longest upstream error body kept in [`CanvasError::Upstream`].
const MAX_ERROR_BODY: usize = 512;

/// Client for one Canvas instance.
pub struct CanvasClient {
    config: CanvasConfig,
    http: reqwest::Client,
}

impl CanvasClient {
    /// Create a client from explicit configuration.
    pub fn new(config: CanvasConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Create a client from `CANVAS_BASE_URL` / `CANVAS_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(CanvasConfig::from_env()?)
    }

    /// Get the active configuration.
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Get a collector bound to this client.
    pub fn collector(&self) -> PaginatedCollector<'_> {
        PaginatedCollector::new(self)
    }

    /// Look up a course. Used to validate a course id before harvesting.
    pub async fn get_course(&self, course_id: &str) -> Result<Course> {
        let url = self.endpoint(&course_path(course_id, ""))?;
        let value = self.get_json(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// List every page with its body. Issues one detail call per page because
    /// the listing payload omits `body`.
    pub async fn list_pages(
        &self,
        course_id: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<PageRecord>> {
        let listing = course_path(course_id, "/pages");
        let detail = DetailEndpoint::new(format!("{listing}/{}", DetailEndpoint::PLACEHOLDER), "url");
        let raw = self
            .collector()
            .collect(&listing, Some(&detail), max_items)
            .await?;
        decode_all(raw)
    }

    /// List every assignment.
    pub async fn list_assignments(
        &self,
        course_id: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<AssignmentRecord>> {
        let raw = self
            .collector()
            .collect(&course_path(course_id, "/assignments"), None, max_items)
            .await?;
        decode_all(raw)
    }

    /// List every discussion topic.
    pub async fn list_discussions(
        &self,
        course_id: &str,
        max_items: Option<usize>,
    ) -> Result<Vec<DiscussionRecord>> {
        let raw = self
            .collector()
            .collect(&course_path(course_id, "/discussion_topics"), None, max_items)
            .await?;
        decode_all(raw)
    }

    /// Replace a page body.
    pub async fn update_page(&self, course_id: &str, slug: &str, html: &str) -> Result<()> {
        let path = course_path(course_id, &format!("/pages/{}", urlencoding::encode(slug)));
        self.put(&path, json!({"wiki_page": {"body": html}})).await
    }

    /// Replace an assignment description.
    pub async fn update_assignment(
        &self,
        course_id: &str,
        assignment_id: &str,
        html: &str,
    ) -> Result<()> {
        let path = course_path(
            course_id,
            &format!("/assignments/{}", urlencoding::encode(assignment_id)),
        );
        self.put(&path, json!({"assignment": {"description": html}}))
            .await
    }

    /// Replace a discussion topic message.
    pub async fn update_discussion(
        &self,
        course_id: &str,
        topic_id: &str,
        html: &str,
    ) -> Result<()> {
        let path = course_path(
            course_id,
            &format!("/discussion_topics/{}", urlencoding::encode(topic_id)),
        );
        self.put(&path, json!({"message": html})).await
    }

    /// Resolve a path against the base URL. Absolute URLs pass through.
    pub(crate) fn endpoint(&self, path_or_url: &str) -> Result<Url> {
        let raw = if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{path_or_url}", self.config.base_url)
        };
        Url::parse(&raw).map_err(|e| CanvasError::Url(format!("{raw}: {e}")))
    }

    pub(crate) async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?;
        ensure_success(response).await
    }

    pub(crate) async fn get_json(&self, url: Url) -> Result<Value> {
        let text = self.get(url).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn put(&self, path: &str, body: Value) -> Result<()> {
        let url = self.endpoint(path)?;
        debug!("PUT {url}");
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        info!("Updated {}", response.url().path());
        Ok(())
    }
}

fn course_path(course_id: &str, suffix: &str) -> String {
    format!("/api/v1/courses/{}{suffix}", urlencoding::encode(course_id))
}

fn decode_all<T: DeserializeOwned>(raw: Vec<Value>) -> Result<Vec<T>> {
    raw.into_iter()
        .map(|value| serde_json::from_value(value).map_err(CanvasError::from))
        .collect()
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(CanvasError::Upstream {
        status: status.as_u16(),
        url,
        body,
    })
}
