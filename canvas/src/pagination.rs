//! Cursor pagination over Canvas listing endpoints.
//!
//! Canvas returns the next listing page as a `Link` response header
//! (`<https://...&page=2>; rel="next"`). The collector follows it until the
//! header disappears or the soft item cap is reached, optionally replacing
//! every listing stub with its detail record.

use std::collections::HashSet;

use futures::{StreamExt, TryStreamExt};
use reqwest::Url;
use reqwest::header::LINK;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::CanvasClient;
use crate::error::{CanvasError, Result};

/// Extract the `rel="next"` target from a `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')?
            .strip_suffix('>')
            .map(str::to_string)
    })
}

/// Secondary per-record fetch used when the listing payload is incomplete.
///
/// `template` is a path (or absolute URL) containing [`DetailEndpoint::PLACEHOLDER`],
/// filled from field `key_field` of each listing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEndpoint {
    template: String,
    key_field: String,
}

impl DetailEndpoint {
    /// Placeholder substituted with the record key.
    pub const PLACEHOLDER: &'static str = "{key}";

    /// Create a detail endpoint.
    pub fn new(template: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            key_field: key_field.into(),
        }
    }

    /// Resolve the detail path for one listing record.
    pub fn path_for(&self, record: &Value) -> Result<String> {
        let key = match record.get(&self.key_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(CanvasError::MalformedRecord(format!(
                    "listing record has no `{}` field",
                    self.key_field
                )));
            }
        };
        Ok(self
            .template
            .replace(Self::PLACEHOLDER, &urlencoding::encode(&key)))
    }
}

/// Fetches complete collections from cursor-paginated listing endpoints.
///
/// Any non-2xx response aborts the walk and discards what was gathered, so
/// callers never see a partial collection.
pub struct PaginatedCollector<'a> {
    client: &'a CanvasClient,
}

impl<'a> PaginatedCollector<'a> {
    pub(crate) fn new(client: &'a CanvasClient) -> Self {
        Self { client }
    }

    /// Collect every record behind `listing`.
    ///
    /// `max_items` is applied after each listing page is merged; the last page
    /// is always fetched whole and the result sliced. Detail calls are only
    /// made for records that survive the cap. `Some(0)` means no cap.
    pub async fn collect(
        &self,
        listing: &str,
        detail: Option<&DetailEndpoint>,
        max_items: Option<usize>,
    ) -> Result<Vec<Value>> {
        let cap = max_items.filter(|&n| n > 0);
        let mut first = self.client.endpoint(listing)?;
        first
            .query_pairs_mut()
            .append_pair("per_page", &self.client.config().per_page.to_string());

        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(first);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            if !visited.insert(url.to_string()) {
                warn!("Cursor revisits {url}, stopping pagination");
                break;
            }

            let response = self.client.get(url).await?;
            let cursor = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link);
            let text = response.text().await?;
            let mut batch = match serde_json::from_str::<Value>(&text)? {
                Value::Array(items) => items,
                single => vec![single],
            };
            pages += 1;
            debug!("Listing page {pages} returned {} records", batch.len());

            // Stubs past the cap would be dropped below; skip their detail calls.
            if let (Some(cap), Some(_)) = (cap, detail) {
                batch.truncate(cap.saturating_sub(records.len()));
            }

            let batch = match detail {
                Some(endpoint) => self.enrich(batch, endpoint).await?,
                None => batch,
            };
            records.extend(batch);

            if let Some(cap) = cap {
                if records.len() >= cap {
                    records.truncate(cap);
                    break;
                }
            }

            next = cursor
                .map(|c| Url::parse(&c).map_err(|e| CanvasError::Url(format!("{c}: {e}"))))
                .transpose()?;
        }

        info!(
            "Collected {} records from {listing} over {pages} listing pages",
            records.len()
        );
        Ok(records)
    }

    /// Replace each stub with its detail record, keeping listing order.
    async fn enrich(&self, stubs: Vec<Value>, endpoint: &DetailEndpoint) -> Result<Vec<Value>> {
        let urls = stubs
            .iter()
            .map(|stub| {
                endpoint
                    .path_for(stub)
                    .and_then(|path| self.client.endpoint(&path))
            })
            .collect::<Result<Vec<_>>>()?;

        futures::stream::iter(urls)
            .map(|url| self.client.get_json(url))
            .buffered(self.client.config().detail_concurrency.max(1))
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvasConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CanvasClient {
        CanvasClient::new(CanvasConfig::new(server.uri(), "token")).unwrap()
    }

    fn next_header(server: &MockServer, listing: &str, page: u32) -> String {
        format!(
            "<{}{listing}?page={page}>; rel=\"next\", <{}{listing}?page=1>; rel=\"first\"",
            server.uri(),
            server.uri()
        )
    }

    #[test]
    fn test_next_link_parsing() {
        let header = "<https://c.test/x?page=1>; rel=\"current\",<https://c.test/x?page=2>; rel=\"next\",<https://c.test/x?page=9>; rel=\"last\"";
        assert_eq!(next_link(header), Some("https://c.test/x?page=2".to_string()));
        assert_eq!(next_link("<https://c.test/x?page=9>; rel=\"last\""), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_detail_path_requires_key() {
        let endpoint = DetailEndpoint::new("/api/v1/courses/1/pages/{key}", "url");
        assert_eq!(
            endpoint.path_for(&json!({"url": "week 1"})).unwrap(),
            "/api/v1/courses/1/pages/week%201"
        );
        assert!(matches!(
            endpoint.path_for(&json!({"title": "no slug"})),
            Err(CanvasError::MalformedRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_follows_cursor_and_concatenates_in_order() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/assignments";

        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("per_page", "100"))
            .and(header("authorization", "Bearer token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1}, {"id": 2}]))
                    .insert_header("link", next_header(&server, listing, 2).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 3}]))
                    .insert_header("link", next_header(&server, listing, 3).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 4}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client.collector().collect(listing, None, None).await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_no_cursor_returns_single_page() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/discussion_topics";

        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}, {"id": 8}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client.collector().collect(listing, None, None).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_soft_cap_slices_after_page_merge() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/assignments";

        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1}, {"id": 2}]))
                    .insert_header("link", next_header(&server, listing, 2).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 3}, {"id": 4}]))
                    .insert_header("link", next_header(&server, listing, 3).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
        // Never reached: the cap is satisfied once page 2 is merged.
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5}])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client
            .collector()
            .collect(listing, None, Some(3))
            .await
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_enrichment_replaces_stubs() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/pages";

        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page_id": 1, "url": "welcome", "title": "Welcome"},
                {"page_id": 2, "url": "week-1", "title": "Week 1"}
            ])))
            .mount(&server)
            .await;
        for (slug, id, body) in [("welcome", 1, "<p>hello</p>"), ("week-1", 2, "<p>week</p>")] {
            Mock::given(method("GET"))
                .and(path(format!("{listing}/{slug}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "page_id": id, "url": slug, "title": slug, "body": body
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        let detail = DetailEndpoint::new(format!("{listing}/{{key}}"), "url");
        let records = client
            .collector()
            .collect(listing, Some(&detail), None)
            .await
            .unwrap();

        let bodies: Vec<_> = records.iter().map(|r| r["body"].as_str().unwrap()).collect();
        assert_eq!(bodies, vec!["<p>hello</p>", "<p>week</p>"]);
    }

    #[tokio::test]
    async fn test_capped_collection_skips_detail_for_dropped_stubs() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/pages";
        let stubs: Vec<_> = (1..=5)
            .map(|i| json!({"page_id": i, "url": format!("p-{i}"), "title": format!("P{i}")}))
            .collect();

        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(stubs)))
            .expect(1)
            .mount(&server)
            .await;
        for i in 1..=5 {
            Mock::given(method("GET"))
                .and(path(format!("{listing}/p-{i}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "page_id": i, "url": format!("p-{i}"), "title": format!("P{i}"), "body": "<p/>"
                })))
                .expect(if i <= 2 { 1 } else { 0 })
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        let detail = DetailEndpoint::new(format!("{listing}/{{key}}"), "url");
        let records = client
            .collector()
            .collect(listing, Some(&detail), Some(2))
            .await
            .unwrap();

        let slugs: Vec<_> = records.iter().map(|r| r["url"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["p-1", "p-2"]);
    }

    #[tokio::test]
    async fn test_failed_detail_fetch_discards_collection() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/pages";

        Mock::given(method("GET"))
            .and(path(listing))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"page_id": 1, "url": "ok", "title": "Ok"},
                {"page_id": 2, "url": "gone", "title": "Gone"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{listing}/ok")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"page_id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{listing}/gone")))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let detail = DetailEndpoint::new(format!("{listing}/{{key}}"), "url");
        let err = client
            .collector()
            .collect(listing, Some(&detail), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_repeated_cursor_terminates() {
        let server = MockServer::start().await;
        let listing = "/api/v1/courses/1/assignments";

        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("per_page", "100"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 1}]))
                    .insert_header("link", next_header(&server, listing, 2).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(listing))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": 2}]))
                    .insert_header("link", next_header(&server, listing, 2).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let records = client.collector().collect(listing, None, None).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
