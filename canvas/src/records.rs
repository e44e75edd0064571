//! Typed views over the raw JSON records Canvas returns.
//!
//! The collector hands back `serde_json::Value`s; these types pick out the
//! fields the sync pipeline uses and ignore the rest.

use serde::{Deserialize, Deserializer, Serialize};

/// Canvas ids arrive as numbers on most endpoints and as strings on a few.
/// Both are kept as opaque strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Number(n) => n.to_string(),
        Repr::Text(s) => s,
    })
}

/// `null` and missing HTML bodies both become the empty string.
fn deserialize_html<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /api/v1/courses/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub course_code: Option<String>,
}

/// A wiki page as returned by the per-page detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub page_id: String,

    /// URL-safe page name used by the page endpoints.
    pub url: String,

    pub title: String,

    #[serde(default, deserialize_with = "deserialize_html")]
    pub body: String,
}

/// An assignment; the listing payload already carries the description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    pub name: String,

    #[serde(default, deserialize_with = "deserialize_html")]
    pub description: String,
}

/// A discussion topic; the listing payload already carries the message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscussionRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    pub title: String,

    #[serde(default, deserialize_with = "deserialize_html")]
    pub message: String,
}
