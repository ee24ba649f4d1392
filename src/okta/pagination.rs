//! Cursor-based pagination over Okta collection endpoints
//!
//! The Management API uses two pagination conventions: IAM endpoints embed a
//! `_links.next.href` cursor in the response body, while the core directory
//! endpoints advertise the next page in a `Link: <url>; rel="next"` response
//! header. Which convention applies is a property of the endpoint and is
//! declared per call site, never sniffed at runtime.

use serde_json::Value;

use super::client::OktaClient;
use super::http::HttpError;

/// How the next page is advertised for a given endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// `_links.next.href` cursor embedded in the response body (IAM endpoints)
    BodyNextLink,
    /// `Link: <url>; rel="next"` response header (directory endpoints)
    LinkHeader,
}

/// What to do when a page answers with a non-200, non-429 status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record a warning and return whatever was accumulated so far
    #[default]
    KeepPartial,
    /// Propagate the status as an error for the whole collection
    Fail,
}

/// A paged collection endpoint and how to walk it
#[derive(Debug, Clone)]
pub struct Collection {
    pub start_url: String,
    /// Key holding the items when the body is an object (`"roles"`,
    /// `"resource-sets"`, ...); `None` when the body is a bare JSON array
    pub items_key: Option<&'static str>,
    pub strategy: PageStrategy,
    pub on_error: ErrorPolicy,
}

impl Collection {
    /// A collection whose pages are bare JSON arrays
    pub fn array(start_url: impl Into<String>, strategy: PageStrategy) -> Self {
        Self {
            start_url: start_url.into(),
            items_key: None,
            strategy,
            on_error: ErrorPolicy::default(),
        }
    }

    /// A collection whose pages are objects with the items under `key`
    pub fn keyed(
        start_url: impl Into<String>,
        key: &'static str,
        strategy: PageStrategy,
    ) -> Self {
        Self {
            start_url: start_url.into(),
            items_key: Some(key),
            strategy,
            on_error: ErrorPolicy::default(),
        }
    }

    pub fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }
}

/// A page that could not be fetched; carried alongside the partial result
#[derive(Debug, Clone)]
pub struct FetchWarning {
    pub url: String,
    pub status: u16,
}

impl std::fmt::Display for FetchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} at {}", self.status, self.url)
    }
}

/// Everything one fetch loop produced
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Items in server order across all pages
    pub items: Vec<Value>,
    pub warnings: Vec<FetchWarning>,
    /// False when the loop stopped before exhausting the collection
    pub complete: bool,
}

/// Fetch every page of a collection.
///
/// Follows only the server-supplied next cursor, so no item is fetched twice
/// and server order is preserved. Rate-limit exhaustion and, under
/// [`ErrorPolicy::KeepPartial`], upstream errors end the loop with whatever
/// was accumulated; transport errors propagate as hard failures.
pub async fn fetch_all(
    client: &OktaClient,
    collection: &Collection,
) -> Result<FetchOutcome, HttpError> {
    let mut outcome = FetchOutcome {
        complete: true,
        ..Default::default()
    };
    let mut next_url = Some(collection.start_url.clone());

    while let Some(url) = next_url {
        tracing::info!("Fetching {}", url);

        let response = match client.get(&url).await {
            Ok(response) => response,
            Err(HttpError::RateLimitExhausted { url, attempts }) => {
                tracing::warn!(
                    "Giving up on {} after {} rate-limited attempts, keeping {} items",
                    url,
                    attempts,
                    outcome.items.len()
                );
                outcome.warnings.push(FetchWarning { url, status: 429 });
                outcome.complete = false;
                break;
            }
            Err(HttpError::Status { url, status }) => match collection.on_error {
                ErrorPolicy::KeepPartial => {
                    tracing::warn!(
                        "Upstream error {} at {}, keeping {} items fetched so far",
                        status,
                        url,
                        outcome.items.len()
                    );
                    outcome.warnings.push(FetchWarning { url, status });
                    outcome.complete = false;
                    break;
                }
                ErrorPolicy::Fail => return Err(HttpError::Status { url, status }),
            },
            // Transport and decode failures are hard stops
            Err(err) => return Err(err),
        };

        next_url = match collection.strategy {
            PageStrategy::BodyNextLink => body_next_link(&response.body),
            PageStrategy::LinkHeader => response.link.as_deref().and_then(parse_link_header),
        };

        outcome.items.extend(extract_items(&response.body, collection.items_key));
    }

    Ok(outcome)
}

/// Pull the items out of one page body
fn extract_items(body: &Value, key: Option<&str>) -> Vec<Value> {
    let items = match key {
        None => body.as_array(),
        Some(key) => body.get(key).and_then(Value::as_array),
    };
    items.cloned().unwrap_or_default()
}

/// `_links.next.href` cursor from a response body
fn body_next_link(body: &Value) -> Option<String> {
    body.get("_links")?
        .get("next")?
        .get("href")?
        .as_str()
        .map(str::to_string)
}

/// URL of the `rel="next"` entry in a `Link` header
pub fn parse_link_header(header: &str) -> Option<String> {
    for part in header.split(',') {
        let sections: Vec<&str> = part.split(';').collect();
        if sections.len() < 2 {
            continue;
        }
        if sections[1..].iter().any(|s| s.trim() == "rel=\"next\"") {
            let url = sections[0].trim();
            if url.starts_with('<') && url.ends_with('>') {
                return Some(url[1..url.len() - 1].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_header_next_is_extracted() {
        let header = "<https://example.okta.com/api/v1/groups?after=a1>; rel=\"self\", \
                      <https://example.okta.com/api/v1/groups?after=b2>; rel=\"next\"";
        assert_eq!(
            parse_link_header(header).as_deref(),
            Some("https://example.okta.com/api/v1/groups?after=b2")
        );
    }

    #[test]
    fn link_header_without_next_is_none() {
        let header = "<https://example.okta.com/api/v1/groups>; rel=\"self\"";
        assert_eq!(parse_link_header(header), None);
    }

    #[test]
    fn malformed_link_header_is_none() {
        assert_eq!(parse_link_header("not a link header"), None);
        assert_eq!(parse_link_header(""), None);
    }

    #[test]
    fn body_cursor_is_extracted() {
        let body = json!({
            "roles": [],
            "_links": { "next": { "href": "https://example.okta.com/api/v1/iam/roles?after=x" } }
        });
        assert_eq!(
            body_next_link(&body).as_deref(),
            Some("https://example.okta.com/api/v1/iam/roles?after=x")
        );
        assert_eq!(body_next_link(&json!({ "roles": [] })), None);
    }

    #[test]
    fn items_from_array_and_keyed_bodies() {
        let array = json!([{"id": "a"}, {"id": "b"}]);
        assert_eq!(extract_items(&array, None).len(), 2);

        let keyed = json!({"roles": [{"id": "a"}]});
        assert_eq!(extract_items(&keyed, Some("roles")).len(), 1);

        // Wrong shape degrades to empty, not a panic
        assert!(extract_items(&array, Some("roles")).is_empty());
        assert!(extract_items(&keyed, None).is_empty());
    }
}
