//! Integration tests for the Okta fetch client using wiremock
//!
//! These verify pagination across both conventions (body cursor and Link
//! header), rate-limit retry timing, and the partial-result behavior on
//! upstream errors.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oktf::okta::auth::ApiToken;
use oktf::okta::client::OktaClient;
use oktf::okta::http::{HttpError, RetryPolicy};
use oktf::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};

const TOKEN: &str = "test-token";

fn client(server: &MockServer) -> OktaClient {
    client_with_retry(server, RetryPolicy::default())
}

fn client_with_retry(server: &MockServer, retry: RetryPolicy) -> OktaClient {
    OktaClient::with_retry(&server.uri(), ApiToken::new(TOKEN), retry)
        .expect("client should build")
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}

mod pagination_tests {
    use super::*;

    /// Body-cursor pagination returns all items in server order
    #[tokio::test]
    async fn test_body_cursor_pagination_preserves_order() {
        let server = MockServer::start().await;

        let next = format!("{}/api/v1/iam/roles?after=page2", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/v1/iam/roles"))
            .and(header("Authorization", format!("SSWS {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "roles": [{"id": "r1"}, {"id": "r2"}],
                "_links": {"next": {"href": next}}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/iam/roles"))
            .and(query_param("after", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "roles": [{"id": "r3"}]
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let collection = Collection::keyed(
            client.iam_roles_url(),
            "roles",
            PageStrategy::BodyNextLink,
        );
        let outcome = fetch_all(&client, &collection).await.expect("fetch");

        assert!(outcome.complete);
        assert!(outcome.warnings.is_empty());
        let ids: Vec<&str> = outcome
            .items
            .iter()
            .map(|item| item["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    /// Link-header pagination returns all items in server order
    #[tokio::test]
    async fn test_link_header_pagination_preserves_order() {
        let server = MockServer::start().await;

        let next = format!("{}/api/v1/groups?after=page2", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "link",
                        format!("<{next}>; rel=\"next\", <{next}>; rel=\"self\"").as_str(),
                    )
                    .set_body_json(json!([{"id": "g1"}, {"id": "g2"}])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .and(query_param("after", "page2"))
            .respond_with(
                ResponseTemplate::new(200)
                    // Last page advertises only itself
                    .insert_header(
                        "link",
                        format!("<{}/api/v1/groups>; rel=\"self\"", server.uri()).as_str(),
                    )
                    .set_body_json(json!([{"id": "g3"}, {"id": "g4"}])),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);
        let outcome = fetch_all(&client, &collection).await.expect("fetch");

        assert!(outcome.complete);
        let ids: Vec<&str> = outcome
            .items
            .iter()
            .map(|item| item["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["g1", "g2", "g3", "g4"]);
    }

    /// A single page with no next cursor terminates immediately
    #[tokio::test]
    async fn test_single_page_collection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "g1"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);
        let outcome = fetch_all(&client, &collection).await.expect("fetch");

        assert!(outcome.complete);
        assert_eq!(outcome.items.len(), 1);
    }
}

mod rate_limit_tests {
    use super::*;

    /// 429 with a reset timestamp waits until the window reopens, then the
    /// retry succeeds
    #[tokio::test]
    async fn test_429_with_reset_header_waits_and_retries() {
        let server = MockServer::start().await;

        let reset = unix_now() + 2;
        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-rate-limit-reset", reset.to_string().as_str()),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "g1"}])))
            .mount(&server)
            .await;

        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);

        let start = Instant::now();
        let outcome = fetch_all(&client, &collection).await.expect("fetch");
        let elapsed = start.elapsed();

        assert_eq!(outcome.items.len(), 1);
        assert!(outcome.complete);
        // The backoff floors at one second; it must not be dramatically more
        // than the two-second window either
        assert!(elapsed >= Duration::from_secs(1), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(10), "waited {elapsed:?}");
    }

    /// 429 without a reset header uses the policy's fallback backoff
    #[tokio::test]
    async fn test_429_without_header_uses_fallback_backoff() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        // 60s in production; injected short here so the test stays fast
        let fallback = Duration::from_millis(300);
        let client = client_with_retry(
            &server,
            RetryPolicy {
                max_attempts: 3,
                fallback_backoff: fallback,
            },
        );
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);

        let start = Instant::now();
        let outcome = fetch_all(&client, &collection).await.expect("fetch");
        let elapsed = start.elapsed();

        assert!(outcome.complete);
        assert!(elapsed >= fallback, "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "waited {elapsed:?}");
    }

    /// A persistent 429 exhausts the budget and degrades to a partial
    /// outcome, not an error
    #[tokio::test]
    async fn test_429_budget_exhaustion_degrades_to_partial() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_with_retry(
            &server,
            RetryPolicy {
                max_attempts: 2,
                fallback_backoff: Duration::from_millis(50),
            },
        );
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);
        let outcome = fetch_all(&client, &collection).await.expect("fetch");

        assert!(outcome.items.is_empty());
        assert!(!outcome.complete);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].status, 429);
    }

    /// The raw HTTP layer reports exhaustion as a typed error
    #[tokio::test]
    async fn test_http_layer_reports_exhaustion() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_with_retry(
            &server,
            RetryPolicy {
                max_attempts: 2,
                fallback_backoff: Duration::from_millis(50),
            },
        );
        let err = client
            .get(&client.groups_url())
            .await
            .expect_err("should exhaust");
        assert!(matches!(
            err,
            HttpError::RateLimitExhausted { attempts: 2, .. }
        ));
    }
}

mod error_policy_tests {
    use super::*;

    async fn three_page_server_failing_on_page2() -> MockServer {
        let server = MockServer::start().await;

        let page2 = format!("{}/api/v1/groups?after=page2", server.uri());
        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", format!("<{page2}>; rel=\"next\"").as_str())
                    .set_body_json(json!([{"id": "g1"}, {"id": "g2"}])),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .and(query_param("after", "page2"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "errorSummary": "Internal error"
            })))
            .mount(&server)
            .await;

        server
    }

    /// Page 1's items survive a 500 on page 2 under KeepPartial
    #[tokio::test]
    async fn test_keep_partial_returns_accumulated_items() {
        let server = three_page_server_failing_on_page2().await;
        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);

        let outcome = fetch_all(&client, &collection).await.expect("no hard error");

        assert_eq!(outcome.items.len(), 2);
        assert!(!outcome.complete);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].status, 500);
        assert!(outcome.warnings[0].url.contains("after=page2"));
    }

    /// The same scenario under Fail propagates the status
    #[tokio::test]
    async fn test_fail_policy_propagates_status() {
        let server = three_page_server_failing_on_page2().await;
        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader)
            .on_error(ErrorPolicy::Fail);

        let err = fetch_all(&client, &collection).await.expect_err("should fail");
        assert!(matches!(err, HttpError::Status { status: 500, .. }));
    }

    /// A failing first page yields zero items but still no hard error
    #[tokio::test]
    async fn test_first_page_failure_yields_empty_partial() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/groups"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client(&server);
        let collection = Collection::array(client.groups_url(), PageStrategy::LinkHeader);
        let outcome = fetch_all(&client, &collection).await.expect("no hard error");

        assert!(outcome.items.is_empty());
        assert!(!outcome.complete);
        assert_eq!(outcome.warnings[0].status, 403);
    }
}
