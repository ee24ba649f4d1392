//! Okta Client
//!
//! Main client for the Okta Management API, combining the org address, the
//! API token, and the HTTP layer.

use super::auth::ApiToken;
use super::http::{ApiResponse, HttpError, OktaHttpClient, RetryPolicy};
use anyhow::Result;

/// Main Okta client
#[derive(Clone)]
pub struct OktaClient {
    pub http: OktaHttpClient,
    /// Org base URL without a trailing slash, e.g. `https://example.okta.com`
    pub org_url: String,
    token: ApiToken,
}

impl OktaClient {
    /// Create a new Okta client with the default retry policy
    pub fn new(org_url: &str, token: ApiToken) -> Result<Self> {
        Ok(Self {
            http: OktaHttpClient::new()?,
            org_url: org_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client with an explicit retry policy (used by tests to keep
    /// backoffs short)
    pub fn with_retry(org_url: &str, token: ApiToken, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: OktaHttpClient::with_retry(retry)?,
            org_url: org_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Make an authenticated GET request to an absolute URL
    pub async fn get(&self, url: &str) -> Result<ApiResponse, HttpError> {
        self.http.get(url, self.token.secret()).await
    }

    /// Build a Management API URL under `/api/v1/`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.org_url, path)
    }

    // =========================================================================
    // IAM API helpers
    // =========================================================================

    /// Custom admin roles collection
    pub fn iam_roles_url(&self) -> String {
        self.api_url("iam/roles")
    }

    /// Resource sets collection
    pub fn resource_sets_url(&self) -> String {
        self.api_url("iam/resource-sets")
    }

    /// Resources bound to one resource set
    pub fn resource_set_resources_url(&self, resource_set_id: &str) -> String {
        self.api_url(&format!("iam/resource-sets/{resource_set_id}/resources"))
    }

    // =========================================================================
    // Directory API helpers
    // =========================================================================

    /// Groups collection
    pub fn groups_url(&self) -> String {
        self.api_url("groups")
    }

    /// Groups collection filtered by a search expression
    pub fn groups_search_url(&self, expression: &str) -> String {
        format!(
            "{}?search={}",
            self.groups_url(),
            urlencoding::encode(expression)
        )
    }

    /// Group rules collection
    pub fn group_rules_url(&self) -> String {
        self.api_url("groups/rules")
    }

    // =========================================================================
    // Policy API helpers
    // =========================================================================

    /// Policies of one type (`PASSWORD`, `OKTA_SIGN_ON`, `MFA_ENROLL`, ...)
    pub fn policies_url(&self, policy_type: &str) -> String {
        format!("{}?type={}", self.api_url("policies"), policy_type)
    }

    /// Rules of one policy
    pub fn policy_rules_url(&self, policy_id: &str) -> String {
        self.api_url(&format!("policies/{policy_id}/rules"))
    }

    // =========================================================================
    // Customization API helpers
    // =========================================================================

    /// Brands collection
    pub fn brands_url(&self) -> String {
        self.api_url("brands")
    }

    /// Custom domains collection
    pub fn domains_url(&self) -> String {
        self.api_url("domains")
    }

    /// One application instance
    pub fn app_url(&self, app_id: &str) -> String {
        self.api_url(&format!("apps/{app_id}"))
    }

    /// Org metadata endpoint (pipeline detection for OIE vs Classic)
    pub fn well_known_org_url(&self) -> String {
        format!("{}/.well-known/okta-organization", self.org_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OktaClient {
        OktaClient::new("https://example.okta.com/", ApiToken::new("t")).unwrap()
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(client().org_url, "https://example.okta.com");
    }

    #[test]
    fn url_builders() {
        let c = client();
        assert_eq!(
            c.iam_roles_url(),
            "https://example.okta.com/api/v1/iam/roles"
        );
        assert_eq!(
            c.resource_set_resources_url("rs1"),
            "https://example.okta.com/api/v1/iam/resource-sets/rs1/resources"
        );
        assert_eq!(
            c.policies_url("PASSWORD"),
            "https://example.okta.com/api/v1/policies?type=PASSWORD"
        );
    }

    #[test]
    fn search_expression_is_encoded() {
        let url = client().groups_search_url("profile.name sw \"okta_admin_\"");
        assert!(url.starts_with("https://example.okta.com/api/v1/groups?search="));
        assert!(!url.contains(' '));
        assert!(!url.contains('"'));
    }
}
