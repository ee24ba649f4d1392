//! Okta credentials and org addressing
//!
//! Okta Management API calls authenticate with a static SSWS API token,
//! passed on the command line or via the OKTA_API_TOKEN environment variable.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no token flag is given
pub const TOKEN_ENV_VAR: &str = "OKTA_API_TOKEN";

/// An Okta SSWS API token.
///
/// Wrapped so the secret never ends up in Debug output or logs.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Resolve the token from a CLI flag, falling back to OKTA_API_TOKEN
    pub fn from_flag_or_env(flag: Option<&str>) -> Result<Self> {
        if let Some(token) = flag {
            return Ok(Self::new(token));
        }
        let token = std::env::var(TOKEN_ENV_VAR).with_context(|| {
            format!("No API token provided. Pass --api-token or set {TOKEN_ENV_VAR}")
        })?;
        Ok(Self::new(token))
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(****)")
    }
}

/// Okta cell suffix selector (mirrors the official org URL families)
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DomainFlag {
    #[default]
    Default,
    Emea,
    Preview,
    Gov,
    Mil,
    Fedramp,
}

impl DomainFlag {
    /// The DNS suffix for this cell
    pub fn suffix(self) -> &'static str {
        match self {
            DomainFlag::Default => "okta.com",
            DomainFlag::Emea => "okta-emea.com",
            DomainFlag::Preview => "oktapreview.com",
            DomainFlag::Gov => "okta-gov.com",
            DomainFlag::Mil => "okta.mil",
            DomainFlag::Fedramp => "oktafed.com",
        }
    }
}

/// Build the org base URL (no trailing slash) from a subdomain and cell
pub fn org_base_url(subdomain: &str, flag: DomainFlag) -> String {
    format!("https://{}.{}", subdomain, flag.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_url_uses_cell_suffix() {
        assert_eq!(
            org_base_url("example", DomainFlag::Default),
            "https://example.okta.com"
        );
        assert_eq!(
            org_base_url("example", DomainFlag::Emea),
            "https://example.okta-emea.com"
        );
        assert_eq!(
            org_base_url("example", DomainFlag::Preview),
            "https://example.oktapreview.com"
        );
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = ApiToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "ApiToken(****)");
    }
}
