//! Okta API interaction module
//!
//! This module provides the core functionality for talking to the Okta
//! Management API: credentials, the HTTP client with rate-limit retry, and
//! cursor-based pagination over collection endpoints.
//!
//! # Module Structure
//!
//! - [`auth`] - API token handling and org URL construction
//! - [`client`] - Main Okta client with per-endpoint URL builders
//! - [`http`] - HTTP wrapper: SSWS auth, 429 retry, error classification
//! - [`pagination`] - Walks paged collections (body cursor or `Link` header)
//!
//! # Example
//!
//! ```ignore
//! use crate::okta::client::OktaClient;
//! use crate::okta::pagination::{fetch_all, Collection, PageStrategy};
//!
//! async fn example(client: &OktaClient) -> anyhow::Result<()> {
//!     let collection = Collection::keyed(client.iam_roles_url(), "roles", PageStrategy::BodyNextLink);
//!     let outcome = fetch_all(client, &collection).await?;
//!     println!("{} roles", outcome.items.len());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod pagination;
