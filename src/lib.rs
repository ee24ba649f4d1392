//! oktf - generate Terraform configuration and import blocks from a live
//! Okta org
//!
//! The crate is a thin pipeline: [`okta`] fetches collections (pagination,
//! rate-limit retry), [`resolve`] turns ids into symbolic names and
//! references, [`generators`] map API payloads onto the [`tf`] intermediate
//! representation, and the renderers in [`tf`] print HCL or Terraform JSON.

pub mod config;
pub mod generators;
pub mod okta;
pub mod resolve;
pub mod tf;
