//! Name and reference resolution
//!
//! Turns opaque Okta object ids into stable, collision-free symbolic names
//! for generated blocks, and rewrites foreign-key-shaped values (ids and
//! resource URLs embedded in API payloads) into references to other
//! generated blocks wherever the target is part of the same run.
//!
//! - [`names`] - label normalization and the per-run [`names::NameTable`]
//! - [`refs`] - the [`refs::Reference`] value and [`refs::resolve`]

pub mod names;
pub mod refs;

pub use names::{normalize, EndpointKind, NameTable, Namer};
pub use refs::{resolve, Reference};
