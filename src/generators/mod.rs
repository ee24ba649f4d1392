//! Terraform generators, one per Okta object family
//!
//! Every generator follows the same shape: materialize collections through
//! [`crate::okta::pagination::fetch_all`], allocate symbolic names, resolve
//! cross-references, and emit a [`crate::tf::Document`] of resource, data
//! and import blocks. Upstream trouble degrades to warnings plus partial
//! output; only transport failures abort a run.
//!
//! - [`roles`] - custom admin roles, their permissions, and resource sets
//! - [`groups`] - directory groups, optionally filtered by name prefix
//! - [`group_rules`] - group membership rules
//! - [`policies`] - password / sign-on / MFA-enrollment policies and rules
//! - [`brands`] - brands, themes and custom domains across environments
//! - [`moved`] - offline `moved` blocks pairing preview and prod groups

pub mod brands;
pub mod group_rules;
pub mod groups;
pub mod moved;
pub mod policies;
pub mod roles;

use serde_json::Value;

/// Walk a JSON payload along a key path
pub(crate) fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// String at a key path
pub(crate) fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    get_path(value, path)?.as_str()
}

/// Bool at a key path, with a single default per call site
pub(crate) fn bool_at(value: &Value, path: &[&str], default: bool) -> bool {
    get_path(value, path)
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

/// Integer at a key path
pub(crate) fn i64_at(value: &Value, path: &[&str]) -> Option<i64> {
    get_path(value, path)?.as_i64()
}

/// List of strings at a key path; missing or mistyped becomes empty
pub(crate) fn str_list_at(value: &Value, path: &[&str]) -> Vec<String> {
    get_path(value, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
