//! Symbolic names for generated blocks
//!
//! Terraform addresses are `[a-z0-9_]` identifiers, while Okta labels are
//! free-form. Normalization is deterministic; uniqueness within a run is
//! guaranteed by suffixing on collision rather than hoping labels differ.

use std::collections::{HashMap, HashSet};

/// Object kinds that can be the target of a URL-shaped reference
/// (`/api/v1/<segment>/<id>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Group,
    User,
    App,
}

impl EndpointKind {
    /// Path segment used by the API
    pub fn segment(self) -> &'static str {
        match self {
            EndpointKind::Group => "groups",
            EndpointKind::User => "users",
            EndpointKind::App => "apps",
        }
    }

    /// Terraform type emitted for this kind (same name for resource and data
    /// source in the Okta provider)
    pub fn tf_type(self) -> &'static str {
        match self {
            EndpointKind::Group => "okta_group",
            EndpointKind::User => "okta_user",
            EndpointKind::App => "okta_app",
        }
    }

    /// Match an API path segment back to a kind
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "groups" => Some(EndpointKind::Group),
            "users" => Some(EndpointKind::User),
            "apps" => Some(EndpointKind::App),
            _ => None,
        }
    }
}

/// Normalize a human label into a Terraform-safe identifier.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9_]` into a
/// single underscore, trims leading/trailing underscores, and prefixes an
/// underscore when the result would start with a digit. Returns `None` for
/// labels with no usable characters so the caller can fall back to an
/// id-derived placeholder.
pub fn normalize(label: &str) -> Option<String> {
    let mut out = String::with_capacity(label.len());
    let mut pending_gap = false;

    for c in label.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            if pending_gap && !out.is_empty() {
                out.push('_');
            }
            pending_gap = false;
            out.push(c);
        } else {
            pending_gap = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        Some(format!("_{trimmed}"))
    } else {
        Some(trimmed.to_string())
    }
}

/// Allocates unique names within one collection of generated blocks.
///
/// Names come from the item's label; items without a usable label get
/// `{fallback_prefix}_{id}`. A label collision gets a `_2`, `_3`, ... suffix,
/// deterministically in insertion order.
#[derive(Debug, Default)]
pub struct Namer {
    by_id: HashMap<String, String>,
    used: HashSet<String>,
}

impl Namer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `id`, allocating from `label` on first sight
    pub fn assign(&mut self, id: &str, label: &str, fallback_prefix: &str) -> String {
        if let Some(existing) = self.by_id.get(id) {
            return existing.clone();
        }

        let base = normalize(label).unwrap_or_else(|| {
            let id_part = normalize(id).unwrap_or_else(|| "unnamed".to_string());
            format!("{}_{}", fallback_prefix, id_part.trim_start_matches('_'))
        });

        let name = self.dedup(base);
        self.used.insert(name.clone());
        self.by_id.insert(id.to_string(), name.clone());
        name
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    fn dedup(&self, base: String) -> String {
        if !self.used.contains(&base) {
            return base;
        }
        let mut n = 2u32;
        loop {
            let candidate = format!("{base}_{n}");
            if !self.used.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// id -> symbolic name lookup across the kinds that can be referenced by URL,
/// built incrementally as collections are fetched
#[derive(Debug, Default)]
pub struct NameTable {
    tables: HashMap<EndpointKind, Namer>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and return its allocated name
    pub fn assign(&mut self, kind: EndpointKind, id: &str, label: &str) -> String {
        let prefix = match kind {
            EndpointKind::Group => "group",
            EndpointKind::User => "user",
            EndpointKind::App => "app",
        };
        self.tables.entry(kind).or_default().assign(id, label, prefix)
    }

    /// Register an object under a pre-allocated name (used when a generator
    /// has already named the block through its own [`Namer`])
    pub fn insert(&mut self, kind: EndpointKind, id: &str, name: &str) {
        let namer = self.tables.entry(kind).or_default();
        namer.used.insert(name.to_string());
        namer.by_id.insert(id.to_string(), name.to_string());
    }

    pub fn get(&self, kind: EndpointKind, id: &str) -> Option<&str> {
        self.tables.get(&kind)?.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  Admin Team!! ").as_deref(), Some("admin_team"));
        assert_eq!(normalize("Okta (SF) / Admins").as_deref(), Some("okta_sf_admins"));
        assert_eq!(normalize("already_fine").as_deref(), Some("already_fine"));
    }

    #[test]
    fn normalize_guards_leading_digit() {
        assert_eq!(normalize("2FA Admins").as_deref(), Some("_2fa_admins"));
    }

    #[test]
    fn normalize_rejects_empty_labels() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("!!!"), None);
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn namer_suffixes_on_collision() {
        let mut namer = Namer::new();
        assert_eq!(namer.assign("id1", "Admin Team", "group"), "admin_team");
        assert_eq!(namer.assign("id2", "Admin Team", "group"), "admin_team_2");
        assert_eq!(namer.assign("id3", "admin team", "group"), "admin_team_3");
        // Re-assigning an id returns the name already allocated
        assert_eq!(namer.assign("id1", "Admin Team", "group"), "admin_team");
    }

    #[test]
    fn namer_falls_back_to_id() {
        let mut namer = Namer::new();
        assert_eq!(namer.assign("00g1AbC", "!!!", "group"), "group_00g1abc");
    }

    #[test]
    fn name_table_is_per_kind() {
        let mut table = NameTable::new();
        table.assign(EndpointKind::Group, "abc", "Admins");
        table.assign(EndpointKind::App, "abc", "Admins");
        assert_eq!(table.get(EndpointKind::Group, "abc"), Some("admins"));
        assert_eq!(table.get(EndpointKind::App, "abc"), Some("admins"));
        assert_eq!(table.get(EndpointKind::User, "abc"), None);
    }
}
