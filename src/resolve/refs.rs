//! Cross-resource reference resolution
//!
//! Okta payloads embed foreign keys as opaque ids or as full resource URLs
//! (`https://org.okta.com/api/v1/groups/00g.../users`). When the target of
//! such a value is itself being generated in the same run, the emitted
//! configuration should point at the generated block instead of carrying a
//! brittle literal id. Resolution never fails: anything unrecognized simply
//! stays a literal.

use url::Url;

use super::names::{EndpointKind, NameTable};

/// A resolved pointer, ready to be rendered by the Terraform layer.
///
/// Quote escaping for literal-ish variants happens at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Emit the raw value as a quoted literal
    Literal(String),
    /// `data.<type>.<name>.<attr>` lookup of an object not owned by this run
    Data {
        kind: EndpointKind,
        name: String,
        attr: &'static str,
    },
    /// `<type>.<name>.<attr>` bare attribute of a generated block
    Attr {
        kind: EndpointKind,
        name: String,
        attr: &'static str,
    },
    /// An org-relative resource URL whose id segment is replaced by an
    /// attribute interpolation; `trailing` keeps any extra path verbatim
    UrlAttr {
        kind: EndpointKind,
        name: String,
        attr: &'static str,
        trailing: Option<String>,
    },
    /// An org-relative URL kept verbatim apart from the host (collection
    /// roots and filter queries)
    OrgUrl { suffix: String },
}

impl Reference {
    pub fn data(kind: EndpointKind, name: impl Into<String>) -> Self {
        Reference::Data {
            kind,
            name: name.into(),
            attr: "id",
        }
    }

    pub fn attr(kind: EndpointKind, name: impl Into<String>) -> Self {
        Reference::Attr {
            kind,
            name: name.into(),
            attr: "id",
        }
    }
}

/// Resolve one foreign-key-shaped value against the objects known to this run.
///
/// In order:
/// 1. `.../api/v1/<kind>/<id>[/trailing]` with the kind known and the id in
///    the table becomes an attribute reference, trailing path preserved.
/// 2. A bare collection root (`.../api/v1/<kind>`) becomes a symbolic
///    org-URL reference.
/// 3. A URL carrying a query string keeps its path and query but swaps the
///    host for the symbolic org URL.
/// 4. Everything else stays a literal.
pub fn resolve(raw: &str, known: &[EndpointKind], table: &NameTable) -> Reference {
    let Ok(url) = Url::parse(raw) else {
        return Reference::Literal(raw.to_string());
    };
    if url.host_str().is_none() {
        return Reference::Literal(raw.to_string());
    }

    if url.query().is_some() {
        let mut suffix = url.path().to_string();
        if let Some(query) = url.query() {
            suffix.push('?');
            suffix.push_str(query);
        }
        return Reference::OrgUrl { suffix };
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    // Only /api/v1/... paths have a recognized shape
    if segments.len() < 3 || segments[0] != "api" || segments[1] != "v1" {
        return Reference::Literal(raw.to_string());
    }

    let Some(kind) = EndpointKind::from_segment(segments[2]) else {
        return Reference::Literal(raw.to_string());
    };
    if !known.contains(&kind) {
        return Reference::Literal(raw.to_string());
    }

    match segments.len() {
        // Bare collection root
        3 => Reference::OrgUrl {
            suffix: format!("/api/v1/{}", kind.segment()),
        },
        _ => {
            let id = segments[3];
            match table.get(kind, id) {
                Some(name) => {
                    let trailing = if segments.len() > 4 {
                        Some(segments[4..].join("/"))
                    } else {
                        None
                    };
                    Reference::UrlAttr {
                        kind,
                        name: name.to_string(),
                        attr: "id",
                        trailing,
                    }
                }
                None => Reference::Literal(raw.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_group() -> NameTable {
        let mut table = NameTable::new();
        table.insert(EndpointKind::Group, "abc123", "admin_team");
        table
    }

    #[test]
    fn known_group_url_becomes_attr_ref() {
        let table = table_with_group();
        let resolved = resolve(
            "https://org.example.com/api/v1/groups/abc123",
            &[EndpointKind::Group],
            &table,
        );
        assert_eq!(
            resolved,
            Reference::UrlAttr {
                kind: EndpointKind::Group,
                name: "admin_team".to_string(),
                attr: "id",
                trailing: None,
            }
        );
    }

    #[test]
    fn trailing_path_is_preserved() {
        let table = table_with_group();
        let resolved = resolve(
            "https://org.example.com/api/v1/groups/abc123/users",
            &[EndpointKind::Group],
            &table,
        );
        assert_eq!(
            resolved,
            Reference::UrlAttr {
                kind: EndpointKind::Group,
                name: "admin_team".to_string(),
                attr: "id",
                trailing: Some("users".to_string()),
            }
        );
    }

    #[test]
    fn unknown_id_stays_literal() {
        let table = table_with_group();
        let raw = "https://org.example.com/api/v1/groups/unknown999";
        assert_eq!(
            resolve(raw, &[EndpointKind::Group], &table),
            Reference::Literal(raw.to_string())
        );
    }

    #[test]
    fn unknown_kind_stays_literal() {
        let table = table_with_group();
        let raw = "https://org.example.com/api/v1/groups/abc123";
        // Groups not in the known set for this call site
        assert_eq!(
            resolve(raw, &[EndpointKind::App], &table),
            Reference::Literal(raw.to_string())
        );
    }

    #[test]
    fn collection_root_becomes_org_url() {
        let table = table_with_group();
        assert_eq!(
            resolve(
                "https://org.example.com/api/v1/groups",
                &[EndpointKind::Group],
                &table,
            ),
            Reference::OrgUrl {
                suffix: "/api/v1/groups".to_string()
            }
        );
    }

    #[test]
    fn query_keeps_path_and_query() {
        let table = table_with_group();
        assert_eq!(
            resolve(
                "https://org.example.com/api/v1/users?filter=status eq \"ACTIVE\"",
                &[EndpointKind::User],
                &table,
            ),
            Reference::OrgUrl {
                suffix: "/api/v1/users?filter=status%20eq%20%22ACTIVE%22".to_string()
            }
        );
    }

    #[test]
    fn non_url_stays_literal() {
        let table = table_with_group();
        assert_eq!(
            resolve("00gabc123", &[EndpointKind::Group], &table),
            Reference::Literal("00gabc123".to_string())
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let table = table_with_group();
        let raw = "https://org.example.com/api/v1/groups/abc123/users";
        let first = resolve(raw, &[EndpointKind::Group], &table);
        let second = resolve(raw, &[EndpointKind::Group], &table);
        assert_eq!(first, second);
    }
}
