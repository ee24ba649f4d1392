//! Property-based tests using proptest
//!
//! These verify the normalization and reference-resolution invariants over
//! randomized inputs: output charset, idempotence, uniqueness under
//! collision, and graceful literal fallback.

use proptest::prelude::*;

use oktf::resolve::{normalize, resolve, EndpointKind, NameTable, Namer, Reference};

/// Labels the way the directory produces them: printable junk included
fn arb_label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[ -~]{0,40}").expect("valid regex")
}

/// Okta-shaped opaque ids
fn arb_id() -> impl Strategy<Value = String> {
    proptest::string::string_regex("00[a-zA-Z0-9]{6,18}").expect("valid regex")
}

proptest! {
    /// Normalized names only ever contain [a-z0-9_] and never lead with a digit
    #[test]
    fn normalize_output_charset(label in arb_label()) {
        if let Some(name) = normalize(&label) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
        }
    }

    /// Normalizing an already-normalized name changes nothing
    #[test]
    fn normalize_is_idempotent(label in arb_label()) {
        if let Some(once) = normalize(&label) {
            prop_assert_eq!(normalize(&once), Some(once.clone()));
        }
    }

    /// Labels made only of alphanumerics and spaces survive recognizably
    #[test]
    fn normalize_keeps_word_content(words in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
        let label = words.join(" ");
        let name = normalize(&label).expect("words produce a name");
        prop_assert_eq!(name, words.join("_"));
    }

    /// Every id gets a distinct name no matter how labels collide
    #[test]
    fn namer_guarantees_uniqueness(
        ids in proptest::collection::hash_set(arb_id(), 1..20),
        label in arb_label(),
    ) {
        let mut namer = Namer::new();
        let names: Vec<String> = ids
            .iter()
            .map(|id| namer.assign(id, &label, "group"))
            .collect();

        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), names.len(), "names collided: {:?}", names);
    }

    /// Resolution never panics and is deterministic for any input
    #[test]
    fn resolve_is_total_and_idempotent(raw in "[ -~]{0,80}") {
        let mut table = NameTable::new();
        table.insert(EndpointKind::Group, "abc123", "admin_team");

        let first = resolve(&raw, &[EndpointKind::Group], &table);
        let second = resolve(&raw, &[EndpointKind::Group], &table);
        prop_assert_eq!(first, second);
    }

    /// Unknown ids always fall back to the literal raw value
    #[test]
    fn resolve_unknown_ids_stay_literal(id in arb_id()) {
        let table = NameTable::new();
        let raw = format!("https://org.example.com/api/v1/groups/{id}");
        let resolved = resolve(&raw, &[EndpointKind::Group], &table);
        prop_assert_eq!(resolved, Reference::Literal(raw.clone()));
    }

    /// Known ids always resolve away from the literal id
    #[test]
    fn resolve_known_ids_substitute(id in arb_id()) {
        let mut table = NameTable::new();
        let name = table.assign(EndpointKind::Group, &id, "Admin Team");
        let raw = format!("https://org.example.com/api/v1/groups/{id}");

        let resolved = resolve(&raw, &[EndpointKind::Group], &table);
        prop_assert_eq!(
            resolved,
            Reference::UrlAttr {
                kind: EndpointKind::Group,
                name,
                attr: "id",
                trailing: None,
            }
        );
    }
}
