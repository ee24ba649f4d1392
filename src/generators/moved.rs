//! `moved` blocks pairing preview and prod groups
//!
//! Offline: scans an existing generated file for environment-suffixed
//! `okta_group` resources, pairs preview and prod entries that share the
//! same `name` attribute, and emits `moved { from/to }` blocks so state can
//! follow a preview-to-prod rename without destroy/create churn.

use std::collections::HashMap;

use regex::Regex;

use crate::tf::{Block, Document};

/// One scanned group resource
struct ScannedGroup {
    resource: String,
    line: usize,
}

pub fn generate(content: &str) -> Document {
    // Capture the full resource name, its environment, and the block body
    let block_re = Regex::new(
        r#"(?s)resource\s+"okta_group"\s+"(group_(preview|prod)_[^"]+)"\s*\{(.*?)\n\}"#,
    )
    .expect("static regex");
    let name_re = Regex::new(r#"name\s*=\s*"([^"]+)""#).expect("static regex");

    // Preview entries keep document order so output is deterministic
    let mut preview: Vec<(String, ScannedGroup)> = Vec::new();
    let mut prod: HashMap<String, ScannedGroup> = HashMap::new();

    for captures in block_re.captures_iter(content) {
        let resource = captures[1].to_string();
        let env = &captures[2];
        let body = &captures[3];
        let line = content[..captures.get(0).expect("match").start()]
            .matches('\n')
            .count()
            + 1;

        let Some(name) = name_re.captures(body).map(|c| c[1].trim().to_string()) else {
            tracing::debug!("Resource {} has no name attribute, skipping", resource);
            continue;
        };

        let scanned = ScannedGroup { resource, line };
        match env {
            "preview" => preview.push((name, scanned)),
            _ => {
                prod.insert(name, scanned);
            }
        }
    }

    let mut doc = Document::new();
    for (name, from) in &preview {
        let Some(to) = prod.get(name) else {
            continue;
        };
        doc.push(
            Block::moved(
                format!("okta_group.{}", from.resource),
                format!("okta_group.{}", to.resource),
            )
            .comment(format!("Preview line {}, prod line {}", from.line, to.line)),
        );
    }

    tracing::info!(
        "Paired {} of {} preview group(s) with prod counterparts",
        doc.blocks.len(),
        preview.len()
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tf::{hcl, OutputFormat};

    const INPUT: &str = r#"
resource "okta_group" "group_preview_00gaaa" {
  count = var.CONFIG == "preview" ? 1 : 0
  name        = "Engineering"
  description = "eng"
}

resource "okta_group" "group_prod_00gbbb" {
  count = var.CONFIG == "prod" ? 1 : 0
  name        = "Engineering"
  description = "eng"
}

resource "okta_group" "group_preview_00gccc" {
  count = var.CONFIG == "preview" ? 1 : 0
  name        = "Preview Only"
}
"#;

    #[test]
    fn pairs_groups_by_name_attribute() {
        let doc = generate(INPUT);
        assert_eq!(doc.blocks.len(), 1);
        let rendered = hcl::render(&doc);
        assert!(rendered.contains("from = okta_group.group_preview_00gaaa"));
        assert!(rendered.contains("to   = okta_group.group_prod_00gbbb"));
    }

    #[test]
    fn unmatched_groups_emit_nothing() {
        let doc = generate("resource \"okta_group\" \"group_preview_x\" {\n  name = \"Solo\"\n}\n");
        assert!(doc.is_empty());
        assert_eq!(doc.render(OutputFormat::Hcl), "");
    }

    #[test]
    fn line_numbers_land_in_comments() {
        let doc = generate(INPUT);
        let rendered = hcl::render(&doc);
        assert!(rendered.contains("# Preview line 2, prod line 8"));
    }
}
