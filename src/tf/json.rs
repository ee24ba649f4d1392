//! Terraform JSON-syntax renderer
//!
//! Produces the `{"resource": {...}, "data": {...}, "import": [...]}`
//! document shape. Expressions become `"${...}"` template strings, except in
//! `import`/`moved` blocks where `to`/`from` are plain resource addresses.

use serde_json::{Map, Value};

use super::ir::{Block, Document, TfValue};

/// Render a whole document as pretty-printed Terraform JSON
pub fn render(doc: &Document) -> String {
    let mut root = Map::new();
    let mut comments: Vec<Value> = Vec::new();

    if let Some(header) = &doc.header {
        comments.push(Value::String(header.clone()));
    }
    if !comments.is_empty() {
        root.insert("//".to_string(), Value::Array(comments));
    }

    for block in &doc.blocks {
        match block.kind {
            "import" | "moved" => {
                let entry = block_body(block, true);
                root.entry(block.kind.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()))
                    .as_array_mut()
                    .expect("block list")
                    .push(entry);
            }
            _ => {
                // resource/data/variable: nest under kind -> type -> name
                let body = block_body(block, false);
                let slot = root
                    .entry(block.kind.to_string())
                    .or_insert_with(|| Value::Object(Map::new()))
                    .as_object_mut()
                    .expect("block map");

                match block.labels.len() {
                    2 => {
                        slot.entry(block.labels[0].clone())
                            .or_insert_with(|| Value::Object(Map::new()))
                            .as_object_mut()
                            .expect("type map")
                            .insert(block.labels[1].clone(), body);
                    }
                    1 => {
                        slot.insert(block.labels[0].clone(), body);
                    }
                    _ => {
                        slot.insert(block.kind.to_string(), body);
                    }
                }
            }
        }
    }

    let mut text = serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_default();
    text.push('\n');
    text
}

fn block_body(block: &Block, address_attrs: bool) -> Value {
    let mut body = Map::new();

    for (key, value) in &block.attrs {
        let is_address = address_attrs && (key == "to" || key == "from");
        body.insert(key.clone(), value_to_json(value, is_address));
    }

    for nested in &block.blocks {
        body.insert(nested.kind.to_string(), block_body(nested, false));
    }

    Value::Object(body)
}

fn value_to_json(value: &TfValue, as_address: bool) -> Value {
    match value {
        TfValue::Null => Value::Null,
        TfValue::Bool(b) => Value::Bool(*b),
        TfValue::Num(n) => Value::Number(n.clone()),
        TfValue::Str(s) | TfValue::Template(s) => Value::String(s.clone()),
        TfValue::Expr(e) => {
            if as_address {
                Value::String(e.clone())
            } else {
                Value::String(format!("${{{e}}}"))
            }
        }
        TfValue::List(items) => {
            Value::Array(items.iter().map(|i| value_to_json(i, false)).collect())
        }
        TfValue::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v, false)))
                .collect(),
        ),
        // jsonencode(x) at plan time produces exactly the serialized JSON of x
        TfValue::Call("jsonencode", arg) => {
            let inner = value_to_json(arg, false);
            Value::String(serde_json::to_string(&inner).unwrap_or_default())
        }
        TfValue::Call(func, arg) => {
            let inner = value_to_json(arg, false);
            Value::String(format!(
                "${{{}({})}}",
                func,
                serde_json::to_string(&inner).unwrap_or_default()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tf::ir::{Block, Document};

    #[test]
    fn resources_nest_under_type_and_name() {
        let mut doc = Document::new();
        doc.push(
            Block::resource("okta_group", "admins")
                .attr("name", TfValue::str("Admins"))
                .attr("description", TfValue::Null),
        );
        let rendered = render(&doc);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["resource"]["okta_group"]["admins"]["name"], "Admins");
        assert!(parsed["resource"]["okta_group"]["admins"]["description"].is_null());
    }

    #[test]
    fn imports_collect_into_an_array() {
        let mut doc = Document::new();
        doc.push(Block::import("okta_group.admins", "00ga"));
        doc.push(Block::import("okta_group.users", "00gb"));
        let parsed: serde_json::Value = serde_json::from_str(&render(&doc)).unwrap();
        let imports = parsed["import"].as_array().unwrap();
        assert_eq!(imports.len(), 2);
        // Addresses are plain strings, not interpolations
        assert_eq!(imports[0]["to"], "okta_group.admins");
        assert_eq!(imports[0]["id"], "00ga");
    }

    #[test]
    fn expressions_become_templates() {
        let mut doc = Document::new();
        doc.push(Block::resource("okta_policy_rule_password", "r").attr(
            "policy_id",
            TfValue::expr("okta_policy_password.p.id"),
        ));
        let parsed: serde_json::Value = serde_json::from_str(&render(&doc)).unwrap();
        assert_eq!(
            parsed["resource"]["okta_policy_rule_password"]["r"]["policy_id"],
            "${okta_policy_password.p.id}"
        );
    }

    #[test]
    fn jsonencode_inlines_serialized_json() {
        let mut doc = Document::new();
        doc.push(Block::resource("okta_group", "g").attr(
            "custom_profile_attributes",
            TfValue::Call(
                "jsonencode",
                Box::new(TfValue::Object(vec![(
                    "adminNotes".to_string(),
                    TfValue::str("keep"),
                )])),
            ),
        ));
        let parsed: serde_json::Value = serde_json::from_str(&render(&doc)).unwrap();
        let encoded = parsed["resource"]["okta_group"]["g"]["custom_profile_attributes"]
            .as_str()
            .unwrap();
        let inner: serde_json::Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(inner["adminNotes"], "keep");
    }
}
