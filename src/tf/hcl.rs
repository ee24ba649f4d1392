//! HCL renderer
//!
//! Emits the block grammar Terraform expects: quoted labels, `key = value`
//! attributes, nested blocks, and 1.5+ `import` / `moved` blocks.

use super::ir::{Block, Document, TfValue};

const INDENT: &str = "  ";

/// Render a whole document
pub fn render(doc: &Document) -> String {
    let mut out = String::new();

    if let Some(header) = &doc.header {
        for line in header.lines() {
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    for (i, block) in doc.blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_block(&mut out, block, 0);
    }

    out
}

/// Escape a string for placement inside a quoted HCL literal
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{")
}

fn write_block(out: &mut String, block: &Block, depth: usize) {
    let pad = INDENT.repeat(depth);

    if let Some(comment) = &block.comment {
        for line in comment.lines() {
            out.push_str(&pad);
            out.push_str("# ");
            out.push_str(line);
            out.push('\n');
        }
    }

    out.push_str(&pad);
    out.push_str(block.kind);
    for label in &block.labels {
        out.push_str(" \"");
        out.push_str(&escape(label));
        out.push('"');
    }
    out.push_str(" {\n");

    let key_width = block
        .attrs
        .iter()
        .map(|(k, _)| k.len())
        .max()
        .unwrap_or(0);

    for (key, value) in &block.attrs {
        out.push_str(&pad);
        out.push_str(INDENT);
        out.push_str(key);
        for _ in key.len()..key_width {
            out.push(' ');
        }
        out.push_str(" = ");
        write_value(out, value, depth + 1);
        out.push('\n');
    }

    for nested in &block.blocks {
        if !block.attrs.is_empty() {
            out.push('\n');
        }
        write_block(out, nested, depth + 1);
    }

    out.push_str(&pad);
    out.push_str("}\n");
}

fn write_value(out: &mut String, value: &TfValue, depth: usize) {
    match value {
        TfValue::Null => out.push_str("null"),
        TfValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        TfValue::Num(n) => out.push_str(&n.to_string()),
        TfValue::Str(s) => {
            out.push('"');
            out.push_str(&escape(s));
            out.push('"');
        }
        // Interpolations emitted verbatim; the producer controls them
        TfValue::Template(t) => {
            out.push('"');
            out.push_str(t);
            out.push('"');
        }
        TfValue::Expr(e) => out.push_str(e),
        TfValue::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, depth);
            }
            out.push(']');
        }
        TfValue::Object(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            let pad = INDENT.repeat(depth + 1);
            for (key, item) in entries {
                out.push_str(&pad);
                out.push('"');
                out.push_str(&escape(key));
                out.push_str("\" = ");
                write_value(out, item, depth + 1);
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(depth));
            out.push('}');
        }
        TfValue::Call(func, arg) => {
            out.push_str(func);
            out.push('(');
            write_value(out, arg, depth);
            out.push(')');
        }
    }
}
