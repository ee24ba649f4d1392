//! Intermediate representation for generated Terraform configuration

use serde_json::Value;

use crate::resolve::refs::Reference;

/// One attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum TfValue {
    Null,
    Bool(bool),
    Num(serde_json::Number),
    /// Plain string; escaped by the renderer
    Str(String),
    /// Quoted string containing `${...}` interpolations, emitted verbatim
    Template(String),
    /// Bare expression (resource addresses, guards, locals)
    Expr(String),
    List(Vec<TfValue>),
    /// Ordered key/value object
    Object(Vec<(String, TfValue)>),
    /// Function call around a value, e.g. `jsonencode({...})`
    Call(&'static str, Box<TfValue>),
}

impl TfValue {
    pub fn str(s: impl Into<String>) -> Self {
        TfValue::Str(s.into())
    }

    pub fn expr(e: impl Into<String>) -> Self {
        TfValue::Expr(e.into())
    }

    pub fn int(n: i64) -> Self {
        TfValue::Num(serde_json::Number::from(n))
    }

    /// `Str` when present, `Null` otherwise
    pub fn opt_str(s: Option<&str>) -> Self {
        match s {
            Some(s) => TfValue::Str(s.to_string()),
            None => TfValue::Null,
        }
    }

    /// Convert a JSON payload fragment structurally
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => TfValue::Null,
            Value::Bool(b) => TfValue::Bool(*b),
            Value::Number(n) => TfValue::Num(n.clone()),
            Value::String(s) => TfValue::Str(s.clone()),
            Value::Array(items) => TfValue::List(items.iter().map(TfValue::from_json).collect()),
            Value::Object(map) => TfValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), TfValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Reference> for TfValue {
    fn from(reference: &Reference) -> Self {
        match reference {
            Reference::Literal(s) => TfValue::Str(s.clone()),
            Reference::Data { kind, name, attr } => {
                TfValue::Expr(format!("data.{}.{}.{}", kind.tf_type(), name, attr))
            }
            Reference::Attr { kind, name, attr } => {
                TfValue::Expr(format!("{}.{}.{}", kind.tf_type(), name, attr))
            }
            Reference::UrlAttr {
                kind,
                name,
                attr,
                trailing,
            } => {
                let tail = trailing
                    .as_deref()
                    .map(|t| format!("/{t}"))
                    .unwrap_or_default();
                TfValue::Template(format!(
                    "${{var.okta_org_url}}/api/v1/{}/${{{}.{}.{}}}{}",
                    kind.segment(),
                    kind.tf_type(),
                    name,
                    attr,
                    tail
                ))
            }
            Reference::OrgUrl { suffix } => {
                TfValue::Template(format!("${{var.okta_org_url}}{suffix}"))
            }
        }
    }
}

/// One top-level or nested configuration block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// `resource`, `data`, `import`, `moved`, `variable`, or a nested block
    /// name like `lifecycle`
    pub kind: &'static str,
    pub labels: Vec<String>,
    pub attrs: Vec<(String, TfValue)>,
    pub blocks: Vec<Block>,
    /// Leading `#` comment line
    pub comment: Option<String>,
}

impl Block {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            labels: Vec::new(),
            attrs: Vec::new(),
            blocks: Vec::new(),
            comment: None,
        }
    }

    pub fn resource(tf_type: impl Into<String>, name: impl Into<String>) -> Self {
        let mut block = Self::new("resource");
        block.labels = vec![tf_type.into(), name.into()];
        block
    }

    pub fn data(tf_type: impl Into<String>, name: impl Into<String>) -> Self {
        let mut block = Self::new("data");
        block.labels = vec![tf_type.into(), name.into()];
        block
    }

    pub fn variable(name: impl Into<String>) -> Self {
        let mut block = Self::new("variable");
        block.labels = vec![name.into()];
        block
    }

    /// Terraform 1.5+ import block binding an address to an upstream id
    pub fn import(to: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("import")
            .attr("to", TfValue::expr(to))
            .attr("id", TfValue::str(id))
    }

    /// Import block guarded on `var.CONFIG`, for environment-suffixed
    /// resources declared with a `count` guard
    pub fn import_guarded(env: &str, to: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new("import")
            .attr(
                "for_each",
                TfValue::expr(format!(
                    "var.CONFIG == \"{env}\" ? toset([\"{env}\"]) : []"
                )),
            )
            .attr("to", TfValue::expr(to))
            .attr("id", TfValue::str(id))
    }

    pub fn moved(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new("moved")
            .attr("from", TfValue::expr(from))
            .attr("to", TfValue::expr(to))
    }

    pub fn attr(mut self, key: impl Into<String>, value: TfValue) -> Self {
        self.attrs.push((key.into(), value));
        self
    }

    pub fn nested(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    /// Address of a resource or data block (`okta_group.admins`,
    /// `data.okta_group.admins`)
    pub fn address(&self) -> String {
        match self.kind {
            "data" => format!("data.{}", self.labels.join(".")),
            _ => self.labels.join("."),
        }
    }
}

/// An ordered sequence of blocks plus an optional leading comment
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub header: Option<String>,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
