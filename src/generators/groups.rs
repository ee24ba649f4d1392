//! Directory groups
//!
//! Reads `/api/v1/groups` (Link-header pagination), keeps only
//! `OKTA_GROUP`-typed entries, and emits one `okta_group` block plus import
//! per group. With `--env` the blocks get the `count = var.CONFIG == "env"`
//! guard and environment-suffixed names so one file can serve several orgs.

use anyhow::Result;
use serde_json::Value;

use crate::okta::client::OktaClient;
use crate::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};
use crate::resolve::Namer;
use crate::tf::{Block, Document, TfValue};

use super::str_at;

/// Profile fields emitted as first-class attributes rather than through
/// `custom_profile_attributes`
const BUILTIN_PROFILE_FIELDS: &[&str] = &["name", "description"];

pub struct GroupsOptions {
    /// Only groups whose name starts with this prefix
    pub search_prefix: Option<String>,
    /// Environment tag; enables `count` guards and guarded imports
    pub env: Option<String>,
    pub on_error: ErrorPolicy,
}

pub async fn generate(client: &OktaClient, opts: &GroupsOptions) -> Result<Document> {
    let start_url = match &opts.search_prefix {
        Some(prefix) => client.groups_search_url(&format!("profile.name sw \"{prefix}\"")),
        None => client.groups_url(),
    };
    let collection =
        Collection::array(start_url, PageStrategy::LinkHeader).on_error(opts.on_error);
    let outcome = fetch_all(client, &collection).await?;

    let groups: Vec<&Value> = outcome
        .items
        .iter()
        .filter(|g| str_at(g, &["type"]) == Some("OKTA_GROUP"))
        .collect();
    tracing::info!(
        "Generating {} of {} fetched group(s)",
        groups.len(),
        outcome.items.len()
    );

    let mut doc = Document::with_header("Okta directory groups");
    if let Some(env) = &opts.env {
        doc.push(config_variable(env));
    }

    let mut namer = Namer::new();
    for group in groups {
        let Some(id) = str_at(group, &["id"]) else {
            continue;
        };
        let label = str_at(group, &["profile", "name"]).unwrap_or(id);
        let base = namer.assign(id, label, "group");
        let name = match &opts.env {
            Some(env) => format!("{base}_{env}"),
            None => base,
        };

        let mut block = Block::resource("okta_group", &name);
        if let Some(env) = &opts.env {
            block = block.attr(
                "count",
                TfValue::expr(format!("var.CONFIG == \"{env}\" ? 1 : 0")),
            );
        }
        block = block
            .attr("name", TfValue::str(label))
            .attr(
                "description",
                TfValue::opt_str(str_at(group, &["profile", "description"])),
            );

        if let Some(custom) = custom_profile_attributes(group) {
            block = block.attr("custom_profile_attributes", custom);
        }

        block = block.nested(
            Block::new("lifecycle").attr("ignore_changes", TfValue::expr("[skip_users]")),
        );
        doc.push(block);

        match &opts.env {
            Some(env) => doc.push(Block::import_guarded(
                env,
                format!("okta_group.{name}[0]"),
                id,
            )),
            None => doc.push(Block::import(format!("okta_group.{name}"), id)),
        }
    }

    Ok(doc)
}

/// The `variable "CONFIG"` declaration backing the environment guards
pub(crate) fn config_variable(example_env: &str) -> Block {
    Block::variable("CONFIG")
        .attr(
            "description",
            TfValue::str(format!(
                "Environment selector, e.g. \"{example_env}\""
            )),
        )
        .attr("type", TfValue::expr("string"))
}

/// Everything in the profile beyond name/description, wrapped in
/// `jsonencode({...})`; `None` when there is nothing custom
fn custom_profile_attributes(group: &Value) -> Option<TfValue> {
    let profile = group.get("profile")?.as_object()?;
    let custom: Vec<(String, TfValue)> = profile
        .iter()
        .filter(|(key, _)| !BUILTIN_PROFILE_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), TfValue::from_json(value)))
        .collect();

    if custom.is_empty() {
        return None;
    }
    Some(TfValue::Call("jsonencode", Box::new(TfValue::Object(custom))))
}
