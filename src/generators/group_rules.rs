//! Group membership rules
//!
//! Reads `/api/v1/groups/rules` (Link-header pagination, bare-array body)
//! and emits one `okta_group_rule` block plus import per rule.

use anyhow::Result;

use crate::okta::client::OktaClient;
use crate::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};
use crate::resolve::Namer;
use crate::tf::{Block, Document, TfValue};

use super::{str_at, str_list_at};

const DEFAULT_EXPRESSION_TYPE: &str = "urn:okta:expression:1.0";

pub struct GroupRulesOptions {
    /// Environment tag; enables `count` guards and guarded imports
    pub env: Option<String>,
    pub on_error: ErrorPolicy,
}

pub async fn generate(client: &OktaClient, opts: &GroupRulesOptions) -> Result<Document> {
    let collection = Collection::array(client.group_rules_url(), PageStrategy::LinkHeader)
        .on_error(opts.on_error);
    let outcome = fetch_all(client, &collection).await?;
    tracing::info!("Generating {} group rule(s)", outcome.items.len());

    let mut doc = Document::with_header("Okta group membership rules");
    if let Some(env) = &opts.env {
        doc.push(super::groups::config_variable(env));
    }

    let mut namer = Namer::new();
    for rule in &outcome.items {
        let Some(id) = str_at(rule, &["id"]) else {
            continue;
        };
        let label = str_at(rule, &["name"]).unwrap_or(id);
        let base = namer.assign(id, label, "rule");
        let name = match &opts.env {
            Some(env) => format!("{base}_{env}"),
            None => base,
        };

        let assignments = str_list_at(rule, &["actions", "assignUserToGroups", "groupIds"]);
        let excluded = str_list_at(rule, &["conditions", "people", "users", "exclude"]);

        let mut block = Block::resource("okta_group_rule", &name);
        if let Some(env) = &opts.env {
            block = block.attr(
                "count",
                TfValue::expr(format!("var.CONFIG == \"{env}\" ? 1 : 0")),
            );
        }
        block = block
            .attr("name", TfValue::str(label))
            .attr(
                "status",
                TfValue::opt_str(str_at(rule, &["status"])),
            )
            .attr(
                "group_assignments",
                TfValue::List(assignments.into_iter().map(TfValue::Str).collect()),
            )
            .attr(
                "expression_type",
                TfValue::str(
                    str_at(rule, &["conditions", "expression", "type"])
                        .unwrap_or(DEFAULT_EXPRESSION_TYPE),
                ),
            )
            .attr(
                "expression_value",
                TfValue::opt_str(str_at(rule, &["conditions", "expression", "value"])),
            )
            .attr(
                "users_excluded",
                TfValue::List(excluded.into_iter().map(TfValue::Str).collect()),
            );
        doc.push(block);

        match &opts.env {
            Some(env) => doc.push(Block::import_guarded(
                env,
                format!("okta_group_rule.{name}[0]"),
                id,
            )),
            None => doc.push(Block::import(format!("okta_group_rule.{name}"), id)),
        }
    }

    Ok(doc)
}
