//! Custom admin roles and resource sets
//!
//! Reads `/api/v1/iam/roles` and `/api/v1/iam/resource-sets` (both paginate
//! via a body cursor), pulls each role's permissions through its
//! `_links.permissions.href`, and each resource set's members through its
//! `/resources` sub-collection. When groups are fetched in the same run
//! (via `--group-prefix`), member URLs pointing at those groups are emitted
//! as references to the generated `okta_group` blocks instead of literals.

use anyhow::Result;
use serde_json::Value;

use crate::okta::client::OktaClient;
use crate::okta::http::HttpError;
use crate::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};
use crate::resolve::{resolve, EndpointKind, NameTable, Namer};
use crate::tf::{Block, Document, TfValue};

use super::str_at;

pub struct RolesOptions {
    /// Also generate groups matching this name prefix, enabling symbolic
    /// references from resource set members
    pub group_prefix: Option<String>,
    pub on_error: ErrorPolicy,
}

pub async fn generate(client: &OktaClient, opts: &RolesOptions) -> Result<Document> {
    let mut doc = Document::with_header("Okta custom admin roles and resource sets");
    doc.push(
        Block::variable("okta_org_url")
            .comment("Org base URL substituted into resource set member URLs")
            .attr("type", TfValue::expr("string")),
    );

    let mut table = NameTable::new();

    if let Some(prefix) = &opts.group_prefix {
        generate_groups(client, prefix, opts.on_error, &mut table, &mut doc).await?;
    }

    generate_roles(client, opts.on_error, &mut doc).await?;
    generate_resource_sets(client, opts.on_error, &table, &mut doc).await?;

    Ok(doc)
}

async fn generate_groups(
    client: &OktaClient,
    prefix: &str,
    on_error: ErrorPolicy,
    table: &mut NameTable,
    doc: &mut Document,
) -> Result<()> {
    let expression = format!("profile.name sw \"{prefix}\"");
    let collection = Collection::array(
        client.groups_search_url(&expression),
        PageStrategy::LinkHeader,
    )
    .on_error(on_error);
    let outcome = fetch_all(client, &collection).await?;
    tracing::info!("Found {} group(s) matching prefix {:?}", outcome.items.len(), prefix);

    for group in &outcome.items {
        let Some(id) = str_at(group, &["id"]) else {
            continue;
        };
        let label = str_at(group, &["profile", "name"]).unwrap_or(id);
        let name = table.assign(EndpointKind::Group, id, label);

        doc.push(
            Block::resource("okta_group", &name)
                .attr("name", TfValue::str(label))
                .attr(
                    "description",
                    TfValue::opt_str(str_at(group, &["profile", "description"])),
                ),
        );
        doc.push(Block::import(format!("okta_group.{name}"), id));
    }

    Ok(())
}

async fn generate_roles(
    client: &OktaClient,
    on_error: ErrorPolicy,
    doc: &mut Document,
) -> Result<()> {
    let collection = Collection::keyed(
        client.iam_roles_url(),
        "roles",
        PageStrategy::BodyNextLink,
    )
    .on_error(on_error);
    let outcome = fetch_all(client, &collection).await?;
    tracing::info!("Found {} custom role(s)", outcome.items.len());

    let mut namer = Namer::new();
    for role in &outcome.items {
        let Some(id) = str_at(role, &["id"]) else {
            continue;
        };
        let label = str_at(role, &["label"]).unwrap_or(id);
        let name = namer.assign(id, label, "role");
        let permissions = fetch_role_permissions(client, role).await?;

        doc.push(
            Block::resource("okta_admin_role_custom", &name)
                .attr("label", TfValue::str(label))
                .attr(
                    "description",
                    TfValue::opt_str(str_at(role, &["description"])),
                )
                .attr(
                    "permissions",
                    TfValue::List(permissions.into_iter().map(TfValue::Str).collect()),
                ),
        );
        doc.push(Block::import(format!("okta_admin_role_custom.{name}"), id));
    }

    Ok(())
}

/// Permission labels via the role's own `_links.permissions.href`.
///
/// Roles without the link, and endpoints answering 404/405 (orgs without the
/// feature), contribute an empty list. Transport failures still abort.
async fn fetch_role_permissions(client: &OktaClient, role: &Value) -> Result<Vec<String>> {
    let Some(href) = str_at(role, &["_links", "permissions", "href"]) else {
        return Ok(Vec::new());
    };

    match client.get(href).await {
        Ok(response) => Ok(response
            .body
            .get("permissions")
            .and_then(Value::as_array)
            .map(|perms| {
                perms
                    .iter()
                    .filter_map(|p| str_at(p, &["label"]))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()),
        Err(HttpError::Status {
            status: 404 | 405, ..
        }) => Ok(Vec::new()),
        Err(HttpError::Status { url, status }) => {
            tracing::warn!("Skipping permissions: HTTP {} at {}", status, url);
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

async fn generate_resource_sets(
    client: &OktaClient,
    on_error: ErrorPolicy,
    table: &NameTable,
    doc: &mut Document,
) -> Result<()> {
    let collection = Collection::keyed(
        client.resource_sets_url(),
        "resource-sets",
        PageStrategy::BodyNextLink,
    )
    .on_error(on_error);
    let outcome = fetch_all(client, &collection).await?;
    tracing::info!("Found {} resource set(s)", outcome.items.len());

    let mut namer = Namer::new();
    for set in &outcome.items {
        let Some(id) = str_at(set, &["id"]) else {
            continue;
        };
        let label = str_at(set, &["label"]).unwrap_or(id);
        let name = namer.assign(id, label, "rs");
        let members = fetch_resource_set_members(client, id, on_error).await?;

        let resources: Vec<TfValue> = members
            .iter()
            .map(|href| TfValue::from(&resolve(href, &[EndpointKind::Group], table)))
            .collect();

        doc.push(
            Block::resource("okta_resource_set", &name)
                .attr("label", TfValue::str(label))
                .attr(
                    "description",
                    TfValue::opt_str(str_at(set, &["description"])),
                )
                .attr("resources", TfValue::List(resources)),
        );
        doc.push(Block::import(format!("okta_resource_set.{name}"), id));
    }

    Ok(())
}

/// Self-link URLs of everything bound to one resource set
async fn fetch_resource_set_members(
    client: &OktaClient,
    resource_set_id: &str,
    on_error: ErrorPolicy,
) -> Result<Vec<String>> {
    let collection = Collection::keyed(
        client.resource_set_resources_url(resource_set_id),
        "resources",
        PageStrategy::BodyNextLink,
    )
    .on_error(on_error);
    let outcome = fetch_all(client, &collection).await?;

    let mut members = Vec::new();
    for resource in &outcome.items {
        match str_at(resource, &["_links", "self", "href"]) {
            Some(href) => members.push(href.to_string()),
            None => tracing::debug!(
                "Resource {} in set {} has no self link, skipping",
                str_at(resource, &["id"]).unwrap_or("?"),
                resource_set_id
            ),
        }
    }
    Ok(members)
}
