//! Policies and policy rules
//!
//! One generator covers the password, sign-on and MFA-enrollment policy
//! families; they share the fetch shape (`/api/v1/policies?type=K`, then
//! `/api/v1/policies/{id}/rules` per policy) and differ only in field
//! mappings. Groups referenced by a policy's people condition become
//! `data.okta_group` lookups so the generated file carries no raw group ids.

use std::collections::BTreeSet;

use anyhow::Result;
use clap::ValueEnum;
use serde_json::Value;

use crate::okta::client::OktaClient;
use crate::okta::http::HttpError;
use crate::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};
use crate::resolve::{EndpointKind, NameTable, Namer, Reference};
use crate::tf::{Block, Document, TfValue};

use super::{bool_at, get_path, i64_at, str_at, str_list_at};

/// Which policy family to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    Password,
    SignOn,
    MfaEnroll,
}

impl PolicyKind {
    /// `type` query value and discriminator in the API payload
    pub fn api_type(self) -> &'static str {
        match self {
            PolicyKind::Password => "PASSWORD",
            PolicyKind::SignOn => "OKTA_SIGN_ON",
            PolicyKind::MfaEnroll => "MFA_ENROLL",
        }
    }

    /// Terraform type for a policy; org-default policies use the dedicated
    /// `*_default` resources where the provider has them
    fn policy_resource_type(self, system: bool) -> &'static str {
        match (self, system) {
            (PolicyKind::Password, true) => "okta_policy_password_default",
            (PolicyKind::Password, false) => "okta_policy_password",
            (PolicyKind::SignOn, _) => "okta_policy_signon",
            (PolicyKind::MfaEnroll, true) => "okta_policy_mfa_default",
            (PolicyKind::MfaEnroll, false) => "okta_policy_mfa",
        }
    }
}

pub struct PoliciesOptions {
    pub kind: PolicyKind,
    pub on_error: ErrorPolicy,
}

pub async fn generate(client: &OktaClient, opts: &PoliciesOptions) -> Result<Document> {
    let kind = opts.kind;
    let collection = Collection::array(
        client.policies_url(kind.api_type()),
        PageStrategy::LinkHeader,
    )
    .on_error(opts.on_error);
    let outcome = fetch_all(client, &collection).await?;

    let policies: Vec<&Value> = outcome
        .items
        .iter()
        .filter(|p| str_at(p, &["type"]) == Some(kind.api_type()))
        .collect();
    tracing::info!(
        "Generating {} {} policy(ies)",
        policies.len(),
        kind.api_type()
    );

    // MFA schemas differ between Identity Engine and Classic orgs
    let is_oie = match kind {
        PolicyKind::MfaEnroll => fetch_is_oie(client).await,
        _ => false,
    };

    let mut doc = Document::with_header(format!("Okta {} policies", kind.api_type()));

    // Group data lookups come first so everything below can reference them
    let mut table = NameTable::new();
    for group_id in collect_group_ids(&policies) {
        let name = format!("group_{group_id}");
        table.insert(EndpointKind::Group, &group_id, &name);
        doc.push(Block::data("okta_group", &name).attr("id", TfValue::str(&group_id)));
    }

    let mut policy_namer = Namer::new();
    let mut rule_namer = Namer::new();
    for policy in policies {
        let Some(policy_id) = str_at(policy, &["id"]) else {
            continue;
        };
        let system = bool_at(policy, &["system"], false);
        let resource_type = kind.policy_resource_type(system);
        let label = str_at(policy, &["name"]).unwrap_or(policy_id);
        let name = policy_namer.assign(policy_id, label, "policy");

        let block = match kind {
            PolicyKind::Password => password_policy_block(policy, resource_type, &name, system, &table),
            PolicyKind::SignOn => signon_policy_block(policy, resource_type, &name, &table),
            PolicyKind::MfaEnroll => {
                mfa_policy_block(policy, resource_type, &name, system, is_oie, &table)
            }
        };
        doc.push(block);
        doc.push(Block::import(format!("{resource_type}.{name}"), policy_id));

        let rules = fetch_policy_rules(client, policy_id, opts.on_error).await?;
        for rule in &rules {
            let Some(rule_id) = str_at(rule, &["id"]) else {
                continue;
            };
            let rule_label = str_at(rule, &["name"]).unwrap_or(rule_id);
            let rule_name = rule_namer.assign(rule_id, rule_label, "rule");
            let parent = format!("{resource_type}.{name}");

            let (rule_type, block) = match kind {
                PolicyKind::Password => password_rule_block(rule, &rule_name, &parent),
                PolicyKind::SignOn => signon_rule_block(rule, &rule_name, &parent),
                PolicyKind::MfaEnroll => {
                    mfa_rule_block(rule, &rule_name, policy_id, &parent, is_oie)
                }
            };
            doc.push(block);
            doc.push(Block::import(
                format!("{rule_type}.{rule_name}"),
                format!("{policy_id}/{rule_id}"),
            ));
        }
    }

    Ok(doc)
}

/// Distinct group ids across all people conditions, in stable order
fn collect_group_ids(policies: &[&Value]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for policy in policies {
        ids.extend(str_list_at(
            policy,
            &["conditions", "people", "groups", "include"],
        ));
    }
    ids
}

/// `groups_included` as data-source references; `null` when the policy has
/// no group condition
fn groups_included(policy: &Value, table: &NameTable) -> TfValue {
    let ids = str_list_at(policy, &["conditions", "people", "groups", "include"]);
    if ids.is_empty() {
        return TfValue::Null;
    }
    TfValue::List(
        ids.iter()
            .map(|id| match table.get(EndpointKind::Group, id) {
                Some(name) => TfValue::from(&Reference::data(EndpointKind::Group, name)),
                None => TfValue::str(id),
            })
            .collect(),
    )
}

fn opt_int(value: Option<i64>) -> TfValue {
    match value {
        Some(n) => TfValue::int(n),
        None => TfValue::Null,
    }
}

/// Rules of one policy; 404 (policy vanished mid-run) degrades to empty
async fn fetch_policy_rules(
    client: &OktaClient,
    policy_id: &str,
    on_error: ErrorPolicy,
) -> Result<Vec<Value>> {
    let collection = Collection::array(
        client.policy_rules_url(policy_id),
        PageStrategy::LinkHeader,
    )
    .on_error(on_error);
    match fetch_all(client, &collection).await {
        Ok(outcome) => Ok(outcome.items),
        Err(HttpError::Status { status: 404, url }) => {
            tracing::warn!("No rules endpoint at {} (404), skipping", url);
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Pipeline probe: Identity Engine orgs report `pipeline == "idx"` on the
/// well-known org endpoint. Failures default to Classic.
async fn fetch_is_oie(client: &OktaClient) -> bool {
    match client.get(&client.well_known_org_url()).await {
        Ok(response) => {
            let pipeline = str_at(&response.body, &["pipeline"]).unwrap_or("");
            tracing::info!("Organization pipeline: {:?}", pipeline);
            pipeline.eq_ignore_ascii_case("idx")
        }
        Err(err) => {
            tracing::warn!("Failed to probe org pipeline, assuming Classic: {}", err);
            false
        }
    }
}

// =========================================================================
// Password policies
// =========================================================================

fn password_policy_block(
    policy: &Value,
    resource_type: &str,
    name: &str,
    system: bool,
    table: &NameTable,
) -> Block {
    let mut block = Block::resource(resource_type, name)
        .attr("name", TfValue::opt_str(str_at(policy, &["name"])))
        .attr(
            "description",
            TfValue::opt_str(str_at(policy, &["description"])),
        )
        .attr("status", TfValue::opt_str(str_at(policy, &["status"])))
        .attr("priority", opt_int(i64_at(policy, &["priority"])))
        .attr("groups_included", groups_included(policy, table));

    if system {
        return block;
    }

    block = block
        .attr(
            "password_history_count",
            opt_int(i64_at(policy, &["settings", "password", "age", "historyCount"])),
        )
        .attr(
            "password_min_length",
            opt_int(i64_at(policy, &["settings", "password", "complexity", "minLength"])),
        )
        .attr(
            "password_min_lowercase",
            opt_int(i64_at(policy, &["settings", "password", "complexity", "minLowerCase"])),
        )
        .attr(
            "password_min_uppercase",
            opt_int(i64_at(policy, &["settings", "password", "complexity", "minUpperCase"])),
        )
        .attr(
            "password_min_number",
            opt_int(i64_at(policy, &["settings", "password", "complexity", "minNumber"])),
        )
        .attr(
            "password_min_symbol",
            opt_int(i64_at(policy, &["settings", "password", "complexity", "minSymbol"])),
        )
        .attr(
            "password_exclude_username",
            match get_path(policy, &["settings", "password", "complexity", "excludeUsername"])
                .and_then(Value::as_bool)
            {
                Some(b) => TfValue::Bool(b),
                None => TfValue::Null,
            },
        )
        .attr(
            "password_expire_warn_days",
            opt_int(i64_at(policy, &["settings", "password", "age", "expireWarnDays"])),
        )
        .attr(
            "password_min_age_minutes",
            opt_int(i64_at(policy, &["settings", "password", "age", "minAgeMinutes"])),
        )
        .attr(
            "password_max_age_days",
            opt_int(i64_at(policy, &["settings", "password", "age", "maxAgeDays"])),
        )
        .attr(
            "password_max_lockout_attempts",
            opt_int(i64_at(policy, &["settings", "password", "lockout", "maxAttempts"])),
        )
        .attr(
            "password_auto_unlock_minutes",
            opt_int(i64_at(policy, &["settings", "password", "lockout", "autoUnlockMinutes"])),
        )
        .attr(
            "password_show_lockout_failures",
            match get_path(policy, &["settings", "password", "lockout", "showLockoutFailures"])
                .and_then(Value::as_bool)
            {
                Some(b) => TfValue::Bool(b),
                None => TfValue::Null,
            },
        )
        .attr(
            "recovery_email_token",
            opt_int(i64_at(
                policy,
                &[
                    "settings",
                    "recovery",
                    "factors",
                    "okta_email",
                    "properties",
                    "recoveryToken",
                    "tokenLifetimeMinutes",
                ],
            )),
        );

    block
}

fn password_rule_block(rule: &Value, name: &str, parent: &str) -> (&'static str, Block) {
    let excluded = str_list_at(rule, &["conditions", "people", "users", "exclude"]);
    let users_excluded = if excluded.is_empty() {
        TfValue::Null
    } else {
        TfValue::List(excluded.into_iter().map(TfValue::Str).collect())
    };

    let block = Block::resource("okta_policy_rule_password", name)
        .attr("name", TfValue::opt_str(str_at(rule, &["name"])))
        .attr("policy_id", TfValue::expr(format!("{parent}.id")))
        .attr("priority", opt_int(i64_at(rule, &["priority"])))
        .attr("status", TfValue::opt_str(str_at(rule, &["status"])))
        .attr(
            "network_connection",
            TfValue::opt_str(str_at(rule, &["conditions", "network", "connection"])),
        )
        .attr(
            "password_change",
            TfValue::opt_str(str_at(rule, &["actions", "passwordChange", "access"])),
        )
        .attr(
            "password_reset",
            TfValue::opt_str(str_at(
                rule,
                &["actions", "selfServicePasswordReset", "access"],
            )),
        )
        .attr(
            "password_unlock",
            TfValue::opt_str(str_at(rule, &["actions", "selfServiceUnlock", "access"])),
        )
        .attr("users_excluded", users_excluded);

    ("okta_policy_rule_password", block)
}

// =========================================================================
// Sign-on policies
// =========================================================================

fn signon_policy_block(
    policy: &Value,
    resource_type: &str,
    name: &str,
    table: &NameTable,
) -> Block {
    Block::resource(resource_type, name)
        .attr("name", TfValue::opt_str(str_at(policy, &["name"])))
        .attr(
            "status",
            TfValue::str(str_at(policy, &["status"]).unwrap_or("ACTIVE")),
        )
        .attr(
            "description",
            TfValue::opt_str(str_at(policy, &["description"])),
        )
        .attr("groups_included", groups_included(policy, table))
        .attr(
            "priority",
            TfValue::int(i64_at(policy, &["priority"]).unwrap_or(1)),
        )
}

fn signon_rule_block(rule: &Value, name: &str, parent: &str) -> (&'static str, Block) {
    let behaviors = str_list_at(rule, &["actions", "signon", "behaviors"]);
    let excluded = str_list_at(rule, &["conditions", "people", "users", "exclude"]);

    let block = Block::resource("okta_policy_rule_signon", name)
        .attr("name", TfValue::opt_str(str_at(rule, &["name"])))
        .attr(
            "status",
            TfValue::str(str_at(rule, &["status"]).unwrap_or("ACTIVE")),
        )
        .attr(
            "access",
            TfValue::str(str_at(rule, &["actions", "signon", "access"]).unwrap_or("ALLOW")),
        )
        .attr(
            "authtype",
            TfValue::str(str_at(rule, &["actions", "signon", "authtype"]).unwrap_or("ANY")),
        )
        .attr(
            "behaviors",
            TfValue::List(behaviors.into_iter().map(TfValue::Str).collect()),
        )
        .attr(
            "network_connection",
            TfValue::str(
                str_at(rule, &["conditions", "network", "connection"]).unwrap_or("ANYWHERE"),
            ),
        )
        .attr(
            "identity_provider",
            TfValue::str(
                str_at(rule, &["conditions", "identityProvider", "provider"]).unwrap_or("ANY"),
            ),
        )
        .attr(
            "mfa_required",
            TfValue::Bool(bool_at(rule, &["actions", "signon", "requireFactor"], false)),
        )
        .attr(
            "primary_factor",
            TfValue::str(
                str_at(rule, &["actions", "signon", "primaryFactor"])
                    .unwrap_or("PASSWORD_IDP_ANY_FACTOR"),
            ),
        )
        .attr(
            "users_excluded",
            TfValue::List(excluded.into_iter().map(TfValue::Str).collect()),
        )
        .attr(
            "priority",
            TfValue::int(i64_at(rule, &["priority"]).unwrap_or(1)),
        )
        .attr(
            "risk_level",
            TfValue::str(
                str_at(rule, &["conditions", "riskScore", "level"]).unwrap_or("ANY"),
            ),
        )
        .attr(
            "session_idle",
            TfValue::int(
                i64_at(rule, &["actions", "signon", "session", "maxSessionIdleMinutes"])
                    .unwrap_or(120),
            ),
        )
        .attr(
            "session_lifetime",
            TfValue::int(
                i64_at(rule, &["actions", "signon", "session", "maxSessionLifetimeMinutes"])
                    .unwrap_or(120),
            ),
        )
        .attr(
            "session_persistent",
            TfValue::Bool(bool_at(
                rule,
                &["actions", "signon", "session", "usePersistentCookie"],
                false,
            )),
        )
        .attr("policy_id", TfValue::expr(format!("{parent}.id")));

    ("okta_policy_rule_signon", block)
}

// =========================================================================
// MFA enrollment policies
// =========================================================================

fn mfa_policy_block(
    policy: &Value,
    resource_type: &str,
    name: &str,
    system: bool,
    is_oie: bool,
    table: &NameTable,
) -> Block {
    let mut block = Block::resource(resource_type, name);

    if !system {
        block = block
            .attr("name", TfValue::opt_str(str_at(policy, &["name"])))
            .attr(
                "description",
                TfValue::opt_str(str_at(policy, &["description"])),
            )
            .attr(
                "status",
                TfValue::str(str_at(policy, &["status"]).unwrap_or("ACTIVE")),
            )
            .attr("priority", opt_int(i64_at(policy, &["priority"])))
            .attr("is_oie", TfValue::Bool(is_oie))
            .attr("groups_included", groups_included(policy, table));
    } else {
        block = block.attr("is_oie", TfValue::Bool(is_oie));
    }

    for (key, enroll) in enrollment_settings(policy) {
        block = block.attr(
            key,
            TfValue::Object(vec![("enroll".to_string(), TfValue::Str(enroll))]),
        );
    }

    block
}

/// Authenticator/factor enrollment map; OIE orgs list `authenticators`,
/// Classic orgs key by factor name
fn enrollment_settings(policy: &Value) -> Vec<(String, String)> {
    let mut settings = Vec::new();

    if let Some(authenticators) = get_path(policy, &["settings", "authenticators"])
        .and_then(Value::as_array)
    {
        for authenticator in authenticators {
            let (Some(key), Some(enroll)) = (
                str_at(authenticator, &["key"]),
                str_at(authenticator, &["enroll", "self"]),
            ) else {
                continue;
            };
            settings.push((key.to_string(), enroll.to_string()));
        }
    } else if let Some(factors) = get_path(policy, &["settings", "factors"])
        .and_then(Value::as_object)
    {
        for (factor, details) in factors {
            let Some(enroll) = str_at(details, &["enroll", "self"]) else {
                continue;
            };
            settings.push((factor.clone(), enroll.to_string()));
        }
    }

    settings
}

fn mfa_rule_block(
    rule: &Value,
    name: &str,
    policy_id: &str,
    parent: &str,
    is_oie: bool,
) -> (&'static str, Block) {
    let excluded = str_list_at(rule, &["conditions", "people", "users", "exclude"]);

    if is_oie {
        let network_list = |key: &str| {
            get_path(rule, &["conditions", "network", key])
                .filter(|v| !v.is_null())
                .map(|v| TfValue::Call("jsonencode", Box::new(TfValue::from_json(v))))
                .unwrap_or(TfValue::Null)
        };
        let users_excluded = if excluded.is_empty() {
            TfValue::Null
        } else {
            TfValue::Call(
                "jsonencode",
                Box::new(TfValue::List(
                    excluded.into_iter().map(TfValue::Str).collect(),
                )),
            )
        };

        let block = Block::resource("okta_policy_rule_mfa", name)
            .attr("policy_id", TfValue::expr(format!("{parent}.id")))
            .attr("name", TfValue::opt_str(str_at(rule, &["name"])))
            .attr(
                "enroll",
                TfValue::opt_str(str_at(rule, &["actions", "enroll", "self"])),
            )
            .attr(
                "network_connection",
                TfValue::str(
                    str_at(rule, &["conditions", "network", "connection"]).unwrap_or("ANYWHERE"),
                ),
            )
            .attr("network_excludes", network_list("excludes"))
            .attr("network_includes", network_list("includes"))
            .attr("priority", opt_int(i64_at(rule, &["priority"])))
            .attr(
                "status",
                TfValue::str(str_at(rule, &["status"]).unwrap_or("ACTIVE")),
            )
            .attr("users_excluded", users_excluded)
            .attr("depends_on", TfValue::expr(format!("[{parent}]")));

        ("okta_policy_rule_mfa", block)
    } else {
        let encoded = |key: &str| {
            rule.get(key)
                .filter(|v| !v.is_null())
                .map(|v| TfValue::Call("jsonencode", Box::new(TfValue::from_json(v))))
                .unwrap_or(TfValue::Null)
        };

        let block = Block::resource("okta_policy_mfa_rule", name)
            .attr("policy_id", TfValue::str(policy_id))
            .attr("name", TfValue::opt_str(str_at(rule, &["name"])))
            .attr(
                "status",
                TfValue::str(str_at(rule, &["status"]).unwrap_or("ACTIVE")),
            )
            .attr("priority", opt_int(i64_at(rule, &["priority"])))
            .attr("conditions", encoded("conditions"))
            .attr("actions", encoded("actions"))
            .attr("depends_on", TfValue::expr(format!("[{parent}]")));

        ("okta_policy_mfa_rule", block)
    }
}
