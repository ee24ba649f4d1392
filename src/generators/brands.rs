//! Brands, themes and custom domains
//!
//! Fetches `/api/v1/brands`, each brand's themes through its
//! `_links.themes.href`, and `/api/v1/domains`, across one or more
//! environments. Every block is guarded by `count = var.CONFIG == "<env>"`
//! and named with an environment suffix, so a single file can drive both a
//! preview and a production org. Production default-app references go
//! through `data.okta_app` label lookups instead of raw instance ids.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::okta::client::OktaClient;
use crate::okta::pagination::{fetch_all, Collection, ErrorPolicy, PageStrategy};
use crate::tf::{Block, Document, TfValue};

use super::str_at;

/// The environment whose default apps are looked up by label
const APP_LOOKUP_ENV: &str = "prod";

/// One org to fetch, tagged with the environment name used in guards
pub struct EnvTarget {
    pub env: String,
    pub client: OktaClient,
}

pub struct BrandsOptions {
    pub on_error: ErrorPolicy,
}

pub async fn generate(targets: &[EnvTarget], opts: &BrandsOptions) -> Result<Document> {
    let mut doc = Document::with_header("Okta brands, themes and custom domains");
    if let Some(first) = targets.first() {
        doc.push(super::groups::config_variable(&first.env));
    }

    // app instance id -> label, production only
    let mut app_labels: BTreeMap<String, String> = BTreeMap::new();

    for target in targets {
        generate_env(target, opts, &mut app_labels, &mut doc).await?;
    }

    for (app_id, label) in &app_labels {
        doc.push(
            Block::data("okta_app", format!("app_{app_id}_by_label"))
                .attr(
                    "count",
                    TfValue::expr(format!("var.CONFIG == \"{APP_LOOKUP_ENV}\" ? 1 : 0")),
                )
                .attr("label", TfValue::str(label)),
        );
    }

    Ok(doc)
}

async fn generate_env(
    target: &EnvTarget,
    opts: &BrandsOptions,
    app_labels: &mut BTreeMap<String, String>,
    doc: &mut Document,
) -> Result<()> {
    let env = &target.env;
    let client = &target.client;

    let brands = fetch_all(
        client,
        &Collection::array(client.brands_url(), PageStrategy::LinkHeader).on_error(opts.on_error),
    )
    .await?;
    tracing::info!("Found {} brand(s) in {}", brands.items.len(), env);

    for brand in &brands.items {
        let Some(brand_id) = str_at(brand, &["id"]) else {
            continue;
        };
        emit_brand(brand, brand_id, env, client, app_labels, doc).await;

        match fetch_themes(client, brand).await {
            Ok(themes) => {
                for theme in &themes {
                    emit_theme(theme, brand_id, env, doc);
                }
            }
            Err(err) => {
                tracing::warn!("Skipping themes for brand {} in {}: {}", brand_id, env, err);
            }
        }
    }

    let domains = fetch_all(
        client,
        &Collection::keyed(client.domains_url(), "domains", PageStrategy::LinkHeader)
            .on_error(opts.on_error),
    )
    .await?;
    for domain in &domains.items {
        emit_domain(domain, env, doc);
    }

    Ok(())
}

async fn emit_brand(
    brand: &Value,
    brand_id: &str,
    env: &str,
    client: &OktaClient,
    app_labels: &mut BTreeMap<String, String>,
    doc: &mut Document,
) {
    let name = format!("brand_{brand_id}_{env}");
    let mut block = Block::resource("okta_brand", &name)
        .comment(format!("{env} environment - brand {brand_id}"))
        .attr(
            "count",
            TfValue::expr(format!("var.CONFIG == \"{env}\" ? 1 : 0")),
        )
        .attr("name", TfValue::opt_str(str_at(brand, &["name"])))
        .attr(
            "remove_powered_by_okta",
            TfValue::Bool(super::bool_at(brand, &["removePoweredByOkta"], false)),
        );

    if let Some(url) = str_at(brand, &["customPrivacyPolicyUrl"]) {
        block = block.attr("custom_privacy_policy_url", TfValue::str(url));
    }
    block = block.attr(
        "agree_to_custom_privacy_policy",
        TfValue::Bool(super::bool_at(brand, &["agreeToCustomPrivacyPolicy"], false)),
    );

    if let Some(app_id) = str_at(brand, &["defaultApp", "appInstanceId"]) {
        // Instance ids differ across orgs; production resolves the app by
        // label, other environments leave the attribute out
        if env == APP_LOOKUP_ENV {
            block = block.attr(
                "default_app_app_instance_id",
                TfValue::expr(format!("data.okta_app.app_{app_id}_by_label[0].id")),
            );
            let label = fetch_app_label(client, app_id).await;
            app_labels.insert(app_id.to_string(), label);
        }
    }
    if let Some(link_name) = str_at(brand, &["defaultApp", "appLinkName"]) {
        block = block.attr("default_app_app_link_name", TfValue::str(link_name));
    }
    if let Some(uri) = str_at(brand, &["defaultApp", "classicApplicationUri"]) {
        block = block.attr("default_app_classic_application_uri", TfValue::str(uri));
    }

    doc.push(block);
    doc.push(Block::import_guarded(
        env,
        format!("okta_brand.{name}[0]"),
        brand_id,
    ));
}

/// Themes through the brand's own link; brands without the link have none
async fn fetch_themes(client: &OktaClient, brand: &Value) -> Result<Vec<Value>> {
    let Some(href) = str_at(brand, &["_links", "themes", "href"]) else {
        return Ok(Vec::new());
    };
    let response = client.get(href).await?;
    Ok(response
        .body
        .as_array()
        .cloned()
        .unwrap_or_default())
}

/// Label of one app, falling back to the raw id when the lookup fails
async fn fetch_app_label(client: &OktaClient, app_id: &str) -> String {
    match client.get(&client.app_url(app_id)).await {
        Ok(response) => str_at(&response.body, &["label"])
            .unwrap_or(app_id)
            .to_string(),
        Err(err) => {
            tracing::warn!("Failed to fetch app {} for label lookup: {}", app_id, err);
            app_id.to_string()
        }
    }
}

/// Optional theme attributes copied verbatim when present
const THEME_FIELDS: &[(&str, &str)] = &[
    ("logo", "logo"),
    ("favicon", "favicon"),
    ("backgroundImage", "background_image"),
    ("primaryColorHex", "primary_color_hex"),
    ("primaryColorContrastHex", "primary_color_contrast_hex"),
    ("secondaryColorHex", "secondary_color_hex"),
    ("secondaryColorContrastHex", "secondary_color_contrast_hex"),
    ("signInPageTouchPointVariant", "sign_in_page_touch_point_variant"),
    (
        "endUserDashboardTouchPointVariant",
        "end_user_dashboard_touch_point_variant",
    ),
    ("errorPageTouchPointVariant", "error_page_touch_point_variant"),
    (
        "emailTemplateTouchPointVariant",
        "email_template_touch_point_variant",
    ),
];

fn emit_theme(theme: &Value, brand_id: &str, env: &str, doc: &mut Document) {
    let Some(theme_id) = str_at(theme, &["id"]) else {
        return;
    };
    let name = format!("theme_{theme_id}_{env}");
    let mut block = Block::resource("okta_theme", &name)
        .comment(format!("{env} environment - theme {theme_id} (brand {brand_id})"))
        .attr(
            "count",
            TfValue::expr(format!("var.CONFIG == \"{env}\" ? 1 : 0")),
        )
        .attr(
            "brand_id",
            TfValue::expr(format!("okta_brand.brand_{brand_id}_{env}[0].id")),
        );

    for &(json_field, tf_attr) in THEME_FIELDS {
        if let Some(value) = str_at(theme, &[json_field]) {
            block = block.attr(tf_attr, TfValue::str(value));
        }
    }

    doc.push(block);
    doc.push(Block::import_guarded(
        env,
        format!("okta_theme.{name}[0]"),
        theme_id,
    ));
}

fn emit_domain(domain: &Value, env: &str, doc: &mut Document) {
    let Some(domain_id) = str_at(domain, &["id"]) else {
        return;
    };
    let name = format!("domain_{domain_id}_{env}");
    let mut block = Block::resource("okta_domain", &name)
        .comment(format!("{env} environment - domain {domain_id}"))
        .attr(
            "count",
            TfValue::expr(format!("var.CONFIG == \"{env}\" ? 1 : 0")),
        )
        .attr("name", TfValue::opt_str(str_at(domain, &["domain"])));

    if let Some(brand_id) = str_at(domain, &["brandId"]) {
        block = block.attr("brand_id", TfValue::str(brand_id));
    }
    if let Some(source) = str_at(domain, &["certificateSourceType"]) {
        block = block.attr("certificate_source_type", TfValue::str(source));
    }

    doc.push(block);
    doc.push(Block::import_guarded(
        env,
        format!("okta_domain.{name}[0]"),
        domain_id,
    ));
}
