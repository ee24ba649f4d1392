use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use oktf::config::Config;
use oktf::generators;
use oktf::generators::brands::{BrandsOptions, EnvTarget};
use oktf::generators::group_rules::GroupRulesOptions;
use oktf::generators::groups::GroupsOptions;
use oktf::generators::policies::{PoliciesOptions, PolicyKind};
use oktf::generators::roles::RolesOptions;
use oktf::okta::auth::{org_base_url, ApiToken, DomainFlag};
use oktf::okta::client::OktaClient;
use oktf::okta::http::format_okta_error;
use oktf::okta::pagination::ErrorPolicy;
use oktf::tf::{Document, OutputFormat};

/// Version injected at compile time via OKTF_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("OKTF_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Generate Terraform configuration from a live Okta org
#[derive(Parser, Debug)]
#[command(name = "oktf", version = VERSION, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Okta subdomain (e.g. mycompany)
    #[arg(long, global = true)]
    subdomain: Option<String>,

    /// Domain family the org lives in
    #[arg(long, global = true, value_enum)]
    domain_flag: Option<DomainFlag>,

    /// Full org URL; overrides --subdomain/--domain-flag
    #[arg(long, global = true)]
    org_url: Option<String>,

    /// Okta API token (falls back to OKTA_API_TOKEN)
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Output file; stdout when omitted
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output syntax
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// What to do when a page answers with an unexpected status
    #[arg(long, global = true, value_enum, default_value = "keep-partial")]
    on_error: OnError,

    /// Log level for stderr diagnostics
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Custom admin roles, their permissions, and resource sets
    Roles {
        /// Also generate groups with this name prefix, enabling symbolic
        /// references from resource set members
        #[arg(long)]
        group_prefix: Option<String>,
    },
    /// Directory groups
    Groups {
        /// Only groups whose name starts with this prefix
        #[arg(long)]
        search_prefix: Option<String>,
        /// Environment tag; adds count guards and guarded imports
        #[arg(long)]
        env: Option<String>,
    },
    /// Group membership rules
    GroupRules {
        /// Environment tag; adds count guards and guarded imports
        #[arg(long)]
        env: Option<String>,
    },
    /// Policies and their rules
    Policies {
        /// Policy family to generate
        #[arg(long, value_enum)]
        kind: PolicyKind,
    },
    /// Brands, themes and custom domains, across one or two environments
    Brands {
        /// Preview org subdomain
        #[arg(long, default_value = "preview")]
        preview_subdomain: String,
        /// Preview full org URL; overrides the subdomain
        #[arg(long)]
        preview_org_url: Option<String>,
        /// Preview API token; preview is skipped without one
        #[arg(long)]
        preview_api_token: Option<String>,
        /// Production org subdomain
        #[arg(long, default_value = "prod")]
        prod_subdomain: String,
        /// Production full org URL; overrides the subdomain
        #[arg(long)]
        prod_org_url: Option<String>,
        /// Production API token; prod is skipped without one
        #[arg(long)]
        prod_api_token: Option<String>,
    },
    /// Pair preview/prod groups in an existing file into moved blocks
    Moved {
        /// Previously generated Terraform file to scan
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
    /// Keep accumulated items and log a warning
    KeepPartial,
    /// Abort the whole fetch
    Fail,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::KeepPartial => ErrorPolicy::KeepPartial,
            OnError::Fail => ErrorPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Diagnostics go to stderr so generated configuration can stream to stdout
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(tracing_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(&args).await {
        tracing::error!("{:?}", err);
        eprintln!("Error: {}", format_okta_error(&err));
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let mut config = Config::load();
    let format = args.format.or(config.format).unwrap_or_default();
    let on_error: ErrorPolicy = args.on_error.into();

    let doc = match &args.command {
        Command::Moved { input } => {
            let content = fs::read_to_string(input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            generators::moved::generate(&content)
        }
        Command::Brands {
            preview_subdomain,
            preview_org_url,
            preview_api_token,
            prod_subdomain,
            prod_org_url,
            prod_api_token,
        } => {
            let mut targets = Vec::new();
            if let Some(token) = preview_api_token {
                let org_url = preview_org_url.clone().unwrap_or_else(|| {
                    org_base_url(preview_subdomain, DomainFlag::Preview)
                });
                targets.push(EnvTarget {
                    env: "preview".to_string(),
                    client: OktaClient::new(&org_url, ApiToken::new(token))?,
                });
            }
            if let Some(token) = prod_api_token {
                let org_url = prod_org_url.clone().unwrap_or_else(|| {
                    org_base_url(
                        prod_subdomain,
                        args.domain_flag.unwrap_or_default(),
                    )
                });
                targets.push(EnvTarget {
                    env: "prod".to_string(),
                    client: OktaClient::new(&org_url, ApiToken::new(token))?,
                });
            }
            anyhow::ensure!(
                !targets.is_empty(),
                "Provide --preview-api-token and/or --prod-api-token"
            );
            generators::brands::generate(&targets, &BrandsOptions { on_error }).await?
        }
        command => {
            let client = build_client(args, &config)?;
            match command {
                Command::Roles { group_prefix } => {
                    generators::roles::generate(
                        &client,
                        &RolesOptions {
                            group_prefix: group_prefix.clone(),
                            on_error,
                        },
                    )
                    .await?
                }
                Command::Groups { search_prefix, env } => {
                    generators::groups::generate(
                        &client,
                        &GroupsOptions {
                            search_prefix: search_prefix.clone(),
                            env: env.clone(),
                            on_error,
                        },
                    )
                    .await?
                }
                Command::GroupRules { env } => {
                    generators::group_rules::generate(
                        &client,
                        &GroupRulesOptions {
                            env: env.clone(),
                            on_error,
                        },
                    )
                    .await?
                }
                Command::Policies { kind } => {
                    generators::policies::generate(
                        &client,
                        &PoliciesOptions {
                            kind: *kind,
                            on_error,
                        },
                    )
                    .await?
                }
                Command::Brands { .. } | Command::Moved { .. } => unreachable!(),
            }
        }
    };

    write_output(&doc, format, args.output.as_deref())?;

    if config.remember(args.subdomain.as_deref(), args.domain_flag, args.format) {
        if let Err(err) = config.save() {
            tracing::debug!("Could not save config: {}", err);
        }
    }

    Ok(())
}

fn build_client(args: &Args, config: &Config) -> Result<OktaClient> {
    let org_url = if let Some(url) = &args.org_url {
        url.trim_end_matches('/').to_string()
    } else {
        let subdomain = args
            .subdomain
            .clone()
            .or_else(|| config.subdomain.clone())
            .context("Provide --org-url or --subdomain")?;
        let flag = args
            .domain_flag
            .or(config.domain_flag)
            .unwrap_or_default();
        org_base_url(&subdomain, flag)
    };
    tracing::info!("Using Okta org: {}", org_url);

    let token = ApiToken::from_flag_or_env(args.api_token.as_deref())?;
    OktaClient::new(&org_url, token)
}

fn write_output(doc: &Document, format: OutputFormat, output: Option<&std::path::Path>) -> Result<()> {
    let rendered = doc.render(format);
    match output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Configuration written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
