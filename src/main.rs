use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use aws_saml_login::config::{self, ProfileConfig};
use aws_saml_login::identity_provider::{AssertionSource, CachedResponse, FileSource};
use aws_saml_login::sts::{resolve_aliases, CredentialExchange, IamAliasLookup, StsExchange};
use aws_saml_login::{aws, login, saml, ui, SamlAssertion};

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_DURATION_SECONDS: i32 = 3600;

/// Acquire temporary AWS credentials via SAML v2 federation
#[derive(Parser)]
#[command(name = "aws-saml-login", version)]
struct Cli {
    /// AWS profile to read configuration from and save credentials to
    #[arg(short, long, default_value = "default")]
    profile: String,

    /// Role ARN to assume (overrides the configured default)
    #[arg(short, long)]
    role_arn: Option<String>,

    /// Session duration in seconds
    #[arg(short, long)]
    duration_seconds: Option<i32>,

    /// File containing the base64-encoded SAML response captured by the
    /// browser driver
    #[arg(short, long)]
    assertion_file: Option<PathBuf>,

    /// Select the target role interactively, with account aliases
    #[arg(short, long)]
    select_role: bool,

    /// Print the resolved profile configuration and exit
    #[arg(long)]
    show_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let profile_config = ProfileConfig::load(&config::aws_config_path()?, &cli.profile)?;
    log::debug!("loaded configuration:\n{profile_config}");

    if cli.show_config {
        println!("{profile_config}");
        return Ok(());
    }

    let source: Box<dyn AssertionSource> = match &cli.assertion_file {
        Some(path) => Box::new(FileSource::new(path.clone())),
        None => Box::new(CachedResponse::new(profile_config.bg_response.clone())),
    };
    let raw_assertion = source.raw_assertion()?;

    if !saml::validate(&raw_assertion) {
        bail!("SAML assertion is malformed or outside its validity window; rerun the login flow");
    }
    let assertion = SamlAssertion::from_encoded(&raw_assertion)?;

    let region = if profile_config.region.is_empty() {
        DEFAULT_REGION.to_string()
    } else {
        profile_config.region.clone()
    };
    let duration_seconds = resolve_duration(
        cli.duration_seconds,
        profile_config.duration,
        assertion.session_duration()?,
    );

    let exchange = StsExchange::new(&region, duration_seconds).await;

    let target_role_arn = cli
        .role_arn
        .clone()
        .or_else(|| (!profile_config.role_arn.is_empty()).then(|| profile_config.role_arn.clone()));

    let credentials = match target_role_arn {
        Some(role_arn) if !cli.select_role => {
            login::exchange_for_role(&raw_assertion, &role_arn, &exchange).await?
        }
        _ => {
            if !cli.select_role && !profile_config.ask_role {
                bail!("no role ARN configured; pass --role-arn or set google_config.role_arn");
            }
            let roles = aws::parse_roles(&assertion)?;
            let lookup = IamAliasLookup::new(&region);
            let roles = resolve_aliases(roles, &assertion, &exchange, &lookup).await?;
            let role = ui::select_role(&roles)?;
            exchange.assume_role(&assertion, role).await?
        }
    };

    let credentials_path = config::aws_credentials_path()?;
    config::persist_credentials(&credentials_path, &cli.profile, &credentials)?;
    println!(
        "Temporary AWS credentials have been saved to {}",
        credentials_path.display()
    );

    Ok(())
}

/// Flag, then profile config, then the assertion's SessionDuration attribute,
/// then the default. A configured value outside the `i32` range is skipped
/// rather than wrapped; range enforcement beyond that is STS's job.
fn resolve_duration(
    flag: Option<i32>,
    configured: Option<i64>,
    assertion_attr: Option<i32>,
) -> i32 {
    flag.or_else(|| configured.and_then(|d| i32::try_from(d).ok()))
        .or(assertion_attr)
        .unwrap_or(DEFAULT_DURATION_SECONDS)
}
