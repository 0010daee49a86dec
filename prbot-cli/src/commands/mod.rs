//! CLI command implementations

pub mod pr;
pub mod repos;
pub mod rules;
pub mod secrets;
pub mod token;
pub mod webhook;

use std::sync::Arc;

use prbot_azure::{AuthSession, AzureDevOpsClient};
use prbot_core::{Secrets, Settings};

pub use pr::PrArgs;
pub use rules::RulesArgs;
pub use secrets::SecretsArgs;
pub use webhook::WebhookArgs;

/// Build the authenticated client from settings and secrets
pub(crate) fn connect(settings: &Settings) -> anyhow::Result<AzureDevOpsClient> {
    let credential = Secrets::load()?.credential()?;
    let session = Arc::new(AuthSession::new(credential));
    AzureDevOpsClient::new(&settings.azure_devops, session).map_err(boundary)
}

/// Surface an Azure DevOps error the way the webhook endpoint reports it
pub(crate) fn boundary(err: prbot_azure::Error) -> anyhow::Error {
    // auth and permission messages don't name the endpoint
    if let prbot_azure::Error::Api(api) = &err {
        tracing::warn!(
            endpoint = api.endpoint(),
            status = api.status_code(),
            "Azure DevOps call failed"
        );
    }
    anyhow::anyhow!("[{}] {}", err.status_code(), err)
}

/// Print the effective configuration; secrets are never shown
pub fn show_config(settings: &Settings) {
    let ado = &settings.azure_devops;

    println!("PRBot Configuration");
    println!("===================");
    println!();
    println!("Azure DevOps:");
    println!("  organization: {}", or_unset(&ado.organization));
    println!("  project: {}", or_unset(&ado.project));
    println!("  host: {}", ado.host);
    println!("  api base: {}", ado.api_base_url());
    println!();
    println!("Review:");
    println!(
        "  rules_dir: {}",
        settings
            .review
            .rules_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!(
        "  deployment_env: {}",
        settings.review.deployment_env.as_deref().unwrap_or("(not set)")
    );
    println!();

    if let Some(path) = Settings::default_config_path() {
        println!("Config file: {}", path.display());
        if path.exists() {
            println!("  (exists)");
        } else {
            println!("  (not found - using defaults)");
        }
    }
    if let Some(path) = Secrets::default_secrets_path() {
        println!("Secrets file: {}", path.display());
        if !path.exists() {
            println!("  (not found - run `prbot secrets init`)");
        }
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
