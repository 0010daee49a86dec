//! PRBot CLI - Command line interface for the Azure DevOps PR review bot
//!
//! Operator entry point: inspect configuration, check the service principal,
//! and exercise the Azure DevOps calls the reviewers rely on.

mod commands;

use clap::{Parser, Subcommand};
use prbot_core::Settings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PrArgs, RulesArgs, SecretsArgs, WebhookArgs};

/// PRBot: automated pull request reviews for Azure DevOps
#[derive(Parser, Debug)]
#[command(name = "prbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Azure DevOps organization (overrides config and env)
    #[arg(long, global = true, env = "PR_APP_ORGANIZATION")]
    organization: Option<String>,

    /// Azure DevOps project (overrides config and env)
    #[arg(long, global = true, env = "PR_APP_PROJECT")]
    project: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Show current configuration
    Config,

    /// Fetch an access token for the service principal and show its expiry
    Token,

    /// List repositories in the project
    Repos,

    /// Inspect and comment on pull requests
    Pr(PrArgs),

    /// Decode a service hook payload
    Webhook(WebhookArgs),

    /// Show review rules for a language
    Rules(RulesArgs),

    /// Manage the secrets file
    Secrets(SecretsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let settings = Settings::load_with_overrides(cli.organization.clone(), cli.project.clone())?;

    if cli.verbose {
        tracing::info!(
            organization = %settings.azure_devops.organization,
            project = %settings.azure_devops.project,
            deployment_env = ?settings.review.deployment_env,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("prbot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => commands::show_config(&settings),
        Some(Commands::Token) => commands::token::execute(&settings).await?,
        Some(Commands::Repos) => commands::repos::execute(&settings, cli.verbose).await?,
        Some(Commands::Pr(args)) => args.execute(&settings, cli.verbose).await?,
        Some(Commands::Webhook(args)) => args.execute(&settings).await?,
        Some(Commands::Rules(args)) => args.execute(&settings)?,
        Some(Commands::Secrets(args)) => args.execute()?,
        None => {
            println!("PRBot - automated pull request reviews for Azure DevOps");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
