//! Secrets command - manage the service principal secrets file

use clap::{Args, Subcommand};
use prbot_core::Secrets;

#[derive(Args, Debug)]
pub struct SecretsArgs {
    #[command(subcommand)]
    pub command: SecretsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommand {
    /// Write a template secrets file with owner-only permissions
    Init,
}

impl SecretsArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self.command {
            SecretsCommand::Init => {
                let path = Secrets::create_template()?;
                println!("Created {}", path.display());
                println!("Fill in tenant_id, client_id and client_secret under [azure].");
            }
        }
        Ok(())
    }
}
