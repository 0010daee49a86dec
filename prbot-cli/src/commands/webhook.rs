//! Webhook command - replay a saved service hook payload

use std::path::PathBuf;

use clap::Args;
use prbot_azure::WebhookEvent;
use prbot_core::Settings;
use tracing::info;

use super::{boundary, connect};

/// Decode a service hook payload and look up its pull request
#[derive(Args, Debug)]
pub struct WebhookArgs {
    /// Path to the JSON body of the service hook request
    pub path: PathBuf,
}

impl WebhookArgs {
    pub async fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        let body = std::fs::read(&self.path)?;
        let event = WebhookEvent::from_slice(&body).map_err(boundary)?;

        if !event.is_pull_request_created() {
            println!("Ignoring event of type {}", event.event_type);
            return Ok(());
        }

        let pull_request_id = event.pull_request_id().map_err(boundary)?;
        info!(pull_request_id, "Received pull request created event");

        let client = connect(settings)?;
        let pr = client
            .get_pull_request(pull_request_id)
            .await
            .map_err(boundary)?;

        println!("#{} {}", pr.pull_request_id, pr.title);
        println!("  repository: {}", pr.repository.name);
        println!("  {} -> {}", pr.source_branch(), pr.target_branch());

        Ok(())
    }
}
