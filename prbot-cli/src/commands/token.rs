//! Token command - check that the service principal can authenticate

use chrono::Utc;
use prbot_azure::{AuthSession, Error};
use prbot_core::{Secrets, Settings};

use super::boundary;

/// Fetch a token and print when it expires. The token itself is not printed.
pub async fn execute(settings: &Settings) -> anyhow::Result<()> {
    let credential = Secrets::load()?.credential()?;
    let client_id = credential.client_id().to_string();
    let session = AuthSession::new(credential);

    session
        .get_token()
        .await
        .map_err(|e| boundary(Error::Auth(e)))?;

    println!("Service principal {} authenticated", client_id);
    if let Some(expires_at) = session.cached_expiry().await {
        let remaining = expires_at - Utc::now();
        println!(
            "Token expires at {} ({} minutes from now)",
            expires_at,
            remaining.num_minutes()
        );
    }
    println!("API base: {}", settings.azure_devops.api_base_url());

    Ok(())
}
