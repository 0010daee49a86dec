//! Entra ID client-credentials token source

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use prbot_core::Credential;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::{AccessToken, TokenSource};
use crate::AuthError;

/// Public-cloud Entra ID authority
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const TOKEN_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Token source for a service principal with a client secret
///
/// The credential is passed in directly; nothing is read from or written to
/// the process environment.
pub struct ClientSecretCredential {
    credential: Credential,
    authority_host: String,
    http: reqwest::Client,
}

impl ClientSecretCredential {
    /// Create a token source for `credential` against the public cloud
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Use a different authority host
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.credential.tenant_id()
        )
    }
}

#[async_trait]
impl TokenSource for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
        debug!(
            tenant_id = %self.credential.tenant_id(),
            client_id = %self.credential.client_id(),
            scope,
            "Requesting client-credentials token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credential.client_id()),
            ("client_secret", self.credential.client_secret().expose_secret().as_str()),
            ("scope", scope),
        ];

        let issued_at = Utc::now();
        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let description = match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(TokenErrorResponse {
                    error_description: Some(description),
                    ..
                }) => description,
                Ok(TokenErrorResponse {
                    error: Some(error), ..
                }) => error,
                _ => text,
            };
            warn!(status = status.as_u16(), "Identity provider rejected token request");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                description,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if body.expires_in <= 0 {
            return Err(AuthError::InvalidResponse(format!(
                "token lifetime must be positive, got {}s",
                body.expires_in
            )));
        }

        let expires_at = Duration::try_seconds(body.expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!(
                    "token lifetime out of range: {}s",
                    body.expires_in
                ))
            })?;

        Ok(AccessToken::new(SecretString::new(body.access_token), expires_at))
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.credential.tenant_id())
            .field("client_id", &self.credential.client_id())
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}
