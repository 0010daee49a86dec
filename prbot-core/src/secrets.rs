//! Secrets management for the PR review bot
//!
//! The service principal used to call Azure DevOps is stored separately from
//! the settings so it is never shared by accident. The secrets file lives at
//! `~/.config/prbot/secrets.toml` and must have restrictive permissions
//! (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (PR_APP_AZURE_TENANT_ID, PR_APP_AZURE_CLIENT_ID,
//!    PR_APP_AZURE_CLIENT_SECRET)
//! 2. Secrets file (~/.config/prbot/secrets.toml)

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Entra ID service principal used to obtain Azure DevOps tokens
///
/// Immutable once built. The secret is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Credential {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
}

impl Credential {
    /// Create a credential from its three parts
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret,
        }
    }

    /// Tenant ID of the app registration
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Client ID of the app registration
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Client secret of the app registration
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }
}

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Secrets {
    /// Azure service principal
    pub azure: AzureSecrets,
}

/// Azure app registration secrets
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AzureSecrets {
    /// Tenant ID for the Entra ID app registration
    pub tenant_id: Option<String>,
    /// Client ID for the Entra ID app registration
    pub client_id: Option<String>,
    /// Client secret for the Entra ID app registration
    pub client_secret: Option<SecretString>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();

            // group or other bits set
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        // Trim whitespace from every part
        for value in [&mut secrets.azure.tenant_id, &mut secrets.azure.client_id]
            .into_iter()
            .flatten()
        {
            *value = value.trim().to_string();
        }
        if let Some(secret) = secrets.azure.client_secret.take() {
            secrets.azure.client_secret =
                Some(SecretString::new(secret.expose_secret().trim().to_string()));
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/prbot/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prbot").join("secrets.toml"))
    }

    /// Build the service principal credential
    ///
    /// Priority: PR_APP_AZURE_* env vars > secrets file. All three parts must
    /// be present and non-empty.
    pub fn credential(&self) -> Result<Credential> {
        self.credential_with(|name| std::env::var(name).ok())
    }

    fn credential_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credential> {
        let pick = |env_name: &str, from_file: Option<&str>| -> Option<String> {
            // Check environment variable first
            if let Some(value) = lookup(env_name) {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    debug!(variable = env_name, "Using credential part from environment");
                    return Some(value);
                }
            }
            // Fall back to secrets file
            from_file
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let tenant_id = pick("PR_APP_AZURE_TENANT_ID", self.azure.tenant_id.as_deref());
        let client_id = pick("PR_APP_AZURE_CLIENT_ID", self.azure.client_id.as_deref());
        let client_secret = pick(
            "PR_APP_AZURE_CLIENT_SECRET",
            self.azure
                .client_secret
                .as_ref()
                .map(|s| s.expose_secret().as_str()),
        );

        match (tenant_id, client_id, client_secret) {
            (Some(tenant), Some(client), Some(secret)) => {
                Ok(Credential::new(tenant, client, SecretString::new(secret)))
            }
            (tenant, client, secret) => {
                let missing: Vec<&str> = [
                    (tenant.is_none(), "tenant_id"),
                    (client.is_none(), "client_id"),
                    (secret.is_none(), "client_secret"),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();

                Err(Error::Config(format!(
                    "Azure service principal incomplete, missing: {}. Set PR_APP_AZURE_* \
                     environment variables or fill in ~/.config/prbot/secrets.toml",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::create_template_at(&path)?;
        Ok(path)
    }

    fn create_template_at(path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# PRBot Secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[azure]
# Entra ID app registration with access to the Azure DevOps organization
tenant_id = ""
client_id = ""
client_secret = ""
"#;

        std::fs::write(path, template)?;

        // Owner-only, or load_from_file refuses it
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your credentials");

        Ok(())
    }
}
