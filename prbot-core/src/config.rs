//! Settings for the PR review bot
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PR_APP_*)
//! 3. Config file (~/.config/prbot/config.toml)
//! 4. Default values
//!
//! Credentials are not part of the settings; see [`crate::secrets`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default Azure DevOps host
pub const DEFAULT_HOST: &str = "dev.azure.com";

/// Azure DevOps organization/project settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AzureDevOpsConfig {
    /// Name of the Azure DevOps organization
    pub organization: String,

    /// Name of the Azure DevOps project
    pub project: String,

    /// Host serving the REST API
    pub host: String,
}

impl Default for AzureDevOpsConfig {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl AzureDevOpsConfig {
    /// Base URL of the project-scoped REST API, always ending in `/_apis/`
    pub fn api_base_url(&self) -> String {
        format!(
            "https://{}/{}/{}/_apis/",
            self.host, self.organization, self.project
        )
    }

    /// Fail early when organization or project are missing
    pub fn validate(&self) -> Result<()> {
        if self.organization.trim().is_empty() {
            return Err(Error::Config(
                "Azure DevOps organization is not set. Set PR_APP_ORGANIZATION \
                 or [azure_devops].organization in config.toml"
                    .to_string(),
            ));
        }
        if self.project.trim().is_empty() {
            return Err(Error::Config(
                "Azure DevOps project is not set. Set PR_APP_PROJECT \
                 or [azure_devops].project in config.toml"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Review-related settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Directory containing `<language>_rules.json` files
    pub rules_dir: Option<PathBuf>,

    /// Deployment environment reported in logs
    pub deployment_env: Option<String>,
}

/// Root settings structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Azure DevOps settings
    pub azure_devops: AzureDevOpsConfig,

    /// Review settings
    pub review: ReviewConfig,
}

impl Settings {
    /// Load settings from the default config file location
    ///
    /// Returns default settings if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/prbot/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("prbot").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PR_APP_ORGANIZATION
    /// - PR_APP_PROJECT
    /// - PR_APP_HOST
    /// - PR_APP_RULES_DIR
    /// - PR_APP_DEPLOYMENT_ENV
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(organization) = lookup("PR_APP_ORGANIZATION") {
            self.azure_devops.organization = organization;
        }
        if let Some(project) = lookup("PR_APP_PROJECT") {
            self.azure_devops.project = project;
        }
        if let Some(host) = lookup("PR_APP_HOST") {
            self.azure_devops.host = host;
        }
        // Review settings
        if let Some(dir) = lookup("PR_APP_RULES_DIR") {
            self.review.rules_dir = Some(PathBuf::from(dir));
        }
        if let Some(env) = lookup("PR_APP_DEPLOYMENT_ENV") {
            self.review.deployment_env = Some(env);
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        organization: Option<String>,
        project: Option<String>,
    ) -> Self {
        if let Some(org) = organization {
            self.azure_devops.organization = org;
        }

        if let Some(p) = project {
            self.azure_devops.project = p;
        }

        self
    }

    /// Load settings with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        organization: Option<String>,
        project: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(organization, project))
    }
}
