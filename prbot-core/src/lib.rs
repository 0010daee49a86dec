//! PRBot Core - shared configuration for the Azure DevOps PR review bot
//!
//! This crate holds the pieces every other crate needs: the settings that
//! say which organization and project to talk to, the service principal
//! secrets used to obtain tokens, and the per-language review rules handed
//! to reviewers.

pub mod config;
pub mod error;
pub mod rules;
pub mod secrets;

pub use config::{AzureDevOpsConfig, ReviewConfig, Settings};
pub use error::{Error, Result};
pub use rules::{load_review_rules, ReviewRule, ReviewRuleLanguage, ReviewRuleSeverity};
pub use secrets::{AzureSecrets, Credential, Secrets};
