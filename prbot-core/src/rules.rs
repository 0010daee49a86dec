//! Review rules handed to the language-specific reviewers
//!
//! Rules live in one JSON file per language, named `<language>_rules.json`,
//! inside the configured rules directory.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Languages that have a dedicated reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRuleLanguage {
    Python,
    Sql,
    Markdown,
}

impl ReviewRuleLanguage {
    /// Lowercase name used in rule file names
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewRuleLanguage::Python => "python",
            ReviewRuleLanguage::Sql => "sql",
            ReviewRuleLanguage::Markdown => "markdown",
        }
    }

    /// Name of the rules file for this language
    pub fn rules_file_name(&self) -> String {
        format!("{}_rules.json", self.as_str())
    }
}

impl fmt::Display for ReviewRuleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewRuleLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(ReviewRuleLanguage::Python),
            "sql" => Ok(ReviewRuleLanguage::Sql),
            "markdown" | "md" => Ok(ReviewRuleLanguage::Markdown),
            other => Err(Error::Rules(format!("Unsupported review language: {}", other))),
        }
    }
}

/// Relative importance of a rule. Critical > Error > Warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRuleSeverity {
    Critical,
    Error,
    Warning,
    Generic,
    Declined,
}

/// A single review rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRule {
    /// Unique identifier, e.g. `SEC001`
    pub id: String,
    /// Short title used for display
    pub title: String,
    /// What the rule checks
    pub description: String,
    /// How important a violation is
    pub severity: ReviewRuleSeverity,
    /// Patterns that hint at a violation
    pub code_smells: Vec<String>,
    /// Extra instructions for evaluating the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_instructions: Option<String>,
}

/// Load the review rules for `language` from `rules_dir`
pub fn load_review_rules(rules_dir: &Path, language: ReviewRuleLanguage) -> Result<Vec<ReviewRule>> {
    let rules_file = rules_dir.join(language.rules_file_name());

    if !rules_file.exists() {
        return Err(Error::Rules(format!(
            "No review rules found for language: {}",
            language
        )));
    }

    let rules: Vec<ReviewRule> = std::fs::read_to_string(&rules_file)
        .map_err(Error::from)
        .and_then(|contents| serde_json::from_str(&contents).map_err(Error::from))
        .map_err(|e| Error::Rules(format!("Error loading rules for {}: {}", language, e)))?;

    debug!(language = %language, count = rules.len(), path = %rules_file.display(), "Loaded review rules");

    Ok(rules)
}
