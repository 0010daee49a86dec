//! Rules command - show the review rules for a language

use clap::Args;
use prbot_core::{load_review_rules, ReviewRuleLanguage, Settings};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Language (python, sql or markdown)
    pub language: String,
}

impl RulesArgs {
    pub fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        let language: ReviewRuleLanguage = self.language.parse()?;
        let rules_dir = settings
            .review
            .rules_dir
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("review.rules_dir is not configured"))?;

        let rules = load_review_rules(rules_dir, language)?;

        println!("{} rules ({})", language, rules.len());
        for rule in &rules {
            println!("  [{:?}] {}: {}", rule.severity, rule.id, rule.title);
        }

        Ok(())
    }
}
