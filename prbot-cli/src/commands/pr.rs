//! Pull request commands

use clap::{Args, Subcommand};
use prbot_azure::{Comment, CommentThreadContext};
use prbot_core::Settings;

use super::{boundary, connect};

/// Pull request commands
#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// Show pull request details
    Show {
        /// Pull request ID
        id: u64,
    },

    /// List files changed between two branches
    Diff {
        /// Repository ID or name
        repo: String,

        /// Base branch
        base: String,

        /// Target branch
        target: String,
    },

    /// Open a comment thread on a pull request
    Comment {
        /// Repository ID or name
        repo: String,

        /// Pull request ID
        id: u64,

        /// Comment text
        text: String,

        /// Anchor the thread to this file
        #[arg(short, long)]
        file: Option<String>,

        /// Line in the file (defaults to 1)
        #[arg(short, long, requires = "file")]
        line: Option<u32>,
    },
}

impl PrArgs {
    /// Execute the pull request command
    pub async fn execute(&self, settings: &Settings, verbose: bool) -> anyhow::Result<()> {
        let client = connect(settings)?;

        match &self.command {
            PrCommand::Show { id } => {
                let pr = client.get_pull_request(*id).await.map_err(boundary)?;

                println!("#{} {}", pr.pull_request_id, pr.title);
                println!("  {} -> {}", pr.source_branch(), pr.target_branch());
                println!("  status: {:?}", pr.status);
                println!(
                    "  author: {}",
                    pr.created_by
                        .display_name
                        .as_deref()
                        .unwrap_or(&pr.created_by.id)
                );
                println!("  repository: {}", pr.repository.name);
                if verbose {
                    println!("  created: {}", pr.creation_date);
                    if let Some(description) = &pr.description {
                        println!();
                        println!("{}", description);
                    }
                }
            }

            PrCommand::Diff { repo, base, target } => {
                let diffs = client
                    .get_commit_diffs(repo, base, target)
                    .await
                    .map_err(boundary)?;

                println!(
                    "{} commits ahead, {} behind (common: {})",
                    diffs.ahead_count, diffs.behind_count, diffs.common_commit
                );
                for (path, change_type) in diffs.changed_files() {
                    println!("  {:<8} {}", change_type.unwrap_or("?"), path);
                }
            }

            PrCommand::Comment {
                repo,
                id,
                text,
                file,
                line,
            } => {
                let context = file.as_ref().map(|path| {
                    let line = line.unwrap_or(1);
                    CommentThreadContext::for_lines(path.as_str(), line, line)
                });

                let comments = [Comment::text(text.as_str())];
                let thread = client
                    .create_pull_request_thread(repo, *id, &comments, context.as_ref())
                    .await
                    .map_err(boundary)?;

                match thread.id {
                    Some(thread_id) => println!("Created thread {} on #{}", thread_id, id),
                    None => println!("Created thread on #{}", id),
                }
            }
        }

        Ok(())
    }
}
