//! Repos command - list repositories in the configured project

use prbot_core::Settings;

use super::{boundary, connect};

pub async fn execute(settings: &Settings, verbose: bool) -> anyhow::Result<()> {
    let client = connect(settings)?;
    let repos = client.list_repositories().await.map_err(boundary)?;

    if repos.value.is_empty() {
        println!("No repositories found.");
        return Ok(());
    }

    println!("Repositories ({})", repos.count);
    for repo in &repos.value {
        let branch = repo.default_branch.as_deref().unwrap_or("-");
        println!("  {} [{}]", repo.name, branch);
        if verbose {
            println!("    id: {}", repo.id);
            if let Some(url) = &repo.web_url {
                println!("    url: {}", url);
            }
        }
    }

    Ok(())
}
