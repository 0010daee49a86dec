//! Repository contents and diffs

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AzureDevOpsClient, Result};

/// How a version descriptor should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitVersionType {
    Branch,
    Tag,
    Commit,
}

impl GitVersionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitVersionType::Branch => "branch",
            GitVersionType::Tag => "tag",
            GitVersionType::Commit => "commit",
        }
    }
}

impl fmt::Display for GitVersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file or folder in a repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// `blob`, `tree` or `commit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// File content, only present when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_folder: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// One changed item between two versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<u64>,
    /// Azure DevOps may combine flags here, e.g. `edit, rename`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<GitItem>,
}

/// Differences between a base and a target version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommitDiffs {
    pub ahead_count: u64,
    pub behind_count: u64,
    #[serde(default)]
    pub change_counts: HashMap<String, u64>,
    #[serde(default)]
    pub changes: Vec<GitChange>,
    pub common_commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_changes_included: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_commit: Option<String>,
}

impl GitCommitDiffs {
    /// Paths of changed files, skipping folders
    pub fn changed_files(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.changes.iter().filter_map(|change| {
            let item = change.item.as_ref()?;
            if item.is_folder.unwrap_or(false) || item.git_object_type.as_deref() == Some("tree") {
                return None;
            }
            Some((item.path.as_deref()?, change.change_type.as_deref()))
        })
    }
}

impl AzureDevOpsClient {
    /// Diff between two branches of a repository
    pub async fn get_commit_diffs(
        &self,
        repository_id: &str,
        base_version: &str,
        target_version: &str,
    ) -> Result<GitCommitDiffs> {
        debug!(repository_id, base_version, target_version, "Fetching diffs");
        self.get_as(
            &format!("git/repositories/{}/diffs/commits", repository_id),
            &[
                ("baseVersion", base_version),
                ("targetVersion", target_version),
            ],
        )
        .await
    }

    /// Get a single file or folder at a given version
    pub async fn get_item(
        &self,
        repository_id: &str,
        path: &str,
        version: &str,
        version_type: GitVersionType,
        include_content: bool,
    ) -> Result<GitItem> {
        debug!(repository_id, path, version, %version_type, "Fetching item");
        let include_content = if include_content { "true" } else { "false" };
        self.get_as(
            &format!("git/repositories/{}/items", repository_id),
            &[
                ("path", path),
                ("versionDescriptor.version", version),
                ("versionDescriptor.versionType", version_type.as_str()),
                ("includeContent", include_content),
            ],
        )
        .await
    }
}
