//! Pull request comment threads
//!
//! Review findings are posted as one thread per finding. A thread anchored
//! to a file needs a [`CommentThreadContext`]; a general remark does not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AzureDevOpsClient, IdentityRef, Result};

/// Status of a comment thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentThreadStatus {
    Unknown,
    Active,
    Fixed,
    WontFix,
    Closed,
    ByDesign,
    Pending,
}

/// Kind of comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentType {
    Unknown,
    Text,
    CodeChange,
    System,
}

/// Position in a file, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPosition {
    pub line: u32,
    pub offset: u32,
}

impl CommentPosition {
    pub fn new(line: u32, offset: u32) -> Self {
        Self { line, offset }
    }
}

/// File location a thread is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadContext {
    /// Path relative to the repository root, with a leading slash
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_file_end: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_start: Option<CommentPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_file_end: Option<CommentPosition>,
}

impl CommentThreadContext {
    /// Anchor on lines of the new (right-hand) version of `file_path`
    pub fn for_lines(file_path: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        let mut file_path = file_path.into();
        if !file_path.starts_with('/') {
            file_path.insert(0, '/');
        }
        Self {
            file_path,
            left_file_start: None,
            left_file_end: None,
            right_file_start: Some(CommentPosition::new(start_line, 1)),
            right_file_end: Some(CommentPosition::new(end_line.max(start_line), 1)),
        }
    }
}

/// A comment inside a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_type: Option<CommentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<IdentityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

impl Comment {
    /// A new top-level text comment
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            comment_type: Some(CommentType::Text),
            parent_comment_id: None,
            id: None,
            author: None,
            published_date: None,
            is_deleted: None,
        }
    }
}

/// A comment thread on a pull request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CommentThreadStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_context: Option<CommentThreadContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateThreadRequest<'a> {
    comments: &'a [Comment],
    status: CommentThreadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_context: Option<&'a CommentThreadContext>,
}

impl AzureDevOpsClient {
    /// Open a new active thread on a pull request
    pub async fn create_pull_request_thread(
        &self,
        repository_id: &str,
        pull_request_id: u64,
        comments: &[Comment],
        thread_context: Option<&CommentThreadContext>,
    ) -> Result<CommentThread> {
        let request = CreateThreadRequest {
            comments,
            status: CommentThreadStatus::Active,
            thread_context,
        };

        let thread: CommentThread = self
            .post_as(
                &format!(
                    "git/repositories/{}/pullrequests/{}/threads",
                    repository_id, pull_request_id
                ),
                &request,
            )
            .await?;

        info!(
            pull_request_id,
            thread_id = ?thread.id,
            file_path = ?thread_context.map(|c| c.file_path.as_str()),
            "Created pull request thread"
        );

        Ok(thread)
    }
}
