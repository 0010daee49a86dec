//! Pull request retrieval

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AzureDevOpsClient, GitRepository, IdentityRef, Result};

/// Status of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PullRequestStatus {
    NotSet,
    Active,
    Abandoned,
    Completed,
    All,
}

/// A pull request, trimmed to the fields the reviewers use
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitPullRequest {
    pub pull_request_id: u64,
    pub repository: GitRepository,
    /// Source branch, e.g. `refs/heads/feature/login`
    pub source_ref_name: String,
    /// Target branch, e.g. `refs/heads/main`
    pub target_ref_name: String,
    pub status: PullRequestStatus,
    pub created_by: IdentityRef,
    pub creation_date: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl GitPullRequest {
    /// Source branch without the `refs/heads/` prefix
    pub fn source_branch(&self) -> &str {
        strip_heads(&self.source_ref_name)
    }

    /// Target branch without the `refs/heads/` prefix
    pub fn target_branch(&self) -> &str {
        strip_heads(&self.target_ref_name)
    }
}

fn strip_heads(ref_name: &str) -> &str {
    ref_name.strip_prefix("refs/heads/").unwrap_or(ref_name)
}

impl AzureDevOpsClient {
    /// Get a pull request by ID
    pub async fn get_pull_request(&self, pull_request_id: u64) -> Result<GitPullRequest> {
        debug!(pull_request_id, "Fetching pull request");
        self.get_as(&format!("git/pullrequests/{}", pull_request_id), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{api_version, client_for, BASE_PATH};
    use crate::{ApiError, Error};

    const PULL_REQUEST_JSON: &str = r#"{
        "pullRequestId": 42,
        "repository": {"id": "r1", "name": "webshop"},
        "sourceRefName": "refs/heads/feature/login",
        "targetRefName": "refs/heads/main",
        "status": "active",
        "createdBy": {"id": "u1", "displayName": "Jamie Doe"},
        "creationDate": "2025-03-01T10:15:00Z",
        "title": "Add login form",
        "isDraft": false,
        "mergeStatus": "succeeded"
    }"#;

    #[test]
    fn test_parse_pull_request() {
        let pr: GitPullRequest = serde_json::from_str(PULL_REQUEST_JSON).unwrap();
        assert_eq!(pr.pull_request_id, 42);
        assert_eq!(pr.status, PullRequestStatus::Active);
        assert_eq!(pr.source_branch(), "feature/login");
        assert_eq!(pr.target_branch(), "main");
        assert!(pr.description.is_none());
    }

    #[tokio::test]
    async fn test_get_pull_request() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", format!("{}/git/pullrequests/42", BASE_PATH).as_str())
            .match_query(api_version())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PULL_REQUEST_JSON)
            .create_async()
            .await;

        let pr = client_for(&server).get_pull_request(42).await.unwrap();

        assert_eq!(pr.title, "Add login form");
        assert_eq!(pr.created_by.display_name.as_deref(), Some("Jamie Doe"));
    }

    #[tokio::test]
    async fn test_get_pull_request_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", format!("{}/git/pullrequests/7", BASE_PATH).as_str())
            .match_query(api_version())
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server).get_pull_request(7).await.unwrap_err();

        assert!(matches!(err, Error::Api(ApiError::NotFound { .. })));
        assert_eq!(err.to_string(), "git/pullrequests/7 not found");
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", format!("{}/git/pullrequests/42", BASE_PATH).as_str())
            .match_query(api_version())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"pullRequestId": 42}"#)
            .create_async()
            .await;

        let err = client_for(&server).get_pull_request(42).await.unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
    }
}
