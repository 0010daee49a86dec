//! PRBot Azure - Azure DevOps access for the PR review bot
//!
//! This crate obtains and caches Entra ID access tokens for a service
//! principal, issues authenticated REST calls against a single Azure DevOps
//! project, and classifies every failure into a small set of error kinds.
//! Typed wrappers cover the endpoints the reviewers use: pull requests,
//! repositories, diffs, file contents and comment threads.

mod auth;
mod client;
mod credential;
mod error;
mod git;
mod models;
mod pull_requests;
mod threads;
mod webhook;

pub use auth::{AccessToken, AuthSession, CachedToken, TokenSource, AZURE_DEVOPS_SCOPE};
pub use client::{AzureDevOpsClient, API_VERSION, REQUEST_TIMEOUT};
pub use credential::{ClientSecretCredential, DEFAULT_AUTHORITY_HOST};
pub use error::{ApiError, AuthError, Error, Result};
pub use git::{GitChange, GitCommitDiffs, GitItem, GitVersionType};
pub use models::{GitRepository, GitRepositoryList, IdentityRef, TeamProjectReference};
pub use pull_requests::{GitPullRequest, PullRequestStatus};
pub use threads::{
    Comment, CommentPosition, CommentThread, CommentThreadContext, CommentThreadStatus,
    CommentType,
};
pub use webhook::{WebhookEvent, WebhookPullRequest, PULL_REQUEST_CREATED};
