//! Azure DevOps service hook payloads
//!
//! Only the fields needed to start a review are modelled; everything else in
//! the envelope is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, GitRepository, Result};

/// Event type sent when a pull request is opened
pub const PULL_REQUEST_CREATED: &str = "git.pullrequest.created";

/// Pull request resource carried by a service hook event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPullRequest {
    #[serde(default)]
    pub pull_request_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub repository: Option<GitRepository>,
    #[serde(default)]
    pub source_ref_name: Option<String>,
    #[serde(default)]
    pub target_ref_name: Option<String>,
}

/// Service hook envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub notification_id: Option<u64>,
    pub event_type: String,
    #[serde(default)]
    pub publisher_id: Option<String>,
    #[serde(default)]
    pub resource: WebhookPullRequest,
    #[serde(default)]
    pub resource_version: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    /// Decode a raw service hook body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let event: WebhookEvent =
            serde_json::from_slice(body).map_err(|e| Error::Webhook(e.to_string()))?;
        debug!(event_type = %event.event_type, id = ?event.id, "Decoded webhook event");
        Ok(event)
    }

    /// Whether this is a pull-request-created event
    pub fn is_pull_request_created(&self) -> bool {
        self.event_type == PULL_REQUEST_CREATED
    }

    /// ID of the pull request the event is about
    pub fn pull_request_id(&self) -> Result<u64> {
        self.resource
            .pull_request_id
            .ok_or_else(|| Error::Webhook("Invalid pull request body".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = r#"{
        "subscriptionId": "00000000-0000-0000-0000-000000000000",
        "notificationId": 3,
        "id": "2ab4e3d3-b7a6-425e-92b1-5a9982c1269e",
        "eventType": "git.pullrequest.created",
        "publisherId": "tfs",
        "message": {"text": "Jamie Doe created a new pull request"},
        "detailedMessage": {"text": "..."},
        "resource": {
            "repository": {"id": "r1", "name": "webshop"},
            "pullRequestId": 42,
            "status": "active",
            "title": "Add login form",
            "sourceRefName": "refs/heads/feature/login",
            "targetRefName": "refs/heads/main"
        },
        "resourceVersion": "1.0",
        "resourceContainers": {},
        "createdDate": "2025-03-01T10:15:02Z"
    }"#;

    #[test]
    fn test_parse_created_event() {
        let event = WebhookEvent::from_slice(EVENT.as_bytes()).unwrap();
        assert!(event.is_pull_request_created());
        assert_eq!(event.pull_request_id().unwrap(), 42);
        assert_eq!(event.resource.repository.unwrap().id, "r1");
        assert_eq!(event.notification_id, Some(3));
    }

    #[test]
    fn test_missing_pull_request_id() {
        let event = WebhookEvent::from_slice(
            br#"{"eventType": "git.pullrequest.created", "resource": {"title": "x"}}"#,
        )
        .unwrap();

        let err = event.pull_request_id().unwrap_err();
        assert!(matches!(err, Error::Webhook(_)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_invalid_json() {
        let err = WebhookEvent::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, Error::Webhook(_)));
    }
}
