//! Error types for Azure DevOps operations

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for Azure DevOps operations
pub type Result<T> = std::result::Result<T, Error>;

/// Classified failure of a single REST call
///
/// Messages never contain the bearer token.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 404 from the API
    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    /// 401 from the API
    #[error("Authentication failed - check service principal credentials")]
    AuthenticationFailed { endpoint: String },

    /// 403 from the API
    #[error("Access denied - check service principal permissions")]
    AccessDenied { endpoint: String },

    /// Any other non-2xx status
    #[error("Azure DevOps API error ({endpoint}): {status}")]
    Upstream { status: u16, endpoint: String },

    /// The request did not complete within the timeout
    #[error("Azure DevOps API timeout for {endpoint}")]
    Timeout { endpoint: String },

    /// Transport or decoding failure
    #[error("Error with {endpoint}: {message}")]
    Unexpected { endpoint: String, message: String },
}

impl ApiError {
    /// Classify a non-success status code
    pub fn from_status(status: StatusCode, endpoint: &str) -> Self {
        let endpoint = endpoint.to_string();
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound { endpoint },
            StatusCode::UNAUTHORIZED => ApiError::AuthenticationFailed { endpoint },
            StatusCode::FORBIDDEN => ApiError::AccessDenied { endpoint },
            other => ApiError::Upstream {
                status: other.as_u16(),
                endpoint,
            },
        }
    }

    /// Classify a transport-level failure
    pub fn from_transport(err: &reqwest::Error, endpoint: &str) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ApiError::Unexpected {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// Endpoint the failed call was made to
    pub fn endpoint(&self) -> &str {
        match self {
            ApiError::NotFound { endpoint }
            | ApiError::AuthenticationFailed { endpoint }
            | ApiError::AccessDenied { endpoint }
            | ApiError::Upstream { endpoint, .. }
            | ApiError::Timeout { endpoint }
            | ApiError::Unexpected { endpoint, .. } => endpoint,
        }
    }

    /// HTTP status to surface to callers of the bot
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound { .. } => 404,
            ApiError::AuthenticationFailed { .. } => 401,
            ApiError::AccessDenied { .. } => 403,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Timeout { .. } => 504,
            ApiError::Unexpected { .. } => 500,
        }
    }
}

/// Failure to obtain an access token from the identity provider
#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider rejected the credential
    #[error("token request rejected ({status}): {description}")]
    Rejected { status: u16, description: String },

    /// The identity provider could not be reached
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The identity provider answered with something unusable
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Errors that can occur during Azure DevOps operations
#[derive(Error, Debug)]
pub enum Error {
    /// REST call failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Token refresh failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Response body did not match the expected model
    #[error("Parse error: {0}")]
    Parse(String),

    /// Webhook payload is unusable
    #[error("Invalid webhook event: {0}")]
    Webhook(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status a webhook surface would answer with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Api(e) => e.status_code(),
            Error::Auth(_) => 401,
            Error::Webhook(_) => 422,
            Error::Parse(_) | Error::Config(_) => 500,
        }
    }
}

impl From<prbot_core::Error> for Error {
    fn from(err: prbot_core::Error) -> Self {
        Error::Config(err.to_string())
    }
}
