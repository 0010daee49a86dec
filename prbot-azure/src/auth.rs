//! Access token caching for the Azure DevOps service principal
//!
//! An [`AuthSession`] owns at most one [`CachedToken`]. Each call to
//! [`AuthSession::get_token`] either hands out the cached value or asks the
//! token source for a fresh one. A token is only handed out while
//! `now < expires_at - buffer`, so a long review never runs into a token that
//! expires mid-flight.
//!
//! Two callers that find the cache expired at the same time will both
//! refresh; whichever finishes last is kept. Each caller still uses the token
//! it obtained, so the only cost is an extra round-trip to the identity
//! provider.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use prbot_core::Credential;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential::{ClientSecretCredential, DEFAULT_AUTHORITY_HOST};
use crate::AuthError;

/// Permission scope of the Azure DevOps REST API
///
/// Fixed by Microsoft, see
/// <https://learn.microsoft.com/en-us/rest/api/azure/devops/tokens/>.
pub const AZURE_DEVOPS_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798/.default";

/// Default safety margin before a token's real expiry
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// Token as returned by a [`TokenSource`]
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token value
    pub token: SecretString,
    /// Absolute expiry
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new access token
    pub fn new(token: SecretString, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }
}

/// Something that can mint access tokens for a scope
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a fresh token for `scope`
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError>;
}

/// A token held by an [`AuthSession`]
#[derive(Debug, Clone)]
pub struct CachedToken {
    token: AccessToken,
}

impl CachedToken {
    /// Wrap a freshly issued token
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }

    /// Bearer token value
    pub fn value(&self) -> &SecretString {
        &self.token.token
    }

    /// Absolute expiry
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.token.expires_at
    }

    /// Whether the token is within `buffer` of expiring, or past it
    pub fn is_expired(&self, buffer: Duration) -> bool {
        self.is_expired_at(Utc::now(), buffer)
    }

    /// Same as [`CachedToken::is_expired`] against an explicit clock
    pub fn is_expired_at(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now >= self.token.expires_at - buffer
    }
}

/// Token cache for one service principal
pub struct AuthSession {
    credential: Credential,
    authority_host: String,
    source: OnceLock<Arc<dyn TokenSource>>,
    cached: RwLock<Option<CachedToken>>,
    buffer: Duration,
}

impl AuthSession {
    /// Create a session for `credential`
    ///
    /// The client-secret token source is built on the first refresh and
    /// reused afterwards.
    pub fn new(credential: Credential) -> Self {
        Self::with_source_cell(credential, OnceLock::new())
    }

    /// Create a session that refreshes through a custom token source
    pub fn with_token_source(credential: Credential, source: Arc<dyn TokenSource>) -> Self {
        Self::with_source_cell(credential, OnceLock::from(source))
    }

    fn with_source_cell(credential: Credential, source: OnceLock<Arc<dyn TokenSource>>) -> Self {
        Self {
            credential,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            source,
            cached: RwLock::new(None),
            buffer: Duration::seconds(DEFAULT_EXPIRY_BUFFER_SECS),
        }
    }

    /// Use a different identity provider host (e.g. a sovereign cloud)
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    /// Change the safety margin applied before a token's expiry
    pub fn with_buffer(mut self, buffer: Duration) -> Self {
        self.buffer = buffer;
        self
    }

    /// Return a usable bearer token, refreshing it if needed
    ///
    /// Refresh failures are returned unchanged; there is no retry.
    pub async fn get_token(&self) -> Result<SecretString, AuthError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if !cached.is_expired(self.buffer) {
                debug!("Using cached Azure DevOps access token");
                return Ok(cached.value().clone());
            }
        }

        info!("Cached token missing or expired, fetching new token");
        let fresh = self.refresh_token().await?;
        let value = fresh.value().clone();
        *self.cached.write().await = Some(fresh);
        Ok(value)
    }

    /// Authorization header for the Azure DevOps REST API
    pub async fn auth_headers(&self) -> Result<HeaderMap, AuthError> {
        let token = self.get_token().await?;

        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| {
                AuthError::InvalidResponse("token contains invalid header characters".to_string())
            })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Expiry of the cached token, if any
    pub async fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.cached.read().await.as_ref().map(CachedToken::expires_at)
    }

    async fn refresh_token(&self) -> Result<CachedToken, AuthError> {
        // built on first use, then shared by every later refresh
        let source = self.source.get_or_init(|| {
            let credential: Arc<dyn TokenSource> = Arc::new(
                ClientSecretCredential::new(self.credential.clone())
                    .with_authority_host(self.authority_host.clone()),
            );
            credential
        });

        let token = source.get_token(AZURE_DEVOPS_SCOPE).await?;
        info!(expiry_timestamp = %token.expires_at, "Azure DevOps token retrieved");

        Ok(CachedToken::new(token))
    }

    #[cfg(test)]
    pub(crate) async fn set_cached(&self, token: CachedToken) {
        *self.cached.write().await = Some(token);
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("client_id", &self.credential.client_id())
            .field("authority_host", &self.authority_host)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub(crate) fn dummy_credential() -> Credential {
        Credential::new(
            "tenant-123",
            "client-123",
            SecretString::new("secret-123".to_string()),
        )
    }

    pub(crate) fn token(value: &str, expires_in_secs: i64) -> AccessToken {
        AccessToken::new(
            SecretString::new(value.to_string()),
            Utc::now() + Duration::seconds(expires_in_secs),
        )
    }

    /// Hands out `<prefix>-<n>` tokens valid for an hour and counts calls
    pub(crate) struct CountingSource {
        prefix: String,
        pub(crate) calls: AtomicUsize,
    }

    impl CountingSource {
        pub(crate) fn new(prefix: &str) -> Arc<Self> {
            Arc::new(Self {
                prefix: prefix.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
            assert_eq!(scope, AZURE_DEVOPS_SCOPE);
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(token(&format!("{}-{}", self.prefix, n), 3600))
        }
    }

    /// Always rejects, like a revoked client secret
    pub(crate) struct RejectingSource;

    #[async_trait]
    impl TokenSource for RejectingSource {
        async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthError> {
            Err(AuthError::Rejected {
                status: 401,
                description: "AADSTS7000215: Invalid client secret provided.".to_string(),
            })
        }
    }

    pub(crate) fn session_with(source: Arc<dyn TokenSource>) -> AuthSession {
        AuthSession::with_token_source(dummy_credential(), source)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    #[test]
    fn test_is_expired_not_expired() {
        let cached = CachedToken::new(token("test_token", 3600));
        assert!(!cached.is_expired(minutes(5)));
    }

    #[test]
    fn test_is_expired_with_buffer() {
        // four minutes left is inside the five minute buffer
        let cached = CachedToken::new(token("test_token", 240));
        assert!(cached.is_expired(minutes(5)));
    }

    #[test]
    fn test_is_expired_custom_buffer() {
        let cached = CachedToken::new(token("test_token", 240));
        assert!(!cached.is_expired(minutes(2)));
    }

    #[test]
    fn test_is_expired_past_timestamp() {
        let cached = CachedToken::new(token("test_token", -100));
        assert!(cached.is_expired(minutes(5)));
    }

    #[test]
    fn test_is_expired_boundary_inclusive() {
        let now = Utc::now();
        let cached = CachedToken::new(AccessToken::new(
            SecretString::new("t".to_string()),
            now + Duration::seconds(300),
        ));
        assert!(cached.is_expired_at(now, Duration::seconds(300)));
        assert!(!cached.is_expired_at(now - Duration::seconds(1), Duration::seconds(300)));
    }

    #[tokio::test]
    async fn test_get_token_caching() {
        let source = CountingSource::new("fresh");
        let session = session_with(source.clone());
        session
            .set_cached(CachedToken::new(token("cached_token", 3600)))
            .await;

        let value = session.get_token().await.unwrap();

        assert_eq!(value.expose_secret(), "cached_token");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_token_refresh_when_expired() {
        let source = CountingSource::new("new_token");
        let session = session_with(source.clone());
        session
            .set_cached(CachedToken::new(token("expired_token", -100)))
            .await;

        let value = session.get_token().await.unwrap();

        assert_eq!(value.expose_secret(), "new_token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_token_refresh_within_buffer() {
        let source = CountingSource::new("new_token");
        let session = session_with(source.clone());
        session
            .set_cached(CachedToken::new(token("nearly_expired", 240)))
            .await;

        assert_eq!(session.get_token().await.unwrap().expose_secret(), "new_token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_smaller_buffer_keeps_token() {
        let source = CountingSource::new("new_token");
        let session = session_with(source.clone()).with_buffer(minutes(2));
        session
            .set_cached(CachedToken::new(token("nearly_expired", 240)))
            .await;

        assert_eq!(session.get_token().await.unwrap().expose_secret(), "nearly_expired");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_token_no_cached_token() {
        let source = CountingSource::new("fresh_token");
        let session = session_with(source.clone());

        assert_eq!(session.get_token().await.unwrap().expose_secret(), "fresh_token-1");
        // second call is served from the cache
        assert_eq!(session.get_token().await.unwrap().expose_secret(), "fresh_token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_expiry_follows_refresh() {
        let source = CountingSource::new("t");
        let session = session_with(source.clone());
        assert!(session.cached_expiry().await.is_none());

        session.get_token().await.unwrap();

        let expires_at = session.cached_expiry().await.unwrap();
        assert!(expires_at > Utc::now() + Duration::minutes(59));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_auth_headers_success() {
        let session = session_with(CountingSource::new("test_bearer_token"));

        let headers = session.auth_headers().await.unwrap();

        assert_eq!(headers.len(), 1);
        let value = headers.get(AUTHORIZATION).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer test_bearer_token-1");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn test_auth_headers_propagates_refresh_failure() {
        let session = session_with(Arc::new(RejectingSource));

        let err = session.auth_headers().await.unwrap_err();

        assert!(matches!(err, AuthError::Rejected { status: 401, .. }));
        assert!(err.to_string().contains("Invalid client secret"));
    }

    #[test]
    fn test_debug_hides_credential_secret() {
        let session = session_with(CountingSource::new("t"));
        let debug = format!("{:?}", session);
        assert!(debug.contains("client-123"));
        assert!(!debug.contains("secret-123"));
    }

    #[tokio::test]
    async fn test_default_source_built_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-123/oauth2/v2.0/token")
            .match_body(mockito::Matcher::UrlEncoded(
                "scope".into(),
                AZURE_DEVOPS_SCOPE.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"from-entra"}"#)
            .expect(2)
            .create_async()
            .await;

        let session = AuthSession::new(dummy_credential()).with_authority_host(server.url());
        assert!(session.source.get().is_none());

        // second call is served from the cache
        assert_eq!(session.get_token().await.unwrap().expose_secret(), "from-entra");
        assert_eq!(session.get_token().await.unwrap().expose_secret(), "from-entra");
        let first = Arc::clone(session.source.get().unwrap());

        session
            .set_cached(CachedToken::new(token("expired_token", -100)))
            .await;
        assert_eq!(session.get_token().await.unwrap().expose_secret(), "from-entra");

        mock.assert_async().await;
        assert!(Arc::ptr_eq(&first, session.source.get().unwrap()));
    }
}
