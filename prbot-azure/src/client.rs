//! Authenticated Azure DevOps REST client

use std::sync::Arc;
use std::time::Duration;

use prbot_core::AzureDevOpsConfig;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::{ApiError, AuthSession, Error, Result};

/// REST API version sent with every request
pub const API_VERSION: &str = "7.1";

/// Upper bound on a single request, including reading the body
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Azure DevOps REST client scoped to one organization and project
///
/// Every call fetches headers from the shared [`AuthSession`], appends
/// `api-version`, and turns failures into an [`ApiError`]. Nothing is retried.
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    auth: Arc<AuthSession>,
    base_url: Url,
    timeout: Duration,
}

impl AzureDevOpsClient {
    /// Create a client for the project named in `config`
    pub fn new(config: &AzureDevOpsConfig, auth: Arc<AuthSession>) -> Result<Self> {
        config.validate()?;
        Self::with_base_url(&config.api_base_url(), auth)
    }

    /// Create a client against an explicit API base, e.g.
    /// `https://dev.azure.com/<org>/<project>/_apis/`
    pub fn with_base_url(base_url: &str, auth: Arc<AuthSession>) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| Error::Config(format!("Invalid API base URL {}: {}", normalized, e)))?;

        info!(base_url = %base_url, "Created Azure DevOps client");

        Ok(Self {
            http: reqwest::Client::new(),
            auth,
            base_url,
            timeout: REQUEST_TIMEOUT,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for `endpoint`; a leading slash is ignored
    ///
    /// The result always stays under the project's `_apis/` path, so the
    /// bearer token is never sent to another host.
    pub fn build_api_url(&self, endpoint: &str) -> Result<Url> {
        let unexpected = |message: String| -> Error {
            ApiError::Unexpected {
                endpoint: endpoint.to_string(),
                message,
            }
            .into()
        };

        let url = self
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| unexpected(e.to_string()))?;

        // absolute URLs and `..` segments can both escape the base
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path())
        {
            return Err(unexpected(format!(
                "endpoint resolves outside {}",
                self.base_url
            )));
        }

        Ok(url)
    }

    /// GET `endpoint` with optional extra query parameters
    ///
    /// JSON responses are returned decoded; anything else comes back as
    /// `{"content": "<text>"}`.
    pub async fn get(&self, endpoint: &str, extra_params: &[(&str, &str)]) -> Result<Value> {
        self.execute(Method::GET, endpoint, extra_params, None).await
    }

    /// POST `body` as JSON to `endpoint`
    pub async fn post<B>(&self, endpoint: &str, body: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Unexpected {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        self.execute(Method::POST, endpoint, &[], body).await
    }

    /// GET `endpoint` and decode it into `T`
    pub(crate) async fn get_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.get(endpoint, extra_params).await?;
        decode(endpoint, body)
    }

    /// POST `body` to `endpoint` and decode the answer into `T`
    pub(crate) async fn post_as<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(endpoint, Some(body)).await?;
        decode(endpoint, response)
    }

    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        extra_params: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.build_api_url(endpoint)?;

        // refresh failures pass through untouched
        let mut headers = self.auth.auth_headers().await?;
        if method == Method::POST {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let params = merge_params(extra_params);
        let header_keys: Vec<&str> = headers.keys().map(|k| k.as_str()).collect();

        info!(
            %method,
            endpoint,
            url = %url,
            header_keys = ?header_keys,
            query_params = ?params,
            body = ?body,
            "Azure DevOps request"
        );

        let mut request = self
            .http
            .request(method, url)
            .headers(headers)
            .query(&params)
            .timeout(self.timeout);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e, endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(endpoint, status = status.as_u16(), response = %text, "Azure DevOps error response");
            return Err(ApiError::from_status(status, endpoint).into());
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e, endpoint))?;

        if is_json {
            serde_json::from_str(&text).map_err(|e| {
                ApiError::Unexpected {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                }
                .into()
            })
        } else {
            Ok(json!({ "content": text }))
        }
    }
}

impl std::fmt::Debug for AzureDevOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// `api-version` first, then caller parameters; a caller value replaces a
/// default with the same key
fn merge_params<'a>(extra_params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut params = vec![("api-version", API_VERSION)];
    for &(key, value) in extra_params {
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => params.push((key, value)),
        }
    }
    params
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| Error::Parse(format!("Unexpected response from {}: {}", endpoint, e)))
}
