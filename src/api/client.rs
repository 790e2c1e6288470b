//! HTTP client for the platform API

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error::{ApiError, ErrorBody};
use super::interceptor::InterceptorChain;
use crate::config::ApiConfig;

/// Client for the platform REST API.
///
/// Cheap to clone; clones share the connection pool and the interceptor
/// chain.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    interceptors: Arc<InterceptorChain>,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ApiError::Transport)?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            interceptors: Arc::new(InterceptorChain::new()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Interceptors applied to every request made through this client
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// Absolute URL for an endpoint path such as `auth/me`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send a request through the interceptors and decode the JSON body.
    ///
    /// An empty success body decodes as `null`.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.interceptors.authorize(request).send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let raw = response.text().await?;

        if status.is_success() {
            tracing::debug!(%status, %url, "API request succeeded");
            let raw = if raw.trim().is_empty() { "null" } else { raw.as_str() };
            return serde_json::from_str(raw).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let body = ErrorBody::parse(&raw);
        if let Some(failure) = self.interceptors.react(status, &body).await {
            return Err(failure.into());
        }

        tracing::debug!(%status, %url, "API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message: body.into_message(status),
        })
    }
}
