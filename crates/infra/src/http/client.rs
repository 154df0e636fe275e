//! reqwest-backed implementation of the mutation transport port.

use std::time::Duration;

use async_trait::async_trait;
use fieldsync_core::MutationTransport;
use fieldsync_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use fieldsync_domain::{
    ApiConfig, FieldSyncError, HttpMethod, HttpResponse, OutboundRequest, Result,
};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;
use url::Url;

use crate::errors::InfraError;

/// HTTP transport that performs exactly one attempt per call.
///
/// Retries belong to the replay engine, so this client never repeats a
/// request on its own. Relative targets are resolved against the configured
/// base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Option<Url>,
}

impl HttpTransport {
    /// Start building a new transport.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Build a transport from the `api` configuration section.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Self::builder().timeout(config.request_timeout());
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    /// Resolve a mutation target to an absolute URL.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    FieldSyncError::InvalidInput(format!(
                        "relative target {target} requires a configured base URL"
                    ))
                })?;
                base.join(target).map_err(|err| {
                    FieldSyncError::InvalidInput(format!("invalid target {target}: {err}"))
                })
            }
            Err(err) => Err(FieldSyncError::InvalidInput(format!("invalid target {target}: {err}"))),
        }
    }
}

#[async_trait]
impl MutationTransport for HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<HttpResponse> {
        let url = self.resolve(&request.target)?;
        let method = to_reqwest_method(request.method);
        debug!(%method, %url, "sending HTTP request");

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.map_err(map_http_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_http_error)?;
        debug!(%method, %url, status, "received HTTP response");

        Ok(HttpResponse::new(status).with_body(body.to_vec()))
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    base_url: Option<String>,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            base_url: None,
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpTransportBuilder {
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let base_url = self
            .base_url
            .map(|raw| {
                Url::parse(&raw)
                    .map_err(|err| FieldSyncError::Config(format!("invalid api.base_url {raw}: {err}")))
            })
            .transpose()?;

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(map_http_error)?;

        Ok(HttpTransport { client, base_url })
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_http_error(err: reqwest::Error) -> FieldSyncError {
    FieldSyncError::from(InfraError::from(err))
}
