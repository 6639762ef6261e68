//! Upstream HTTP client
//!
//! One attempt per call, no retries, no storage writes. Every failure maps to
//! a [`SourceError`] reason:
//! - transport failure or timeout → `Network`
//! - non-2xx status → `BadStatus(code)`
//! - body that does not decode → `MalformedBody`
//!
//! Requests from one client are paced by a shared rate limiter so the same
//! host never sees calls closer together than `pacing_delay`.

use crate::config::IngestConfig;
use crate::error::SourceError;
use crate::types::{Payload, RawDocument, SourceKind};
use async_trait::async_trait;
use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use hoopstats_common::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

/// Which upstream an endpoint lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// JSON stats API under `api_base_url`
    Api,
    /// Rendered HTML under `base_url`
    Page,
}

/// Address of one upstream resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub kind: EndpointKind,
    pub path: String,
    /// Entity the resource describes; defaults to the path
    pub identifier: String,
}

impl Endpoint {
    pub fn api(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: EndpointKind::Api,
            identifier: path.clone(),
            path,
        }
    }

    pub fn page(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: EndpointKind::Page,
            identifier: path.clone(),
            path,
        }
    }

    /// Tag the endpoint with the entity it is about
    pub fn about(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        match self.kind {
            EndpointKind::Api => SourceKind::StructuredApi,
            EndpointKind::Page => SourceKind::RenderedPage,
        }
    }
}

/// Fetch capability used by the resolver and record sources
///
/// Implemented by [`SourceClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> std::result::Result<RawDocument, SourceError>;
}

/// Paced HTTP client for the stats API and rendered pages
pub struct SourceClient {
    http_client: Client,
    base_url: String,
    api_base_url: String,
    pacer: Option<DefaultDirectRateLimiter>,
}

impl SourceClient {
    /// Build a client from configuration
    ///
    /// Fails only on invalid header names/values or TLS backend setup.
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let headers = build_headers(config)?;

        let http_client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client setup failed: {}", e)))?;

        let pacer = Quota::with_period(config.pacing_delay).map(RateLimiter::direct);

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            pacer,
        })
    }

    fn url_for(&self, endpoint: &Endpoint) -> String {
        let root = match endpoint.kind {
            EndpointKind::Api => &self.api_base_url,
            EndpointKind::Page => &self.base_url,
        };
        format!("{}/{}", root, endpoint.path.trim_start_matches('/'))
    }
}

#[async_trait]
impl DocumentSource for SourceClient {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> std::result::Result<RawDocument, SourceError> {
        if let Some(pacer) = &self.pacer {
            pacer.until_ready().await;
        }

        let url = self.url_for(endpoint);
        debug!(url = %url, identifier = %endpoint.identifier, "Fetching upstream resource");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Upstream returned error status");
            return Err(SourceError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let payload = decode_body(endpoint.kind, body)?;

        Ok(RawDocument {
            source_kind: endpoint.source_kind(),
            identifier: endpoint.identifier.clone(),
            payload,
            fetched_at: Utc::now(),
        })
    }
}

/// Classify a successful body for its endpoint kind
pub fn decode_body(kind: EndpointKind, body: String) -> std::result::Result<Payload, SourceError> {
    match kind {
        EndpointKind::Api => serde_json::from_str(&body)
            .map(Payload::Structured)
            .map_err(|e| SourceError::MalformedBody(e.to_string())),
        EndpointKind::Page if body.trim().is_empty() => {
            Err(SourceError::MalformedBody("empty page body".to_string()))
        }
        EndpointKind::Page => Ok(Payload::Markup(body)),
    }
}

fn build_headers(config: &IngestConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.request_headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("Invalid value for header '{}': {}", name, e)))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
