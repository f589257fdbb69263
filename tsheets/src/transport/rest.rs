//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use super::Transport;
use crate::cancellation::CancellationToken;
use crate::config::{ClientConfig, TlsVersion};
use crate::context::LogContext;
use crate::errors::{ApiError, Error, Result};
use crate::model::EndPoint;

/// HTTP transport for the REST API.
///
/// Authenticates with a bearer token and maps non-success statuses to
/// [`ApiError`]. In-flight requests are abandoned when the cancellation token
/// fires.
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    extra: Option<serde_json::Value>,
}

impl RestClient {
    /// Builds a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .min_tls_version(tls_version(config.min_tls_version))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url(),
            access_token: config.access_token.clone(),
        })
    }

    fn request(&self, method: Method, endpoint: EndPoint) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint.path());
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    fn json_request(&self, method: Method, endpoint: EndPoint, body: &str) -> RequestBuilder {
        self.request(method, endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body.to_owned())
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        endpoint: EndPoint,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        cancel.check()?;
        let started = Instant::now();

        let response = tokio::select! {
            result = builder.send() => result.map_err(|e| Error::Transport(e.to_string()))?,
            () = cancel.cancelled() => return Err(cancel.to_error()),
        };

        let status = response.status();
        debug!(
            correlation_id = %log.correlation_id,
            event_id = log.event_id,
            endpoint = %endpoint,
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "received HTTP response"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status.as_u16(), status.canonical_reason(), &body).into())
    }

    async fn send_text(
        &self,
        builder: RequestBuilder,
        endpoint: EndPoint,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response = self.send(builder, endpoint, log, cancel).await?;
        tokio::select! {
            text = response.text() => text.map_err(|e| Error::Transport(e.to_string())),
            () = cancel.cancelled() => Err(cancel.to_error()),
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn create(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = self.json_request(Method::POST, endpoint, body);
        self.send_text(request, endpoint, log, cancel).await
    }

    async fn get(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = self.request(Method::GET, endpoint).query(filter);
        self.send_text(request, endpoint, log, cancel).await
    }

    async fn download(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let request = self.request(Method::GET, endpoint).query(filter);
        let response = self.send(request, endpoint, log, cancel).await?;
        tokio::select! {
            bytes = response.bytes() => bytes
                .map(|b| b.to_vec())
                .map_err(|e| Error::Transport(e.to_string())),
            () = cancel.cancelled() => Err(cancel.to_error()),
        }
    }

    async fn update(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = self.json_request(Method::PUT, endpoint, body);
        self.send_text(request, endpoint, log, cancel).await
    }

    async fn delete(
        &self,
        endpoint: EndPoint,
        ids: &[i64],
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .request(Method::DELETE, endpoint)
            .query(&[("ids", joined)]);
        self.send_text(request, endpoint, log, cancel).await
    }
}

fn tls_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::Tls10 => reqwest::tls::Version::TLS_1_0,
        TlsVersion::Tls11 => reqwest::tls::Version::TLS_1_1,
        TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
    }
}

/// Maps an error response to a typed API error.
///
/// Reads `{"error": {"message", "extra"}}` when present and falls back to
/// the status reason phrase.
fn error_from_response(status: u16, reason: Option<&str>, body: &str) -> ApiError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .and_then(|e| e.error.message.clone())
        .or_else(|| reason.map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"));

    let error = ApiError::new(status, message);
    match envelope.and_then(|e| e.error.extra) {
        Some(serde_json::Value::String(extra)) if !extra.is_empty() => error.with_extra(extra),
        Some(serde_json::Value::Null) | None => error,
        Some(other) => error.with_extra(other.to_string()),
    }
}
