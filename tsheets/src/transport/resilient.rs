//! Retrying transport decorator.
//!
//! Retries a call only when it fails with an [`Error::Api`] whose kind is in
//! the configured allow-list. The delay before retry `n` (1-based) is
//! `n^exponent * multiplier` seconds, so the defaults wait 1.5 s, 6 s and
//! 13.5 s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::Transport;
use crate::cancellation::CancellationToken;
use crate::context::LogContext;
use crate::errors::{Error, ErrorKind, Result};
use crate::events::{EventSink, NoOpEventSink, TRANSPORT_RETRY};
use crate::model::EndPoint;

/// Retry policy for transient server failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retry_count: u32,
    /// Power applied to the retry number.
    pub exponent: f64,
    /// Seconds multiplied onto the powered retry number.
    pub multiplier: f64,
    /// Error kinds eligible for retry.
    pub retryable_errors: HashSet<ErrorKind>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            exponent: 2.0,
            multiplier: 1.5,
            retryable_errors: HashSet::from([ErrorKind::ServiceUnavailable]),
        }
    }
}

impl RetrySettings {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retry_count: 0,
            ..Self::default()
        }
    }

    /// Sets the retry count.
    #[must_use]
    pub fn with_max_retry_count(mut self, max_retry_count: u32) -> Self {
        self.max_retry_count = max_retry_count;
        self
    }

    /// Sets the exponent.
    #[must_use]
    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Adds a retryable error kind.
    #[must_use]
    pub fn with_retryable(mut self, kind: ErrorKind) -> Self {
        self.retryable_errors.insert(kind);
        self
    }

    /// Returns the wait before retry `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = f64::from(attempt).powf(self.exponent) * self.multiplier;
        if !secs.is_finite() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Returns true if `error` may be retried under this policy.
    #[must_use]
    pub fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::Api(api) => self.retryable_errors.contains(&api.kind),
            _ => false,
        }
    }
}

/// Wraps a transport with retry on transient failures.
pub struct ResilientTransport {
    inner: Arc<dyn Transport>,
    settings: RetrySettings,
    events: Arc<dyn EventSink>,
}

impl ResilientTransport {
    /// Wraps `inner` with `settings`.
    #[must_use]
    pub fn new(inner: Arc<dyn Transport>, settings: RetrySettings) -> Self {
        Self {
            inner,
            settings,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving retry events.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    async fn execute<R, F, Fut>(
        &self,
        operation: &str,
        endpoint: EndPoint,
        log: &LogContext,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<R>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<R>> + Send,
        R: Send,
    {
        if self.settings.max_retry_count == 0 {
            return call().await;
        }

        let max_retries = self.settings.max_retry_count;
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_retries && self.settings.is_retryable(&err) => {
                    attempt += 1;
                    let delay = self.settings.delay_for(attempt);

                    warn!(
                        correlation_id = %log.correlation_id,
                        event_id = log.event_id,
                        operation,
                        endpoint = %endpoint,
                        attempt,
                        max_retries,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "Retrying {} {} (attempt {} of {}) in {:.1}s: {}",
                        operation,
                        endpoint,
                        attempt,
                        max_retries,
                        delay.as_secs_f64(),
                        err
                    );
                    self.events.try_emit(
                        TRANSPORT_RETRY,
                        Some(serde_json::json!({
                            "correlation_id": log.correlation_id.to_string(),
                            "operation": operation,
                            "endpoint": endpoint.path(),
                            "attempt": attempt,
                            "max_retries": max_retries,
                            "delay_secs": delay.as_secs_f64(),
                            "error": err.to_string(),
                        })),
                    );

                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => {
                            debug!(correlation_id = %log.correlation_id, "Retry backoff cancelled");
                            return Err(cancel.to_error());
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl std::fmt::Debug for ResilientTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientTransport")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for ResilientTransport {
    async fn create(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.execute("create", endpoint, log, cancel, || {
            self.inner.create(endpoint, body, log, cancel)
        })
        .await
    }

    async fn get(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.execute("get", endpoint, log, cancel, || {
            self.inner.get(endpoint, filter, log, cancel)
        })
        .await
    }

    async fn download(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        self.execute("download", endpoint, log, cancel, || {
            self.inner.download(endpoint, filter, log, cancel)
        })
        .await
    }

    async fn update(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.execute("update", endpoint, log, cancel, || {
            self.inner.update(endpoint, body, log, cancel)
        })
        .await
    }

    async fn delete(
        &self,
        endpoint: EndPoint,
        ids: &[i64],
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.execute("delete", endpoint, log, cancel, || {
            self.inner.delete(endpoint, ids, log, cancel)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::events::CollectingEventSink;
    use crate::transport::MockTransport;
    use tokio::time::Instant;

    fn unavailable() -> Error {
        ApiError::new(503, "Service Unavailable").into()
    }

    #[test]
    fn test_delay_formula() {
        let settings = RetrySettings::default();
        assert_eq!(settings.delay_for(1), Duration::from_millis(1500));
        assert_eq!(settings.delay_for(2), Duration::from_secs(6));
        assert_eq!(settings.delay_for(3), Duration::from_millis(13500));
    }

    #[test]
    fn test_only_allow_listed_api_errors_retry() {
        let settings = RetrySettings::default();
        assert!(settings.is_retryable(&unavailable()));
        assert!(!settings.is_retryable(&ApiError::new(500, "boom").into()));
        assert!(!settings.is_retryable(&Error::Transport("reset".into())));

        let wider = settings.with_retryable(ErrorKind::TooManyRequests);
        assert!(wider.is_retryable(&ApiError::new(429, "slow down").into()));
    }

    #[test]
    fn test_none_preset() {
        let settings = RetrySettings::none();
        assert_eq!(settings.max_retry_count, 0);
        assert_eq!(settings.exponent, 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_exact_backoff_then_succeeds() {
        let mut mock = MockTransport::new();
        let mut calls = 0;
        mock.expect_get().times(4).returning(move |_, _, _, _| {
            calls += 1;
            if calls < 4 {
                Err(unavailable())
            } else {
                Ok("{}".to_string())
            }
        });

        let sink = Arc::new(CollectingEventSink::new());
        let transport = ResilientTransport::new(Arc::new(mock), RetrySettings::default())
            .with_event_sink(sink.clone());

        let started = Instant::now();
        let body = transport
            .get(
                EndPoint::Users,
                &BTreeMap::new(),
                &LogContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(body, "{}");
        assert_eq!(started.elapsed(), Duration::from_millis(1500 + 6000 + 13500));
        assert_eq!(sink.events_of_type(TRANSPORT_RETRY).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_reraise_last_error() {
        let mut mock = MockTransport::new();
        mock.expect_update()
            .times(3)
            .returning(|_, _, _, _| Err(unavailable()));

        let transport = ResilientTransport::new(
            Arc::new(mock),
            RetrySettings::default().with_max_retry_count(2),
        );

        let err = transport
            .update(
                EndPoint::Users,
                "{}",
                &LogContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let mut mock = MockTransport::new();
        mock.expect_delete()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::new(404, "Not Found").into()));

        let transport = ResilientTransport::new(Arc::new(mock), RetrySettings::default());
        let err = transport
            .delete(
                EndPoint::Timesheets,
                &[1],
                &LogContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_no_retry_policy_passes_through() {
        let mut mock = MockTransport::new();
        mock.expect_create()
            .times(1)
            .returning(|_, _, _, _| Err(unavailable()));

        let transport = ResilientTransport::new(Arc::new(mock), RetrySettings::none());
        let err = transport
            .create(
                EndPoint::Users,
                "{}",
                &LogContext::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleep_is_cancellable() {
        let cancel = Arc::new(CancellationToken::new());
        let mut mock = MockTransport::new();
        mock.expect_download().times(1).returning(|_, _, _, _| Err(unavailable()));

        let transport = ResilientTransport::new(Arc::new(mock), RetrySettings::default());

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel("caller gave up");
            })
        };

        let err = transport
            .download(
                EndPoint::FilesRaw,
                &BTreeMap::new(),
                &LogContext::default(),
                &cancel,
            )
            .await
            .unwrap_err();

        canceller.await.unwrap();
        assert!(err.is_cancelled());
    }
}
