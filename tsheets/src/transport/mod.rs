//! HTTP transport seam.
//!
//! This module provides:
//! - The [`Transport`] trait consumed by transport-invocation stages
//! - [`ResilientTransport`], a retrying decorator with exact backoff
//! - [`RestClient`], the reqwest implementation (feature `http`)

mod resilient;
#[cfg(feature = "http")]
mod rest;

pub use resilient::{ResilientTransport, RetrySettings};
#[cfg(feature = "http")]
pub use rest::RestClient;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cancellation::CancellationToken;
use crate::context::LogContext;
use crate::errors::Result;
use crate::model::EndPoint;

/// Raw access to the REST API.
///
/// Every method fails with [`crate::errors::Error::Api`] when the server
/// answers with a non-success status and returns the raw body otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a JSON body.
    async fn create(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// GETs with a query filter.
    async fn get(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// GETs raw bytes with a query filter.
    async fn download(
        &self,
        endpoint: EndPoint,
        filter: &BTreeMap<String, String>,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>>;

    /// PUTs a JSON body.
    async fn update(
        &self,
        endpoint: EndPoint,
        body: &str,
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// DELETEs records by id.
    async fn delete(
        &self,
        endpoint: EndPoint,
        ids: &[i64],
        log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String>;
}
