//! Error types for the TSheets client.
//!
//! Errors fall into a small taxonomy:
//!
//! - client-input errors, raised before any network call
//! - API errors, one [`ErrorKind`] per HTTP status code returned by the server
//! - per-item failures inside an otherwise successful response, aggregated
//!   into a single [`MultiStatusError`]
//! - cancellation, internal defects and unexpected response shapes

use crate::context::ResultStatus;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The server rejected the whole call with a non-success status.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Some items of a create, update or delete call failed.
    #[error("{0}")]
    MultiStatus(#[from] Box<MultiStatusError>),

    /// The request data is malformed; detected before any network call.
    #[error("Bad request: {0}")]
    InvalidRequest(String),

    /// The caller's cancellation token fired.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// The server response has a shape the client does not understand.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A library defect, such as a stage run against the wrong context.
    #[error("Internal error: {0}")]
    Internal(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The client configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Creates a client-input error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled(reason.into())
    }

    /// Returns the status-derived kind, if this error has one.
    ///
    /// Client-input errors report [`ErrorKind::BadRequest`].
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Api(err) => Some(err.kind),
            Self::InvalidRequest(_) => Some(ErrorKind::BadRequest),
            _ => None,
        }
    }

    /// Returns true for cancellation errors.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns the aggregate partial-failure payload, if any.
    #[must_use]
    pub fn as_multi_status(&self) -> Option<&MultiStatusError> {
        match self {
            Self::MultiStatus(err) => Some(err),
            _ => None,
        }
    }
}

/// Kind of an API error, one per mapped HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 402, the account has a billing problem.
    PaymentRequired,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 406
    NotAcceptable,
    /// 409
    Conflict,
    /// 413, too many items in one request.
    RequestEntityTooLarge,
    /// 417
    ExpectationFailed,
    /// 429
    TooManyRequests,
    /// 500
    InternalServerError,
    /// 501
    NotImplemented,
    /// 503
    ServiceUnavailable,
    /// Any other status code.
    Unmapped,
}

impl ErrorKind {
    /// Maps an HTTP-style status code to its kind.
    #[must_use]
    pub fn from_status(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            402 => Self::PaymentRequired,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            406 => Self::NotAcceptable,
            409 => Self::Conflict,
            413 => Self::RequestEntityTooLarge,
            417 => Self::ExpectationFailed,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            501 => Self::NotImplemented,
            503 => Self::ServiceUnavailable,
            _ => Self::Unmapped,
        }
    }

    /// Returns the canonical status code, or `None` for [`ErrorKind::Unmapped`].
    #[must_use]
    pub fn status_code(self) -> Option<u16> {
        match self {
            Self::BadRequest => Some(400),
            Self::Unauthorized => Some(401),
            Self::PaymentRequired => Some(402),
            Self::NotFound => Some(404),
            Self::MethodNotAllowed => Some(405),
            Self::NotAcceptable => Some(406),
            Self::Conflict => Some(409),
            Self::RequestEntityTooLarge => Some(413),
            Self::ExpectationFailed => Some(417),
            Self::TooManyRequests => Some(429),
            Self::InternalServerError => Some(500),
            Self::NotImplemented => Some(501),
            Self::ServiceUnavailable => Some(503),
            Self::Unmapped => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::PaymentRequired => "payment required",
            Self::NotFound => "not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::NotAcceptable => "not acceptable",
            Self::Conflict => "conflict",
            Self::RequestEntityTooLarge => "request entity too large",
            Self::ExpectationFailed => "expectation failed",
            Self::TooManyRequests => "too many requests",
            Self::InternalServerError => "internal server error",
            Self::NotImplemented => "not implemented",
            Self::ServiceUnavailable => "service unavailable",
            Self::Unmapped => "unmapped error",
        };
        f.write_str(text)
    }
}

/// A typed API error, produced either for a whole call or for one item.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} ({status_code}): {message}")]
pub struct ApiError {
    /// The mapped kind.
    pub kind: ErrorKind,
    /// The raw status code.
    pub status_code: u16,
    /// The server's message.
    pub message: String,
    /// Additional detail, if the server supplied any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ApiError {
    /// Creates an error from a status code and message.
    #[must_use]
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status_code),
            status_code,
            message: message.into(),
            extra: None,
        }
    }

    /// Sets the extra detail.
    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    /// Maps a per-item status block to a typed error.
    #[must_use]
    pub fn from_status(status: &ResultStatus) -> Self {
        Self {
            kind: ErrorKind::from_status(status.code),
            status_code: status.code,
            message: status.message.clone(),
            extra: status.extra.clone(),
        }
    }
}

/// One failed item of a multi-status response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Position of the item in the caller's original input.
    pub index: usize,
    /// Id of the item, when the server reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The partially decoded item, if the server echoed it back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<serde_json::Value>,
    /// The mapped error.
    pub error: ApiError,
}

/// Aggregate outcome of a call where some items failed.
///
/// Carries every success alongside every failure so callers can reconcile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiStatusError {
    /// Successful items, in input order.
    pub successes: Vec<serde_json::Value>,
    /// Failed items, in input order.
    pub failures: Vec<FailedItem>,
}

impl MultiStatusError {
    /// Creates a new aggregate.
    #[must_use]
    pub fn new(successes: Vec<serde_json::Value>, failures: Vec<FailedItem>) -> Self {
        Self {
            successes,
            failures,
        }
    }

    /// Decodes the successes into a typed list.
    pub fn successes_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.successes
            .iter()
            .map(|value| serde_json::from_value(value.clone()).map_err(Error::from))
            .collect()
    }

    /// Iterates the per-item errors.
    pub fn errors(&self) -> impl Iterator<Item = &ApiError> {
        self.failures.iter().map(|failure| &failure.error)
    }

    /// Returns the number of successful items.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Returns the number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for MultiStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} items failed",
            self.failures.len(),
            self.failures.len() + self.successes.len()
        )
    }
}

impl std::error::Error for MultiStatusError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_status_covers_mapped_codes() {
        let cases = [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Unauthorized),
            (402, ErrorKind::PaymentRequired),
            (404, ErrorKind::NotFound),
            (405, ErrorKind::MethodNotAllowed),
            (406, ErrorKind::NotAcceptable),
            (409, ErrorKind::Conflict),
            (413, ErrorKind::RequestEntityTooLarge),
            (417, ErrorKind::ExpectationFailed),
            (429, ErrorKind::TooManyRequests),
            (500, ErrorKind::InternalServerError),
            (501, ErrorKind::NotImplemented),
            (503, ErrorKind::ServiceUnavailable),
        ];

        for (code, kind) in cases {
            assert_eq!(ErrorKind::from_status(code), kind);
            assert_eq!(kind.status_code(), Some(code));
        }
    }

    #[test]
    fn test_unknown_status_is_unmapped() {
        assert_eq!(ErrorKind::from_status(418), ErrorKind::Unmapped);
        assert_eq!(ErrorKind::from_status(502), ErrorKind::Unmapped);
        assert_eq!(ErrorKind::Unmapped.status_code(), None);
    }

    #[test]
    fn test_api_error_from_item_status() {
        let status = ResultStatus::new(404, "Not Found").with_extra("no such jobcode");
        let err = ApiError::from_status(&status);

        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.status_code, 404);
        assert_eq!(err.extra.as_deref(), Some("no such jobcode"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_error_kind_accessor() {
        let api: Error = ApiError::new(503, "down").into();
        assert_eq!(api.kind(), Some(ErrorKind::ServiceUnavailable));

        let input = Error::invalid_request("empty list");
        assert_eq!(input.kind(), Some(ErrorKind::BadRequest));

        assert_eq!(Error::cancelled("stop").kind(), None);
        assert!(Error::cancelled("stop").is_cancelled());
    }

    #[test]
    fn test_multi_status_keeps_successes() {
        let err = MultiStatusError::new(
            vec![json!({"id": 1, "name": "a"})],
            vec![FailedItem {
                index: 1,
                id: None,
                item: None,
                error: ApiError::new(417, "Expectation Failed"),
            }],
        );

        assert_eq!(err.success_count(), 1);
        assert_eq!(err.failure_count(), 1);
        assert_eq!(err.to_string(), "1 of 2 items failed");

        let values: Vec<serde_json::Value> = err.successes_as().unwrap();
        assert_eq!(values[0]["name"], "a");
        assert_eq!(err.errors().next().unwrap().kind, ErrorKind::ExpectationFailed);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ErrorKind::ServiceUnavailable).unwrap();
        assert_eq!(json, "\"service_unavailable\"");
    }
}
