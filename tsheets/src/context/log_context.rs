//! Per-call diagnostic identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Operation;
use crate::model::EndPoint;

/// Correlates every log line and transport call of one top-level call.
///
/// Has no effect on control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    /// Unique id of the call.
    pub correlation_id: Uuid,
    /// Stable number identifying the operation and endpoint.
    pub event_id: u32,
}

impl LogContext {
    /// Creates a context with a fresh correlation id.
    #[must_use]
    pub fn new(event_id: u32) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            event_id,
        }
    }

    /// Creates a context for an operation against an endpoint.
    #[must_use]
    pub fn for_call(operation: Operation, endpoint: EndPoint) -> Self {
        Self::new(operation.code() * 100 + endpoint.ordinal())
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(0)
    }
}
