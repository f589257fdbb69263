//! Decoded call results.

use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, FailedItem};

/// Per-item status block reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    /// HTTP-style status code; below 300 means success.
    pub code: u16,
    /// Status message.
    pub message: String,
    /// Additional detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ResultStatus {
    /// Creates a status block.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
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

    /// Returns true for codes below 300.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code < 300
    }
}

/// One failed record of a write or delete call.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorItem<T> {
    /// Position of the record in the caller's input.
    pub index: usize,
    /// Id of the record, when reported.
    pub id: Option<i64>,
    /// The partially decoded record, if it could be decoded.
    pub item: Option<T>,
    /// The server's status block.
    pub status: ResultStatus,
}

impl<T: Serialize> ErrorItem<T> {
    /// Maps the status block to a typed failure.
    #[must_use]
    pub fn to_failed_item(&self) -> FailedItem {
        FailedItem {
            index: self.index,
            id: self.id,
            item: self
                .item
                .as_ref()
                .and_then(|item| serde_json::to_value(item).ok()),
            error: ApiError::from_status(&self.status),
        }
    }
}

/// Successes and failures collected for one context.
#[derive(Debug, Clone, PartialEq)]
pub struct Results<T> {
    /// Successful records, in input order.
    pub items: Vec<T>,
    /// Failed records, in input order.
    pub errors: Vec<ErrorItem<T>>,
}

impl<T> Results<T> {
    /// Creates an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Creates a result set holding only successes.
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            items,
            errors: Vec::new(),
        }
    }

    /// Returns true if any record failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.errors.is_empty()
    }

    /// Appends another result set, shifting its failure indices by `offset`.
    pub fn append_offset(&mut self, other: Self, offset: usize) {
        self.items.extend(other.items);
        self.errors.extend(other.errors.into_iter().map(|mut error| {
            error.index += offset;
            error
        }));
    }
}

impl<T> Default for Results<T> {
    fn default() -> Self {
        Self::new()
    }
}
