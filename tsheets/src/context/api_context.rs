//! The per-call context threaded through a stage sequence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{LogContext, PagingState, RequestOptions, Results, SupplementalData};
use crate::errors::{Error, Result};
use crate::model::{EndPoint, Entity};

/// Kind of API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read records, possibly across pages.
    Get,
    /// Create records.
    Create,
    /// Update records.
    Update,
    /// Delete records by id.
    Delete,
    /// Download raw content.
    Download,
    /// Retrieve an aggregate report.
    Report,
}

impl Operation {
    /// Returns a small stable code for log event ids.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Get => 1,
            Self::Create => 2,
            Self::Update => 3,
            Self::Delete => 4,
            Self::Download => 5,
            Self::Report => 6,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
            Self::Report => "report",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation-specific state of a context.
#[derive(Debug, Clone)]
pub enum ContextKind<T> {
    /// A get call.
    Get {
        /// Query filter.
        filter: BTreeMap<String, String>,
        /// Paging and supplemental options.
        options: RequestOptions,
        /// Paging metadata from the last response.
        paging: Option<PagingState>,
    },
    /// A create call.
    Create {
        /// Records to create.
        items: Vec<T>,
        /// Serialized request body.
        body: Option<String>,
    },
    /// An update call.
    Update {
        /// Records to update.
        items: Vec<T>,
        /// Serialized request body.
        body: Option<String>,
    },
    /// A delete call.
    Delete {
        /// Ids to delete.
        ids: Vec<i64>,
    },
    /// A download call.
    Download {
        /// Query filter.
        filter: BTreeMap<String, String>,
        /// Downloaded content.
        payload: Vec<u8>,
    },
    /// A report call.
    Report {
        /// Report filter.
        filter: serde_json::Value,
        /// Serialized request body.
        body: Option<String>,
        /// Decoded report.
        report: Option<T>,
    },
}

/// Mutable state of one logical API call.
///
/// Owned by the call that created it; batching and paging reuse the same
/// context across their sequential sub-calls.
#[derive(Debug, Clone)]
pub struct ApiContext<T> {
    endpoint: EndPoint,
    kind: ContextKind<T>,
    raw_response: Option<String>,
    results: Results<T>,
    supplemental: SupplementalData,
    log: LogContext,
}

impl<T: Entity> ApiContext<T> {
    fn with_kind(endpoint: EndPoint, kind: ContextKind<T>) -> Self {
        let operation = operation_of(&kind);
        Self {
            endpoint,
            kind,
            raw_response: None,
            results: Results::new(),
            supplemental: SupplementalData::new(),
            log: LogContext::for_call(operation, endpoint),
        }
    }

    /// Creates a get context.
    #[must_use]
    pub fn get(
        endpoint: EndPoint,
        filter: BTreeMap<String, String>,
        options: RequestOptions,
    ) -> Self {
        Self::with_kind(
            endpoint,
            ContextKind::Get {
                filter,
                options,
                paging: None,
            },
        )
    }

    /// Creates a create context.
    #[must_use]
    pub fn create(endpoint: EndPoint, items: Vec<T>) -> Self {
        Self::with_kind(endpoint, ContextKind::Create { items, body: None })
    }

    /// Creates an update context.
    #[must_use]
    pub fn update(endpoint: EndPoint, items: Vec<T>) -> Self {
        Self::with_kind(endpoint, ContextKind::Update { items, body: None })
    }

    /// Creates a delete context.
    ///
    /// Fails fast with a client error when `ids` is empty.
    pub fn delete(endpoint: EndPoint, ids: Vec<i64>) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::invalid_request("delete requires at least one id"));
        }
        Ok(Self::with_kind(endpoint, ContextKind::Delete { ids }))
    }

    /// Creates a download context.
    #[must_use]
    pub fn download(endpoint: EndPoint, filter: BTreeMap<String, String>) -> Self {
        Self::with_kind(
            endpoint,
            ContextKind::Download {
                filter,
                payload: Vec::new(),
            },
        )
    }

    /// Creates a report context.
    #[must_use]
    pub fn report(endpoint: EndPoint, filter: serde_json::Value) -> Self {
        Self::with_kind(
            endpoint,
            ContextKind::Report {
                filter,
                body: None,
                report: None,
            },
        )
    }
}

impl<T> ApiContext<T> {
    /// Returns the operation kind.
    #[must_use]
    pub fn operation(&self) -> Operation {
        operation_of(&self.kind)
    }

    /// Returns the target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> EndPoint {
        self.endpoint
    }

    /// Returns the operation-specific state.
    #[must_use]
    pub fn kind(&self) -> &ContextKind<T> {
        &self.kind
    }

    /// Returns the diagnostic identity.
    #[must_use]
    pub fn log(&self) -> &LogContext {
        &self.log
    }

    /// Returns the raw response, or an error if no transport stage ran yet.
    pub fn raw_response(&self) -> Result<&str> {
        self.raw_response.as_deref().ok_or_else(|| {
            Error::Internal(format!(
                "{} {} response read before the transport stage ran",
                self.operation(),
                self.endpoint
            ))
        })
    }

    /// Stores the raw response.
    pub fn set_raw_response(&mut self, raw: String) {
        self.raw_response = Some(raw);
    }

    /// Returns the collected results.
    #[must_use]
    pub fn results(&self) -> &Results<T> {
        &self.results
    }

    /// Returns the collected results mutably.
    pub fn results_mut(&mut self) -> &mut Results<T> {
        &mut self.results
    }

    /// Takes the collected results, leaving an empty set.
    pub fn take_results(&mut self) -> Results<T> {
        std::mem::take(&mut self.results)
    }

    /// Returns the supplemental side-table.
    #[must_use]
    pub fn supplemental(&self) -> &SupplementalData {
        &self.supplemental
    }

    /// Returns the supplemental side-table mutably.
    pub fn supplemental_mut(&mut self) -> &mut SupplementalData {
        &mut self.supplemental
    }

    /// Takes the supplemental side-table.
    pub fn take_supplemental(&mut self) -> SupplementalData {
        std::mem::take(&mut self.supplemental)
    }

    /// Returns the get filter.
    pub fn filter(&self) -> Result<&BTreeMap<String, String>> {
        match &self.kind {
            ContextKind::Get { filter, .. } | ContextKind::Download { filter, .. } => Ok(filter),
            _ => Err(self.mismatch("a query filter")),
        }
    }

    /// Returns the get options.
    pub fn options(&self) -> Result<&RequestOptions> {
        match &self.kind {
            ContextKind::Get { options, .. } => Ok(options),
            _ => Err(self.mismatch("request options")),
        }
    }

    /// Returns the get options mutably.
    pub fn options_mut(&mut self) -> Result<&mut RequestOptions> {
        let err = self.mismatch("request options");
        match &mut self.kind {
            ContextKind::Get { options, .. } => Ok(options),
            _ => Err(err),
        }
    }

    /// Returns the paging state of a get context.
    #[must_use]
    pub fn paging(&self) -> Option<PagingState> {
        match &self.kind {
            ContextKind::Get { paging, .. } => *paging,
            _ => None,
        }
    }

    /// Stores the paging state.
    pub fn set_paging(&mut self, state: PagingState) -> Result<()> {
        if let ContextKind::Get { paging, .. } = &mut self.kind {
            *paging = Some(state);
            return Ok(());
        }
        Err(self.mismatch("paging state"))
    }

    /// Returns the create or update items.
    pub fn items(&self) -> Result<&[T]> {
        match &self.kind {
            ContextKind::Create { items, .. } | ContextKind::Update { items, .. } => Ok(items),
            _ => Err(self.mismatch("input items")),
        }
    }

    /// Replaces the create or update items, returning the previous ones.
    pub fn replace_items(&mut self, new_items: Vec<T>) -> Result<Vec<T>> {
        match &mut self.kind {
            ContextKind::Create { items, .. } | ContextKind::Update { items, .. } => {
                Ok(std::mem::replace(items, new_items))
            }
            _ => Err(self.mismatch("input items")),
        }
    }

    /// Returns the delete ids.
    pub fn ids(&self) -> Result<&[i64]> {
        match &self.kind {
            ContextKind::Delete { ids } => Ok(ids),
            _ => Err(self.mismatch("ids")),
        }
    }

    /// Returns the serialized request body.
    pub fn body(&self) -> Result<&str> {
        let body = match &self.kind {
            ContextKind::Create { body, .. }
            | ContextKind::Update { body, .. }
            | ContextKind::Report { body, .. } => body.as_deref(),
            _ => return Err(self.mismatch("a request body")),
        };
        body.ok_or_else(|| {
            Error::Internal(format!(
                "{} {} body read before the serializer stage ran",
                self.operation(),
                self.endpoint
            ))
        })
    }

    /// Stores the serialized request body.
    pub fn set_body(&mut self, new_body: String) -> Result<()> {
        match &mut self.kind {
            ContextKind::Create { body, .. }
            | ContextKind::Update { body, .. }
            | ContextKind::Report { body, .. } => {
                *body = Some(new_body);
                Ok(())
            }
            _ => Err(self.mismatch("a request body")),
        }
    }

    /// Returns the report filter.
    pub fn report_filter(&self) -> Result<&serde_json::Value> {
        match &self.kind {
            ContextKind::Report { filter, .. } => Ok(filter),
            _ => Err(self.mismatch("a report filter")),
        }
    }

    /// Returns the decoded report.
    #[must_use]
    pub fn decoded_report(&self) -> Option<&T> {
        match &self.kind {
            ContextKind::Report { report, .. } => report.as_ref(),
            _ => None,
        }
    }

    /// Stores the decoded report.
    pub fn set_report(&mut self, value: T) -> Result<()> {
        if let ContextKind::Report { report, .. } = &mut self.kind {
            *report = Some(value);
            return Ok(());
        }
        Err(self.mismatch("a report"))
    }

    /// Takes the decoded report.
    pub fn take_report(&mut self) -> Option<T> {
        match &mut self.kind {
            ContextKind::Report { report, .. } => report.take(),
            _ => None,
        }
    }

    /// Returns the downloaded content.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        match &self.kind {
            ContextKind::Download { payload, .. } => payload,
            _ => &[],
        }
    }

    /// Stores the downloaded content.
    pub fn set_payload(&mut self, bytes: Vec<u8>) -> Result<()> {
        if let ContextKind::Download { payload, .. } = &mut self.kind {
            *payload = bytes;
            return Ok(());
        }
        Err(self.mismatch("a download payload"))
    }

    /// Takes the downloaded content.
    pub fn take_payload(&mut self) -> Vec<u8> {
        match &mut self.kind {
            ContextKind::Download { payload, .. } => std::mem::take(payload),
            _ => Vec::new(),
        }
    }

    fn mismatch(&self, what: &str) -> Error {
        Error::Internal(format!(
            "{} context for {} has no {what}",
            self.operation(),
            self.endpoint
        ))
    }
}

fn operation_of<T>(kind: &ContextKind<T>) -> Operation {
    match kind {
        ContextKind::Get { .. } => Operation::Get,
        ContextKind::Create { .. } => Operation::Create,
        ContextKind::Update { .. } => Operation::Update,
        ContextKind::Delete { .. } => Operation::Delete,
        ContextKind::Download { .. } => Operation::Download,
        ContextKind::Report { .. } => Operation::Report,
    }
}
