//! A transport that replays queued responses.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use crate::cancellation::CancellationToken;
use crate::context::LogContext;
use crate::errors::{ApiError, Error, Result};
use crate::model::EndPoint;
use crate::transport::Transport;

/// HTTP verb of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET` for records.
    Get,
    /// `POST`
    Create,
    /// `PUT`
    Update,
    /// `DELETE`
    Delete,
    /// `GET` for raw content.
    Download,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Download => "download",
        };
        f.write_str(name)
    }
}

/// One call seen by a [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The verb used.
    pub verb: Verb,
    /// The target endpoint.
    pub endpoint: EndPoint,
    /// Query parameters of get and download calls.
    pub query: BTreeMap<String, String>,
    /// Request body of create and update calls.
    pub body: Option<String>,
    /// Ids of delete calls.
    pub ids: Vec<i64>,
}

/// Replays queued responses per verb and records every call.
///
/// A call with nothing queued for its verb fails with [`Error::Internal`].
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<Verb, VecDeque<Result<String>>>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    /// Creates a transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful body for `verb`.
    #[must_use]
    pub fn with_response(self, verb: Verb, body: impl Into<String>) -> Self {
        self.push(verb, Ok(body.into()));
        self
    }

    /// Queues a whole-call failure for `verb`.
    #[must_use]
    pub fn with_error(self, verb: Verb, error: ApiError) -> Self {
        self.push(verb, Err(error.into()));
        self
    }

    /// Queues downloaded content.
    #[must_use]
    pub fn with_download(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.downloads.lock().push_back(Ok(bytes.into()));
        self
    }

    /// Queues an outcome for `verb`.
    pub fn push(&self, verb: Verb, outcome: Result<String>) {
        self.responses
            .lock()
            .entry(verb)
            .or_default()
            .push_back(outcome);
    }

    /// Returns every call seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls made with `verb`.
    #[must_use]
    pub fn call_count(&self, verb: Verb) -> usize {
        self.calls.lock().iter().filter(|c| c.verb == verb).count()
    }

    /// Returns the number of queued outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let responses: usize = self.responses.lock().values().map(VecDeque::len).sum();
        responses + self.downloads.lock().len()
    }

    fn record(&self, verb: Verb, endpoint: EndPoint) -> RecordedCall {
        RecordedCall {
            verb,
            endpoint,
            query: BTreeMap::new(),
            body: None,
            ids: Vec::new(),
        }
    }

    fn next(&self, call: RecordedCall) -> Result<String> {
        let (verb, endpoint) = (call.verb, call.endpoint);
        self.calls.lock().push(call);
        self.responses
            .lock()
            .get_mut(&verb)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(unscripted(verb, endpoint)))
    }
}

fn unscripted(verb: Verb, endpoint: EndPoint) -> Error {
    Error::Internal(format!("no scripted response for {verb} {endpoint}"))
}

impl fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("calls", &self.calls.lock().len())
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn create(
        &self,
        endpoint: EndPoint,
        body: &str,
        _log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        cancel.check()?;
        let mut call = self.record(Verb::Create, endpoint);
        call.body = Some(body.to_string());
        self.next(call)
    }

    async fn get(
        &self,
        endpoint: EndPoint,
        query: &BTreeMap<String, String>,
        _log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        cancel.check()?;
        let mut call = self.record(Verb::Get, endpoint);
        call.query = query.clone();
        self.next(call)
    }

    async fn download(
        &self,
        endpoint: EndPoint,
        query: &BTreeMap<String, String>,
        _log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        cancel.check()?;
        let mut call = self.record(Verb::Download, endpoint);
        call.query = query.clone();
        self.calls.lock().push(call);
        self.downloads
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted(Verb::Download, endpoint)))
    }

    async fn update(
        &self,
        endpoint: EndPoint,
        body: &str,
        _log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        cancel.check()?;
        let mut call = self.record(Verb::Update, endpoint);
        call.body = Some(body.to_string());
        self.next(call)
    }

    async fn delete(
        &self,
        endpoint: EndPoint,
        ids: &[i64],
        _log: &LogContext,
        cancel: &CancellationToken,
    ) -> Result<String> {
        cancel.check()?;
        let mut call = self.record(Verb::Delete, endpoint);
        call.ids = ids.to_vec();
        self.next(call)
    }
}
