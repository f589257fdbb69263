//! Response deserializers.
//!
//! Responses carry their records under `results.<endpoint key>`, either as an
//! id-keyed object or as an array. Write responses tag every record with
//! `_status_code`, `_status_message` and optionally `_status_extra`; codes
//! below 300 are successes.

use async_trait::async_trait;
use serde_json::Value;

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::{entity_id, record_id, ApiContext, ErrorItem, PagingState, ResultStatus};
use crate::errors::{Error, Result};
use crate::model::Entity;

const STATUS_CODE: &str = "_status_code";
const STATUS_MESSAGE: &str = "_status_message";
const STATUS_EXTRA: &str = "_status_extra";

/// Parses a raw body; an empty body yields `None`.
pub(crate) fn parse_response(raw: &str) -> Result<Option<Value>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(raw)?))
}

/// Returns the records under `results.<key>` in server order.
fn result_records(root: Option<&Value>, key: &str) -> Vec<(String, Value)> {
    match root.and_then(|r| r.get("results")).and_then(|r| r.get(key)) {
        Some(Value::Object(records)) => records
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect(),
        Some(Value::Array(records)) => records
            .iter()
            .enumerate()
            .map(|(i, record)| (i.to_string(), record.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Removes and returns the status block of a write record.
fn take_status(record: &mut Value) -> ResultStatus {
    let Value::Object(fields) = record else {
        return ResultStatus::new(200, "OK");
    };

    let code = fields
        .remove(STATUS_CODE)
        .and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(200);
    let message = fields
        .remove(STATUS_MESSAGE)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let extra = fields
        .remove(STATUS_EXTRA)
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        });

    ResultStatus {
        code,
        message,
        extra,
    }
}

/// Decodes the records of a get response.
///
/// A missing or empty results section yields zero items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for ResultsDeserializer {
    fn name(&self) -> &str {
        "results_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let root = parse_response(ctx.raw_response()?)?;
        let key = ctx.endpoint().results_key();

        let items = result_records(root.as_ref(), key)
            .into_iter()
            .map(|(_, record)| serde_json::from_value(record).map_err(Error::from))
            .collect::<Result<Vec<T>>>()?;

        ctx.results_mut().items = items;
        Ok(())
    }
}

/// Splits the records of a create or update response into successes and
/// failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteResultsDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for WriteResultsDeserializer {
    fn name(&self) -> &str {
        "write_results_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let root = parse_response(ctx.raw_response()?)?;
        let key = ctx.endpoint().results_key();

        for (index, (id_key, mut record)) in result_records(root.as_ref(), key)
            .into_iter()
            .enumerate()
        {
            let status = take_status(&mut record);
            if status.is_success() {
                let item = serde_json::from_value(record)?;
                ctx.results_mut().items.push(item);
            } else {
                let id = entity_id(&id_key, &record);
                let item = serde_json::from_value(record).ok();
                ctx.results_mut().errors.push(ErrorItem {
                    index,
                    id,
                    item,
                    status,
                });
            }
        }
        Ok(())
    }
}

/// Records the failures of a delete response.
///
/// Success is implied by the absence of a failure status.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteResultsDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for DeleteResultsDeserializer {
    fn name(&self) -> &str {
        "delete_results_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let root = parse_response(ctx.raw_response()?)?;
        let key = ctx.endpoint().results_key();

        for (index, (id_key, mut record)) in result_records(root.as_ref(), key)
            .into_iter()
            .enumerate()
        {
            let status = take_status(&mut record);
            if !status.is_success() {
                ctx.results_mut().errors.push(ErrorItem {
                    index,
                    id: record_id(&id_key, &record),
                    item: None,
                    status,
                });
            }
        }
        Ok(())
    }
}

/// Decodes the single aggregate object of a report response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for ReportDeserializer {
    fn name(&self) -> &str {
        "report_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let root = parse_response(ctx.raw_response()?)?;
        let key = ctx.endpoint().results_key();

        let section = root
            .as_ref()
            .and_then(|r| r.get("results"))
            .and_then(|r| r.get(key))
            .cloned()
            .ok_or_else(|| {
                Error::InvalidState(format!("report response has no results.{key} section"))
            })?;

        // An empty report may arrive as an empty array.
        let section = match section {
            Value::Array(rows) if rows.is_empty() => Value::Object(serde_json::Map::new()),
            other => other,
        };

        let report = serde_json::from_value(section)?;
        ctx.set_report(report)
    }
}

/// Reads the `more` flag and echoes the requested page into the paging state.
///
/// The page is recorded even when the response cannot be parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagingMetaDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for PagingMetaDeserializer {
    fn name(&self) -> &str {
        "paging_meta_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let current_page = ctx.options()?.page.unwrap_or(1);
        let parsed = ctx.raw_response().and_then(parse_response);

        let has_more = match &parsed {
            Ok(Some(root)) => match root.get("more") {
                Some(Value::Bool(more)) => *more,
                Some(Value::String(more)) => more.eq_ignore_ascii_case("true"),
                _ => false,
            },
            _ => false,
        };

        ctx.set_paging(PagingState {
            has_more,
            current_page,
        })?;
        parsed.map(|_| ())
    }
}
