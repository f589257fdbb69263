//! Response bodies shaped like the API's.

use serde_json::{json, Map, Value};

use crate::model::EndPoint;

/// Builds a response body for one endpoint.
///
/// Records are keyed by their `id` field when present and by position
/// otherwise, matching how the server keys `results.<key>`.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    key: &'static str,
    records: Map<String, Value>,
    more: Option<bool>,
    supplemental: Map<String, Value>,
}

impl ResponseBuilder {
    /// Starts an empty response for `endpoint`.
    #[must_use]
    pub fn new(endpoint: EndPoint) -> Self {
        Self {
            key: endpoint.results_key(),
            records: Map::new(),
            more: None,
            supplemental: Map::new(),
        }
    }

    /// Adds a record.
    #[must_use]
    pub fn record(mut self, record: Value) -> Self {
        let key = record_key(&record, self.records.len());
        self.records.insert(key, record);
        self
    }

    /// Adds several records.
    #[must_use]
    pub fn records(self, records: impl IntoIterator<Item = Value>) -> Self {
        records.into_iter().fold(self, Self::record)
    }

    /// Adds a write result record tagged with a per-item status.
    #[must_use]
    pub fn status_record(self, code: u16, message: &str, mut record: Value) -> Self {
        if let Value::Object(fields) = &mut record {
            fields.insert("_status_code".to_string(), json!(code));
            fields.insert("_status_message".to_string(), json!(message));
        }
        self.record(record)
    }

    /// Sets the `more` flag.
    #[must_use]
    pub fn more(mut self, more: bool) -> Self {
        self.more = Some(more);
        self
    }

    /// Adds a record to a supplemental section.
    #[must_use]
    pub fn supplemental(mut self, section: &str, record: Value) -> Self {
        if let Value::Object(records) = self
            .supplemental
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            let key = record_key(&record, records.len());
            records.insert(key, record);
        }
        self
    }

    /// Returns the body as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut results = Map::new();
        results.insert(self.key.to_string(), Value::Object(self.records.clone()));

        let mut root = Map::new();
        root.insert("results".to_string(), Value::Object(results));
        if let Some(more) = self.more {
            root.insert("more".to_string(), Value::Bool(more));
        }
        if !self.supplemental.is_empty() {
            root.insert(
                "supplemental_data".to_string(),
                Value::Object(self.supplemental.clone()),
            );
        }
        Value::Object(root)
    }

    /// Returns the body as a string.
    #[must_use]
    pub fn build(&self) -> String {
        self.to_value().to_string()
    }
}

/// Builds a report response holding `report` under the endpoint's key.
#[must_use]
pub fn report_response(endpoint: EndPoint, report: Value) -> String {
    let mut results = Map::new();
    results.insert(endpoint.results_key().to_string(), report);
    json!({ "results": results }).to_string()
}

/// Echoes the items of a write request body back as a successful response.
///
/// Items without an id are assigned `first_id`, `first_id + 1`, and so on.
#[must_use]
pub fn echo_write_response(endpoint: EndPoint, body: &str, first_id: i64) -> String {
    let items = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|body| body.get("data").and_then(Value::as_array).cloned())
        .unwrap_or_default();

    items
        .into_iter()
        .zip(first_id..)
        .fold(ResponseBuilder::new(endpoint), |builder, (mut item, id)| {
            if let Value::Object(fields) = &mut item {
                fields.entry("id").or_insert(json!(id));
            }
            builder.status_record(200, "OK", item)
        })
        .build()
}

fn record_key(record: &Value, position: usize) -> String {
    match record.get("id") {
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::String(id)) => id.clone(),
        _ => (position + 1).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_response_shape() {
        let body = ResponseBuilder::new(EndPoint::Jobcodes)
            .records([json!({"id": 4, "name": "A"}), json!({"id": 9, "name": "B"})])
            .more(true)
            .supplemental("users", json!({"id": 1}))
            .to_value();

        assert_eq!(body["results"]["jobcodes"]["9"]["name"], "B");
        assert_eq!(body["more"], true);
        assert_eq!(body["supplemental_data"]["users"]["1"]["id"], 1);
    }

    #[test]
    fn test_status_records_keyed_by_position_without_id() {
        let body = ResponseBuilder::new(EndPoint::Users)
            .status_record(417, "Expectation Failed", json!({"first_name": "x"}))
            .to_value();

        assert_eq!(body["results"]["users"]["1"]["_status_code"], 417);
        assert!(body.get("more").is_none());
    }

    #[test]
    fn test_echo_assigns_ids_in_order() {
        let body = echo_write_response(
            EndPoint::Users,
            r#"{"data":[{"first_name":"a"},{"first_name":"b","id":3}]}"#,
            100,
        );
        let body: Value = serde_json::from_str(&body).unwrap();
        let users = body["results"]["users"].as_object().unwrap();

        let ids: Vec<_> = users.keys().cloned().collect();
        assert_eq!(ids, vec!["100".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_report_response_key() {
        let body = report_response(EndPoint::CurrentTotalsReport, json!({}));
        assert_eq!(body, r#"{"results":{"current_totals_report":{}}}"#);
    }
}
