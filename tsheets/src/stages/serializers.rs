//! Request body serializers.
//!
//! Both serializers wrap their payload in a `{"data": ...}` envelope and
//! drop null fields.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::{ApiContext, Operation};
use crate::errors::{Error, Result};
use crate::model::Entity;

/// Serializes create and update items, applying the entity's field rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteSerializer;

#[async_trait]
impl<T: Entity> Stage<T> for WriteSerializer {
    fn name(&self) -> &str {
        "write_serializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let rules = T::field_rules();
        let creating = ctx.operation() == Operation::Create;

        let mut records = Vec::with_capacity(ctx.items()?.len());
        for item in ctx.items()? {
            let Value::Object(fields) = serde_json::to_value(item)? else {
                return Err(Error::invalid_request(format!(
                    "{} items must serialize to JSON objects",
                    ctx.endpoint()
                )));
            };

            let kept: Map<String, Value> = fields
                .into_iter()
                .filter(|(name, value)| {
                    let excluded = if creating {
                        rules.excluded_on_create(name)
                    } else {
                        rules.excluded_on_update(name)
                    };
                    !excluded && !value.is_null()
                })
                .collect();
            records.push(Value::Object(kept));
        }

        let body = serde_json::to_string(&serde_json::json!({ "data": records }))?;
        ctx.set_body(body)
    }
}

/// Serializes a report filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSerializer;

#[async_trait]
impl<T: Entity> Stage<T> for ReportSerializer {
    fn name(&self) -> &str {
        "report_serializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let data = strip_nulls(ctx.report_filter()?.clone());
        let body = serde_json::to_string(&serde_json::json!({ "data": data }))?;
        ctx.set_body(body)
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}
