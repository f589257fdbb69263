//! Supplemental data deserializer.

use async_trait::async_trait;
use serde_json::Value;

use super::deserializers::parse_response;
use super::Stage;
use crate::cancellation::CancellationToken;
use crate::context::{ApiContext, SupplementalKind};
use crate::errors::{Error, Result};
use crate::model::Entity;

/// Merges the `supplemental_data` section into the context's side-table.
///
/// A missing or empty section is a no-op. Unknown section names fail with
/// [`Error::InvalidState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SupplementalDeserializer;

#[async_trait]
impl<T: Entity> Stage<T> for SupplementalDeserializer {
    fn name(&self) -> &str {
        "supplemental_deserializer"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, _cancel: &CancellationToken) -> Result<()> {
        let Some(root) = parse_response(ctx.raw_response()?)? else {
            return Ok(());
        };

        let sections = match root.get("supplemental_data") {
            Some(Value::Object(sections)) => sections,
            None | Some(Value::Null | Value::Array(_)) => return Ok(()),
            Some(other) => {
                return Err(Error::InvalidState(format!(
                    "supplemental_data is not an object: {other}"
                )))
            }
        };

        for (name, records) in sections {
            match records {
                Value::Object(records) => ctx.supplemental_mut().merge_section(name, records)?,
                // An empty section may arrive as an empty array.
                Value::Array(records) if records.is_empty() => {
                    SupplementalKind::from_section(name)?;
                }
                other => {
                    return Err(Error::InvalidState(format!(
                        "supplemental section '{name}' is not an object: {other}"
                    )))
                }
            }
        }
        Ok(())
    }
}
