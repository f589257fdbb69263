//! Auto-batching of large writes.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::BATCH_SIZE;
use crate::cancellation::CancellationToken;
use crate::context::{ApiContext, Results};
use crate::errors::{Error, Result};
use crate::events::{EventSink, NoOpEventSink, BATCH_COMPLETED};
use crate::model::Entity;
use crate::stages::Stage;

/// Runs an inner write sequence once per batch of at most [`BATCH_SIZE`] items.
///
/// Batches run strictly in order against the same context. Results are
/// concatenated in input order and each failure index is shifted to its
/// position in the full input. Per-batch partial failures are absorbed so
/// that a single aggregate can be raised once every batch has run.
pub struct AutoBatcher<T: Entity> {
    inner: Arc<dyn Stage<T>>,
    events: Arc<dyn EventSink>,
}

impl<T: Entity> AutoBatcher<T> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Stage<T>>) -> Self {
        Self {
            inner,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving per-batch events.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl<T: Entity> std::fmt::Debug for AutoBatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoBatcher")
            .field("inner", &self.inner.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for AutoBatcher<T> {
    fn name(&self) -> &str {
        "auto_batcher"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let all = ctx.replace_items(Vec::new())?;
        if all.len() <= BATCH_SIZE {
            ctx.replace_items(all)?;
            return self.inner.process(ctx, cancel).await;
        }

        let batches = all.len().div_ceil(BATCH_SIZE);
        let mut consolidated = Results::new();

        for (number, chunk) in all.chunks(BATCH_SIZE).enumerate() {
            if cancel.is_cancelled() {
                ctx.replace_items(all.clone())?;
                return Err(cancel.to_error());
            }

            let offset = number * BATCH_SIZE;
            ctx.replace_items(chunk.to_vec())?;
            ctx.take_results();

            match self.inner.process(ctx, cancel).await {
                Ok(()) | Err(Error::MultiStatus(_)) => {}
                Err(err) => {
                    ctx.replace_items(all.clone())?;
                    return Err(err);
                }
            }

            let batch = ctx.take_results();
            let (succeeded, failed) = (batch.items.len(), batch.errors.len());
            consolidated.append_offset(batch, offset);

            debug!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                batch = number + 1,
                batches,
                succeeded,
                failed,
                "batch completed"
            );
            self.events.try_emit(
                BATCH_COMPLETED,
                Some(json!({
                    "correlation_id": ctx.log().correlation_id.to_string(),
                    "endpoint": ctx.endpoint().path(),
                    "batch": number + 1,
                    "batches": batches,
                    "offset": offset,
                    "succeeded": succeeded,
                    "failed": failed,
                })),
            );
        }

        info!(
            correlation_id = %ctx.log().correlation_id,
            event_id = ctx.log().event_id,
            operation = %ctx.operation(),
            endpoint = %ctx.endpoint(),
            items = all.len(),
            batches,
            failed = consolidated.errors.len(),
            "auto-batched write finished"
        );
        ctx.replace_items(all)?;
        *ctx.results_mut() = consolidated;
        Ok(())
    }
}
