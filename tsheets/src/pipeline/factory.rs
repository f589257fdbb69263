//! Stage sequences per operation.

use std::sync::Arc;

use super::{AutoBatcher, AutoPager, Pipeline, BATCH_SIZE};
use crate::cancellation::CancellationToken;
use crate::context::{ApiContext, ContextKind, Operation};
use crate::errors::Result;
use crate::events::{EventSink, NoOpEventSink};
use crate::model::Entity;
use crate::stages::{
    DeleteInvoker, DeleteResultsDeserializer, DeleteValidator, DownloadInvoker, GetInvoker,
    MultiStatusHandler, PagingMetaDeserializer, PostInvoker, PutInvoker, ReportDeserializer,
    ReportSerializer, ResultsDeserializer, Stage, SupplementalDeserializer, WriteResultsDeserializer,
    WriteSerializer, WriteValidator,
};
use crate::transport::Transport;

/// Builds the stage sequence for a context.
///
/// | Operation | Sequence |
/// |-----------|----------|
/// | get | invoke, results, supplemental, paging meta; wrapped by [`AutoPager`] when auto-paging |
/// | create / update | validate, serialize, invoke, write results, supplemental; wrapped by [`AutoBatcher`] above [`BATCH_SIZE`] items; then multi-status |
/// | delete | validate, invoke, delete results, multi-status |
/// | download | invoke |
/// | report | serialize, invoke, report, supplemental |
#[derive(Clone)]
pub struct PipelineFactory {
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
}

impl PipelineFactory {
    /// Creates a factory whose invokers use `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink handed to the batching and paging wrappers.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Builds the sequence for `ctx`.
    #[must_use]
    pub fn build<T: Entity>(&self, ctx: &ApiContext<T>) -> Pipeline<T> {
        let name = format!("{}:{}", ctx.operation(), ctx.endpoint());
        match ctx.kind() {
            ContextKind::Get { options, .. } => {
                let page = self.get_page(&name, options.include_supplemental_data);
                if options.auto_paging {
                    Pipeline::new(name).stage(
                        AutoPager::new(Arc::new(page)).with_event_sink(self.events.clone()),
                    )
                } else {
                    page
                }
            }
            ContextKind::Create { items, .. } | ContextKind::Update { items, .. } => {
                let write = self.write_batch(&name, ctx.operation());
                let write: Arc<dyn Stage<T>> = if items.len() > BATCH_SIZE {
                    Arc::new(AutoBatcher::new(Arc::new(write)).with_event_sink(self.events.clone()))
                } else {
                    Arc::new(write)
                };
                Pipeline::new(name)
                    .shared_stage(write)
                    .stage(MultiStatusHandler)
            }
            ContextKind::Delete { .. } => Pipeline::new(name)
                .stage(DeleteValidator)
                .stage(DeleteInvoker::new(self.transport.clone()))
                .stage(DeleteResultsDeserializer)
                .stage(MultiStatusHandler),
            ContextKind::Download { .. } => {
                Pipeline::new(name).stage(DownloadInvoker::new(self.transport.clone()))
            }
            ContextKind::Report { .. } => Pipeline::new(name)
                .stage(ReportSerializer)
                .stage(PostInvoker::new(self.transport.clone()))
                .stage(ReportDeserializer)
                .stage(SupplementalDeserializer),
        }
    }

    /// Builds and runs the sequence for `ctx`.
    pub async fn execute<T: Entity>(
        &self,
        ctx: &mut ApiContext<T>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let pipeline = self.build(ctx);
        pipeline.process(ctx, cancel).await
    }

    fn get_page<T: Entity>(&self, name: &str, supplemental: bool) -> Pipeline<T> {
        let mut page = Pipeline::new(format!("{name}:page"))
            .stage(GetInvoker::new(self.transport.clone()))
            .stage(ResultsDeserializer);
        if supplemental {
            page = page.stage(SupplementalDeserializer);
        }
        page.stage(PagingMetaDeserializer)
    }

    fn write_batch<T: Entity>(&self, name: &str, operation: Operation) -> Pipeline<T> {
        let batch = Pipeline::new(format!("{name}:batch"))
            .stage(WriteValidator)
            .stage(WriteSerializer);
        let batch = if operation == Operation::Update {
            batch.stage(PutInvoker::new(self.transport.clone()))
        } else {
            batch.stage(PostInvoker::new(self.transport.clone()))
        };
        batch
            .stage(WriteResultsDeserializer)
            .stage(SupplementalDeserializer)
    }
}

impl std::fmt::Debug for PipelineFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineFactory").finish_non_exhaustive()
    }
}
