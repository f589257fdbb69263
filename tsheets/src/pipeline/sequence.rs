//! Linear stage sequences.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::Result;
use crate::model::Entity;
use crate::observability::SpanTimer;
use crate::stages::Stage;

/// An ordered list of stages run against one context.
///
/// Stages run one at a time in registration order. Cancellation is checked
/// before each stage; the first error aborts the rest. A pipeline is itself a
/// [`Stage`], so sequences nest.
pub struct Pipeline<T: Entity> {
    name: String,
    stages: Vec<Arc<dyn Stage<T>>>,
}

impl<T: Entity> Pipeline<T> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage<T> + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends a shared stage.
    #[must_use]
    pub fn shared_stage(mut self, stage: Arc<dyn Stage<T>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T: Entity> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for Pipeline<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        for stage in &self.stages {
            cancel.check()?;

            let timer = SpanTimer::start(stage.name());
            debug!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                pipeline = %self.name,
                stage = stage.name(),
                "stage started"
            );

            let outcome = stage.process(ctx, cancel).await;
            debug!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                pipeline = %self.name,
                stage = timer.name(),
                duration_ms = timer.elapsed_ms(),
                ok = outcome.is_ok(),
                "stage finished"
            );
            outcome?;
        }
        Ok(())
    }
}
