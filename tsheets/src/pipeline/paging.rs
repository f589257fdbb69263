//! Auto-paging of get calls.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cancellation::CancellationToken;
use crate::context::ApiContext;
use crate::errors::{Error, Result};
use crate::events::{EventSink, NoOpEventSink, PAGE_FETCHED};
use crate::model::Entity;
use crate::stages::Stage;

/// Runs an inner get sequence until the server reports no more pages.
///
/// Pages are fetched strictly in order; items are concatenated in page
/// order and supplemental data accumulates across pages. Cancellation is
/// checked before every page. A `max_pages` option stops the loop early.
pub struct AutoPager<T: Entity> {
    inner: Arc<dyn Stage<T>>,
    events: Arc<dyn EventSink>,
}

impl<T: Entity> AutoPager<T> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn Stage<T>>) -> Self {
        Self {
            inner,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving per-page events.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl<T: Entity> std::fmt::Debug for AutoPager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoPager")
            .field("inner", &self.inner.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Entity> Stage<T> for AutoPager<T> {
    fn name(&self) -> &str {
        "auto_pager"
    }

    async fn process(&self, ctx: &mut ApiContext<T>, cancel: &CancellationToken) -> Result<()> {
        let max_pages = ctx.options()?.max_pages;
        let mut items = Vec::new();
        let mut fetched = 0u32;

        loop {
            cancel.check()?;
            ctx.take_results();

            self.inner.process(ctx, cancel).await?;
            fetched = fetched.saturating_add(1);

            let page = ctx.take_results();
            let state = ctx.paging();
            debug!(
                correlation_id = %ctx.log().correlation_id,
                event_id = ctx.log().event_id,
                page = state.map_or(fetched, |s| s.current_page),
                records = page.items.len(),
                more = state.is_some_and(|s| s.has_more),
                "page fetched"
            );
            self.events.try_emit(
                PAGE_FETCHED,
                Some(json!({
                    "correlation_id": ctx.log().correlation_id.to_string(),
                    "endpoint": ctx.endpoint().path(),
                    "page": state.map_or(fetched, |s| s.current_page),
                    "records": page.items.len(),
                })),
            );
            items.extend(page.items);

            let Some(state) = state.filter(|s| s.has_more) else {
                break;
            };
            if max_pages.is_some_and(|max| fetched >= max) {
                debug!(
                    correlation_id = %ctx.log().correlation_id,
                    max_pages = fetched,
                    "page limit reached"
                );
                break;
            }
            let next = state.current_page.checked_add(1).ok_or_else(|| {
                Error::InvalidState(format!(
                    "page {} reports more results but no next page exists",
                    state.current_page
                ))
            })?;
            ctx.options_mut()?.page = Some(next);
        }

        info!(
            correlation_id = %ctx.log().correlation_id,
            event_id = ctx.log().event_id,
            endpoint = %ctx.endpoint(),
            pages = fetched,
            records = items.len(),
            "auto-paged get finished"
        );
        ctx.results_mut().items = items;
        Ok(())
    }
}
