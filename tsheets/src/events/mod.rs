//! Event sinks for client observability.
//!
//! Sinks are injected into the transport decorator and the pipeline factory;
//! the default discards everything.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Emitted before each transport retry.
pub const TRANSPORT_RETRY: &str = "transport.retry";

/// Emitted after each batch of an auto-batched write.
pub const BATCH_COMPLETED: &str = "pipeline.batch_completed";

/// Emitted after each page of an auto-paged get.
pub const PAGE_FETCHED: &str = "pipeline.page_fetched";
