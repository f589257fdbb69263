//! Per-call context for pipeline execution.
//!
//! This module provides:
//! - [`ApiContext`], the mutable record threaded through a stage sequence
//! - Decoded results with per-item failures
//! - Get options and paging state
//! - The supplemental data side-table
//! - The per-call diagnostic identity

mod api_context;
mod log_context;
mod options;
mod results;
mod supplemental;

pub use api_context::{ApiContext, ContextKind, Operation};
pub use log_context::LogContext;
pub use options::{PagingState, RequestOptions};
pub use results::{ErrorItem, ResultStatus, Results};
pub use supplemental::{SupplementalData, SupplementalKind};

pub(crate) use supplemental::{entity_id, record_id};
