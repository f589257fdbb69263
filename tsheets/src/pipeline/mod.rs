//! Request pipelines.
//!
//! This module provides:
//! - [`Pipeline`], an ordered stage sequence that is itself a stage
//! - [`AutoBatcher`], which splits large writes into batches
//! - [`AutoPager`], which follows pages of a get
//! - [`PipelineFactory`], which picks the sequence for a context

mod batching;
mod factory;
mod paging;
mod sequence;

#[cfg(test)]
mod integration_tests;

pub use batching::AutoBatcher;
pub use factory::PipelineFactory;
pub use paging::AutoPager;
pub use sequence::Pipeline;

/// Maximum number of items sent in one create or update request.
pub const BATCH_SIZE: usize = 50;
