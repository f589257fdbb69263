//! Cooperative cancellation.
//!
//! Every pipeline stage and transport call receives a [`CancellationToken`].
//! Wrappers check it between batches and pages; transports race in-flight
//! requests and backoff sleeps against it.

mod token;

pub use token::CancellationToken;
