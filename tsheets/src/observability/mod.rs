//! Observability utilities.
//!
//! The client logs through `tracing`; every record carries the correlation
//! id and event id of its call. Applications may install their own
//! subscriber or use [`init_tracing`].

mod subscriber;
mod timer;

pub use subscriber::{init_tracing, LogFormat};
pub use timer::SpanTimer;
