//! Testing utilities for code built on the client.
//!
//! This module provides:
//! - [`ScriptedTransport`], a transport that replays queued responses
//! - [`ResponseBuilder`] and helpers for API-shaped response bodies

mod fixtures;
mod scripted;

pub use fixtures::{echo_write_response, report_response, ResponseBuilder};
pub use scripted::{RecordedCall, ScriptedTransport, Verb};
