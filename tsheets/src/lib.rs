//! # TSheets
//!
//! A typed async client for the TSheets timekeeping REST API.
//!
//! Every call runs as a pipeline of small stages over a per-call context:
//!
//! - **Stage pipelines**: validate, serialize, invoke the transport, decode
//! - **Auto-batching**: writes above 50 items are sent in sequential batches
//! - **Auto-paging**: gets follow pages until the server reports no more
//! - **Partial failures**: one aggregate error carries successes and failures
//! - **Resilience**: transient failures are retried with exact backoff
//! - **Cancellation**: every call honours a caller-supplied token
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tsheets::prelude::*;
//!
//! let service = DataService::from_config(&ClientConfig::new(token))?;
//! let cancel = CancellationToken::new();
//!
//! let users = service
//!     .get_users(&UserFilter::new(), RequestOptions::default(), &cancel)
//!     .await?;
//! for user in &users.items {
//!     println!("{:?}", user.first_name);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod service;
pub mod stages;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{ClientConfig, RetrySettings, TlsVersion};
    pub use crate::context::{ApiContext, LogContext, RequestOptions, SupplementalData};
    pub use crate::errors::{ApiError, Error, ErrorKind, FailedItem, MultiStatusError, Result};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::model::{
        ActiveStatus, CurrentTotalsReport, CurrentTotalsReportFilter, CustomField,
        CustomFieldFilter, CustomFieldItem, CustomFieldItemFilter, EndPoint, Entity, File,
        FileFilter, GeoLocation, GeolocationFilter, Group, GroupFilter, Jobcode,
        JobcodeAssignment, JobcodeAssignmentFilter, JobcodeFilter, Location, LocationFilter,
        PayrollReport, PayrollReportFilter, Timesheet, TimesheetFilter, User, UserFilter,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{Pipeline, PipelineFactory};
    pub use crate::service::{DataService, ListResult, ReportResult, WriteResult};
    pub use crate::stages::Stage;
    pub use crate::transport::{ResilientTransport, Transport};
    #[cfg(feature = "http")]
    pub use crate::transport::RestClient;
}
