//! Entity model for the TSheets API.
//!
//! This module provides:
//! - The [`Entity`] trait and per-field write rules
//! - Endpoint identifiers and their response keys
//! - Resource entities, report aggregates and request filters

mod endpoint;
mod entities;
mod filters;
mod reports;

pub use endpoint::EndPoint;
pub use entities::{
    CustomField, CustomFieldItem, File, GeoLocation, Group, Jobcode, JobcodeAssignment, Location,
    Timesheet, User,
};
pub use filters::{
    to_query, ActiveStatus, CurrentTotalsReportFilter, CustomFieldFilter, CustomFieldItemFilter,
    FileFilter, GeolocationFilter, GroupFilter, JobcodeAssignmentFilter, JobcodeFilter,
    LocationFilter, PayrollReportFilter, TimesheetFilter, UserFilter,
};
pub use reports::{CurrentTotalsReport, CurrentTotalsRow, PayrollReport, PayrollRow};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Field names left out of request bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldRules {
    /// Fields never sent when creating (for example `id`).
    pub create_excluded: &'static [&'static str],
    /// Fields never sent on any write (server-maintained values).
    pub write_excluded: &'static [&'static str],
}

impl FieldRules {
    /// Creates a rule set.
    #[must_use]
    pub const fn new(
        create_excluded: &'static [&'static str],
        write_excluded: &'static [&'static str],
    ) -> Self {
        Self {
            create_excluded,
            write_excluded,
        }
    }

    /// Returns true if `field` must be omitted for a create request.
    #[must_use]
    pub fn excluded_on_create(&self, field: &str) -> bool {
        self.create_excluded.contains(&field) || self.write_excluded.contains(&field)
    }

    /// Returns true if `field` must be omitted for an update request.
    #[must_use]
    pub fn excluded_on_update(&self, field: &str) -> bool {
        self.write_excluded.contains(&field)
    }
}

/// A record type the API can return or accept.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Debug + 'static {
    /// Returns the write rules for this entity's fields.
    fn field_rules() -> FieldRules {
        FieldRules::default()
    }
}

impl Entity for serde_json::Value {}
