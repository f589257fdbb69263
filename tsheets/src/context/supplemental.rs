//! Supplemental data side-table.
//!
//! Responses may embed related records under `supplemental_data`, keyed by
//! record type and then by id. The side-table is merged additively across
//! pages and batches: a record with a known id replaces the previous one,
//! nothing is ever removed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Error, Result};
use crate::model::{
    CustomField, CustomFieldItem, File, GeoLocation, Group, Jobcode, JobcodeAssignment, Location,
    Timesheet, User,
};

/// A record type that can appear in the supplemental section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupplementalKind {
    /// `users`
    Users,
    /// `groups`
    Groups,
    /// `jobcodes`
    Jobcodes,
    /// `jobcode_assignments`
    JobcodeAssignments,
    /// `timesheets`
    Timesheets,
    /// `customfields`
    CustomFields,
    /// `customfielditems`
    CustomFieldItems,
    /// `locations`
    Locations,
    /// `geolocations`
    GeoLocations,
    /// `files`
    Files,
}

impl SupplementalKind {
    /// Resolves a section name.
    ///
    /// Unknown names mean the server returned a shape this client does not
    /// understand.
    pub fn from_section(name: &str) -> Result<Self> {
        let kind = match name {
            "users" => Self::Users,
            "groups" => Self::Groups,
            "jobcodes" => Self::Jobcodes,
            "jobcode_assignments" => Self::JobcodeAssignments,
            "timesheets" => Self::Timesheets,
            "customfields" => Self::CustomFields,
            "customfielditems" => Self::CustomFieldItems,
            "locations" => Self::Locations,
            "geolocations" => Self::GeoLocations,
            "files" => Self::Files,
            other => {
                return Err(Error::InvalidState(format!(
                    "unknown supplemental data section '{other}'"
                )))
            }
        };
        Ok(kind)
    }

    /// Returns the section name.
    #[must_use]
    pub fn section(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Groups => "groups",
            Self::Jobcodes => "jobcodes",
            Self::JobcodeAssignments => "jobcode_assignments",
            Self::Timesheets => "timesheets",
            Self::CustomFields => "customfields",
            Self::CustomFieldItems => "customfielditems",
            Self::Locations => "locations",
            Self::GeoLocations => "geolocations",
            Self::Files => "files",
        }
    }
}

impl fmt::Display for SupplementalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// Related records embedded in responses, keyed by type and id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplementalData {
    /// Users by id.
    pub users: BTreeMap<i64, User>,
    /// Groups by id.
    pub groups: BTreeMap<i64, Group>,
    /// Jobcodes by id.
    pub jobcodes: BTreeMap<i64, Jobcode>,
    /// Jobcode assignments by id.
    pub jobcode_assignments: BTreeMap<i64, JobcodeAssignment>,
    /// Timesheets by id.
    pub timesheets: BTreeMap<i64, Timesheet>,
    /// Custom fields by id.
    pub customfields: BTreeMap<i64, CustomField>,
    /// Custom field items by id.
    pub customfielditems: BTreeMap<i64, CustomFieldItem>,
    /// Locations by id.
    pub locations: BTreeMap<i64, Location>,
    /// Geolocations by id.
    pub geolocations: BTreeMap<i64, GeoLocation>,
    /// Files by id.
    pub files: BTreeMap<i64, File>,
}

impl SupplementalData {
    /// Creates an empty side-table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
            + self.groups.len()
            + self.jobcodes.len()
            + self.jobcode_assignments.len()
            + self.timesheets.len()
            + self.customfields.len()
            + self.customfielditems.len()
            + self.locations.len()
            + self.geolocations.len()
            + self.files.len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decodes one response section and merges its records.
    pub fn merge_section(
        &mut self,
        name: &str,
        records: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        match SupplementalKind::from_section(name)? {
            SupplementalKind::Users => merge_records(&mut self.users, name, records),
            SupplementalKind::Groups => merge_records(&mut self.groups, name, records),
            SupplementalKind::Jobcodes => merge_records(&mut self.jobcodes, name, records),
            SupplementalKind::JobcodeAssignments => {
                merge_records(&mut self.jobcode_assignments, name, records)
            }
            SupplementalKind::Timesheets => merge_records(&mut self.timesheets, name, records),
            SupplementalKind::CustomFields => merge_records(&mut self.customfields, name, records),
            SupplementalKind::CustomFieldItems => {
                merge_records(&mut self.customfielditems, name, records)
            }
            SupplementalKind::Locations => merge_records(&mut self.locations, name, records),
            SupplementalKind::GeoLocations => merge_records(&mut self.geolocations, name, records),
            SupplementalKind::Files => merge_records(&mut self.files, name, records),
        }
    }
}

fn merge_records<E: DeserializeOwned>(
    target: &mut BTreeMap<i64, E>,
    section: &str,
    records: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    for (key, record) in records {
        let id = record_id(key, record).ok_or_else(|| {
            Error::InvalidState(format!("supplemental {section} record '{key}' has no id"))
        })?;
        let entity = serde_json::from_value(record.clone())?;
        target.insert(id, entity);
    }
    Ok(())
}

/// Resolves a record id from its map key, falling back to its `id` field.
pub(crate) fn record_id(key: &str, record: &serde_json::Value) -> Option<i64> {
    key.parse()
        .ok()
        .or_else(|| record.get("id").and_then(value_as_id))
}

/// Resolves a record id from its `id` field, falling back to its map key.
///
/// Write responses key records by request position, so the body wins there.
pub(crate) fn entity_id(key: &str, record: &serde_json::Value) -> Option<i64> {
    record
        .get("id")
        .and_then(value_as_id)
        .or_else(|| key.parse().ok())
}

fn value_as_id(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
