//! Request filters.
//!
//! Get filters travel as a query map: lists are comma-joined, booleans are
//! `true`/`false` and unset fields are omitted. Report filters travel as a
//! JSON body instead.

use crate::errors::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Converts a serializable filter into a query map.
///
/// The filter must serialize to a JSON object.
pub fn to_query<F: Serialize>(filter: &F) -> Result<BTreeMap<String, String>> {
    let value = serde_json::to_value(filter)?;
    let serde_json::Value::Object(map) = value else {
        return Err(Error::invalid_request("filter must serialize to an object"));
    };

    let mut query = BTreeMap::new();
    for (key, value) in map {
        if let Some(text) = query_value(&value) {
            query.insert(key, text);
        }
    }
    Ok(query)
}

fn query_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(query_value).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        serde_json::Value::Object(_) => Some(value.to_string()),
    }
}

/// Active-state selector used by most filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    /// Only active records.
    #[default]
    Yes,
    /// Only inactive records.
    No,
    /// Both.
    Both,
}

/// Filter for users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    /// User ids.
    pub ids: Option<Vec<i64>>,
    /// User ids to exclude.
    pub not_ids: Option<Vec<i64>>,
    /// Employee numbers.
    pub employee_numbers: Option<Vec<i64>>,
    /// Usernames.
    pub usernames: Option<Vec<String>>,
    /// Group ids.
    pub group_ids: Option<Vec<i64>>,
    /// Group ids to exclude.
    pub not_group_ids: Option<Vec<i64>>,
    /// Payroll ids.
    pub payroll_ids: Option<Vec<String>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// First name, `*` wildcards allowed.
    pub first_name: Option<String>,
    /// Last name, `*` wildcards allowed.
    pub last_name: Option<String>,
    /// Only users modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only users modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

impl UserFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to the given ids.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Sets the active state.
    #[must_use]
    pub fn with_active(mut self, active: ActiveStatus) -> Self {
        self.active = Some(active);
        self
    }
}

/// Filter for groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupFilter {
    /// Group ids.
    pub ids: Option<Vec<i64>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Manager user ids.
    pub manager_ids: Option<Vec<i64>>,
    /// Group names.
    pub name: Option<Vec<String>>,
    /// Only groups modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only groups modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for jobcodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobcodeFilter {
    /// Jobcode ids.
    pub ids: Option<Vec<i64>>,
    /// Parent jobcode ids; `0` selects top-level jobcodes.
    pub parent_ids: Option<Vec<i64>>,
    /// Name, `*` wildcards allowed.
    pub name: Option<String>,
    /// Jobcode type.
    #[serde(rename = "type")]
    pub jobcode_type: Option<String>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Only jobcodes modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only jobcodes modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for jobcode assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobcodeAssignmentFilter {
    /// Assigned user ids.
    pub user_ids: Option<Vec<i64>>,
    /// Jobcode type.
    #[serde(rename = "type")]
    pub jobcode_type: Option<String>,
    /// Assigned jobcode.
    pub jobcode_id: Option<i64>,
    /// Parent of the assigned jobcodes.
    pub jobcode_parent_id: Option<i64>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Only assignments modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only assignments modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for timesheets and deleted timesheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimesheetFilter {
    /// Timesheet ids.
    pub ids: Option<Vec<i64>>,
    /// First day, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Jobcode ids.
    pub jobcode_ids: Option<Vec<i64>>,
    /// Payroll ids.
    pub payroll_ids: Option<Vec<String>>,
    /// User ids.
    pub user_ids: Option<Vec<i64>>,
    /// Group ids.
    pub group_ids: Option<Vec<i64>>,
    /// On-the-clock selector (`yes`, `no`, `both`).
    pub on_the_clock: Option<ActiveStatus>,
    /// Jobcode type.
    pub jobcode_type: Option<String>,
    /// Only timesheets modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only timesheets modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

impl TimesheetFilter {
    /// Selects timesheets in a date range.
    #[must_use]
    pub fn for_dates(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
            ..Self::default()
        }
    }
}

/// Filter for custom fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldFilter {
    /// Custom field ids.
    pub ids: Option<Vec<i64>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// What the fields apply to.
    pub applies_to: Option<String>,
    /// Only fields modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only fields modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFilter {
    /// Location ids.
    pub ids: Option<Vec<i64>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Only locations modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only locations modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for custom field items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldItemFilter {
    /// Owning custom field; required by the server.
    pub customfield_id: i64,
    /// Item ids.
    pub ids: Option<Vec<i64>>,
    /// Item names.
    pub name: Option<Vec<String>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Only items modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only items modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

impl CustomFieldItemFilter {
    /// Selects the items of one custom field.
    #[must_use]
    pub fn for_field(customfield_id: i64) -> Self {
        Self {
            customfield_id,
            ..Self::default()
        }
    }
}

/// Filter for geolocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationFilter {
    /// Geolocation ids.
    pub ids: Option<Vec<i64>>,
    /// User ids.
    pub user_ids: Option<Vec<i64>>,
    /// Group ids.
    pub group_ids: Option<Vec<i64>>,
    /// Only points modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only points modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for file metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFilter {
    /// File ids.
    pub ids: Option<Vec<i64>>,
    /// Uploading user ids.
    pub uploaded_by_user_ids: Option<Vec<i64>>,
    /// Active state.
    pub active: Option<ActiveStatus>,
    /// Only files modified before this time.
    pub modified_before: Option<DateTime<FixedOffset>>,
    /// Only files modified since this time.
    pub modified_since: Option<DateTime<FixedOffset>>,
}

/// Filter for the current totals report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentTotalsReportFilter {
    /// User ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<i64>>,
    /// Group ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
    /// On-the-clock selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_the_clock: Option<ActiveStatus>,
}

/// Filter for the payroll report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollReportFilter {
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last day, `YYYY-MM-DD`.
    pub end_date: String,
    /// User ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<i64>>,
    /// Group ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<i64>>,
    /// Whether to include users with no time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_zero_time: Option<bool>,
}

impl PayrollReportFilter {
    /// Creates a filter for a date range.
    #[must_use]
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            ..Self::default()
        }
    }
}
