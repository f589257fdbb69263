//! Resource entities.
//!
//! Every field is optional so a partial record echoed back with a failure
//! status still decodes. Null fields are stripped before a request is sent.

use super::{Entity, FieldRules};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-maintained timestamps that are never written.
const TIMESTAMPS: &[&str] = &["last_modified", "created"];

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Id of the user.
    pub id: Option<i64>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Display name.
    pub display_name: Option<String>,
    /// Id of the group the user belongs to.
    pub group_id: Option<i64>,
    /// Whether the user is active.
    pub active: Option<bool>,
    /// Employee number.
    pub employee_number: Option<i64>,
    /// Whether the user is salaried.
    pub salaried: Option<bool>,
    /// Whether the user is exempt from overtime.
    pub exempt: Option<bool>,
    /// Login name.
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the email address is verified.
    pub email_verified: Option<bool>,
    /// Payroll id.
    pub payroll_id: Option<String>,
    /// Hire date, `YYYY-MM-DD`.
    pub hire_date: Option<String>,
    /// Termination date, `YYYY-MM-DD`.
    pub term_date: Option<String>,
    /// Mobile phone number.
    pub mobile_number: Option<String>,
    /// Groups this user manages.
    pub manager_of_group_ids: Option<Vec<i64>>,
    /// Password, only ever sent.
    pub password: Option<String>,
    /// Last time the user was active.
    pub last_active: Option<DateTime<FixedOffset>>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for User {
    fn field_rules() -> FieldRules {
        FieldRules::new(
            &["id"],
            &["last_modified", "created", "last_active", "email_verified"],
        )
    }
}

/// A group of users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Id of the group.
    pub id: Option<i64>,
    /// Whether the group is active.
    pub active: Option<bool>,
    /// Group name.
    pub name: Option<String>,
    /// Users managing this group.
    pub manager_ids: Option<Vec<i64>>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for Group {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], TIMESTAMPS)
    }
}

/// A jobcode, the unit time is tracked against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jobcode {
    /// Id of the jobcode.
    pub id: Option<i64>,
    /// Id of the parent jobcode, `0` at the top level.
    pub parent_id: Option<i64>,
    /// Name.
    pub name: Option<String>,
    /// Short code.
    pub short_code: Option<String>,
    /// Jobcode type (`regular`, `pto`, `paid_break`, `unpaid_break`).
    #[serde(rename = "type")]
    pub jobcode_type: Option<String>,
    /// Whether the jobcode is billable.
    pub billable: Option<bool>,
    /// Billable rate.
    pub billable_rate: Option<f64>,
    /// Whether it has child jobcodes.
    pub has_children: Option<bool>,
    /// Whether every user is assigned to it.
    pub assigned_to_all: Option<bool>,
    /// Whether the jobcode is active.
    pub active: Option<bool>,
    /// Custom fields required when tracking time against it.
    pub required_customfields: Option<Vec<i64>>,
    /// Linked location ids.
    pub locations: Option<Vec<i64>>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for Jobcode {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], &["last_modified", "created", "has_children"])
    }
}

/// Assignment of a jobcode to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobcodeAssignment {
    /// Id of the assignment.
    pub id: Option<i64>,
    /// Assigned user.
    pub user_id: Option<i64>,
    /// Assigned jobcode.
    pub jobcode_id: Option<i64>,
    /// Whether the assignment is active.
    pub active: Option<bool>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for JobcodeAssignment {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], TIMESTAMPS)
    }
}

/// A timesheet entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timesheet {
    /// Id of the timesheet.
    pub id: Option<i64>,
    /// Owner of the timesheet.
    pub user_id: Option<i64>,
    /// Jobcode time is tracked against.
    pub jobcode_id: Option<i64>,
    /// Start time (ISO 8601), empty for manual timesheets.
    pub start: Option<String>,
    /// End time (ISO 8601), empty while on the clock.
    pub end: Option<String>,
    /// Duration in seconds.
    pub duration: Option<i64>,
    /// Date of the timesheet, `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Timesheet type (`regular` or `manual`).
    #[serde(rename = "type")]
    pub timesheet_type: Option<String>,
    /// Timezone offset in hours.
    pub tz: Option<i32>,
    /// Timezone name.
    pub tz_str: Option<String>,
    /// Location description.
    pub location: Option<String>,
    /// Whether the user is currently on the clock.
    pub on_the_clock: Option<bool>,
    /// Lock level, non-zero when locked.
    pub locked: Option<i32>,
    /// Notes.
    pub notes: Option<String>,
    /// Custom field values keyed by custom field id.
    pub customfields: Option<BTreeMap<String, String>>,
    /// Attached file ids.
    pub attached_files: Option<Vec<i64>>,
    /// User who created the timesheet.
    pub created_by_user_id: Option<i64>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
}

impl Entity for Timesheet {
    fn field_rules() -> FieldRules {
        FieldRules::new(
            &["id"],
            &[
                "last_modified",
                "on_the_clock",
                "created_by_user_id",
                "tz",
                "tz_str",
                "locked",
            ],
        )
    }
}

/// A custom field definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    /// Id of the custom field.
    pub id: Option<i64>,
    /// Whether the field is active.
    pub active: Option<bool>,
    /// Whether the field applies to every jobcode.
    pub global: Option<bool>,
    /// Whether a value is required.
    pub required: Option<bool>,
    /// What the field applies to (`timesheet`, `user`, `jobcode`).
    pub applies_to: Option<String>,
    /// Field type (`managed-list` or `free-form`).
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    /// Short code.
    pub short_code: Option<String>,
    /// Validation regex for free-form values.
    pub regex_filter: Option<String>,
    /// Name.
    pub name: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for CustomField {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], TIMESTAMPS)
    }
}

/// An item of a managed-list custom field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomFieldItem {
    /// Id of the item.
    pub id: Option<i64>,
    /// Owning custom field.
    pub customfield_id: Option<i64>,
    /// Whether the item is active.
    pub active: Option<bool>,
    /// Short code.
    pub short_code: Option<String>,
    /// Name.
    pub name: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
}

impl Entity for CustomFieldItem {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], &["last_modified"])
    }
}

/// A named place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Id of the location.
    pub id: Option<i64>,
    /// First address line.
    pub addr1: Option<String>,
    /// Second address line.
    pub addr2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State.
    pub state: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Address formatted by the server.
    pub formatted_address: Option<String>,
    /// Whether the location is active.
    pub active: Option<bool>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for Location {
    fn field_rules() -> FieldRules {
        FieldRules::new(
            &["id"],
            &["last_modified", "created", "formatted_address"],
        )
    }
}

/// A geolocation point recorded by a device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoLocation {
    /// Id of the point.
    pub id: Option<i64>,
    /// User who recorded it.
    pub user_id: Option<i64>,
    /// Accuracy in meters.
    pub accuracy: Option<f64>,
    /// Altitude in meters.
    pub altitude: Option<f64>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Speed in meters per second.
    pub speed: Option<f64>,
    /// Heading in degrees.
    pub heading: Option<f64>,
    /// Source (`gps`, `wifi`, `cell`).
    pub source: Option<String>,
    /// Device identifier.
    pub device_identifier: Option<String>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for GeoLocation {
    fn field_rules() -> FieldRules {
        FieldRules::new(&["id"], &["created"])
    }
}

/// Metadata of an uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    /// Id of the file.
    pub id: Option<i64>,
    /// File name.
    pub file_name: Option<String>,
    /// Uploader.
    pub uploaded_by_user_id: Option<i64>,
    /// Whether the file is active.
    pub active: Option<bool>,
    /// Size in bytes.
    pub size: Option<i64>,
    /// Description.
    pub file_description: Option<String>,
    /// Rotation for images, in degrees.
    pub image_rotation: Option<i32>,
    /// Last modification time.
    pub last_modified: Option<DateTime<FixedOffset>>,
    /// Creation time.
    pub created: Option<DateTime<FixedOffset>>,
}

impl Entity for File {
    fn field_rules() -> FieldRules {
        FieldRules::new(
            &["id"],
            &["last_modified", "created", "size", "uploaded_by_user_id"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_decodes_partial_record() {
        let user: User = serde_json::from_value(json!({
            "id": 42,
            "first_name": "Ada",
            "manager_of_group_ids": [1, 2],
            "last_modified": "2024-03-01T10:00:00+00:00"
        }))
        .unwrap();

        assert_eq!(user.id, Some(42));
        assert_eq!(user.manager_of_group_ids, Some(vec![1, 2]));
        assert!(user.last_modified.is_some());
        assert!(user.email.is_none());
    }

    #[test]
    fn test_type_fields_are_renamed() {
        let jobcode = Jobcode {
            jobcode_type: Some("pto".to_string()),
            ..Jobcode::default()
        };
        let value = serde_json::to_value(&jobcode).unwrap();
        assert_eq!(value["type"], "pto");
    }

    #[test]
    fn test_timesheet_tolerates_empty_end() {
        let sheet: Timesheet = serde_json::from_value(json!({
            "id": 7,
            "start": "2024-03-01T08:00:00-07:00",
            "end": "",
            "on_the_clock": true
        }))
        .unwrap();

        assert_eq!(sheet.end.as_deref(), Some(""));
        assert_eq!(sheet.on_the_clock, Some(true));
    }

    #[test]
    fn test_user_rules_exclude_id_on_create_only() {
        let rules = User::field_rules();
        assert!(rules.excluded_on_create("id"));
        assert!(!rules.excluded_on_update("id"));
        assert!(rules.excluded_on_update("created"));
    }
}
