//! API endpoint identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource collection exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndPoint {
    /// The authenticated user.
    CurrentUser,
    /// Custom field definitions.
    CustomFields,
    /// Items of list-type custom fields.
    CustomFieldItems,
    /// File metadata.
    Files,
    /// Raw file content.
    FilesRaw,
    /// Geolocation points.
    GeoLocations,
    /// User groups.
    Groups,
    /// Jobcode to user assignments.
    JobcodeAssignments,
    /// Jobcodes.
    Jobcodes,
    /// Locations.
    Locations,
    /// Timesheets.
    Timesheets,
    /// Deleted timesheets.
    TimesheetsDeleted,
    /// Users.
    Users,
    /// Current totals report.
    CurrentTotalsReport,
    /// Payroll report.
    PayrollReport,
}

impl EndPoint {
    /// All endpoints, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::CurrentUser,
        Self::CustomFields,
        Self::CustomFieldItems,
        Self::Files,
        Self::FilesRaw,
        Self::GeoLocations,
        Self::Groups,
        Self::JobcodeAssignments,
        Self::Jobcodes,
        Self::Locations,
        Self::Timesheets,
        Self::TimesheetsDeleted,
        Self::Users,
        Self::CurrentTotalsReport,
        Self::PayrollReport,
    ];

    /// Returns the URL path relative to the API base.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::CurrentUser => "current_user",
            Self::CustomFields => "customfields",
            Self::CustomFieldItems => "customfielditems",
            Self::Files => "files",
            Self::FilesRaw => "files/raw",
            Self::GeoLocations => "geolocations",
            Self::Groups => "groups",
            Self::JobcodeAssignments => "jobcode_assignments",
            Self::Jobcodes => "jobcodes",
            Self::Locations => "locations",
            Self::Timesheets => "timesheets",
            Self::TimesheetsDeleted => "timesheets_deleted",
            Self::Users => "users",
            Self::CurrentTotalsReport => "reports/current_totals",
            Self::PayrollReport => "reports/payroll",
        }
    }

    /// Returns the key under `results` holding this endpoint's records.
    #[must_use]
    pub fn results_key(self) -> &'static str {
        match self {
            Self::CurrentUser | Self::Users => "users",
            Self::CustomFields => "customfields",
            Self::CustomFieldItems => "customfielditems",
            Self::Files | Self::FilesRaw => "files",
            Self::GeoLocations => "geolocations",
            Self::Groups => "groups",
            Self::JobcodeAssignments => "jobcode_assignments",
            Self::Jobcodes => "jobcodes",
            Self::Locations => "locations",
            Self::Timesheets => "timesheets",
            Self::TimesheetsDeleted => "timesheets_deleted",
            Self::CurrentTotalsReport => "current_totals_report",
            Self::PayrollReport => "payroll_report",
        }
    }

    /// Returns a stable ordinal used to build log event ids.
    #[must_use]
    pub fn ordinal(self) -> u32 {
        Self::ALL
            .iter()
            .position(|e| *e == self)
            .map_or(0, |p| u32::try_from(p).unwrap_or(0) + 1)
    }
}

impl fmt::Display for EndPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = EndPoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(paths.len(), EndPoint::ALL.len());
    }

    #[test]
    fn test_current_user_shares_users_key() {
        assert_eq!(EndPoint::CurrentUser.results_key(), "users");
        assert_eq!(EndPoint::CurrentUser.path(), "current_user");
    }

    #[test]
    fn test_report_keys() {
        assert_eq!(EndPoint::PayrollReport.path(), "reports/payroll");
        assert_eq!(EndPoint::PayrollReport.results_key(), "payroll_report");
    }

    #[test]
    fn test_ordinals_are_one_based() {
        assert_eq!(EndPoint::CurrentUser.ordinal(), 1);
        assert_eq!(EndPoint::PayrollReport.ordinal(), 15);
    }
}
