//! Report aggregates.
//!
//! A report response carries one object keyed by user id rather than a list
//! of records, so each report decodes as a single value.

use super::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One user's row of the current totals report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentTotalsRow {
    /// User the totals belong to.
    pub user_id: Option<i64>,
    /// Group of the user.
    pub group_id: Option<i64>,
    /// Whether the user is on the clock.
    pub on_the_clock: Option<bool>,
    /// Id of the active timesheet.
    pub timesheet_id: Option<i64>,
    /// Jobcode of the active timesheet.
    pub jobcode_id: Option<i64>,
    /// Seconds in the current shift.
    pub shift_seconds: Option<i64>,
    /// Seconds worked today.
    pub day_seconds: Option<i64>,
}

/// The current totals report, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentTotalsReport {
    /// Rows keyed by user id.
    pub rows: BTreeMap<String, CurrentTotalsRow>,
}

impl CurrentTotalsReport {
    /// Returns the row of one user.
    #[must_use]
    pub fn for_user(&self, user_id: i64) -> Option<&CurrentTotalsRow> {
        self.rows.get(&user_id.to_string())
    }

    /// Returns the users currently on the clock.
    pub fn on_the_clock(&self) -> impl Iterator<Item = &CurrentTotalsRow> {
        self.rows
            .values()
            .filter(|row| row.on_the_clock.unwrap_or(false))
    }
}

impl Entity for CurrentTotalsReport {}

/// One user's row of the payroll report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollRow {
    /// User the totals belong to.
    pub user_id: Option<i64>,
    /// Client id for multi-company accounts.
    pub client_id: Option<i64>,
    /// First day of the period.
    pub start_date: Option<String>,
    /// Last day of the period.
    pub end_date: Option<String>,
    /// Regular seconds.
    pub total_re_seconds: Option<i64>,
    /// Overtime seconds.
    pub total_ot_seconds: Option<i64>,
    /// Double-time seconds.
    pub total_dt_seconds: Option<i64>,
    /// Paid time off seconds.
    pub total_pto_seconds: Option<i64>,
    /// All worked seconds.
    pub total_work_seconds: Option<i64>,
    /// Paid time off seconds by jobcode id.
    pub pto_seconds: Option<BTreeMap<String, i64>>,
}

/// The payroll report, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayrollReport {
    /// Rows keyed by user id.
    pub rows: BTreeMap<String, PayrollRow>,
}

impl PayrollReport {
    /// Returns the row of one user.
    #[must_use]
    pub fn for_user(&self, user_id: i64) -> Option<&PayrollRow> {
        self.rows.get(&user_id.to_string())
    }

    /// Sums worked seconds across all users.
    #[must_use]
    pub fn total_work_seconds(&self) -> i64 {
        self.rows
            .values()
            .filter_map(|row| row.total_work_seconds)
            .sum()
    }
}

impl Entity for PayrollReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_totals_decodes_keyed_rows() {
        let report: CurrentTotalsReport = serde_json::from_value(json!({
            "11": {"user_id": 11, "on_the_clock": true, "shift_seconds": 3600},
            "12": {"user_id": 12, "on_the_clock": false}
        }))
        .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.for_user(11).unwrap().shift_seconds, Some(3600));
        assert_eq!(report.on_the_clock().count(), 1);
    }

    #[test]
    fn test_payroll_totals() {
        let report: PayrollReport = serde_json::from_value(json!({
            "1": {"user_id": 1, "total_work_seconds": 100},
            "2": {"user_id": 2, "total_work_seconds": 50, "pto_seconds": {"9": 20}}
        }))
        .unwrap();

        assert_eq!(report.total_work_seconds(), 150);
        assert_eq!(report.for_user(2).unwrap().pto_seconds.as_ref().unwrap()["9"], 20);
    }
}
