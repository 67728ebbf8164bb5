//! Payroll run models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ScopePayload;

/// Run details collected by the first wizard step, as submitted by the
/// dashboard. Validated into [`RunPayroll`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetailsRequest {
    /// Month name, abbreviation, or number 1-12.
    pub month: serde_json::Value,
    pub year: i32,
    pub payroll_type: String,
    pub payroll_date: String,
}

/// Validated run details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunPayroll {
    /// Full English month name.
    pub month: String,
    pub year: i32,
    pub payroll_type: String,
    pub payroll_date: NaiveDate,
}

/// Payroll-creation command sent upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayrollRequest {
    pub run_payroll: RunPayroll,
    pub employee_scope: ScopePayload,
}
