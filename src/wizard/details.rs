//! Run details validation.

use chrono::{Month, NaiveDate};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{RunDetailsRequest, RunPayroll};

/// Validate and normalize the first wizard step.
pub fn validate_details(request: RunDetailsRequest) -> Result<RunPayroll, AppError> {
    let month = parse_month(&request.month).ok_or_else(|| {
        AppError::Validation(format!("Unrecognised month: {}", request.month))
    })?;

    if !(1900..=9999).contains(&request.year) {
        return Err(AppError::Validation(format!(
            "Year {} is out of range",
            request.year
        )));
    }

    let payroll_type = request.payroll_type.trim();
    if payroll_type.is_empty() {
        return Err(AppError::Validation("Payroll type is required".to_string()));
    }

    let payroll_date = NaiveDate::parse_from_str(request.payroll_date.trim(), "%Y-%m-%d")
        .map_err(|_| {
            AppError::Validation(format!(
                "Payroll date must be YYYY-MM-DD, got '{}'",
                request.payroll_date
            ))
        })?;

    Ok(RunPayroll {
        month: month.name().to_string(),
        year: request.year,
        payroll_type: payroll_type.to_string(),
        payroll_date,
    })
}

/// Accepts "March", "mar", "3" or 3.
fn parse_month(value: &Value) -> Option<Month> {
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => return s.trim().parse::<Month>().ok(),
        },
        _ => None,
    }?;
    let number = u8::try_from(number).ok()?;
    Month::try_from(number).ok()
}
