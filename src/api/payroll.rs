//! Payroll submission endpoint.

use axum::extract::State;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{success, ApiPath, ApiResult};
use crate::models::CreatePayrollRequest;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayrollResponse {
    /// What was sent upstream.
    pub request: CreatePayrollRequest,
    /// Upstream's answer, passed through untouched.
    pub payroll: Value,
}

/// POST /api/wizards/:id/submit - Create the payroll run and close the wizard.
pub async fn submit_payroll(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<SubmitPayrollResponse> {
    let request = state
        .wizards
        .update(id, |wizard| wizard.begin_submit())
        .await??;

    match state.directory.create_payroll(&request).await {
        Ok(payroll) => {
            if let Err(e) = state.wizards.remove(id).await {
                tracing::warn!(wizard = %id, "Submitted wizard already closed: {}", e);
            }
            tracing::info!(
                wizard = %id,
                month = %request.run_payroll.month,
                year = request.run_payroll.year,
                "Payroll run submitted"
            );
            success(SubmitPayrollResponse { request, payroll })
        }
        Err(e) => {
            if let Err(e) = state.wizards.update(id, |wizard| wizard.abort_submit()).await {
                tracing::warn!(wizard = %id, "Could not re-enable submission: {}", e);
            }
            Err(e.into())
        }
    }
}
