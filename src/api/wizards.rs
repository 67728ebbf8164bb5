//! Wizard session endpoints.

use axum::{body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::options::load_options;
use super::{success, ApiJson, ApiPath, ApiResult};
use crate::errors::AppError;
use crate::models::{
    EntityKind, EntityOption, OptionQuery, RunDetailsRequest, ScopeDefaults, SelectionKind,
    SelectionMode,
};
use crate::picker::EmployeePicker;
use crate::wizard::{validate_details, WizardOptions, WizardSession, WizardStep, WizardView};
use crate::AppState;

/// Request body for opening a wizard.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWizardRequest {
    #[serde(default)]
    pub default_values: ScopeDefaults,
}

#[derive(Debug, Deserialize)]
pub struct SetStepRequest {
    pub step: WizardStep,
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: SelectionMode,
}

/// Replace any of the selection lists. Omitted lists are left alone.
#[derive(Debug, Deserialize)]
pub struct SetSelectionRequest {
    #[serde(default)]
    pub departments: Option<Vec<String>>,
    #[serde(default)]
    pub cadres: Option<Vec<String>>,
    #[serde(default)]
    pub employees: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSelectionRequest {
    pub kind: SelectionKind,
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct ToggleSelectionResponse {
    pub selected: bool,
    pub wizard: WizardView,
}

/// POST /api/wizards - Open a payroll run wizard. The body is optional.
pub async fn create_wizard(State(state): State<AppState>, body: Bytes) -> ApiResult<WizardView> {
    let request: CreateWizardRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateWizardRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let picker = EmployeePicker::new(
        state.config.picker_per_page,
        state.config.search_debounce_ms,
        state.config.picker_stall_ms(),
    );
    let session = WizardSession::new(&request.default_values, picker);
    success(state.wizards.insert(session).await)
}

/// GET /api/wizards/:id - Current wizard state.
pub async fn get_wizard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<WizardView> {
    success(state.wizards.read(id, WizardSession::view).await?)
}

/// DELETE /api/wizards/:id - Cancel a wizard, discarding its state. Refused
/// while a submission is in flight.
pub async fn cancel_wizard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.wizards.cancel(id).await?;
    success(())
}

/// PUT /api/wizards/:id/details - Set run details.
pub async fn set_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RunDetailsRequest>,
) -> ApiResult<WizardView> {
    let details = validate_details(request)?;
    let view = state
        .wizards
        .update(id, |wizard| {
            wizard.set_details(details);
            wizard.view()
        })
        .await?;
    success(view)
}

/// PUT /api/wizards/:id/step - Move between wizard steps.
pub async fn set_step(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetStepRequest>,
) -> ApiResult<WizardView> {
    let view = state
        .wizards
        .update(id, |wizard| wizard.go_to(request.step).map(|()| wizard.view()))
        .await??;
    success(view)
}

/// PUT /api/wizards/:id/mode - Change the selection mode.
pub async fn set_mode(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetModeRequest>,
) -> ApiResult<WizardView> {
    let view = state
        .wizards
        .update(id, |wizard| {
            wizard.scope.set_mode(request.mode);
            wizard.view()
        })
        .await?;
    success(view)
}

/// PUT /api/wizards/:id/selection - Replace selection lists.
pub async fn set_selection(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetSelectionRequest>,
) -> ApiResult<WizardView> {
    let view = state
        .wizards
        .update(id, |wizard| {
            if let Some(departments) = request.departments {
                wizard.scope.set_departments(departments);
            }
            if let Some(cadres) = request.cadres {
                wizard.scope.set_cadres(cadres);
            }
            if let Some(employees) = &request.employees {
                wizard.scope.set_employees(employees);
            }
            wizard.view()
        })
        .await?;
    success(view)
}

/// POST /api/wizards/:id/selection/toggle - Toggle one id.
pub async fn toggle_selection(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ToggleSelectionRequest>,
) -> ApiResult<ToggleSelectionResponse> {
    let response = state
        .wizards
        .update(id, |wizard| {
            let selected = wizard.scope.toggle(request.kind, &request.id);
            ToggleSelectionResponse {
                selected,
                wizard: wizard.view(),
            }
        })
        .await?;
    success(response)
}

/// GET /api/wizards/:id/options - Departments and cadres for the scope step.
///
/// Each list fails independently; a failed list comes back empty with
/// `isError` set.
pub async fn wizard_options(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<WizardOptions> {
    // Fail fast on an unknown wizard before calling upstream.
    state.wizards.read(id, |_| ()).await?;

    let (departments, cadres) = tokio::join!(
        load_options(&state, EntityKind::Department),
        load_options(&state, EntityKind::Cadre),
    );

    let options = state
        .wizards
        .update(id, |wizard| WizardOptions {
            departments: record(wizard, EntityKind::Department, departments),
            cadres: record(wizard, EntityKind::Cadre, cadres),
        })
        .await?;
    success(options)
}

fn record(
    wizard: &mut WizardSession,
    kind: EntityKind,
    loaded: Result<Vec<EntityOption>, AppError>,
) -> OptionQuery {
    match loaded {
        Ok(options) => {
            wizard.record_options(kind, &options);
            OptionQuery::loaded(options)
        }
        Err(e) => {
            tracing::warn!(kind = kind.as_str(), "Option query failed: {}", e);
            OptionQuery::failed()
        }
    }
}
