//! Employee picker endpoints.
//!
//! Each call advances the wizard's picker against the service clock and runs
//! whatever fetch the picker asks for before answering.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::{success, ApiJson, ApiPath, ApiResult};
use crate::employees::page_from_response;
use crate::errors::AppError;
use crate::picker::{FetchKey, PickerView};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub page: u32,
}

/// Run the fetch for `key`, and every follow-up the picker requests, with the
/// session lock released during upstream calls. Follow-ups only come from
/// clamping to a smaller total, so the page strictly decreases.
async fn run_fetches(state: &AppState, id: Uuid, key: Option<FetchKey>) -> Result<(), AppError> {
    let mut next = key;
    while let Some(key) = next.take() {
        match state.directory.list_employees(&key).await {
            Ok(response) => {
                let page = page_from_response(&response, &key);
                let now = state.clock.now_ms();
                next = state
                    .wizards
                    .update(id, |wizard| wizard.apply_employee_page(&key, page, now))
                    .await?;
            }
            Err(e) => {
                tracing::error!(wizard = %id, "Employee fetch failed: {}", e);
                let message = e.to_string();
                state
                    .wizards
                    .update(id, |wizard| wizard.picker.fail(&key, message))
                    .await?;
            }
        }
    }
    Ok(())
}

async fn picker_view(state: &AppState, id: Uuid) -> ApiResult<PickerView> {
    success(state.wizards.read(id, |wizard| wizard.picker.view()).await?)
}

/// GET /api/wizards/:id/picker - Poll the picker.
pub async fn get_picker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PickerView> {
    let now = state.clock.now_ms();
    let key = state.wizards.update(id, |wizard| wizard.picker.tick(now)).await?;
    run_fetches(&state, id, key).await?;
    picker_view(&state, id).await
}

/// PUT /api/wizards/:id/picker/search - Record the search box contents.
pub async fn set_picker_search(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> ApiResult<PickerView> {
    let now = state.clock.now_ms();
    let key = state
        .wizards
        .update(id, |wizard| {
            wizard.picker.type_search(request.term, now);
            wizard.picker.tick(now)
        })
        .await?;
    run_fetches(&state, id, key).await?;
    picker_view(&state, id).await
}

/// PUT /api/wizards/:id/picker/page - Navigate to a page.
pub async fn set_picker_page(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<PageRequest>,
) -> ApiResult<PickerView> {
    let now = state.clock.now_ms();
    let key = state
        .wizards
        .update(id, |wizard| wizard.picker.set_page(request.page, now))
        .await?;
    run_fetches(&state, id, key).await?;
    picker_view(&state, id).await
}

/// POST /api/wizards/:id/picker/retry - Re-issue a failed fetch.
pub async fn retry_picker(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PickerView> {
    let now = state.clock.now_ms();
    let key = state.wizards.update(id, |wizard| wizard.picker.retry(now)).await?;
    run_fetches(&state, id, key).await?;
    picker_view(&state, id).await
}
