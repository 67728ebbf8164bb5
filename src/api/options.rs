//! Department and cadre option endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{EntityKind, EntityOption};
use crate::options::options_from_response;
use crate::AppState;

/// Fetch and aggregate one option list from upstream.
pub(super) async fn load_options(
    state: &AppState,
    kind: EntityKind,
) -> Result<Vec<EntityOption>, AppError> {
    let response = match kind {
        EntityKind::Department => state.directory.list_departments().await?,
        EntityKind::Cadre => state.directory.list_cadres().await?,
    };
    let options = options_from_response(kind, &response);
    tracing::debug!(kind = kind.as_str(), count = options.len(), "Loaded options");
    Ok(options)
}

/// GET /api/options/departments - Department choices.
pub async fn list_department_options(State(state): State<AppState>) -> ApiResult<Vec<EntityOption>> {
    success(load_options(&state, EntityKind::Department).await?)
}

/// GET /api/options/cadres - Cadre choices.
pub async fn list_cadre_options(State(state): State<AppState>) -> ApiResult<Vec<EntityOption>> {
    success(load_options(&state, EntityKind::Cadre).await?)
}
