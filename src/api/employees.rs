//! Employee listing endpoint.

use axum::extract::State;

use super::{success, ApiQuery, ApiResult};
use crate::employees::page_from_response;
use crate::models::{EmployeePage, EmployeeQuery};
use crate::AppState;

/// Maximum page size forwarded upstream.
const MAX_PER_PAGE: u32 = 100;

/// GET /api/employees - One page of the employee listing.
pub async fn list_employees(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<EmployeeQuery>,
) -> ApiResult<EmployeePage> {
    let query = EmployeeQuery {
        search: params.search.trim().to_string(),
        page: params.page.max(1),
        per_page: params.per_page.clamp(1, MAX_PER_PAGE),
    };

    let response = state.directory.list_employees(&query).await?;
    success(page_from_response(&response, &query))
}
