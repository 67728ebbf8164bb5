//! Employee picker models.

use serde::{Deserialize, Serialize};

/// Placeholder rendered for fields upstream did not supply.
pub const PLACEHOLDER: &str = "—";

/// One row of the employee picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListItem {
    pub id: String,
    pub name: String,
    pub role: String,
    pub department: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub initials: String,
}

/// Server-authoritative pagination cursor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_docs: u64,
}

/// One page of the employee listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePage {
    pub employees: Vec<EmployeeListItem>,
    pub pagination: Pagination,
}

/// Query parameters of the paginated employee listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}
