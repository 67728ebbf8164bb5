//! Employee record projection.
//!
//! Turns upstream employee records into picker rows and resolves the employee
//! references a selection is built from.

use std::collections::HashSet;

use serde_json::Value;

use crate::lenient::{self, FieldChain};
use crate::models::{EmployeeListItem, EmployeePage, EmployeeQuery, Pagination, PLACEHOLDER};

const EMPLOYEE_ID: FieldChain =
    FieldChain::new(&["employeeId", "staffId", "empId", "id", "_id", "userId", "uuid"]);
const FULL_NAME: FieldChain = FieldChain::new(&["fullName", "name", "displayName", "employeeName"]);
const FIRST_NAME: FieldChain = FieldChain::new(&["firstName", "firstname", "givenName"]);
const LAST_NAME: FieldChain = FieldChain::new(&["lastName", "lastname", "surname", "familyName"]);
const ROLE: FieldChain = FieldChain::new(&["jobTitle", "role", "designation", "position", "cadre.name"]);
const DEPARTMENT: FieldChain =
    FieldChain::new(&["department.name", "departmentName", "department", "dept"]);
const CODE: FieldChain = FieldChain::new(&["employeeCode", "staffCode", "code", "staffId", "employeeId"]);
const AVATAR: FieldChain = FieldChain::new(&["avatar", "photo", "profileImage", "image", "imageUrl"]);

const EMPLOYEE_LIST: &[&str] = &["employees", "data.employees", "data", "docs", "items", "results"];
const PAGE: FieldChain = FieldChain::new(&["pagination.page", "pagination.currentPage", "page", "currentPage"]);
const PER_PAGE: FieldChain =
    FieldChain::new(&["pagination.perPage", "pagination.limit", "perPage", "limit"]);
const TOTAL_PAGES: FieldChain =
    FieldChain::new(&["pagination.totalPages", "pagination.pages", "totalPages", "pages"]);
const TOTAL_DOCS: FieldChain =
    FieldChain::new(&["pagination.totalDocs", "pagination.total", "totalDocs", "total"]);

/// The id an employee reference names, if any. Strings and numbers are ids
/// themselves; records go through the id chain.
pub fn employee_id(reference: &Value) -> Option<String> {
    lenient::scalar_string(reference).or_else(|| EMPLOYEE_ID.string(reference))
}

/// Like [`employee_id`], but an unresolvable reference gets the positional
/// id `employee-<index>`.
pub fn resolve_employee_id(reference: &Value, index: usize) -> String {
    employee_id(reference).unwrap_or_else(|| format!("employee-{}", index))
}

/// Resolve and de-duplicate employee references, keeping first-seen order.
pub fn normalize_employee_ids(references: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    references
        .iter()
        .enumerate()
        .map(|(index, reference)| resolve_employee_id(reference, index))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Up to two uppercase initials, `?` for an empty name.
pub fn initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

fn display_name(record: &Value) -> Option<String> {
    if let Some(name) = FULL_NAME.string(record) {
        return Some(name);
    }
    let parts: Vec<String> = [FIRST_NAME.string(record), LAST_NAME.string(record)]
        .into_iter()
        .flatten()
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Project one upstream employee record into a picker row.
pub fn to_list_item(record: &Value, index: usize) -> EmployeeListItem {
    let name = display_name(record).unwrap_or_else(|| "Unnamed employee".to_string());
    let placeholder = || PLACEHOLDER.to_string();

    EmployeeListItem {
        id: EMPLOYEE_ID.string_or(record, || format!("employee-{}", index)),
        initials: initials(&name),
        role: ROLE.string_or(record, placeholder),
        department: DEPARTMENT.string_or(record, placeholder),
        code: CODE.string_or(record, placeholder),
        avatar: AVATAR.string(record),
        name,
    }
}

/// Project an upstream employee listing into a page.
///
/// Missing pagination fields fall back to the request's own parameters;
/// missing total pages are derived from the document count.
pub fn page_from_response(response: &Value, query: &EmployeeQuery) -> EmployeePage {
    let records = lenient::records(response, EMPLOYEE_LIST);
    let employees: Vec<EmployeeListItem> = records
        .iter()
        .enumerate()
        .map(|(index, record)| to_list_item(record, index))
        .collect();

    let page = PAGE.count(response).map_or(query.page, clamp_u32).max(1);
    let per_page = PER_PAGE.count(response).map_or(query.per_page, clamp_u32).max(1);
    let total_docs = TOTAL_DOCS.count(response).unwrap_or(employees.len() as u64);
    let total_pages = TOTAL_PAGES
        .count(response)
        .map(clamp_u32)
        .unwrap_or_else(|| clamp_u32(total_docs.div_ceil(u64::from(per_page))))
        .max(1);

    EmployeePage {
        employees,
        pagination: Pagination {
            page,
            per_page,
            total_pages,
            total_docs,
        },
    }
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
