//! Employee scope models.

use serde::{Deserialize, Serialize};

/// Which employees a payroll run targets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    All,
    Department,
    Cadre,
    Specific,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::All => "all",
            SelectionMode::Department => "department",
            SelectionMode::Cadre => "cadre",
            SelectionMode::Specific => "specific",
        }
    }
}

/// Serialized employee scope sent with a payroll-creation request.
///
/// Exactly one flag is set and only its list may be non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScopePayload {
    pub all_employees: bool,
    pub by_department: bool,
    pub departments: Vec<String>,
    pub by_cadre: bool,
    pub cadres: Vec<String>,
    pub specific_employees: bool,
    pub employees: Vec<String>,
}

/// Initial scope handed to a new wizard.
///
/// Same shape as [`ScopePayload`], but every field is optional and employee
/// references may be raw upstream records rather than id strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeDefaults {
    #[serde(default)]
    pub all_employees: bool,
    #[serde(default)]
    pub by_department: bool,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub by_cadre: bool,
    #[serde(default)]
    pub cadres: Vec<String>,
    #[serde(default)]
    pub specific_employees: bool,
    #[serde(default)]
    pub employees: Vec<serde_json::Value>,
}

/// Selection list addressed by a toggle request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Department,
    Cadre,
    Employee,
}
