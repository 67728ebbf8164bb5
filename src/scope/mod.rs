//! Employee scope resolution.
//!
//! A [`ScopeSelection`] holds the wizard's selection mode together with the
//! picks made in every mode. Picks survive switches between the department,
//! cadre and specific modes; switching to `all` clears them. The payload sent
//! upstream only ever carries the list matching the active mode.

use serde::Serialize;
use serde_json::Value;

use crate::employees::{employee_id, normalize_employee_ids};
use crate::lenient::scalar_string;
use crate::models::{ScopeDefaults, ScopePayload, SelectionKind, SelectionMode};
use crate::options::CountLookup;

/// Counts known to the wizard, used to summarise a selection.
#[derive(Debug, Clone, Default)]
pub struct CountContext {
    pub departments: CountLookup,
    pub cadres: CountLookup,
    /// Total number of employees, when upstream has reported it.
    pub roster_total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSelection {
    mode: SelectionMode,
    departments: Vec<String>,
    cadres: Vec<String>,
    employees: Vec<String>,
}

impl ScopeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state from a wizard's default values.
    ///
    /// The first set flag, in the order all / department / cadre / specific,
    /// picks the mode; with none set the mode is `all`.
    pub fn from_defaults(defaults: &ScopeDefaults) -> Self {
        let mode = if defaults.all_employees {
            SelectionMode::All
        } else if defaults.by_department {
            SelectionMode::Department
        } else if defaults.by_cadre {
            SelectionMode::Cadre
        } else if defaults.specific_employees {
            SelectionMode::Specific
        } else {
            SelectionMode::All
        };

        let mut selection = Self {
            mode: SelectionMode::All,
            departments: dedup(defaults.departments.iter().cloned()),
            cadres: dedup(defaults.cadres.iter().cloned()),
            employees: normalize_employee_ids(&defaults.employees),
        };
        selection.set_mode(mode);
        selection
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn departments(&self) -> &[String] {
        &self.departments
    }

    pub fn cadres(&self) -> &[String] {
        &self.cadres
    }

    pub fn employees(&self) -> &[String] {
        &self.employees
    }

    /// Switch mode. Entering `all` clears every list; other switches keep them.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        if mode == SelectionMode::All {
            self.departments.clear();
            self.cadres.clear();
            self.employees.clear();
        }
    }

    pub fn set_departments(&mut self, ids: Vec<String>) {
        self.departments = dedup(ids);
    }

    pub fn set_cadres(&mut self, ids: Vec<String>) {
        self.cadres = dedup(ids);
    }

    /// Replace the employee selection with normalized references.
    pub fn set_employees(&mut self, references: &[Value]) {
        self.employees = normalize_employee_ids(references);
    }

    /// Add the id if absent, remove it otherwise. Returns whether it is now
    /// selected. Department and cadre references must be plain ids, employee
    /// references must resolve to an id; anything else is ignored.
    pub fn toggle(&mut self, kind: SelectionKind, reference: &Value) -> bool {
        let (list, id) = match kind {
            SelectionKind::Department => match scalar_string(reference) {
                Some(id) => (&mut self.departments, id),
                None => return false,
            },
            SelectionKind::Cadre => match scalar_string(reference) {
                Some(id) => (&mut self.cadres, id),
                None => return false,
            },
            SelectionKind::Employee => match employee_id(reference) {
                Some(id) => (&mut self.employees, id),
                None => return false,
            },
        };

        if let Some(position) = list.iter().position(|existing| *existing == id) {
            list.remove(position);
            false
        } else {
            list.push(id);
            true
        }
    }

    /// Serialize the active mode. Pure and idempotent.
    pub fn build_payload(&self) -> ScopePayload {
        let mut payload = ScopePayload::default();
        match self.mode {
            SelectionMode::All => payload.all_employees = true,
            SelectionMode::Department => {
                payload.by_department = true;
                payload.departments = self.departments.clone();
            }
            SelectionMode::Cadre => {
                payload.by_cadre = true;
                payload.cadres = self.cadres.clone();
            }
            SelectionMode::Specific => {
                payload.specific_employees = true;
                payload.employees = self.employees.clone();
            }
        }
        payload
    }

    /// Whether the active mode has nothing selected (`all` never is).
    pub fn is_empty_selection(&self) -> bool {
        match self.mode {
            SelectionMode::All => false,
            SelectionMode::Department => self.departments.is_empty(),
            SelectionMode::Cadre => self.cadres.is_empty(),
            SelectionMode::Specific => self.employees.is_empty(),
        }
    }

    /// Number of employees the current selection covers, when known.
    pub fn current_count(&self, counts: &CountContext) -> Option<u64> {
        match self.mode {
            SelectionMode::All => counts.roster_total,
            SelectionMode::Department => Some(counts.departments.sum_selected(&self.departments)),
            SelectionMode::Cadre => Some(counts.cadres.sum_selected(&self.cadres)),
            SelectionMode::Specific => {
                Some(u64::try_from(self.employees.len()).unwrap_or(u64::MAX))
            }
        }
    }
}

fn dedup(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in ids {
        let id = id.trim().to_string();
        if !id.is_empty() && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
