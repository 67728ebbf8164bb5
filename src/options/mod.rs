//! Department and cadre option aggregation.
//!
//! Upstream department and cadre records arrive in whatever shape the HR API
//! happens to produce. They are projected into [`EntityOption`]s here, and the
//! counts of a selection are summed against a precomputed lookup.

use std::collections::HashMap;

use serde_json::Value;

use crate::lenient::{self, FieldChain};
use crate::models::{EntityKind, EntityOption};

const DEPARTMENT_ID: FieldChain =
    FieldChain::new(&["departmentId", "deptId", "id", "_id", "code", "value"]);
const DEPARTMENT_NAME: FieldChain =
    FieldChain::new(&["name", "departmentName", "deptName", "title", "label"]);
const CADRE_ID: FieldChain = FieldChain::new(&["cadreId", "id", "_id", "code", "value"]);
const CADRE_NAME: FieldChain = FieldChain::new(&["name", "cadreName", "title", "label", "level"]);
const COUNT: FieldChain =
    FieldChain::new(&["employeeCount", "count", "totalEmployees", "total", "size"]);

/// Wrapper keys under which list responses may carry their records.
pub fn list_wrappers(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Department => &["data", "departments", "items", "results", "docs", "data.departments"],
        EntityKind::Cadre => &["data", "cadres", "items", "results", "docs", "data.cadres"],
    }
}

fn chains(kind: EntityKind) -> (FieldChain, FieldChain) {
    match kind {
        EntityKind::Department => (DEPARTMENT_ID, DEPARTMENT_NAME),
        EntityKind::Cadre => (CADRE_ID, CADRE_NAME),
    }
}

/// Project a single record. Returns `None` when neither id nor name resolve.
pub fn build_option(kind: EntityKind, record: &Value, index: usize) -> Option<EntityOption> {
    let (id_chain, name_chain) = chains(kind);
    let id = id_chain.string(record);
    let name = name_chain.string(record);

    if id.is_none() && name.is_none() {
        tracing::debug!(kind = kind.as_str(), index, "Dropping record without id or name");
        return None;
    }

    Some(EntityOption {
        id: id.unwrap_or_else(|| format!("{}-{}", kind.as_str(), index)),
        name: name.unwrap_or_else(|| format!("Unnamed {}", kind.as_str())),
        count: COUNT.count(record),
    })
}

/// Project every record of a list, dropping unusable ones.
pub fn build_options(kind: EntityKind, records: &[Value]) -> Vec<EntityOption> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| build_option(kind, record, index))
        .collect()
}

/// Project an upstream list response (bare array or wrapped).
pub fn options_from_response(kind: EntityKind, response: &Value) -> Vec<EntityOption> {
    build_options(kind, lenient::records(response, list_wrappers(kind)))
}

/// Known employee counts keyed by option id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountLookup {
    counts: HashMap<String, u64>,
}

impl CountLookup {
    pub fn from_options(options: &[EntityOption]) -> Self {
        let counts = options
            .iter()
            .filter_map(|option| option.count.map(|count| (option.id.clone(), count)))
            .collect();
        Self { counts }
    }

    pub fn get(&self, id: &str) -> Option<u64> {
        self.counts.get(id).copied()
    }

    /// Sum the counts of `selected`.
    ///
    /// When the ids are non-empty but their counts sum to zero (unknown or
    /// genuinely empty), the number of selected ids is returned instead so a
    /// non-empty selection never reads as zero.
    pub fn sum_selected(&self, selected: &[String]) -> u64 {
        let sum = selected
            .iter()
            .filter_map(|id| self.get(id))
            .fold(0, u64::saturating_add);
        if sum == 0 && !selected.is_empty() {
            u64::try_from(selected.len()).unwrap_or(u64::MAX)
        } else {
            sum
        }
    }
}

impl FromIterator<(String, u64)> for CountLookup {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_department_fallback_keys() {
        let records = vec![
            json!({ "departmentId": "eng", "departmentName": "Engineering", "employeeCount": 12 }),
            json!({ "_id": "ops", "title": "Operations", "totalEmployees": "4" }),
        ];
        let options = build_options(EntityKind::Department, &records);

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].id, "eng");
        assert_eq!(options[0].name, "Engineering");
        assert_eq!(options[0].count, Some(12));
        assert_eq!(options[1].id, "ops");
        assert_eq!(options[1].count, Some(4));
    }

    #[test]
    fn test_unnamed_record_is_kept() {
        let records = vec![json!({ "id": "d1" }), json!({ "cadreId": 3 })];

        let departments = build_options(EntityKind::Department, &records[..1]);
        assert_eq!(departments[0].name, "Unnamed department");
        assert_eq!(departments[0].id, "d1");

        let cadres = build_options(EntityKind::Cadre, &records[1..]);
        assert_eq!(cadres[0].name, "Unnamed cadre");
        assert_eq!(cadres[0].id, "3");
    }

    #[test]
    fn test_record_without_id_or_name_is_dropped() {
        let records = vec![
            json!({ "employeeCount": 9 }),
            json!({ "name": "Finance" }),
        ];
        let options = build_options(EntityKind::Department, &records);

        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "Finance");
        assert_eq!(options[0].id, "department-1");
    }

    #[test]
    fn test_unknown_count_is_none() {
        let records = vec![json!({ "id": "c1", "name": "Senior", "count": -1 })];
        let options = build_options(EntityKind::Cadre, &records);
        assert_eq!(options[0].count, None);
    }

    #[test]
    fn test_options_from_wrapped_response() {
        let response = json!({ "cadres": [{ "cadreId": "a", "cadreName": "Junior" }] });
        let options = options_from_response(EntityKind::Cadre, &response);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].name, "Junior");
    }

    #[test]
    fn test_sum_selected_counts() {
        let lookup: CountLookup = [("eng".to_string(), 12), ("sales".to_string(), 7)]
            .into_iter()
            .collect();
        assert_eq!(
            lookup.sum_selected(&["eng".to_string(), "sales".to_string()]),
            19
        );
        assert_eq!(lookup.sum_selected(&[]), 0);
    }

    #[test]
    fn test_sum_falls_back_to_selection_size() {
        let lookup = CountLookup::default();
        assert_eq!(
            lookup.sum_selected(&["x".to_string(), "y".to_string(), "z".to_string()]),
            3
        );
    }

    #[test]
    fn test_lookup_ignores_unknown_counts() {
        let options = vec![
            EntityOption { id: "a".into(), name: "A".into(), count: Some(2) },
            EntityOption { id: "b".into(), name: "B".into(), count: None },
        ];
        let lookup = CountLookup::from_options(&options);
        assert_eq!(lookup.get("a"), Some(2));
        assert_eq!(lookup.get("b"), None);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let record = json!({ "id": "a", "name": "A", "employeeCount": 1e20 });
        let huge = build_option(EntityKind::Department, &record, 0).unwrap();
        assert_eq!(huge.count, Some(u64::MAX));

        let lookup: CountLookup = [("a".to_string(), u64::MAX), ("b".to_string(), u64::MAX)]
            .into_iter()
            .collect();
        assert_eq!(lookup.sum_selected(&["a".to_string(), "b".to_string()]), u64::MAX);
    }
}
