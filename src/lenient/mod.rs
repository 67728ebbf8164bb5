//! Lenient decoding of upstream records.
//!
//! The upstream HR API does not commit to stable field names, so every value
//! this service reads from it is resolved through an ordered chain of accessor
//! paths. The first path that yields a usable value wins; callers supply the
//! default when nothing matches.

use serde_json::Value;

/// An ordered list of accessor paths tried against a record.
///
/// A path is a dotted key sequence, so `department.name` reads
/// `record["department"]["name"]`.
#[derive(Debug, Clone, Copy)]
pub struct FieldChain {
    paths: &'static [&'static str],
}

impl FieldChain {
    pub const fn new(paths: &'static [&'static str]) -> Self {
        Self { paths }
    }

    /// Return the first value produced by `decode` along the chain.
    pub fn find<T>(&self, record: &Value, decode: impl Fn(&Value) -> Option<T>) -> Option<T> {
        self.paths
            .iter()
            .filter_map(|path| lookup(record, path))
            .find_map(decode)
    }

    /// First non-empty string (numbers are rendered as strings).
    pub fn string(&self, record: &Value) -> Option<String> {
        self.find(record, scalar_string)
    }

    pub fn string_or(&self, record: &Value, default: impl FnOnce() -> String) -> String {
        self.string(record).unwrap_or_else(default)
    }

    /// First value that parses to a finite, non-negative number.
    pub fn count(&self, record: &Value) -> Option<u64> {
        self.find(record, non_negative_count)
    }
}

/// Follow a dotted path into a JSON value.
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |node, key| node.get(key))
}

/// Render a scalar as a trimmed, non-empty string.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a number or numeric string into a count. Fractions are truncated.
pub fn non_negative_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if n.is_finite() && n >= 0.0 {
        Some(n.trunc() as u64)
    } else {
        None
    }
}

/// Locate the record array in a list response.
///
/// Accepts a bare array, or an object carrying the array under one of
/// `wrappers` (tried in order). Anything else yields no records.
pub fn records<'a>(response: &'a Value, wrappers: &[&str]) -> &'a [Value] {
    if let Some(items) = response.as_array() {
        return items;
    }
    wrappers
        .iter()
        .find_map(|key| lookup(response, key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
