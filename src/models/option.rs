//! Department and cadre choice models.

use serde::{Deserialize, Serialize};

/// The entity an [`EntityOption`] was aggregated from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Department,
    Cadre,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Department => "department",
            EntityKind::Cadre => "cadre",
        }
    }
}

/// A normalized department or cadre choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityOption {
    pub id: String,
    pub name: String,
    /// Employee count, `None` when upstream reported nothing usable.
    pub count: Option<u64>,
}

/// Result of one upstream option query, with the failure flag the dashboard
/// renders an inline message for.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuery {
    pub options: Vec<EntityOption>,
    pub is_error: bool,
}

impl OptionQuery {
    pub fn loaded(options: Vec<EntityOption>) -> Self {
        Self {
            options,
            is_error: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            options: Vec::new(),
            is_error: true,
        }
    }
}
