//! Catalog of automation actions an automated node can run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One action offered to automated nodes, with the parameters it expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Automation {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Automation {
    /// Declared parameters with no value, or only whitespace, in `values`.
    pub fn missing_params<'a>(&'a self, values: &BTreeMap<String, String>) -> Vec<&'a str> {
        self.params
            .iter()
            .filter(|p| values.get(*p).map_or(true, |v| v.trim().is_empty()))
            .map(String::as_str)
            .collect()
    }
}
