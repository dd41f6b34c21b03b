use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Materialized rows of one dataset, keyed by its builder-unique id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    pub name: String,

    pub values: Value,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
