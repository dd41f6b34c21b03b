use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A resolved scale: merged domain and any explicit range override. A scale
/// that only carries a range override has no inferred type or domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub name: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
