//! Scale vocabulary, property-to-scale aliasing, and range overrides.

pub mod infer;

use crate::error::{Result, VizSpecError};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Internal inferred scale type. Ordinal, nominal and logical all map to the
/// shared external "ordinal" kind at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    Numeric,
    Ordinal,
    Nominal,
    Logical,
    Datetime,
}

impl ScaleType {
    /// External scale-kind vocabulary used in the resolved spec.
    pub fn external(&self) -> &'static str {
        match self {
            Self::Numeric => "quantitative",
            Self::Ordinal | Self::Nominal | Self::Logical => "ordinal",
            Self::Datetime => "time",
        }
    }

    /// Two types are compatible when they normalize to the same external kind.
    pub fn compatible(&self, other: &Self) -> bool {
        self.external() == other.external()
    }
}

/// Where a scale's domain comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainSource {
    /// Two-element [min, max] bound for numeric and datetime scales.
    Range { min: Value, max: Value },
    /// Discrete level set, in order of first appearance.
    Levels(Vec<Value>),
    /// Re-derived at resolution time from a reactive dataset's current table.
    Reactive { dataset: String, field: String },
}

/// Per-scale accumulated domain knowledge from one mark's property mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleInfo {
    pub scale: String,
    pub type_: ScaleType,
    pub domain: DomainSource,
}

lazy_static! {
    /// Properties sharing a scale with another property map to that scale's
    /// name; unrecognized names pass through unchanged.
    static ref PROP_TO_SCALE: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("x2", "x");
        m.insert("y2", "y");
        m.insert("fillOpacity", "opacity");
        m.insert("strokeOpacity", "opacity");
        m.insert("innerRadius", "radius");
        m.insert("outerRadius", "radius");
        m.insert("startAngle", "angle");
        m.insert("endAngle", "angle");
        m
    };
}

/// Map a base property name to its shared scale name.
pub fn prop_to_scale(name: &str) -> String {
    PROP_TO_SCALE.get(name).unwrap_or(&name).to_string()
}

/// Validate and normalize an explicit scale range/domain override.
///
/// A two-element numeric vector yields both bounds under the base name; one
/// missing (null) endpoint yields a single `Min`- or `Max`-suffixed partial
/// constraint; two missing endpoints yield no constraint. A string vector is
/// passed through verbatim rather than inferred.
pub fn range_prop(name: &str, values: &[Value]) -> Result<Vec<(String, Value)>> {
    if values.is_empty() {
        return Err(VizSpecError::invalid_scale_range(format!(
            "empty range override for '{name}'"
        )));
    }
    if values.iter().all(|v| v.is_string()) {
        return Ok(vec![(name.to_string(), Value::Array(values.to_vec()))]);
    }
    if let Some(bad) = values.iter().find(|v| !v.is_number() && !v.is_null()) {
        return Err(VizSpecError::invalid_scale_range(format!(
            "range override for '{name}' must be numeric or character, found: {bad}"
        )));
    }
    if values.len() > 2 {
        return Err(VizSpecError::invalid_scale_range(format!(
            "numeric range override for '{name}' must have exactly 2 elements, found {}",
            values.len()
        )));
    }
    if values.len() < 2 {
        return Err(VizSpecError::invalid_scale_range(format!(
            "numeric range override for '{name}' must have exactly 2 elements, found 1"
        )));
    }
    let (lower, upper) = (&values[0], &values[1]);
    Ok(match (lower.is_null(), upper.is_null()) {
        (true, true) => vec![],
        (false, true) => vec![(format!("{name}Min"), lower.clone())],
        (true, false) => vec![(format!("{name}Max"), upper.clone())],
        (false, false) => vec![(
            name.to_string(),
            Value::Array(vec![lower.clone(), upper.clone()]),
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prop_to_scale_aliases() {
        let names = ["x", "x2", "y2", "fillOpacity", "foo"];
        let scales: Vec<String> = names.iter().map(|n| prop_to_scale(n)).collect();
        assert_eq!(scales, vec!["x", "x", "y", "opacity", "foo"]);
    }

    #[test]
    fn test_range_prop_partial_constraints() {
        assert_eq!(
            range_prop("x", &[json!(null), json!(5)]).unwrap(),
            vec![("xMax".to_string(), json!(5))]
        );
        assert_eq!(
            range_prop("x", &[json!(1), json!(null)]).unwrap(),
            vec![("xMin".to_string(), json!(1))]
        );
        assert_eq!(range_prop("x", &[json!(null), json!(null)]).unwrap(), vec![]);
        assert_eq!(
            range_prop("x", &[json!(1), json!(5)]).unwrap(),
            vec![("x".to_string(), json!([1, 5]))]
        );
    }

    #[test]
    fn test_range_prop_character_passthrough() {
        assert_eq!(
            range_prop("fill", &[json!("red"), json!("green"), json!("blue")]).unwrap(),
            vec![("fill".to_string(), json!(["red", "green", "blue"]))]
        );
    }

    #[test]
    fn test_range_prop_errors() {
        assert!(range_prop("x", &[json!(1), json!(2), json!(3)]).is_err());
        assert!(range_prop("x", &[json!(true), json!(2)]).is_err());
        assert!(range_prop("x", &[]).is_err());
    }
}
