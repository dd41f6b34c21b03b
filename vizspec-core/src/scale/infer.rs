//! Automatic scale inference.
//!
//! Invoked whenever a mark is added: every scaled property mapping is
//! evaluated against the current dataset to obtain a sample of values, the
//! sample's value kind determines the scale type, and a domain source is
//! constructed. The domain stays lazy when the underlying dataset is reactive
//! so it re-derives on recomputation.

use crate::data::table::DeclaredType;
use crate::data::Dataset;
use crate::error::{Result, VizSpecError};
use crate::props::{looks_like_field_ref, PropExpr, PropertySet};
use crate::scale::{prop_to_scale, DomainSource, ScaleInfo, ScaleType};
use chrono::DateTime;
use serde_json::Value;

/// Derive the scale contributions of one property set against the dataset
/// active when its mark was added.
pub fn infer_scale_infos(props: &PropertySet, dataset: Option<&Dataset>) -> Result<Vec<ScaleInfo>> {
    let mut infos = Vec::new();
    for mapping in props.iter().filter(|m| m.scaled) {
        let scale = prop_to_scale(&mapping.name);

        let field = match &mapping.expr {
            PropExpr::FieldRef(field) => Some(field.clone()),
            PropExpr::Reactive(reactive) => {
                let current = reactive.cell.read();
                if looks_like_field_ref(&current) {
                    current
                        .get("field")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                } else {
                    None
                }
            }
            PropExpr::Literal(_) => None,
        };

        let info = match (&mapping.expr, field) {
            (_, Some(field)) => {
                let Some(dataset) = dataset else {
                    continue;
                };
                let table = dataset.current();
                let sample = table.column(&field);
                let Some(type_) = infer_type(&sample, table.field_type(&field))? else {
                    continue;
                };
                let domain = if dataset.is_reactive() {
                    DomainSource::Reactive {
                        dataset: dataset.id.clone(),
                        field,
                    }
                } else {
                    infer_domain(type_, &sample)
                };
                ScaleInfo {
                    scale,
                    type_,
                    domain,
                }
            }
            (PropExpr::Literal(literal), None) => {
                // A scaled literal contributes its single value
                let sample = vec![literal.clone()];
                let Some(type_) = infer_type(&sample, None)? else {
                    continue;
                };
                let domain = infer_domain(type_, &sample);
                ScaleInfo {
                    scale,
                    type_,
                    domain,
                }
            }
            _ => continue,
        };
        infos.push(info);
    }
    Ok(infos)
}

/// Infer a scale type from a sample of values. Returns `None` when the sample
/// carries no information (empty or all null). Mixed value kinds fail fast.
pub fn infer_type(values: &[Value], declared: Option<DeclaredType>) -> Result<Option<ScaleType>> {
    let mut inferred: Option<ScaleType> = None;
    let mut all_datetime = true;
    for value in values.iter().filter(|v| !v.is_null()) {
        let kind = match value {
            Value::Number(_) => ScaleType::Numeric,
            Value::Bool(_) => ScaleType::Logical,
            Value::String(text) => {
                if DateTime::parse_from_rfc3339(text).is_err() {
                    all_datetime = false;
                }
                match declared {
                    Some(DeclaredType::Ordinal) => ScaleType::Ordinal,
                    Some(DeclaredType::Datetime) => ScaleType::Datetime,
                    None => ScaleType::Nominal,
                }
            }
            other => {
                return Err(VizSpecError::invalid_argument(format!(
                    "cannot infer a scale type from value: {other}"
                )))
            }
        };
        match inferred {
            None => inferred = Some(kind),
            Some(existing) if existing == kind => {}
            Some(existing) => {
                return Err(VizSpecError::invalid_argument(format!(
                    "mixed value kinds in one column: {:?} and {:?}",
                    existing, kind
                )))
            }
        }
    }
    // Strings that all parse as RFC 3339 timestamps infer as datetime
    if inferred == Some(ScaleType::Nominal) && all_datetime {
        inferred = Some(ScaleType::Datetime);
    }
    Ok(inferred)
}

/// Compute a static domain source for a sample of the given type.
pub fn infer_domain(type_: ScaleType, values: &[Value]) -> DomainSource {
    match type_ {
        ScaleType::Numeric => {
            let mut min: Option<&Value> = None;
            let mut max: Option<&Value> = None;
            for value in values {
                let Some(number) = value.as_f64() else {
                    continue;
                };
                if min.and_then(Value::as_f64).map_or(true, |m| number < m) {
                    min = Some(value);
                }
                if max.and_then(Value::as_f64).map_or(true, |m| number > m) {
                    max = Some(value);
                }
            }
            DomainSource::Range {
                min: min.cloned().unwrap_or(Value::Null),
                max: max.cloned().unwrap_or(Value::Null),
            }
        }
        ScaleType::Datetime => {
            let mut min: Option<(&Value, DateTime<chrono::FixedOffset>)> = None;
            let mut max: Option<(&Value, DateTime<chrono::FixedOffset>)> = None;
            for value in values {
                let Some(text) = value.as_str() else {
                    continue;
                };
                let Ok(parsed) = DateTime::parse_from_rfc3339(text) else {
                    continue;
                };
                if min.as_ref().map_or(true, |(_, m)| parsed < *m) {
                    min = Some((value, parsed));
                }
                if max.as_ref().map_or(true, |(_, m)| parsed > *m) {
                    max = Some((value, parsed));
                }
            }
            DomainSource::Range {
                min: min.map(|(v, _)| v.clone()).unwrap_or(Value::Null),
                max: max.map(|(v, _)| v.clone()).unwrap_or(Value::Null),
            }
        }
        ScaleType::Ordinal | ScaleType::Nominal | ScaleType::Logical => {
            let mut levels: Vec<Value> = Vec::new();
            for value in values.iter().filter(|v| !v.is_null()) {
                if !levels.contains(value) {
                    levels.push(value.clone());
                }
            }
            DomainSource::Levels(levels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataTable;
    use crate::props::{field, props, PropArg};
    use serde_json::json;

    #[test]
    fn test_infer_type_kinds() {
        assert_eq!(
            infer_type(&[json!(1), json!(2.5)], None).unwrap(),
            Some(ScaleType::Numeric)
        );
        assert_eq!(
            infer_type(&[json!("a"), json!("b")], None).unwrap(),
            Some(ScaleType::Nominal)
        );
        assert_eq!(
            infer_type(&[json!(true), json!(false)], None).unwrap(),
            Some(ScaleType::Logical)
        );
        assert_eq!(
            infer_type(
                &[json!("2023-01-01T00:00:00Z"), json!("2023-06-01T00:00:00Z")],
                None
            )
            .unwrap(),
            Some(ScaleType::Datetime)
        );
        assert_eq!(infer_type(&[json!(null)], None).unwrap(), None);
        assert!(infer_type(&[json!(1), json!("a")], None).is_err());
    }

    #[test]
    fn test_infer_type_declared_ordinal() {
        assert_eq!(
            infer_type(&[json!("lo"), json!("hi")], Some(DeclaredType::Ordinal)).unwrap(),
            Some(ScaleType::Ordinal)
        );
    }

    #[test]
    fn test_numeric_domain_skips_nulls() {
        let domain = infer_domain(ScaleType::Numeric, &[json!(3), json!(null), json!(1)]);
        assert_eq!(
            domain,
            DomainSource::Range {
                min: json!(1),
                max: json!(3)
            }
        );
    }

    #[test]
    fn test_levels_first_appearance() {
        let domain = infer_domain(
            ScaleType::Nominal,
            &[json!("b"), json!("a"), json!("b"), json!("c")],
        );
        assert_eq!(
            domain,
            DomainSource::Levels(vec![json!("b"), json!("a"), json!("c")])
        );
    }

    #[test]
    fn test_reactive_dataset_yields_lazy_domain() {
        let table = DataTable::from_json(&json!([{"x": 1}, {"x": 9}])).unwrap();
        let cell = crate::reactive::ReactiveCell::input(table);
        let dataset = Dataset::reactive("pts0", cell);
        let set = props(vec![PropArg::unnamed(field("x"))]).unwrap();

        let infos = infer_scale_infos(&set, Some(&dataset)).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(
            infos[0].domain,
            DomainSource::Reactive {
                dataset: "pts0".to_string(),
                field: "x".to_string()
            }
        );
    }

    #[test]
    fn test_alias_normalization_in_inference() {
        let table = DataTable::from_json(&json!([{"x0": 1, "x1": 5}])).unwrap();
        let dataset = Dataset::constant("r0", table);
        let set = props(vec![
            PropArg::named("x", field("x0")),
            PropArg::named("x2", field("x1")),
        ])
        .unwrap();
        let infos = infer_scale_infos(&set, Some(&dataset)).unwrap();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|info| info.scale == "x"));
    }
}
