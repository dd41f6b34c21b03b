//! Resolution: walk a fully composed builder and produce the output spec.
//!
//! Resolution is a read-only pass. Scale contributions accumulated from all
//! marks are merged per scale name (numeric ranges widened to the outer
//! bounds, discrete level sets unioned in order of first appearance), reactive
//! dataset producers are evaluated, and mark encodings are emitted against
//! dataset and scale names.

use crate::builder::SpecBuilder;
use crate::data::DataTable;
use crate::error::{Result, VizSpecError};
use crate::props::PropExpr;
use crate::scale::infer::infer_domain;
use crate::scale::{prop_to_scale, DomainSource, ScaleInfo, ScaleType};
use crate::spec::{
    ChartSpec, DataSpec, EncodingValueSpec, MarkFromSpec, MarkSpec, ScaleSpec,
};
use chrono::DateTime;
use log::debug;
use serde_json::Value;
use std::collections::BTreeMap;

/// Resolve the builder into a renderer-agnostic [`ChartSpec`].
pub fn resolve(builder: &SpecBuilder) -> Result<ChartSpec> {
    for mark in builder.marks() {
        for mapping in mark.props.iter() {
            if let PropExpr::Reactive(reactive) = &mapping.expr {
                if builder.reactive(&reactive.id).is_none() {
                    return Err(VizSpecError::missing_dependency(format!(
                        "reactive '{}' referenced by property '{}' was never registered",
                        reactive.id, mapping.name
                    )));
                }
            }
        }
    }

    // Materialize every dataset once; reactive producers are read here
    let materialized: Vec<(String, DataTable)> = builder
        .datasets()
        .iter()
        .map(|dataset| (dataset.id.clone(), dataset.current()))
        .collect();

    let data = materialized
        .iter()
        .map(|(id, table)| DataSpec {
            name: id.clone(),
            values: table.to_values(),
            extra: Default::default(),
        })
        .collect();

    let scales = resolve_scales(builder, &materialized)?;
    let marks = resolve_marks(builder);

    debug!(
        "resolved spec: {} datasets, {} scales, {} marks",
        materialized.len(),
        scales.len(),
        marks.len()
    );
    Ok(ChartSpec {
        data,
        scales,
        marks,
        axes: builder.axes().to_vec(),
        legends: builder.legends().to_vec(),
        extra: Default::default(),
    })
}

fn resolve_scales(
    builder: &SpecBuilder,
    materialized: &[(String, DataTable)],
) -> Result<Vec<ScaleSpec>> {
    let mut names: Vec<&str> = Vec::new();
    for info in builder.scale_infos() {
        if !names.contains(&info.scale.as_str()) {
            names.push(&info.scale);
        }
    }

    let mut scales = Vec::with_capacity(names.len());
    for name in names {
        let infos: Vec<&ScaleInfo> = builder
            .scale_infos()
            .iter()
            .filter(|info| info.scale == name)
            .collect();
        let type_ = infos[0].type_;
        for info in &infos {
            if !type_.compatible(&info.type_) {
                return Err(VizSpecError::inconsistent_scale_type(format!(
                    "scale '{name}' received both {} and {} contributions",
                    type_.external(),
                    info.type_.external()
                )));
            }
        }

        let domain = merge_domains(name, type_, &infos, materialized)?;

        scales.push(ScaleSpec {
            name: name.to_string(),
            type_: Some(type_.external().to_string()),
            domain: Some(domain),
            range: None,
            extra: BTreeMap::new(),
        });
    }

    // Every stored override survives resolution. A constraint on a scale no
    // mark contributed to still emits a range-only scale
    for (key, value) in builder.scale_overrides() {
        let (base, slot) = if let Some(base) = key.strip_suffix("Min") {
            (base, Some("rangeMin"))
        } else if let Some(base) = key.strip_suffix("Max") {
            (base, Some("rangeMax"))
        } else {
            (key.as_str(), None)
        };
        let position = match scales.iter().position(|scale| scale.name == base) {
            Some(position) => position,
            None => {
                scales.push(ScaleSpec {
                    name: base.to_string(),
                    type_: None,
                    domain: None,
                    range: None,
                    extra: BTreeMap::new(),
                });
                scales.len() - 1
            }
        };
        match slot {
            None => scales[position].range = Some(value.clone()),
            Some(slot) => {
                scales[position].extra.insert(slot.to_string(), value.clone());
            }
        }
    }
    Ok(scales)
}

/// Merge all contributions to one scale into a single effective domain.
fn merge_domains(
    name: &str,
    type_: ScaleType,
    infos: &[&ScaleInfo],
    materialized: &[(String, DataTable)],
) -> Result<Value> {
    let continuous = matches!(type_.external(), "quantitative" | "time");
    let mut min: Option<Value> = None;
    let mut max: Option<Value> = None;
    let mut levels: Vec<Value> = Vec::new();

    for info in infos {
        let domain = match &info.domain {
            DomainSource::Reactive { dataset, field } => {
                let table = materialized
                    .iter()
                    .find(|(id, _)| id == dataset)
                    .map(|(_, table)| table)
                    .ok_or_else(|| {
                        VizSpecError::missing_dependency(format!(
                            "scale '{name}' references unknown dataset '{dataset}'"
                        ))
                    })?;
                infer_domain(info.type_, &table.column(field))
            }
            other => other.clone(),
        };
        match domain {
            DomainSource::Range {
                min: lower,
                max: upper,
            } if continuous => {
                widen(&mut min, lower, type_, false);
                widen(&mut max, upper, type_, true);
            }
            DomainSource::Levels(contributed) if !continuous => {
                for level in contributed {
                    if !levels.contains(&level) {
                        levels.push(level);
                    }
                }
            }
            _ => {
                return Err(VizSpecError::internal(format!(
                    "scale '{name}' accumulated a domain of the wrong shape"
                )))
            }
        }
    }

    Ok(if continuous {
        Value::Array(vec![min.unwrap_or(Value::Null), max.unwrap_or(Value::Null)])
    } else {
        Value::Array(levels)
    })
}

/// Numeric order key for a continuous domain bound.
fn bound_key(type_: ScaleType, value: &Value) -> Option<f64> {
    match type_ {
        ScaleType::Datetime => value
            .as_str()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|parsed| parsed.timestamp_millis() as f64),
        _ => value.as_f64(),
    }
}

fn widen(bound: &mut Option<Value>, candidate: Value, type_: ScaleType, upper: bool) {
    let Some(candidate_key) = bound_key(type_, &candidate) else {
        return;
    };
    let replace = match bound.as_ref().and_then(|b| bound_key(type_, b)) {
        None => true,
        Some(existing) => {
            if upper {
                candidate_key > existing
            } else {
                candidate_key < existing
            }
        }
    };
    if replace {
        *bound = Some(candidate);
    }
}

fn resolve_marks(builder: &SpecBuilder) -> Vec<MarkSpec> {
    builder
        .marks()
        .iter()
        .map(|mark| {
            let mut encode: BTreeMap<String, BTreeMap<String, EncodingValueSpec>> =
                BTreeMap::new();
            for mapping in mark.props.iter() {
                let encoding = match &mapping.expr {
                    PropExpr::FieldRef(field) => EncodingValueSpec::Field {
                        field: field.clone(),
                        scale: mapping.scaled.then(|| prop_to_scale(&mapping.name)),
                    },
                    PropExpr::Literal(value) => EncodingValueSpec::Value {
                        value: value.clone(),
                    },
                    PropExpr::Reactive(reactive) => EncodingValueSpec::Signal {
                        signal: reactive.id.clone(),
                    },
                };
                encode
                    .entry(mapping.state.as_str().to_string())
                    .or_default()
                    .insert(mapping.name.clone(), encoding);
            }
            MarkSpec {
                type_: mark.type_.as_str().to_string(),
                from: mark
                    .dataset
                    .as_ref()
                    .map(|data| MarkFromSpec { data: data.clone() }),
                encode,
                extra: Default::default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{MarkType, SpecBuilder};
    use crate::props::{field, props, value, PropArg};
    use serde_json::json;

    fn two_layer_builder() -> SpecBuilder {
        let mut builder = SpecBuilder::new();
        builder.add_data(
            "a",
            DataTable::from_json(&json!([{"x": 1, "g": "p"}, {"x": 5, "g": "q"}])).unwrap(),
        );
        builder.add_props(
            props(vec![
                PropArg::unnamed(field("x")),
                PropArg::named("fill", field("g")),
            ])
            .unwrap(),
            true,
        );
        builder.add_mark(MarkType::Point).unwrap();

        builder.add_data(
            "b",
            DataTable::from_json(&json!([{"x": -2, "g": "r"}, {"x": 3, "g": "p"}])).unwrap(),
        );
        builder.add_mark(MarkType::Line).unwrap();
        builder
    }

    #[test]
    fn test_domains_merged_across_marks() {
        let builder = two_layer_builder();
        let spec = resolve(&builder).unwrap();

        let x = spec.get_scale("x").unwrap();
        assert_eq!(x.type_.as_deref(), Some("quantitative"));
        assert_eq!(x.domain, Some(json!([-2, 5])));

        let fill = spec.get_scale("fill").unwrap();
        assert_eq!(fill.type_.as_deref(), Some("ordinal"));
        assert_eq!(fill.domain, Some(json!(["p", "q", "r"])));
    }

    #[test]
    fn test_inconsistent_scale_type_detected_at_resolution() {
        let mut builder = SpecBuilder::new();
        builder.add_data("a", DataTable::from_json(&json!([{"x": 1}])).unwrap());
        builder.add_props(props(vec![PropArg::unnamed(field("x"))]).unwrap(), true);
        builder.add_mark(MarkType::Point).unwrap();

        builder.add_data("b", DataTable::from_json(&json!([{"x": "lo"}])).unwrap());
        builder.add_mark(MarkType::Point).unwrap();

        let err = resolve(&builder).unwrap_err();
        assert!(err.to_string().contains("Inconsistent scale type"));
    }

    #[test]
    fn test_mark_encoding_shape() {
        let mut builder = SpecBuilder::new();
        builder.add_data("a", DataTable::from_json(&json!([{"x": 1}])).unwrap());
        builder.add_props(
            props(vec![
                PropArg::unnamed(field("x")),
                PropArg::named("fill", value("red")),
                PropArg::named("fill.hover", value("blue")),
            ])
            .unwrap(),
            true,
        );
        builder.add_mark(MarkType::Rect).unwrap();

        let spec = resolve(&builder).unwrap();
        let mark = &spec.marks[0];
        assert_eq!(mark.type_, "rect");
        assert_eq!(mark.from.as_ref().unwrap().data, "a0");
        assert_eq!(
            mark.encode["base"]["x"],
            EncodingValueSpec::Field {
                field: "x".to_string(),
                scale: Some("x".to_string())
            }
        );
        assert_eq!(
            mark.encode["hover"]["fill"],
            EncodingValueSpec::Value {
                value: json!("blue")
            }
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let builder = two_layer_builder();
        let first = serde_json::to_string(&resolve(&builder).unwrap()).unwrap();
        let second = serde_json::to_string(&resolve(&builder).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_overrides_attached_to_scales() {
        let mut builder = two_layer_builder();
        builder
            .add_scale_override("x", &[json!(0), json!(null)])
            .unwrap();
        builder
            .add_scale_override("fill", &[json!("red"), json!("green"), json!("blue")])
            .unwrap();

        let spec = resolve(&builder).unwrap();
        let x = spec.get_scale("x").unwrap();
        assert_eq!(x.extra.get("rangeMin"), Some(&json!(0)));
        let fill = spec.get_scale("fill").unwrap();
        assert_eq!(fill.range, Some(json!(["red", "green", "blue"])));
    }

    #[test]
    fn test_override_without_contributions_emits_scale() {
        let mut builder = two_layer_builder();
        builder
            .add_scale_override("size", &[json!(10), json!(100)])
            .unwrap();
        builder
            .add_scale_override("opacity", &[json!(null), json!(0.8)])
            .unwrap();

        let spec = resolve(&builder).unwrap();

        // No mark maps "size" or "opacity", but the stored constraints still
        // surface as range-only scales
        let size = spec.get_scale("size").unwrap();
        assert_eq!(size.type_, None);
        assert_eq!(size.domain, None);
        assert_eq!(size.range, Some(json!([10, 100])));

        let opacity = spec.get_scale("opacity").unwrap();
        assert_eq!(opacity.range, None);
        assert_eq!(opacity.extra.get("rangeMax"), Some(&json!(0.8)));
    }
}
