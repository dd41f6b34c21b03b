use serde_json::json;
use std::rc::Rc;
use vizspec_core::{
    add_stack, field, props, reactive_prop, resolve, Broker, DataTable, MarkType, PropArg,
    PropExpr, ReactiveCell, ReactiveValue, SpecBuilder,
};

fn table(rows: serde_json::Value) -> DataTable {
    DataTable::from_json(&rows).unwrap()
}

#[test]
fn test_reactive_dataset_flows_through_stack() {
    let cell = ReactiveCell::input(table(json!([
        {"cyl": 4, "count": 1},
        {"cyl": 4, "count": 1},
    ])));

    let mut builder = SpecBuilder::new();
    builder.add_reactive_data("pts", cell.clone());
    add_stack(
        &mut builder,
        PropExpr::FieldRef("count".to_string()),
        Some(PropExpr::FieldRef("cyl".to_string())),
    )
    .unwrap();
    builder.add_props(
        props(vec![
            PropArg::unnamed(field("cyl")),
            PropArg::unnamed(field("stack_upr_")),
        ])
        .unwrap(),
        true,
    );
    builder.add_mark(MarkType::Rect).unwrap();

    let spec = resolve(&builder).unwrap();
    let stacked = spec.get_data("pts0/stack1").unwrap();
    assert_eq!(stacked.values.as_array().unwrap().len(), 2);
    assert_eq!(spec.get_scale("y").unwrap().domain, Some(json!([1.0, 2.0])));

    // Push new data through the input cell; the stacked dataset and the
    // reactive y domain both re-derive at the next resolution
    cell.set(table(json!([
        {"cyl": 4, "count": 1},
        {"cyl": 4, "count": 1},
        {"cyl": 4, "count": 1},
    ])));
    let spec = resolve(&builder).unwrap();
    let stacked = spec.get_data("pts0/stack1").unwrap();
    let rows = stacked.values.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["stack_upr_"], json!(3.0));
    assert_eq!(spec.get_scale("y").unwrap().domain, Some(json!([1.0, 3.0])));
}

#[test]
fn test_reactive_prop_resolves_to_signal_reference() {
    let size = ReactiveValue::new("slider:size", ReactiveCell::input(json!(40))).with_broker(
        Broker {
            controls: vec![json!({"type": "slider", "min": 10, "max": 100})],
            connector: Rc::new(|value| value.clone()),
            handler: json!({"event": "change", "target": "size"}),
        },
    );

    let mut builder = SpecBuilder::new();
    builder.add_data("pts", table(json!([{"x": 1, "y": 2}])));
    builder.add_props(
        props(vec![
            PropArg::unnamed(field("x")),
            PropArg::unnamed(field("y")),
            PropArg::named("size", reactive_prop(&size)),
        ])
        .unwrap(),
        true,
    );
    builder.add_mark(MarkType::Point).unwrap();

    // Broker recorded exactly once even if the same reactive appears again
    builder.add_props(
        props(vec![PropArg::named("opacity", reactive_prop(&size))]).unwrap(),
        true,
    );
    assert_eq!(builder.reactives().len(), 1);
    assert_eq!(builder.controls().len(), 1);
    assert_eq!(builder.handlers().len(), 1);

    let spec = resolve(&builder).unwrap();
    let size_encoding = &spec.marks[0].encode["base"]["size"];
    let expected = serde_json::to_value(size_encoding).unwrap();
    assert_eq!(expected, json!({"signal": size.id}));
}

#[test]
fn test_reactive_field_reference_participates_in_scale_inference() {
    // A reactive whose current value looks like a field reference is treated
    // as a scaled field mapping
    let which = ReactiveValue::new("prop:x-field", ReactiveCell::input(json!({"field": "x"})));

    let mut builder = SpecBuilder::new();
    builder.add_data("pts", table(json!([{"x": 1}, {"x": 9}])));
    builder.add_props(
        props(vec![PropArg::unnamed(reactive_prop(&which))]).unwrap(),
        true,
    );
    builder.add_mark(MarkType::Point).unwrap();

    let spec = resolve(&builder).unwrap();
    let x = spec.get_scale("x").unwrap();
    assert_eq!(x.type_.as_deref(), Some("quantitative"));
    assert_eq!(x.domain, Some(json!([1, 9])));
}
