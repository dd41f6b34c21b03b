//! Stacking transform.
//!
//! Within each group, in existing row order, a running cumulative sum of the
//! stack variable becomes `stack_upr_`; `stack_lwr_` is the same sum lagged by
//! one position, with the group's first row defaulting to 0. The input's
//! grouping state is saved and restored so stacking never leaks grouping
//! changes to the caller.

use crate::builder::SpecBuilder;
use crate::data::DataTable;
use crate::error::{Result, VizSpecError};
use crate::props::PropExpr;
use crate::transform::{register_computation, TransformArg, TransformFn};
use serde_json::{json, Value};
use std::rc::Rc;

pub const STACK_UPPER: &str = "stack_upr_";
pub const STACK_LOWER: &str = "stack_lwr_";

/// Stack `stack_var` within groups defined by `group_var`. Rows outside any
/// group (no group variable) are treated as one implicit group.
pub fn compute_stack(
    table: &DataTable,
    stack_var: &PropExpr,
    group_var: Option<&PropExpr>,
) -> Result<DataTable> {
    let PropExpr::FieldRef(stack_field) = stack_var else {
        return Err(VizSpecError::invalid_argument(
            "stack variable must be a field reference",
        ));
    };
    let group_field = match group_var {
        None => None,
        Some(PropExpr::FieldRef(field)) => Some(field.as_str()),
        Some(_) => {
            return Err(VizSpecError::invalid_argument(
                "group variable must be a field reference",
            ))
        }
    };

    let original_grouping = table.grouping().to_vec();
    let mut output = table.clone();
    if let Some(field) = group_field {
        output.set_grouping(vec![field.to_string()]);
    }

    let mut upper = vec![Value::Null; output.len()];
    let mut lower = vec![Value::Null; output.len()];
    for group in output.group_indices(group_field) {
        let mut running = 0.0;
        for index in group {
            let value = output.rows()[index].get(stack_field);
            let number = match value {
                None | Some(Value::Null) => 0.0,
                Some(value) => value.as_f64().ok_or_else(|| {
                    VizSpecError::invalid_argument(format!(
                        "stack variable '{stack_field}' must be numeric, found: {value}"
                    ))
                })?,
            };
            lower[index] = json!(running);
            running += number;
            upper[index] = json!(running);
        }
    }
    output.insert_column(STACK_UPPER, upper)?;
    output.insert_column(STACK_LOWER, lower)?;
    output.set_grouping(original_grouping);
    Ok(output)
}

/// Register stacking on the builder's current dataset as the named transform
/// "stack", so it participates in reactive recomputation and dataset-id
/// bookkeeping. Both variables must be field references (a reactive whose
/// current value is a field reference is accepted for the stack variable).
pub fn add_stack(
    builder: &mut SpecBuilder,
    stack_var: PropExpr,
    group_var: Option<PropExpr>,
) -> Result<()> {
    let stack_arg = field_arg("stack variable", stack_var)?;
    let group_arg = group_var.map(|expr| field_arg("group variable", expr)).transpose()?;

    let mut args = vec![("stack_var".to_string(), stack_arg)];
    if let Some(group_arg) = group_arg {
        args.push(("group_var".to_string(), group_arg));
    }

    let transform_fn: TransformFn = Rc::new(|table, args| {
        let stack_field = arg_field(args.get("stack_var"))
            .ok_or_else(|| VizSpecError::internal("stack variable argument missing"))?;
        let group_expr = arg_field(args.get("group_var")).map(PropExpr::FieldRef);
        compute_stack(
            table,
            &PropExpr::FieldRef(stack_field),
            group_expr.as_ref(),
        )
    });
    register_computation(builder, args, "stack", Some(transform_fn))
}

fn field_arg(what: &str, expr: PropExpr) -> Result<TransformArg> {
    match expr {
        PropExpr::FieldRef(field) => Ok(TransformArg::Value(json!({ "field": field }))),
        PropExpr::Reactive(reactive) => {
            if crate::props::looks_like_field_ref(&reactive.cell.read()) {
                Ok(TransformArg::Reactive(reactive))
            } else {
                Err(VizSpecError::invalid_argument(format!(
                    "{what} must be a field reference"
                )))
            }
        }
        PropExpr::Literal(_) => Err(VizSpecError::invalid_argument(format!(
            "{what} must be a field reference"
        ))),
    }
}

fn arg_field(arg: Option<&Value>) -> Option<String> {
    arg.and_then(|value| value.get("field"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counts_by_cyl() -> DataTable {
        DataTable::from_json(&json!([
            {"cyl": 4, "count": 1},
            {"cyl": 4, "count": 1},
            {"cyl": 6, "count": 1},
            {"cyl": 4, "count": 1},
            {"cyl": 4, "count": 1},
        ]))
        .unwrap()
    }

    fn numbers(table: &DataTable, field: &str) -> Vec<f64> {
        table
            .column(field)
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect()
    }

    #[test]
    fn test_stack_cumulative_sums_per_group() {
        let table = counts_by_cyl();
        let stacked = compute_stack(
            &table,
            &PropExpr::FieldRef("count".to_string()),
            Some(&PropExpr::FieldRef("cyl".to_string())),
        )
        .unwrap();

        // cyl=4 rows at indices 0,1,3,4 form a group of four
        assert_eq!(
            numbers(&stacked, STACK_UPPER),
            vec![1.0, 2.0, 1.0, 3.0, 4.0]
        );
        assert_eq!(
            numbers(&stacked, STACK_LOWER),
            vec![0.0, 1.0, 0.0, 2.0, 3.0]
        );
        // Input was ungrouped and stays ungrouped after the call
        assert!(table.grouping().is_empty());
        assert!(stacked.grouping().is_empty());
    }

    #[test]
    fn test_stack_without_group_is_one_implicit_group() {
        let table = DataTable::from_json(&json!([{"n": 2}, {"n": 3}])).unwrap();
        let stacked = compute_stack(&table, &PropExpr::FieldRef("n".to_string()), None).unwrap();
        assert_eq!(numbers(&stacked, STACK_UPPER), vec![2.0, 5.0]);
        assert_eq!(numbers(&stacked, STACK_LOWER), vec![0.0, 2.0]);
    }

    #[test]
    fn test_stack_restores_existing_grouping() {
        let table = counts_by_cyl().with_grouping(vec!["model".to_string()]);
        let stacked = compute_stack(
            &table,
            &PropExpr::FieldRef("count".to_string()),
            Some(&PropExpr::FieldRef("cyl".to_string())),
        )
        .unwrap();
        assert_eq!(stacked.grouping(), &["model".to_string()]);
    }

    #[test]
    fn test_stack_rejects_non_field_expressions() {
        let table = counts_by_cyl();
        let err = compute_stack(&table, &PropExpr::Literal(json!(1)), None).unwrap_err();
        assert!(err.to_string().contains("field reference"));
    }

    #[test]
    fn test_stack_rejects_non_numeric_values() {
        let table = DataTable::from_json(&json!([{"n": "two"}])).unwrap();
        let err = compute_stack(&table, &PropExpr::FieldRef("n".to_string()), None).unwrap_err();
        assert!(err.to_string().contains("numeric"));
    }
}
