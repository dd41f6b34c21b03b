//! Reactive data-transform registration.
//!
//! Every data transform goes through [`register_computation`]: reactive
//! arguments are registered with the builder (idempotently, keyed by content
//! fingerprint), a new dataset id is minted from the parent id plus the
//! transform name and the dataset count, and the producer is reactive exactly
//! when the parent dataset or any argument is reactive. Transforms share the
//! preserve-constants contract: constant-valued input columns dropped by a
//! transform are re-attached to its output.

pub mod stack;

use crate::builder::SpecBuilder;
use crate::data::{DataTable, Dataset};
use crate::error::{Result, VizSpecError};
use crate::reactive::{ReactiveCell, ReactiveValue};
use log::{debug, error};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A transform argument: either a constant value or a reactive whose current
/// value is re-read on every recomputation.
#[derive(Debug, Clone)]
pub enum TransformArg {
    Value(Value),
    Reactive(ReactiveValue<Value>),
}

impl TransformArg {
    pub fn is_reactive(&self) -> bool {
        matches!(self, Self::Reactive(_))
    }

    pub fn current(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Reactive(reactive) => reactive.cell.read(),
        }
    }
}

/// A pure transform step from (table, resolved args) to a table.
pub type TransformFn = Rc<dyn Fn(&DataTable, &HashMap<String, Value>) -> Result<DataTable>>;

/// Register a named computation with the builder.
///
/// Without a transform function this only registers the reactive arguments
/// (and their brokers), e.g. for bare controls. With one, the resulting
/// dataset becomes the builder's current dataset. The call is atomic: an
/// eager transform failure leaves the builder untouched.
pub fn register_computation(
    builder: &mut SpecBuilder,
    args: Vec<(String, TransformArg)>,
    transform_name: &str,
    transform_fn: Option<TransformFn>,
) -> Result<()> {
    let reactive_args: Vec<ReactiveValue<Value>> = args
        .iter()
        .filter_map(|(_, arg)| match arg {
            TransformArg::Reactive(reactive) => Some(reactive.clone()),
            TransformArg::Value(_) => None,
        })
        .collect();

    let Some(transform_fn) = transform_fn else {
        for reactive in &reactive_args {
            builder.register_reactive(reactive);
        }
        return Ok(());
    };

    let parent = builder
        .current_dataset()
        .ok_or_else(|| {
            VizSpecError::missing_dependency(format!(
                "transform '{transform_name}' requires a dataset attached to the builder"
            ))
        })?
        .clone();

    let id = builder.next_dataset_id(&format!("{}/{}", parent.id, transform_name));
    let any_reactive = parent.is_reactive() || args.iter().any(|(_, arg)| arg.is_reactive());
    let transform_fn = with_preserved_constants(transform_fn);

    let dataset = if any_reactive {
        let name = transform_name.to_string();
        let compute = move || {
            let table = parent.current();
            let resolved: HashMap<String, Value> = args
                .iter()
                .map(|(key, arg)| (key.clone(), arg.current()))
                .collect();
            match transform_fn(&table, &resolved) {
                Ok(output) => output,
                Err(err) => {
                    // A reactive recomputation has no caller to propagate to;
                    // pass the input through unchanged
                    error!("reactive transform '{name}' failed: {err}");
                    table
                }
            }
        };
        Dataset::reactive(id, ReactiveCell::computed(compute))
    } else {
        let table = parent.current();
        let resolved: HashMap<String, Value> = args
            .iter()
            .map(|(key, arg)| (key.clone(), arg.current()))
            .collect();
        let output = transform_fn(&table, &resolved)?;
        Dataset::constant(id, output)
    };

    debug!(
        "registered transform '{}' as dataset '{}'",
        transform_name, dataset.id
    );
    for reactive in &reactive_args {
        builder.register_reactive(reactive);
    }
    builder.push_dataset(dataset);
    Ok(())
}

/// Re-attach constant-valued input columns dropped by the transform.
fn with_preserved_constants(transform_fn: TransformFn) -> TransformFn {
    Rc::new(move |table, args| {
        let constants = table.constant_columns();
        let mut output = transform_fn(table, args)?;
        let present = output.column_names();
        for (name, value) in constants {
            if !present.iter().any(|existing| *existing == name) {
                let column = vec![value; output.len()];
                output.insert_column(&name, column)?;
            }
        }
        Ok(output)
    })
}
