//! Declarative visualization-specification builder.
//!
//! Callers describe a dataset and a set of visual-property mappings, then
//! incrementally compose a graphic out of marks, scales, axes, legends and
//! reactive data transforms. Resolution walks the composed state and emits a
//! renderer-agnostic [`spec::ChartSpec`] for a separate rendering engine.

pub mod builder;
pub mod data;
pub mod error;
pub mod persist;
pub mod props;
pub mod reactive;
pub mod resolve;
pub mod scale;
pub mod spec;
pub mod transform;

pub use builder::{Mark, MarkType, SpecBuilder};
pub use data::{DataTable, Dataset, DeclaredType};
pub use error::{Result, ResultWithContext, VizSpecError};
pub use persist::{load_spec, save_spec, SpecDisplay, WriterDisplay};
pub use props::{
    field, props, reactive_prop, unscaled_field, value, PropArg, PropExpr, PropState,
    PropertyMapping, PropertySet,
};
pub use reactive::{Broker, ReactiveCell, ReactiveValue};
pub use resolve::resolve;
pub use scale::{prop_to_scale, range_prop, DomainSource, ScaleInfo, ScaleType};
pub use transform::stack::{add_stack, compute_stack};
pub use transform::{register_computation, TransformArg, TransformFn};
