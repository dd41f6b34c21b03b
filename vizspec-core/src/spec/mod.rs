//! Renderer-agnostic output spec tree.
//!
//! These types are the external contract handed to a rendering engine; field
//! names are a stable schema (`scales`, `marks`, `data`, `axes`, `legends`).

pub mod axis;
pub mod chart;
pub mod data;
pub mod legend;
pub mod mark;
pub mod scale;

pub use axis::AxisSpec;
pub use chart::ChartSpec;
pub use data::DataSpec;
pub use legend::LegendSpec;
pub use mark::{EncodingValueSpec, MarkFromSpec, MarkSpec};
pub use scale::ScaleSpec;
