//! The visualisation builder: the aggregate root of incremental composition.
//!
//! A `SpecBuilder` is exclusively owned by its single calling thread of
//! control for the whole composition phase. Its dataset and reactive tables
//! are append-only (entries replaced by identity, never mutated destructively)
//! until resolution, which is a read-only pass. Every mutation is atomic:
//! validation errors surface before any state changes, so a failed call
//! leaves the builder usable.

use crate::data::{DataTable, Dataset};
use crate::error::Result;
use crate::props::PropertySet;
use crate::reactive::{Connector, ReactiveCell, ReactiveValue};
use crate::scale::infer::infer_scale_infos;
use crate::scale::{range_prop, ScaleInfo};
use crate::spec::{AxisSpec, LegendSpec};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Point,
    Line,
    Path,
    Rect,
    Arc,
    Text,
    Image,
}

impl MarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Line => "line",
            Self::Path => "path",
            Self::Rect => "rect",
            Self::Arc => "arc",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// One visual primitive instance: a snapshot of the builder's current
/// properties and dataset at the time it was added. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Mark {
    pub type_: MarkType,
    pub props: PropertySet,
    pub dataset: Option<String>,
}

#[derive(Default)]
pub struct SpecBuilder {
    datasets: Vec<Dataset>,
    current_dataset: Option<String>,
    current_props: PropertySet,
    marks: Vec<Mark>,
    scale_infos: Vec<ScaleInfo>,
    scale_overrides: Vec<(String, Value)>,
    axes: Vec<AxisSpec>,
    legends: Vec<LegendSpec>,
    reactives: Vec<ReactiveValue<Value>>,
    controls: Vec<Value>,
    connectors: Vec<Connector>,
    handlers: Vec<Value>,
}

impl std::fmt::Debug for SpecBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecBuilder")
            .field("datasets", &self.datasets.len())
            .field("current_dataset", &self.current_dataset)
            .field("marks", &self.marks.len())
            .field("scale_infos", &self.scale_infos.len())
            .field("reactives", &self.reactives.len())
            .finish()
    }
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a constant dataset and make it current. Attaching the same
    /// named source twice yields two distinct dataset ids.
    pub fn add_data(&mut self, name: &str, table: DataTable) -> &mut Self {
        let id = self.next_dataset_id(name);
        self.push_dataset(Dataset::constant(id, table));
        self
    }

    /// Attach a reactive dataset and make it current.
    pub fn add_reactive_data(&mut self, name: &str, cell: ReactiveCell<DataTable>) -> &mut Self {
        let id = self.next_dataset_id(name);
        self.push_dataset(Dataset::reactive(id, cell));
        self
    }

    /// Mint a dataset id from a prefix and the dataset count. Names that
    /// already end in digits can make the concatenation collide with an
    /// existing id, so the count is advanced past any taken id.
    pub(crate) fn next_dataset_id(&self, prefix: &str) -> String {
        let mut count = self.datasets.len();
        loop {
            let id = format!("{prefix}{count}");
            if self.dataset(&id).is_none() {
                return id;
            }
            count += 1;
        }
    }

    pub(crate) fn push_dataset(&mut self, dataset: Dataset) {
        debug!("attached dataset '{}'", dataset.id);
        self.current_dataset = Some(dataset.id.clone());
        self.datasets.push(dataset);
    }

    /// Merge a property set onto the current one. Reactive expressions found
    /// in the set are registered with the reactive table.
    pub fn add_props(&mut self, props: PropertySet, inherit: bool) -> &mut Self {
        let reactives: Vec<_> = props.reactive_values().into_iter().cloned().collect();
        for reactive in &reactives {
            self.register_reactive(reactive);
        }
        self.current_props = self.current_props.merge(&props, inherit);
        self
    }

    /// Append a mark, snapshotting the current properties and dataset, and
    /// accumulate scale information for every scaled property mapping.
    pub fn add_mark(&mut self, type_: MarkType) -> Result<&mut Self> {
        let infos = infer_scale_infos(&self.current_props, self.current_dataset())?;
        self.scale_infos.extend(infos);
        self.marks.push(Mark {
            type_,
            props: self.current_props.clone(),
            dataset: self.current_dataset.clone(),
        });
        Ok(self)
    }

    /// Record an explicit scale domain/range override, validated through
    /// [`range_prop`]. Re-setting a constraint replaces it in place.
    pub fn add_scale_override(&mut self, name: &str, values: &[Value]) -> Result<&mut Self> {
        let constraints = range_prop(name, values)?;
        for (key, value) in constraints {
            match self
                .scale_overrides
                .iter()
                .position(|(existing, _)| *existing == key)
            {
                Some(position) => self.scale_overrides[position] = (key, value),
                None => self.scale_overrides.push((key, value)),
            }
        }
        Ok(self)
    }

    pub fn add_axis(&mut self, axis: AxisSpec) -> &mut Self {
        self.axes.push(axis);
        self
    }

    pub fn add_legend(&mut self, legend: LegendSpec) -> &mut Self {
        self.legends.push(legend);
        self
    }

    /// Register a reactive value, keyed by its content-fingerprint id.
    /// Re-registering the same reactive is a no-op; a broker's controls,
    /// connector and handler are recorded exactly once per reactive.
    pub fn register_reactive(&mut self, reactive: &ReactiveValue<Value>) {
        if self.reactives.iter().any(|r| r.id == reactive.id) {
            return;
        }
        debug!("registered reactive '{}'", reactive.id);
        if let Some(broker) = &reactive.broker {
            self.controls.extend(broker.controls.iter().cloned());
            self.connectors.push(broker.connector.clone());
            self.handlers.push(broker.handler.clone());
        }
        self.reactives.push(reactive.clone());
    }

    pub fn current_dataset(&self) -> Option<&Dataset> {
        self.current_dataset
            .as_deref()
            .and_then(|id| self.dataset(id))
    }

    pub fn dataset(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn reactive(&self, id: &str) -> Option<&ReactiveValue<Value>> {
        self.reactives.iter().find(|r| r.id == id)
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn current_props(&self) -> &PropertySet {
        &self.current_props
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn scale_infos(&self) -> &[ScaleInfo] {
        &self.scale_infos
    }

    pub fn scale_overrides(&self) -> &[(String, Value)] {
        &self.scale_overrides
    }

    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    pub fn legends(&self) -> &[LegendSpec] {
        &self.legends
    }

    pub fn reactives(&self) -> &[ReactiveValue<Value>] {
        &self.reactives
    }

    pub fn controls(&self) -> &[Value] {
        &self.controls
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn handlers(&self) -> &[Value] {
        &self.handlers
    }
}
