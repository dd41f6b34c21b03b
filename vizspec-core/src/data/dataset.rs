//! Named datasets tracked by the builder.
//!
//! A dataset is replaced, never mutated, when new data is attached; the
//! builder's current-dataset pointer shadows earlier registrations. A constant
//! producer's table is computed once at registration and treated as immutable
//! for the builder's lifetime (there is no invalidation path for it); a
//! reactive producer is re-read on every access.

use crate::data::table::DataTable;
use crate::reactive::ReactiveCell;

#[derive(Debug, Clone)]
pub enum DataProducer {
    Constant(DataTable),
    Reactive(ReactiveCell<DataTable>),
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: String,
    producer: DataProducer,
}

impl Dataset {
    pub fn constant(id: impl Into<String>, table: DataTable) -> Self {
        Self {
            id: id.into(),
            producer: DataProducer::Constant(table),
        }
    }

    pub fn reactive(id: impl Into<String>, cell: ReactiveCell<DataTable>) -> Self {
        Self {
            id: id.into(),
            producer: DataProducer::Reactive(cell),
        }
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self.producer, DataProducer::Reactive(_))
    }

    /// The current table. Reactive producers recompute lazily if stale.
    pub fn current(&self) -> DataTable {
        match &self.producer {
            DataProducer::Constant(table) => table.clone(),
            DataProducer::Reactive(cell) => cell.read(),
        }
    }

    pub fn producer(&self) -> &DataProducer {
        &self.producer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reactive_dataset_tracks_cell() {
        let cell = ReactiveCell::input(DataTable::from_json(&json!([{"x": 1}])).unwrap());
        let dataset = Dataset::reactive("pts0", cell.clone());
        assert!(dataset.is_reactive());
        assert_eq!(dataset.current().len(), 1);

        cell.set(DataTable::from_json(&json!([{"x": 1}, {"x": 2}])).unwrap());
        assert_eq!(dataset.current().len(), 2);
    }
}
