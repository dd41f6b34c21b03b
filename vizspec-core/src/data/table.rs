//! Row-oriented tabular values consumed by the builder.
//!
//! The builder does not care how source data is stored, only that it supports
//! field extraction by name and grouped iteration. `DataTable` is the owned
//! realization of that contract: JSON object rows plus optional declared field
//! types (JSON cannot distinguish ordinal from nominal strings) and an
//! optional grouping column list.

use crate::error::{Result, VizSpecError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field type declarations that cannot be derived from JSON value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    Ordinal,
    Datetime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    rows: Vec<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    field_types: BTreeMap<String, DeclaredType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    grouping: Vec<String>,
}

impl DataTable {
    pub fn from_rows(rows: Vec<Map<String, Value>>) -> Self {
        Self {
            rows,
            field_types: Default::default(),
            grouping: Default::default(),
        }
    }

    /// Build a table from a JSON array of objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Array(elements) = value else {
            return Err(VizSpecError::invalid_argument(
                "expected a JSON array of objects",
            ));
        };
        let mut rows = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                Value::Object(obj) => rows.push(obj.clone()),
                _ => {
                    return Err(VizSpecError::invalid_argument(format!(
                        "expected a JSON object row, found: {element}"
                    )))
                }
            }
        }
        Ok(Self::from_rows(rows))
    }

    pub fn with_field_type(mut self, field: &str, declared: DeclaredType) -> Self {
        self.field_types.insert(field.to_string(), declared);
        self
    }

    pub fn field_type(&self, field: &str) -> Option<DeclaredType> {
        self.field_types.get(field).copied()
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract a column by field name. Missing fields yield nulls so the
    /// column is always row-aligned.
    pub fn column(&self, field: &str) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| row.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Column names in order of first appearance across all rows.
    pub fn column_names(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .unique()
            .collect()
    }

    pub fn grouping(&self) -> &[String] {
        &self.grouping
    }

    pub fn set_grouping(&mut self, grouping: Vec<String>) {
        self.grouping = grouping;
    }

    pub fn with_grouping(mut self, grouping: Vec<String>) -> Self {
        self.grouping = grouping;
        self
    }

    /// Row indices grouped by the value of `group_field`, groups in order of
    /// first appearance and rows in original order within each group. With no
    /// group field the whole table is one implicit group.
    pub fn group_indices(&self, group_field: Option<&str>) -> Vec<Vec<usize>> {
        let Some(field) = group_field else {
            return vec![(0..self.rows.len()).collect()];
        };
        let mut keys: Vec<Value> = Vec::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            let key = row.get(field).cloned().unwrap_or(Value::Null);
            match keys.iter().position(|existing| *existing == key) {
                Some(position) => groups[position].push(index),
                None => {
                    keys.push(key);
                    groups.push(vec![index]);
                }
            }
        }
        groups
    }

    /// Columns whose value is identical across every row.
    pub fn constant_columns(&self) -> Vec<(String, Value)> {
        let mut constants = Vec::new();
        for name in self.column_names() {
            let mut values = self.rows.iter().map(|row| row.get(&name));
            let Some(first) = values.next().flatten() else {
                continue;
            };
            if values.all(|value| value == Some(first)) {
                constants.push((name, first.clone()));
            }
        }
        constants
    }

    /// Attach a row-aligned column, replacing any column of the same name.
    pub fn insert_column(&mut self, field: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(VizSpecError::internal(format!(
                "column '{field}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(field.to_string(), value);
        }
        Ok(())
    }

    /// Materialize the rows as a JSON array of objects.
    pub fn to_values(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}
