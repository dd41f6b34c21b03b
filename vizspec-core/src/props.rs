//! Visual-property mappings and their merge semantics.
//!
//! A [`PropertySet`] is an ordered mapping from `(property name, state)` to a
//! value expression. Adding a duplicate key overrides the prior mapping in
//! place, preserving its original position, rather than appending.

use crate::error::{Result, VizSpecError};
use crate::reactive::ReactiveValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property names with built-in scale handling. The vocabulary is extensible:
/// unknown names are carried through untouched.
pub const KNOWN_PROPERTIES: &[&str] = &[
    "x",
    "x2",
    "y",
    "y2",
    "stroke",
    "strokeOpacity",
    "fill",
    "fillOpacity",
    "shape",
    "size",
    "opacity",
    "angle",
    "startAngle",
    "endAngle",
    "radius",
    "innerRadius",
    "outerRadius",
    "fontSize",
    "text",
];

pub fn is_known_property(name: &str) -> bool {
    KNOWN_PROPERTIES.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropState {
    #[default]
    Base,
    Enter,
    Exit,
    Update,
    Hover,
}

impl PropState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Update => "update",
            Self::Hover => "hover",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "base" => Some(Self::Base),
            "enter" => Some(Self::Enter),
            "exit" => Some(Self::Exit),
            "update" => Some(Self::Update),
            "hover" => Some(Self::Hover),
            _ => None,
        }
    }
}

/// Value expression bound to a property.
#[derive(Debug, Clone)]
pub enum PropExpr {
    Literal(Value),
    FieldRef(String),
    Reactive(ReactiveValue<Value>),
}

impl PartialEq for PropExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::FieldRef(a), Self::FieldRef(b)) => a == b,
            // Reactive identity is carried by the fingerprint id
            (Self::Reactive(a), Self::Reactive(b)) => a.id == b.id,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMapping {
    pub name: String,
    pub state: PropState,
    pub expr: PropExpr,
    pub scaled: bool,
}

/// Ordered collection of property mappings, at most one per
/// `(property name, state)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    mappings: Vec<PropertyMapping>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.mappings.iter()
    }

    pub fn get(&self, name: &str, state: PropState) -> Option<&PropertyMapping> {
        self.mappings
            .iter()
            .find(|m| m.name == name && m.state == state)
    }

    /// Insert a mapping, overriding any existing mapping with the same
    /// `(name, state)` key in place.
    pub fn insert(&mut self, mapping: PropertyMapping) {
        match self
            .mappings
            .iter()
            .position(|m| m.name == mapping.name && m.state == mapping.state)
        {
            Some(position) => self.mappings[position] = mapping,
            None => self.mappings.push(mapping),
        }
    }

    /// Override merge. With `inherit = true`, every key of `other` replaces
    /// the matching key here (position preserved) and unmentioned keys are
    /// retained; with `inherit = false` the result is exactly `other`.
    pub fn merge(&self, other: &Self, inherit: bool) -> Self {
        if !inherit {
            return other.clone();
        }
        let mut merged = self.clone();
        for mapping in other.iter() {
            merged.insert(mapping.clone());
        }
        merged
    }

    /// All reactive values referenced by this set.
    pub fn reactive_values(&self) -> Vec<&ReactiveValue<Value>> {
        self.mappings
            .iter()
            .filter_map(|m| match &m.expr {
                PropExpr::Reactive(rv) => Some(rv),
                _ => None,
            })
            .collect()
    }
}

/// A classified property argument, before it is keyed by name and state.
#[derive(Debug, Clone)]
pub struct PropValue {
    expr: PropExpr,
    scaled: bool,
}

/// Field-reference expression, participating in scale inference.
pub fn field(name: impl Into<String>) -> PropValue {
    PropValue {
        expr: PropExpr::FieldRef(name.into()),
        scaled: true,
    }
}

/// Field-reference expression used as a direct visual value (no scale).
pub fn unscaled_field(name: impl Into<String>) -> PropValue {
    PropValue {
        expr: PropExpr::FieldRef(name.into()),
        scaled: false,
    }
}

/// Literal visual value (no scale).
pub fn value(literal: impl Into<Value>) -> PropValue {
    PropValue {
        expr: PropExpr::Literal(literal.into()),
        scaled: false,
    }
}

/// Reactive expression; participates in scale inference when its current
/// value looks like a field reference (`{"field": ...}`).
pub fn reactive_prop(reactive: &ReactiveValue<Value>) -> PropValue {
    let scaled = looks_like_field_ref(&reactive.cell.read());
    PropValue {
        expr: PropExpr::Reactive(reactive.clone()),
        scaled,
    }
}

pub(crate) fn looks_like_field_ref(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("field"))
}

#[derive(Debug, Clone)]
pub enum PropArg {
    Unnamed(PropValue),
    Named(String, PropValue),
}

impl PropArg {
    pub fn unnamed(value: PropValue) -> Self {
        Self::Unnamed(value)
    }

    pub fn named(name: impl Into<String>, value: PropValue) -> Self {
        Self::Named(name.into(), value)
    }
}

/// Build a [`PropertySet`] from classified arguments. The first two unnamed
/// arguments default to `x` and `y`; further unnamed arguments are rejected.
/// Named arguments may carry a `.state` suffix, e.g. `"fill.hover"`.
pub fn props(args: Vec<PropArg>) -> Result<PropertySet> {
    let mut set = PropertySet::new();
    let mut positional = ["x", "y"].iter();
    for arg in args {
        let (raw_name, prop_value) = match arg {
            PropArg::Unnamed(prop_value) => match positional.next() {
                Some(name) => ((*name).to_string(), prop_value),
                None => {
                    return Err(VizSpecError::invalid_argument(
                        "only the first two unnamed properties (x, y) are supported; \
                         name further properties explicitly",
                    ))
                }
            },
            PropArg::Named(name, prop_value) => (name, prop_value),
        };
        let (name, state) = split_state(&raw_name)?;
        set.insert(PropertyMapping {
            name,
            state,
            expr: prop_value.expr,
            scaled: prop_value.scaled,
        });
    }
    Ok(set)
}

fn split_state(raw: &str) -> Result<(String, PropState)> {
    match raw.split_once('.') {
        None => Ok((raw.to_string(), PropState::Base)),
        Some((name, suffix)) => match PropState::from_suffix(suffix) {
            Some(state) => Ok((name.to_string(), state)),
            None => Err(VizSpecError::invalid_argument(format!(
                "unknown property state suffix: {suffix}"
            ))),
        },
    }
}
