//! Single-threaded reactive cells with lazy pull evaluation.
//!
//! A cell is either an input (holds a value, updated with [`ReactiveCell::set`])
//! or a computed cell (recomputes lazily when an upstream cell changed).
//! Dependency edges are recorded implicitly: while a computed cell runs its
//! compute function, every cell it reads registers it as a dependent.
//! Recomputation is depth-first and synchronous, so a producer always observes
//! a fully up-to-date snapshot of every reactive input it reads.

use std::cell::{Cell, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use ahash::AHasher;
use serde_json::Value;

thread_local! {
    static NEXT_CELL_ID: Cell<u64> = const { Cell::new(0) };
    static EVAL_STACK: RefCell<Vec<(u64, Weak<dyn AnyCell>)>> = const { RefCell::new(Vec::new()) };
}

fn next_cell_id() -> u64 {
    NEXT_CELL_ID.with(|id| {
        let next = id.get();
        id.set(next + 1);
        next
    })
}

/// Type-erased view of a cell, used for dirty propagation across
/// heterogeneously-typed dependents.
trait AnyCell {
    fn invalidate(&self);
    fn add_dependent(&self, id: u64, dep: Weak<dyn AnyCell>);
}

struct CellCore<T> {
    id: u64,
    compute: Option<Box<dyn Fn() -> T>>,
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    dependents: RefCell<Vec<(u64, Weak<dyn AnyCell>)>>,
}

impl<T: Clone + 'static> AnyCell for CellCore<T> {
    fn invalidate(&self) {
        if self.dirty.get() {
            // Already propagated through this cell
            return;
        }
        self.dirty.set(true);
        for (_, dep) in self.dependents.borrow().iter() {
            if let Some(dep) = dep.upgrade() {
                dep.invalidate();
            }
        }
    }

    fn add_dependent(&self, id: u64, dep: Weak<dyn AnyCell>) {
        let mut deps = self.dependents.borrow_mut();
        if deps.iter().all(|(existing, _)| *existing != id) {
            deps.push((id, dep));
        }
    }
}

/// A unit of lazily recomputed state with tracked dependencies.
pub struct ReactiveCell<T> {
    core: Rc<CellCore<T>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("id", &self.core.id)
            .field("dirty", &self.core.dirty.get())
            .finish()
    }
}

impl<T: Clone + 'static> ReactiveCell<T> {
    /// Create an input cell holding `value`.
    pub fn input(value: T) -> Self {
        Self {
            core: Rc::new(CellCore {
                id: next_cell_id(),
                compute: None,
                value: RefCell::new(Some(value)),
                dirty: Cell::new(false),
                dependents: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a computed cell. The compute function runs on first read and
    /// again whenever any cell it reads is invalidated.
    pub fn computed(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            core: Rc::new(CellCore {
                id: next_cell_id(),
                compute: Some(Box::new(compute)),
                value: RefCell::new(None),
                dirty: Cell::new(true),
                dependents: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Replace an input cell's value and mark all transitive dependents dirty.
    pub fn set(&self, value: T) {
        *self.core.value.borrow_mut() = Some(value);
        for (_, dep) in self.core.dependents.borrow().iter() {
            if let Some(dep) = dep.upgrade() {
                dep.invalidate();
            }
        }
    }

    /// Read the current value, recomputing first if any upstream cell changed.
    pub fn read(&self) -> T {
        // Record the edge from the cell currently computing, if any
        EVAL_STACK.with(|stack| {
            if let Some((top_id, top)) = stack.borrow().last() {
                if *top_id != self.core.id {
                    self.core.add_dependent(*top_id, top.clone());
                }
            }
        });

        let stale = self.core.dirty.get() || self.core.value.borrow().is_none();
        if stale {
            if let Some(compute) = &self.core.compute {
                let erased: Rc<dyn AnyCell> = self.core.clone();
                EVAL_STACK
                    .with(|stack| stack.borrow_mut().push((self.core.id, Rc::downgrade(&erased))));
                let value = compute();
                EVAL_STACK.with(|stack| {
                    stack.borrow_mut().pop();
                });
                *self.core.value.borrow_mut() = Some(value.clone());
                self.core.dirty.set(false);
                return value;
            }
            self.core.dirty.set(false);
        }
        match self.core.value.borrow().as_ref() {
            Some(value) => value.clone(),
            // Input cells are constructed with a value and computed cells were
            // filled above, so the value is always present here.
            None => unreachable!("reactive cell read before initialization"),
        }
    }
}

/// Connector function feeding control changes back into data.
pub type Connector = Rc<dyn Fn(&Value) -> Value>;

/// Bundle attached to a reactive value: interactive controls, a connector
/// describing how control changes feed back into data, and a handler spec
/// fragment. Controls and handler are opaque to the builder.
#[derive(Clone)]
pub struct Broker {
    pub controls: Vec<Value>,
    pub connector: Connector,
    pub handler: Value,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("controls", &self.controls)
            .field("handler", &self.handler)
            .finish()
    }
}

/// A reactive cell together with its stable identity.
///
/// The id is a content fingerprint of the definition label, so structurally
/// identical reactive definitions collapse to one registration in the builder.
pub struct ReactiveValue<T> {
    pub id: String,
    pub cell: ReactiveCell<T>,
    pub broker: Option<Broker>,
}

impl<T> Clone for ReactiveValue<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            cell: self.cell.clone(),
            broker: self.broker.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ReactiveValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveValue")
            .field("id", &self.id)
            .field("broker", &self.broker)
            .finish()
    }
}

impl<T: Clone + 'static> ReactiveValue<T> {
    /// Wrap a cell, deriving the identity from `label`. The label should
    /// describe the reactive's definition (not its current value), e.g.
    /// `"slider:size:10:100"`.
    pub fn new(label: impl AsRef<str>, cell: ReactiveCell<T>) -> Self {
        Self {
            id: fingerprint(label.as_ref()),
            cell,
            broker: None,
        }
    }

    pub fn with_broker(mut self, broker: Broker) -> Self {
        self.broker = Some(broker);
        self
    }
}

fn fingerprint(label: &str) -> String {
    let mut hasher = AHasher::default();
    label.hash(&mut hasher);
    format!("reactive_{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_read_and_set() {
        let cell = ReactiveCell::input(1_i64);
        assert_eq!(cell.read(), 1);
        cell.set(2);
        assert_eq!(cell.read(), 2);
    }

    #[test]
    fn test_computed_recomputes_on_upstream_change() {
        let source = ReactiveCell::input(10_i64);
        let upstream = source.clone();
        let doubled = ReactiveCell::computed(move || upstream.read() * 2);
        assert_eq!(doubled.read(), 20);

        source.set(21);
        assert_eq!(doubled.read(), 42);
    }

    #[test]
    fn test_chain_is_depth_first() {
        let source = ReactiveCell::input(1_i64);
        let a_src = source.clone();
        let a = ReactiveCell::computed(move || a_src.read() + 1);
        let b_src = a.clone();
        let b = ReactiveCell::computed(move || b_src.read() * 10);
        assert_eq!(b.read(), 20);

        source.set(4);
        // Reading the tail pulls the whole chain up to date
        assert_eq!(b.read(), 50);
    }

    #[test]
    fn test_fingerprint_collapses_identical_labels() {
        let a = ReactiveValue::new("slider:0:10", ReactiveCell::input(Value::from(5)));
        let b = ReactiveValue::new("slider:0:10", ReactiveCell::input(Value::from(7)));
        let c = ReactiveValue::new("slider:0:99", ReactiveCell::input(Value::from(5)));
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }
}
