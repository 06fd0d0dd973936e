use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use clbridge_value::Value;

/// Shared name→value environment for one session.
///
/// A cheap handle passed explicitly to every dispatcher and engine
/// operation; cloning yields another handle to the same environment.
/// The session model is single-threaded, so interior mutability is
/// uncontended; borrows must simply not be held across host
/// callbacks.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    vars: Rc<RefCell<HashMap<String, Value>>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a name, cloning the stored value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(name).cloned()
    }

    /// Bind or rebind a name.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    /// Whether a name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Number of bound names.
    pub fn len(&self) -> usize {
        self.vars.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.borrow().is_empty()
    }
}
