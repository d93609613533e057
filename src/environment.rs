//! Lexical scope chain for the interpreter.
//!
//! An `Environment` maps names to runtime values and optionally links to the
//! enclosing scope, forming a singly linked chain.  Chains only ever grow by
//! nesting a child inside an existing scope, never by re-parenting, so they
//! are acyclic.  Capture is by reference: a closure and the interpreter's
//! current-scope pointer may alias the same `Rc<RefCell<Environment>>`, and
//! both observe each other's mutations.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in *this* scope, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up through the chain.  `None` means undefined everywhere.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an *existing* binding, searching outward.  Returns `false`
    /// when no reachable scope declares `name`.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Walk exactly `distance` enclosing links up from `this`.
    ///
    /// The resolver guarantees the distance is in range; a shorter chain
    /// means the resolution table and the environment chain went out of
    /// sync, which is a bug, not a user error.
    pub fn ancestor(this: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut env: Rc<RefCell<Environment>> = Rc::clone(this);

        for _ in 0..distance {
            let next: Rc<RefCell<Environment>> = env
                .borrow()
                .enclosing
                .as_ref()
                .map(Rc::clone)
                .expect("resolved distance exceeds environment chain depth");

            env = next;
        }

        env
    }

    /// Read `name` in the scope exactly `distance` hops up the chain.
    pub fn get_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Option<Value> {
        Self::ancestor(this, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
    }

    /// Write `name` in the scope exactly `distance` hops up the chain.
    pub fn assign_at(
        this: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        let target: Rc<RefCell<Environment>> = Self::ancestor(this, distance);
        let mut target = target.borrow_mut();

        if target.values.contains_key(name) {
            target.values.insert(name.to_string(), value);
            true
        } else {
            false
        }
    }
}
