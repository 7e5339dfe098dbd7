/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lexically chained variable environments.
//!
//! A transformation run owns a tree of scopes: each scope has its own local
//! frame, an optional parent, and a handle to the single shared store that
//! every scope in the run sees. Lookup walks locals, then the parent chain,
//! then the shared store. Writes never cross frame boundaries except through
//! [`Scope::set_shared`].

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A set of named variable bindings.
pub type Bindings = HashMap<String, Value>;

/// The run-wide shared store, visible from every scope of a transformation.
pub type SharedBindings = Rc<RefCell<Bindings>>;

/// A variable environment with local, inherited and shared tiers.
#[derive(Debug)]
pub struct Scope {
    locals: RefCell<Bindings>,
    shared: SharedBindings,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// Create a root scope over the given shared store.
    pub fn new(locals: Bindings, shared: SharedBindings) -> Scope {
        Scope {
            locals: RefCell::new(locals),
            shared,
            parent: None,
        }
    }

    /// Look a variable up through locals, then the parent chain, then the
    /// shared store. A miss is `None`, never an error.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.locals.borrow().get(key) {
            return Some(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(key),
            None => self.shared.borrow().get(key).cloned(),
        }
    }

    /// Look a variable up in this scope's own frame only.
    pub fn get_local(&self, key: &str) -> Option<Value> {
        self.locals.borrow().get(key).cloned()
    }

    /// Look a variable up in the shared store only.
    pub fn get_shared(&self, key: &str) -> Option<Value> {
        self.shared.borrow().get(key).cloned()
    }

    /// Bind a variable in this scope's own frame.
    pub fn set_local(&self, key: impl Into<String>, value: Value) {
        self.locals.borrow_mut().insert(key.into(), value);
    }

    /// Bind a variable in the shared store, visible to every scope of the
    /// run.
    pub fn set_shared(&self, key: impl Into<String>, value: Value) {
        self.shared.borrow_mut().insert(key.into(), value);
    }

    /// Create a child scope with the given starting bindings. The child
    /// shares this run's shared store and resolves misses through `self`.
    pub fn create_child(self: &Rc<Self>, locals: Bindings) -> Rc<Scope> {
        Rc::new(Scope {
            locals: RefCell::new(locals),
            shared: Rc::clone(&self.shared),
            parent: Some(Rc::clone(self)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_scope(locals: Bindings) -> Rc<Scope> {
        Rc::new(Scope::new(locals, Rc::new(RefCell::new(Bindings::new()))))
    }

    #[test]
    fn test_lookup_order() {
        let root = root_scope(Bindings::from([(
            "name".to_string(),
            Value::from("root"),
        )]));
        root.set_shared("name", Value::from("shared"));
        root.set_shared("only_shared", Value::from("s"));

        let child = root.create_child(Bindings::new());
        assert_eq!(child.get("name"), Some(Value::from("root")));
        assert_eq!(child.get("only_shared"), Some(Value::from("s")));
        assert_eq!(child.get("missing"), None);
    }

    #[test]
    fn test_child_shadows_parent() {
        let root = root_scope(Bindings::from([("x".to_string(), Value::from(1.0))]));
        let child = root.create_child(Bindings::from([("x".to_string(), Value::from(2.0))]));

        assert_eq!(child.get("x"), Some(Value::from(2.0)));
        assert_eq!(root.get("x"), Some(Value::from(1.0)));
    }

    #[test]
    fn test_local_writes_do_not_leak_upward() {
        let root = root_scope(Bindings::new());
        let child = root.create_child(Bindings::new());
        child.set_local("x", Value::from(1.0));

        assert_eq!(root.get("x"), None);
        assert_eq!(child.get_local("x"), Some(Value::from(1.0)));
        assert_eq!(root.get_local("x"), None);
    }

    #[test]
    fn test_shared_writes_are_visible_everywhere() {
        let root = root_scope(Bindings::new());
        let a = root.create_child(Bindings::new());
        let b = root.create_child(Bindings::new());

        a.set_shared("counter", Value::from(1.0));
        assert_eq!(b.get("counter"), Some(Value::from(1.0)));
        assert_eq!(root.get_shared("counter"), Some(Value::from(1.0)));
        // sibling locals stay isolated
        a.set_local("private", Value::from(true));
        assert_eq!(b.get("private"), None);
    }

    #[test]
    fn test_get_local_ignores_the_chain() {
        let root = root_scope(Bindings::from([("x".to_string(), Value::from(1.0))]));
        let child = root.create_child(Bindings::new());
        assert_eq!(child.get_local("x"), None);
        assert_eq!(child.get("x"), Some(Value::from(1.0)));
    }
}
