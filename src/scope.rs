//! Lexical scope frames.
//!
//! A frame owns its own bindings and borrows its parent. Reads walk outward
//! through the chain; writes only ever land in the innermost frame, so a
//! child can shadow an outer name without touching it and sibling frames
//! never see each other's bindings.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::ast::Node;

pub struct Scope<'p, V = Node> {
    bindings: RefCell<HashMap<String, V>>,
    parent: Option<&'p Scope<'p, V>>,
}

impl<'p, V: Clone> Scope<'p, V> {
    pub fn root() -> Self {
        Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }
    }

    pub fn child(parent: &'p Scope<'p, V>) -> Self {
        Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Binds `key` in this frame. Fails if this frame already holds `key`;
    /// outer bindings of the same name are shadowed, not rejected.
    pub fn declare(&self, key: &str, value: V) -> Result<(), String> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(key) {
            return Err(format!("Repeat declaration of \"{}\"", key));
        }
        bindings.insert(key.to_string(), value);
        Ok(())
    }

    /// Binds `key` in this frame, replacing any previous binding.
    pub fn bind(&self, key: &str, value: V) {
        self.bindings.borrow_mut().insert(key.to_string(), value);
    }

    pub fn lookup(&self, key: &str) -> Option<V> {
        if let Some(value) = self.bindings.borrow().get(key) {
            return Some(value.clone());
        }
        self.parent.and_then(|p| p.lookup(key))
    }

    pub fn contains_local(&self, key: &str) -> bool {
        self.bindings.borrow().contains_key(key)
    }

    pub fn depth(&self) -> usize {
        match self.parent {
            Some(p) => p.depth() + 1,
            None => 0,
        }
    }
}
