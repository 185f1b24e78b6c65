//! Runtime scope chain.
//!
//! Environments are shared through `Rc<RefCell<_>>`: every active call frame
//! and every closure that captured a scope holds a handle to the same node,
//! so a `define`/`assign` is visible to all of them at once.  A closure
//! stored in the scope it captured forms a reference cycle; such cycles are
//! never collected and live until the process exits.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an [`Environment`].
pub type EnvRef<'a> = Rc<RefCell<Environment<'a>>>;

#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<EnvRef<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'a>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef<'a>) -> EnvRef<'a> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    /// Binds `name` in this scope, shadowing or overwriting freely.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Looks `name` up along the whole chain.
    pub fn get(&self, name: &Token<'_>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Rebinds an existing `name` somewhere along the chain.
    pub fn assign(&mut self, name: &Token<'_>, value: Value<'a>) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// The environment exactly `distance` links up from `env`.
    pub fn ancestor(env: &EnvRef<'a>, distance: usize) -> EnvRef<'a> {
        let mut current: EnvRef<'a> = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone();

            match next {
                Some(parent) => current = parent,
                None => break, // resolver guarantees depth; stop at the root
            }
        }

        current
    }

    /// Reads `name` from the scope `distance` links up.  The resolver has
    /// already proven the binding exists there; a miss yields `nil`.
    pub fn get_at(env: &EnvRef<'a>, distance: usize, name: &str) -> Value<'a> {
        let scope: EnvRef<'a> = Self::ancestor(env, distance);
        let value: Option<Value<'a>> = scope.borrow().values.get(name).cloned();

        value.unwrap_or(Value::Nil)
    }

    /// Writes `name` into the scope `distance` links up.
    pub fn assign_at(env: &EnvRef<'a>, distance: usize, name: &str, value: Value<'a>) {
        let scope: EnvRef<'a> = Self::ancestor(env, distance);
        scope.borrow_mut().values.insert(name.to_string(), value);
    }
}
