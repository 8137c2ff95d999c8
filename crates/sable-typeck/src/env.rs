//! Type environment with scope stack.
//!
//! The type environment maps binding names to their type and mutability.
//! It uses a scope stack (Vec of maps) so that entering a checked scope
//! (a function body) pushes a new frame and leaving pops it. Lookups search
//! from the innermost scope outward, implementing lexical scoping; an inner
//! definition shadows an outer binding of the same name, never mutates it.

use rustc_hash::FxHashMap;

use crate::ty::Ty;

/// What the type environment knows about one binding.
#[derive(Clone, Debug)]
pub struct Binding {
    pub ty: Ty,
    pub mutable: bool,
}

/// A type environment: a stack of scopes mapping names to [`Binding`]s.
pub struct TypeEnv {
    /// The scope stack. Index 0 is the outermost (global) scope.
    scopes: Vec<FxHashMap<String, Binding>>,
}

impl TypeEnv {
    /// Create a new type environment with one empty global scope.
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![FxHashMap::default()],
        }
    }

    /// Push a new empty scope onto the stack.
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    /// Pop the top scope from the stack.
    ///
    /// # Panics
    ///
    /// Panics if called when only the global scope remains.
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Define a name in the current (topmost) scope.
    pub fn define(&mut self, name: impl Into<String>, ty: Ty, mutable: bool) {
        self.scopes
            .last_mut()
            .expect("scope stack should never be empty")
            .insert(name.into(), Binding { ty, mutable });
    }

    /// Look up a name, searching from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        for scope in self.scopes.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return Some(binding);
            }
        }
        None
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
