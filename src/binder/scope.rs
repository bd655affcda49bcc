use std::collections::HashMap;

use crate::bir::Definition;

/// A single lexical scope: a name-to-definition map chained to the scope
/// that encloses it. Blocks push and pop scopes around their bodies, so
/// the chain is strictly LIFO with the block nesting.
#[derive(Debug, Default)]
pub struct Scope {
    definitions: HashMap<String, Definition>,
    outer: Option<Box<Scope>>,
}

impl Scope {
    /// Creates an empty root scope.
    pub fn new() -> Self {
        Scope::default()
    }

    /// Creates a scope enclosed by `outer`.
    pub fn with_outer(outer: Scope) -> Self {
        Scope {
            definitions: HashMap::new(),
            outer: Some(Box::new(outer)),
        }
    }

    /// Removes and returns the enclosing scope. Panics on the root scope;
    /// pops are always paired with pushes.
    pub fn into_outer(self) -> Scope {
        *self.outer.expect("popped the root scope")
    }

    /// Inserts a definition, shadowing any existing binding with the same
    /// name in this scope. Returns the shadowed definition, if any.
    pub fn insert(&mut self, name: impl Into<String>, definition: Definition) -> Option<Definition> {
        self.definitions.insert(name.into(), definition)
    }

    /// Returns the definition associated with `name`, searching this scope
    /// first and then walking the chain of enclosing scopes to the root.
    pub fn get(&self, name: &str) -> Option<&Definition> {
        match self.definitions.get(name) {
            Some(def) => Some(def),
            None => self.outer.as_ref()?.get(name),
        }
    }
}
