use crate::value::SharedValue;
use std::collections::HashMap;
use std::iter;
use std::ops::{Deref, DerefMut};

/// Returned by `assign` when no visible scope binds the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Undefined;

type Bindings = HashMap<String, SharedValue>;

/// Stack of lexical scopes on top of the global scope, which lives as long as
/// the environment.
#[derive(Debug)]
pub struct Environment {
    globals: Bindings,
    scopes: Vec<Bindings>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            scopes: Vec::new(),
        }
    }

    /// Number of live scopes, the global one included.
    pub fn depth(&self) -> usize {
        self.scopes.len() + 1
    }

    fn innermost(&mut self) -> &mut Bindings {
        match self.scopes.last_mut() {
            Some(scope) => scope,
            None => &mut self.globals,
        }
    }

    fn visible(&self) -> impl Iterator<Item = &Bindings> {
        self.scopes.iter().rev().chain(iter::once(&self.globals))
    }

    /// Bind `name` in the innermost scope. Returns true when this replaced a
    /// binding of the same scope.
    pub fn declare(&mut self, name: &str, value: SharedValue) -> bool {
        self.innermost().insert(name.to_string(), value).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<SharedValue> {
        self.visible().find_map(|scope| scope.get(name)).cloned()
    }

    /// Rebind an existing name in the scope that holds it.
    pub fn assign(&mut self, name: &str, value: SharedValue) -> Result<(), Undefined> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .chain(iter::once(&mut self.globals))
            .find_map(|scope| scope.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Undefined),
        }
    }

    /// Enter a nested scope that is left again when the guard drops.
    pub fn scope(&mut self) -> Scope<'_> {
        self.scopes.push(HashMap::new());
        tracing::trace!(depth = self.depth(), "scope entered");
        Scope { env: self }
    }
}

/// Guard for a nested scope. Derefs to the environment so evaluation can
/// continue through it; dropping it discards every binding made inside.
pub struct Scope<'e> {
    env: &'e mut Environment,
}

impl Deref for Scope<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.env.scopes.pop();
        tracing::trace!(depth = self.env.depth(), "scope left");
    }
}
