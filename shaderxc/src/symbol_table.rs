//! Scoped symbol table (spec §4.4): name-to-declaration resolution across
//! nested scopes, with overload-set accumulation for functions.
use std::collections::HashMap;

use crate::ast::DeclId;

#[derive(Debug, Clone)]
enum Binding {
    Single(DeclId),
    /// Functions (and intrinsics shadowed by user overloads) accumulate
    /// every declaration sharing a name within one scope.
    Overloads(Vec<DeclId>),
}

#[derive(Debug, Default, Clone)]
struct Scope {
    bindings: HashMap<String, Binding>,
    /// Type-alias and structure names visible in this scope, tracked
    /// separately so the parser's cast-disambiguation lookup
    /// (`is_type_name`) doesn't need to walk variable bindings too.
    type_names: std::collections::HashSet<String>,
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self { scopes: Vec::new() };
        table.open_scope();
        table
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn close_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "closed the global scope");
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declares a single-binding name (variable, buffer, sampler, structure,
    /// type alias, uniform buffer member) in the innermost scope.
    pub fn declare(&mut self, name: impl Into<String>, id: DeclId) {
        let scope = self.scopes.last_mut().expect("at least the global scope is always open");
        scope.bindings.insert(name.into(), Binding::Single(id));
    }

    /// Declares a function, adding to any existing overload set in the
    /// innermost scope (functions may be repeatedly overloaded; spec §4.5).
    pub fn declare_function(&mut self, name: impl Into<String>, id: DeclId) {
        let scope = self.scopes.last_mut().expect("at least the global scope is always open");
        match scope.bindings.entry(name.into()) {
            std::collections::hash_map::Entry::Occupied(mut e) => match e.get_mut() {
                Binding::Overloads(ids) => ids.push(id),
                Binding::Single(existing) => {
                    let existing = *existing;
                    e.insert(Binding::Overloads(vec![existing, id]));
                }
            },
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(Binding::Overloads(vec![id]));
            }
        }
    }

    pub fn declare_type_name(&mut self, name: impl Into<String>) {
        self.scopes.last_mut().expect("global scope always open").type_names.insert(name.into());
    }

    /// Looks up the nearest enclosing scope that declares `name`. For
    /// functions this returns the full overload set from that scope only —
    /// HLSL/GLSL do not merge overloads across scope boundaries.
    pub fn resolve(&self, name: &str) -> Option<Vec<DeclId>> {
        for scope in self.scopes.iter().rev() {
            match scope.bindings.get(name) {
                Some(Binding::Single(id)) => return Some(vec![*id]),
                Some(Binding::Overloads(ids)) => return Some(ids.clone()),
                None => continue,
            }
        }
        None
    }

    pub fn is_type_name(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.type_names.contains(name))
    }
}
