//! Macro definitions and token-string substitution (spec §4.1 "Macro model").
use std::collections::HashMap;

/// A macro is `(identifier, parameter-list-or-none, varargs-flag, body)`.
/// `params: None` marks an object-like macro, distinct from `Some(vec![])`
/// (a function-like macro with an empty parameter list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDef {
    pub name: String,
    pub params: Option<Vec<String>>,
    pub is_variadic: bool,
    /// Body as a flat token-string: each element is one preprocessing token's
    /// spelling, in order, already split on whitespace/punctuation boundaries.
    pub body: Vec<String>,
    pub is_standard: bool,
}

impl MacroDef {
    pub fn object_like(name: impl Into<String>, body: Vec<String>) -> Self {
        Self { name: name.into(), params: None, is_variadic: false, body, is_standard: false }
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    /// Redefinition is permitted only if token-by-token identical including
    /// parameter lists (spec §4.1).
    pub fn identical_to(&self, other: &MacroDef) -> bool {
        self.params == other.params && self.is_variadic == other.is_variadic && self.body == other.body
    }
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, MacroDef>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard_macros(target_version_macro: &str) -> Self {
        let mut table = Self::new();
        table.define_standard("__FILE__", vec!["\"<source>\"".to_string()]);
        table.define_standard("__LINE__", vec!["0".to_string()]);
        table.define_standard(target_version_macro, vec!["1".to_string()]);
        table
    }

    fn define_standard(&mut self, name: &str, body: Vec<String>) {
        let mut def = MacroDef::object_like(name, body);
        def.is_standard = true;
        self.macros.insert(name.to_string(), def);
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn is_standard(&self, name: &str) -> bool {
        self.macros.get(name).map(|m| m.is_standard).unwrap_or(false)
    }

    /// All currently-defined macro names, non-standard ones first, used for
    /// the reflection data's "macros" list.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.macros.keys().cloned().collect();
        names.sort();
        names
    }

    /// Define or redefine a macro. Returns `Err(existing)` when the name is
    /// standard (never redefinable) or the new definition mismatches a
    /// previous non-identical one.
    pub fn define(&mut self, def: MacroDef) -> Result<(), String> {
        if let Some(existing) = self.macros.get(&def.name) {
            if existing.is_standard {
                return Err(format!("'{}' is a standard macro and cannot be redefined", def.name));
            }
            if !existing.identical_to(&def) {
                return Err(format!("'{}' macro redefinition is not identical to a previous definition", def.name));
            }
        }
        self.macros.insert(def.name.clone(), def);
        Ok(())
    }

    /// `#undef`. Returns `true` if a macro was actually removed (the caller
    /// is expected to warn, not error, when it was not defined, per spec).
    pub fn undef(&mut self, name: &str) -> Result<bool, String> {
        if self.is_standard(name) {
            return Err(format!("'{}' is a standard macro and cannot be undefined", name));
        }
        Ok(self.macros.remove(name).is_some())
    }
}
