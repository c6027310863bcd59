//! Symbol Table (ST): a two-level scoped mapping from identifier name to
//! `(type, kind, index)`, with one dense, zero-based counter per kind.

use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Static,
    Field,
    Argument,
    Local,
    /// Sentinel result of a lookup miss. Never stored in the table.
    None,
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub type_name: String,
    pub kind: IdentifierKind,
    pub index: u16,
}

#[derive(Debug, Default)]
struct Scope {
    entries: HashMap<String, SymbolEntry>,
    counts: [u16; 4], // indexed by Static, Field, Argument, Local
}

fn slot(kind: IdentifierKind) -> usize {
    match kind {
        IdentifierKind::Static => 0,
        IdentifierKind::Field => 1,
        IdentifierKind::Argument => 2,
        IdentifierKind::Local => 3,
        IdentifierKind::None => unreachable!("None is never counted"),
    }
}

/// Two owned mappings (class scope, subroutine scope) plus their counters.
/// Subroutine scope is wholly replaced on every `start_subroutine` call;
/// this language has no nested block scoping.
#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: Scope,
    subroutine_scope: Scope,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the subroutine scope and resets its counters to 0.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope = Scope::default();
    }

    /// Defines `name` in the scope implied by `kind`, assigning the next
    /// dense index for that kind. `kind == None` is a caller error.
    pub fn define(&mut self, name: &str, type_name: &str, kind: IdentifierKind) {
        assert!(
            kind != IdentifierKind::None,
            "cannot define '{name}' with kind None"
        );
        let scope = match kind {
            IdentifierKind::Static | IdentifierKind::Field => &mut self.class_scope,
            IdentifierKind::Argument | IdentifierKind::Local => &mut self.subroutine_scope,
            IdentifierKind::None => unreachable!(),
        };
        let index = scope.counts[slot(kind)];
        scope.counts[slot(kind)] += 1;
        debug!(name, ?kind, index, "defined symbol");
        scope.entries.insert(
            name.to_string(),
            SymbolEntry {
                type_name: type_name.to_string(),
                kind,
                index,
            },
        );
    }

    /// Current count of variables of the given kind. `None` always counts 0.
    pub fn var_count(&self, kind: IdentifierKind) -> u16 {
        match kind {
            IdentifierKind::Static | IdentifierKind::Field => self.class_scope.counts[slot(kind)],
            IdentifierKind::Argument | IdentifierKind::Local => {
                self.subroutine_scope.counts[slot(kind)]
            }
            IdentifierKind::None => 0,
        }
    }

    fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.subroutine_scope
            .entries
            .get(name)
            .or_else(|| self.class_scope.entries.get(name))
    }

    /// Resolves with subroutine-then-class precedence; `None` if absent.
    pub fn kind_of(&self, name: &str) -> IdentifierKind {
        self.lookup(name).map(|e| e.kind).unwrap_or(IdentifierKind::None)
    }

    /// Only valid when `kind_of(name) != None`.
    pub fn type_of(&self, name: &str) -> &str {
        &self
            .lookup(name)
            .unwrap_or_else(|| panic!("type_of called on undefined symbol '{name}'"))
            .type_name
    }

    /// Only valid when `kind_of(name) != None`.
    pub fn index_of(&self, name: &str) -> u16 {
        self.lookup(name)
            .unwrap_or_else(|| panic!("index_of called on undefined symbol '{name}'"))
            .index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_scope_persists_across_subroutines() {
        let mut st = SymbolTable::new();
        st.define("x", "int", IdentifierKind::Field);
        st.define("y", "int", IdentifierKind::Field);
        st.start_subroutine();
        st.define("a", "int", IdentifierKind::Argument);
        assert_eq!(st.kind_of("x"), IdentifierKind::Field);
        assert_eq!(st.index_of("y"), 1);
        assert_eq!(st.var_count(IdentifierKind::Field), 2);
        assert_eq!(st.var_count(IdentifierKind::Argument), 1);

        st.start_subroutine();
        assert_eq!(st.kind_of("a"), IdentifierKind::None);
        assert_eq!(st.kind_of("x"), IdentifierKind::Field);
        assert_eq!(st.var_count(IdentifierKind::Argument), 0);
    }

    #[test]
    fn subroutine_scope_shadows_class_scope() {
        let mut st = SymbolTable::new();
        st.define("x", "int", IdentifierKind::Field);
        st.start_subroutine();
        st.define("x", "boolean", IdentifierKind::Local);
        assert_eq!(st.kind_of("x"), IdentifierKind::Local);
        assert_eq!(st.type_of("x"), "boolean");
    }

    #[test]
    fn indices_are_dense_per_kind() {
        let mut st = SymbolTable::new();
        st.start_subroutine();
        st.define("a", "int", IdentifierKind::Local);
        st.define("b", "int", IdentifierKind::Local);
        st.define("c", "int", IdentifierKind::Local);
        assert_eq!(st.index_of("a"), 0);
        assert_eq!(st.index_of("b"), 1);
        assert_eq!(st.index_of("c"), 2);
    }

    #[test]
    #[should_panic]
    fn define_with_none_kind_panics() {
        let mut st = SymbolTable::new();
        st.define("x", "int", IdentifierKind::None);
    }
}
