use gc::{Finalize, Trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An interned name. Two symbols are equal iff they come from the same
/// table entry, so comparison and hashing look at identity only.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0.as_ptr() as usize).hash(state)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Finalize for Symbol {}
unsafe impl Trace for Symbol {
    unsafe_empty_trace!();
}

/// Append-only interning table. Cloning yields another handle to the same
/// table; it is created once per runtime and handed to the reader and
/// the evaluator.
#[derive(Clone, Default)]
pub struct SymbolTable(Rc<RefCell<HashMap<String, Symbol>>>);

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Names are folded to lowercase, so `Foo` and `foo` are one symbol
    pub fn intern(&self, name: &str) -> Symbol {
        let folded = name.to_lowercase();
        let mut table = self.0.borrow_mut();

        if let Some(symbol) = table.get(&folded) {
            return symbol.clone();
        }

        let symbol = Symbol(Rc::from(&folded[..]));
        table.insert(folded, symbol.clone());
        symbol
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SymbolTable({} symbols)", self.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_name_same_symbol() {
        let table = SymbolTable::new();
        let a = table.intern("lambda");
        let b = table.intern("lambda");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn names_are_case_folded() {
        let table = SymbolTable::new();
        assert_eq!(table.intern("Foo"), table.intern("foo"));
        assert_eq!(table.intern("FOO").as_str(), "foo");
    }

    #[test]
    fn different_names_differ() {
        let table = SymbolTable::new();
        assert_ne!(table.intern("car"), table.intern("cdr"));
    }

    #[test]
    fn handles_share_the_table() {
        let table = SymbolTable::new();
        let handle = table.clone();
        assert_eq!(table.intern("x"), handle.intern("x"));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn separate_tables_do_not_alias() {
        let a = SymbolTable::new().intern("x");
        let b = SymbolTable::new().intern("x");
        assert_ne!(a, b);
    }
}
