use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    rc::Rc,
};

/// An interned name.  Two symbols are equal only if they are the same handle, which the
/// SymbolTable guarantees for every distinct name it has seen.  Comparing and hashing a symbol
/// never touches the characters of the name.
#[derive(Clone)]
pub struct Symbol {
    name: Rc<str>,
}

impl Symbol {
    /// The text of the name this symbol was interned from.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> usize {
        Rc::as_ptr(&self.name) as *const u8 as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Symbol({})", self.name)
    }
}

/// The session wide table of interned names.  Symbols are never removed individually, the whole
/// table is released at once when it is dropped.
#[derive(Default)]
pub struct SymbolTable {
    symbols: RefCell<HashMap<Rc<str>, Symbol>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Get the unique symbol for a name, creating it on first use.
    pub fn intern(&self, name: &str) -> Symbol {
        if let Some(found) = self.symbols.borrow().get(name) {
            return found.clone();
        }

        let name: Rc<str> = Rc::from(name);
        let symbol = Symbol { name: name.clone() };

        let _ = self.symbols.borrow_mut().insert(name, symbol.clone());
        symbol
    }

    /// Find the symbol for a name without creating one.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.symbols.borrow().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.symbols.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_name_gives_the_same_handle() {
        let table = SymbolTable::new();
        let first = table.intern("dup");
        let second = table.intern("dup");

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_names_give_distinct_handles() {
        let table = SymbolTable::new();

        assert_ne!(table.intern("dup"), table.intern("drop"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn lookup_does_not_create() {
        let table = SymbolTable::new();

        assert!(table.lookup("main").is_none());
        assert!(table.is_empty());

        let main = table.intern("main");
        assert_eq!(table.lookup("main"), Some(main));
    }

    #[test]
    fn symbols_from_different_tables_are_not_equal() {
        let first = SymbolTable::new();
        let second = SymbolTable::new();

        assert_ne!(first.intern("x"), second.intern("x"));
    }
}
