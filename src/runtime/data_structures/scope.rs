use crate::{
    lang::{
        ast::WordSeq,
        diagnostics::{CompileError, Diagnostics},
    },
    runtime::data_structures::{
        function::{FunctionKind, FunctionRef, FunctionRegistry, UserFunction},
        symbol::{Symbol, SymbolTable},
    },
};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// One name binding within a scope.
#[derive(Clone)]
pub struct ScopeEntry {
    pub func: FunctionRef,

    /// The line the name was declared on, None for words the host registered.
    pub line: Option<usize>,

    /// The binding was folded in from another module.
    pub imported: bool,
}

pub type ScopePtr = Rc<Scope>;

/// A table of name bindings chained to the scope it is nested in.  Lookups walk outwards to
/// the root, which holds the primitives.
pub struct Scope {
    parent: Option<ScopePtr>,
    entries: RefCell<HashMap<Symbol, ScopeEntry>>,
    vars_below: usize,
}

impl Scope {
    /// The outermost scope of a session.
    pub fn new_root() -> ScopePtr {
        Rc::new(Scope {
            parent: None,
            entries: RefCell::new(HashMap::new()),
            vars_below: 0,
        })
    }

    /// A nested scope that sees the same variable slots as its parent.
    pub fn new_child(parent: &ScopePtr) -> ScopePtr {
        Rc::new(Scope {
            parent: Some(Rc::clone(parent)),
            entries: RefCell::new(HashMap::new()),
            vars_below: parent.vars_below,
        })
    }

    /// The scope of a bind construct introducing `count` new variable slots.
    pub fn new_binding(parent: &ScopePtr, count: usize) -> ScopePtr {
        Rc::new(Scope {
            parent: Some(Rc::clone(parent)),
            entries: RefCell::new(HashMap::new()),
            vars_below: parent.vars_below + count,
        })
    }

    pub fn parent(&self) -> Option<&ScopePtr> {
        self.parent.as_ref()
    }

    /// How many variable slots code compiled in this scope can see.
    pub fn vars_below(&self) -> usize {
        self.vars_below
    }

    /// Find the nearest binding of a name, searching outwards.
    pub fn lookup(&self, symbol: &Symbol) -> Option<ScopeEntry> {
        if let Some(entry) = self.entries.borrow().get(symbol) {
            return Some(entry.clone());
        }

        self.parent.as_ref()?.lookup(symbol)
    }

    /// Find a binding made directly in this scope.
    pub fn lookup_local(&self, symbol: &Symbol) -> Option<ScopeEntry> {
        self.entries.borrow().get(symbol).cloned()
    }

    /// Convenience lookup by name, used by hosts looking for an entry point such as `main`.  A
    /// name that was never interned can't be bound anywhere.
    pub fn find_func(&self, symbols: &SymbolTable, name: &str) -> Option<FunctionRef> {
        let symbol = symbols.lookup(name)?;

        self.lookup(&symbol).map(|entry| entry.func)
    }

    /// Reserve a name for a declaration before any body is compiled, so later bodies and the
    /// declaration's own body can refer to it.  Shadowing an outer binding is allowed with a
    /// warning, declaring a name twice in one scope is not.
    pub fn placehold(
        &self,
        registry: &FunctionRegistry,
        symbol: &Symbol,
        line: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<FunctionRef, CompileError> {
        if let Some(existing) = self.lookup_local(symbol) {
            return Err(match existing.line {
                Some(previous) if existing.func.is_user_function() => {
                    CompileError::DuplicateDefinition {
                        name: symbol.to_string(),
                        line,
                        previous,
                    }
                }
                _ => CompileError::RedefinedBuiltin {
                    name: symbol.to_string(),
                    line,
                },
            });
        }

        self.warn_shadowing("word", symbol, line, diagnostics);

        let func = registry.register(Some(symbol.clone()), FunctionKind::Placeholder);

        self.insert(symbol, &func, Some(line), false);
        Ok(func)
    }

    /// Complete a placeholder made by `placehold` in this scope.
    ///
    /// Panics if the name is not bound here or is bound to something other than a placeholder.
    pub fn register_definition(
        &self,
        symbol: &Symbol,
        free_var_index: usize,
        captured_count: usize,
        body: Rc<WordSeq>,
    ) {
        let mut entries = self.entries.borrow_mut();
        let entry = entries
            .get_mut(symbol)
            .unwrap_or_else(|| panic!("no placeholder for ‘{}’ in this scope", symbol));

        assert!(
            entry.func.is_placeholder(),
            "‘{}’ is already defined",
            symbol
        );

        entry.func.define(FunctionKind::Named(UserFunction {
            body,
            free_var_index,
            captured_count,
        }));
        entry.imported = false;
    }

    /// Bind a name to variable slot `slot`.
    pub fn bind_variable(
        &self,
        registry: &FunctionRegistry,
        symbol: &Symbol,
        slot: usize,
        line: usize,
        diagnostics: &mut Diagnostics,
    ) -> Result<FunctionRef, CompileError> {
        if self.lookup_local(symbol).is_some() {
            return Err(CompileError::DuplicateVariable {
                name: symbol.to_string(),
                line,
            });
        }

        self.warn_shadowing("variable", symbol, line, diagnostics);

        let func = registry.register(Some(symbol.clone()), FunctionKind::Variable(slot));

        self.insert(symbol, &func, Some(line), false);
        Ok(func)
    }

    /// Bind a host provided function, such as a primitive.
    pub fn register(&self, symbol: &Symbol, func: &FunctionRef) -> Result<(), CompileError> {
        self.insert_new(symbol, func, None, false)
    }

    /// Bind a function folded in from another module, keeping the line it was declared on.
    pub fn import(
        &self,
        symbol: &Symbol,
        func: &FunctionRef,
        line: Option<usize>,
    ) -> Result<(), CompileError> {
        self.insert_new(symbol, func, line, true)
    }

    /// Remove a binding from this scope.  The function itself stays owned by the registry.
    pub fn delete(&self, symbol: &Symbol) -> Option<ScopeEntry> {
        self.entries.borrow_mut().remove(symbol)
    }

    /// The bindings this scope declared itself, the ones an importer may take.
    pub fn exported(&self) -> Vec<(Symbol, ScopeEntry)> {
        let mut exported: Vec<(Symbol, ScopeEntry)> = self
            .entries
            .borrow()
            .iter()
            .filter(|(_, entry)| !entry.imported)
            .map(|(symbol, entry)| (symbol.clone(), entry.clone()))
            .collect();

        exported.sort_by(|a, b| a.0.name().cmp(b.0.name()));
        exported
    }

    /// Put back an entry taken out by `delete`, replacing whatever the name is bound to now.
    pub fn restore(&self, symbol: &Symbol, entry: ScopeEntry) {
        let _ = self.entries.borrow_mut().insert(symbol.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn insert_new(
        &self,
        symbol: &Symbol,
        func: &FunctionRef,
        line: Option<usize>,
        imported: bool,
    ) -> Result<(), CompileError> {
        if self.lookup_local(symbol).is_some() {
            return Err(CompileError::AlreadyDefined {
                name: symbol.to_string(),
            });
        }

        self.insert(symbol, func, line, imported);
        Ok(())
    }

    fn insert(&self, symbol: &Symbol, func: &FunctionRef, line: Option<usize>, imported: bool) {
        let entry = ScopeEntry {
            func: Rc::clone(func),
            line,
            imported,
        };

        let _ = self.entries.borrow_mut().insert(symbol.clone(), entry);
    }

    fn warn_shadowing(
        &self,
        what: &str,
        symbol: &Symbol,
        line: usize,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(outer) = self.parent.as_ref().and_then(|parent| parent.lookup(symbol)) else {
            return;
        };

        let message = match outer.line {
            Some(previous) => format!(
                "declaration of {} ‘{}’ at line {} shadows previous definition at line {}",
                what, symbol, line, previous
            ),
            None => format!(
                "declaration of {} ‘{}’ at line {} shadows built-in word",
                what, symbol, line
            ),
        };

        diagnostics.warn(Some(line), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::diagnostics::Severity;

    struct Fixture {
        symbols: SymbolTable,
        registry: FunctionRegistry,
        diagnostics: Diagnostics,
    }

    impl Fixture {
        fn new() -> Fixture {
            Fixture {
                symbols: SymbolTable::new(),
                registry: FunctionRegistry::new(),
                diagnostics: Diagnostics::new(),
            }
        }

        fn builtin(&self, scope: &ScopePtr, name: &str) {
            let func = self.registry.register(
                Some(self.symbols.intern(name)),
                FunctionKind::Variable(0),
            );

            scope.register(&self.symbols.intern(name), &func).unwrap();
        }
    }

    #[test]
    fn lookup_walks_to_the_root() {
        let mut fixture = Fixture::new();
        let root = Scope::new_root();
        let child = Scope::new_child(&root);
        let name = fixture.symbols.intern("f");

        root.placehold(&fixture.registry, &name, 1, &mut fixture.diagnostics)
            .unwrap();

        assert!(child.lookup(&name).is_some());
        assert!(child.lookup_local(&name).is_none());
    }

    #[test]
    fn duplicate_placeholder_names_both_lines() {
        let mut fixture = Fixture::new();
        let scope = Scope::new_root();
        let name = fixture.symbols.intern("f");

        scope
            .placehold(&fixture.registry, &name, 1, &mut fixture.diagnostics)
            .unwrap();

        let error = scope
            .placehold(&fixture.registry, &name, 2, &mut fixture.diagnostics)
            .err();

        assert_eq!(
            error,
            Some(CompileError::DuplicateDefinition {
                name: "f".to_string(),
                line: 2,
                previous: 1
            })
        );
    }

    #[test]
    fn redefining_a_builtin_in_its_own_scope_fails_without_warning() {
        let mut fixture = Fixture::new();
        let scope = Scope::new_root();

        fixture.builtin(&scope, "dup");

        let name = fixture.symbols.intern("dup");
        let error = scope
            .placehold(&fixture.registry, &name, 3, &mut fixture.diagnostics)
            .err();

        assert!(matches!(error, Some(CompileError::RedefinedBuiltin { line: 3, .. })));
        assert!(fixture.diagnostics.is_empty());
    }

    #[test]
    fn shadowing_a_builtin_warns() {
        let mut fixture = Fixture::new();
        let root = Scope::new_root();
        let child = Scope::new_child(&root);

        fixture.builtin(&root, "dup");

        let name = fixture.symbols.intern("dup");
        child
            .placehold(&fixture.registry, &name, 4, &mut fixture.diagnostics)
            .unwrap();

        let warning = fixture.diagnostics.iter().next().unwrap();

        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(
            warning.message,
            "declaration of word ‘dup’ at line 4 shadows built-in word"
        );
    }

    #[test]
    fn duplicate_variables_in_one_bind_fail() {
        let mut fixture = Fixture::new();
        let root = Scope::new_root();
        let binding = Scope::new_binding(&root, 2);
        let name = fixture.symbols.intern("x");

        binding
            .bind_variable(&fixture.registry, &name, 0, 5, &mut fixture.diagnostics)
            .unwrap();

        let error = binding
            .bind_variable(&fixture.registry, &name, 1, 5, &mut fixture.diagnostics)
            .err();

        assert!(matches!(error, Some(CompileError::DuplicateVariable { line: 5, .. })));
        assert_eq!(binding.vars_below(), 2);
    }

    #[test]
    fn register_definition_completes_the_placeholder() {
        let mut fixture = Fixture::new();
        let scope = Scope::new_root();
        let name = fixture.symbols.intern("f");
        let func = scope
            .placehold(&fixture.registry, &name, 1, &mut fixture.diagnostics)
            .unwrap();

        scope.register_definition(&name, 0, 0, Rc::new(WordSeq::default()));

        assert!(matches!(*func.kind(), FunctionKind::Named(_)));
    }

    #[test]
    #[should_panic]
    fn register_definition_without_placeholder_panics() {
        let fixture = Fixture::new();
        let scope = Scope::new_root();

        scope.register_definition(
            &fixture.symbols.intern("nothing"),
            0,
            0,
            Rc::new(WordSeq::default()),
        );
    }

    #[test]
    fn exported_skips_imported_entries() {
        let mut fixture = Fixture::new();
        let scope = Scope::new_root();
        let own = fixture.symbols.intern("own");
        let other = fixture.symbols.intern("other");

        let func = scope
            .placehold(&fixture.registry, &own, 1, &mut fixture.diagnostics)
            .unwrap();
        scope.import(&other, &func, Some(7)).unwrap();

        let exported: Vec<String> = scope
            .exported()
            .iter()
            .map(|(symbol, _)| symbol.to_string())
            .collect();

        assert_eq!(exported, vec!["own".to_string()]);
        assert!(scope.import(&other, &func, None).is_err());
    }

    #[test]
    fn find_func_does_not_intern() {
        let fixture = Fixture::new();
        let scope = Scope::new_root();

        assert!(scope.find_func(&fixture.symbols, "main").is_none());
        assert!(fixture.symbols.is_empty());
    }

    #[test]
    fn restore_puts_a_deleted_entry_back() {
        let mut fixture = Fixture::new();
        let scope = Scope::new_root();
        let name = fixture.symbols.intern("f");

        let original = scope
            .placehold(&fixture.registry, &name, 3, &mut fixture.diagnostics)
            .unwrap();
        let entry = scope.delete(&name).unwrap();

        scope
            .placehold(&fixture.registry, &name, 9, &mut fixture.diagnostics)
            .unwrap();
        scope.restore(&name, entry);

        let restored = scope.lookup_local(&name).unwrap();

        assert!(Rc::ptr_eq(&restored.func, &original));
        assert_eq!(restored.line, Some(3));
    }
}
