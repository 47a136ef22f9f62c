use crate::{
    lang::{
        ast::{Binding, Block, DeclSeq, Declaration, ImportDecl, LetBlock, Op, WordSeq},
        diagnostics::{CompileError, CompileFailure, Diagnostics},
    },
    runtime::data_structures::{
        function::FunctionRegistry,
        scope::{Scope, ScopePtr},
        symbol::{Symbol, SymbolTable},
    },
};
use std::rc::Rc;

/// Supplies the scopes of imported modules.  Each call returns a scope holding the module's own
/// declarations, already compiled.
pub trait ModuleImporter {
    fn import_module(
        &mut self,
        registry: &FunctionRegistry,
        diagnostics: &mut Diagnostics,
        module: &str,
        line: usize,
    ) -> Result<ScopePtr, CompileError>;

    /// The table aliased names are interned in.
    fn symbols(&self) -> &SymbolTable;
}

/// Two pass compiler over declaration sequences.
///
/// The first pass reserves a placeholder for every declared name so bodies can refer to words
/// declared later in the unit, or to themselves.  The second pass rewrites every call-by-name in
/// every body into a call of the resolved function.  Errors are counted rather than stopping at
/// the first, and a unit with any error leaves its scope exactly as it found it.
pub struct Compiler<'a> {
    registry: &'a FunctionRegistry,
    diagnostics: &'a mut Diagnostics,
    importer: Option<&'a mut dyn ModuleImporter>,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a FunctionRegistry, diagnostics: &'a mut Diagnostics) -> Compiler<'a> {
        Compiler {
            registry,
            diagnostics,
            importer: None,
        }
    }

    /// Allow the unit to import modules.  Without an importer every import fails.
    pub fn with_importer(mut self, importer: &'a mut dyn ModuleImporter) -> Compiler<'a> {
        self.importer = Some(importer);
        self
    }

    /// Compile a unit of declarations into `scope`.
    pub fn compile(&mut self, scope: &ScopePtr, decls: &mut DeclSeq) -> Result<(), CompileFailure> {
        let mut introduced = Vec::new();
        let errors = self.compile_unit(scope, decls, &mut introduced);

        if errors.is_empty() {
            return Ok(());
        }

        for symbol in introduced.iter().rev() {
            let _ = scope.delete(symbol);
        }

        Err(self.fail(errors))
    }

    /// Resolve a free standing word sequence against `scope`, as typed at the REPL.
    pub fn compile_words(&mut self, scope: &ScopePtr, words: &mut WordSeq) -> Result<(), CompileFailure> {
        let mut errors = Vec::new();

        self.resolve_words(scope, words, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(self.fail(errors))
        }
    }

    /// Compile a quoted block against the scope it was written in.  Only the first call does any
    /// work, later calls hand back the same body.
    pub fn compile_block(&mut self, block: &Block) -> Result<Rc<WordSeq>, CompileFailure> {
        if block.is_compiled() {
            return Ok(block.body());
        }

        let Some(scope) = block.environment() else {
            let errors = vec![CompileError::DetachedBlock { line: block.line() }];
            return Err(self.fail(errors));
        };

        log::debug!("Compiling block from line {}.", block.line());

        let mut body = (*block.body()).clone();
        let mut errors = Vec::new();

        self.resolve_words(&scope, &mut body, &mut errors);

        if !errors.is_empty() {
            return Err(self.fail(errors));
        }

        let body = Rc::new(body);

        block.finish(Rc::clone(&body));
        Ok(body)
    }

    fn fail(&mut self, errors: Vec<CompileError>) -> CompileFailure {
        for error in &errors {
            self.diagnostics.error(error);
        }

        CompileFailure::new(errors)
    }

    /// Both passes over one unit.  Every name bound in `scope` is added to `introduced` so the
    /// caller can take them back out.
    fn compile_unit(
        &mut self,
        scope: &ScopePtr,
        decls: &mut DeclSeq,
        introduced: &mut Vec<Symbol>,
    ) -> Vec<CompileError> {
        let mut errors = Vec::new();

        log::debug!("Pass 1 over {} declarations.", decls.len());

        for decl in decls.iter() {
            if let Declaration::Import(import) = decl {
                self.import(scope, import, introduced, &mut errors);
            }
        }

        for decl in decls.iter() {
            if let Declaration::Func(func) = decl {
                match scope.placehold(self.registry, &func.symbol, func.line, self.diagnostics) {
                    Ok(_) => introduced.push(func.symbol.clone()),
                    Err(error) => errors.push(error),
                }
            }
        }

        if !errors.is_empty() {
            log::debug!("Pass 1 failed with {} errors.", errors.len());
            return errors;
        }

        log::debug!("Pass 2 over {} declarations.", decls.len());

        for decl in decls.iter_mut() {
            let Declaration::Func(func) = decl else {
                continue;
            };

            let before = errors.len();

            self.resolve_words(scope, Rc::make_mut(&mut func.body), &mut errors);

            if errors.len() == before {
                scope.register_definition(
                    &func.symbol,
                    scope.vars_below(),
                    scope.vars_below(),
                    Rc::clone(&func.body),
                );
            }
        }

        errors
    }

    /// Fold the declarations of an imported module into `scope`.
    fn import(
        &mut self,
        scope: &ScopePtr,
        import: &ImportDecl,
        introduced: &mut Vec<Symbol>,
        errors: &mut Vec<CompileError>,
    ) {
        log::debug!("Importing module {} at line {}.", import.module, import.line);

        let result = match self.importer.as_mut() {
            Some(importer) => {
                importer.import_module(self.registry, self.diagnostics, &import.module, import.line)
            }
            None => Err(CompileError::ModuleNotFound {
                module: import.module.clone(),
                line: import.line,
            }),
        };

        let module_scope = match result {
            Ok(module_scope) => module_scope,
            Err(error) => {
                errors.push(error);
                return;
            }
        };

        let exported = module_scope.exported();

        let wanted: Vec<_> = match &import.names {
            None => exported,
            Some(names) => {
                let mut wanted = Vec::with_capacity(names.len());

                for name in names {
                    match exported.iter().find(|(symbol, _)| *symbol == name.symbol) {
                        Some(found) => wanted.push(found.clone()),
                        None => errors.push(CompileError::MissingImport {
                            name: name.symbol.to_string(),
                            module: import.module.clone(),
                            line: name.line,
                        }),
                    }
                }

                wanted
            }
        };

        let wanted: Vec<_> = match (&import.alias, self.importer.as_ref()) {
            (Some(alias), Some(importer)) => wanted
                .into_iter()
                .map(|(symbol, entry)| {
                    let qualified = format!("{}.{}", alias, symbol);
                    (importer.symbols().intern(&qualified), entry)
                })
                .collect(),
            _ => wanted,
        };

        for (symbol, entry) in wanted {
            if let Some(existing) = scope.lookup_local(&symbol)
                && Rc::ptr_eq(&existing.func, &entry.func)
            {
                continue;
            }

            match scope.import(&symbol, &entry.func, entry.line) {
                Ok(()) => introduced.push(symbol),
                Err(_) => errors.push(CompileError::ImportConflict {
                    name: symbol.to_string(),
                    module: import.module.clone(),
                    line: import.line,
                }),
            }
        }
    }

    /// Rewrite the call-by-name nodes of a sequence.  Quotes only record where they were
    /// written, their contents are compiled when they first run.
    fn resolve_words(&mut self, scope: &ScopePtr, words: &mut WordSeq, errors: &mut Vec<CompileError>) {
        for node in words.iter_mut() {
            let line = node.line;

            let resolved = match &mut node.op {
                Op::PushValue(_) | Op::Call(_) => None,

                Op::Word(symbol) => match scope.lookup(symbol) {
                    Some(entry) => Some(Op::Call(entry.func)),
                    None => {
                        errors.push(CompileError::UnknownWord {
                            name: symbol.to_string(),
                            line,
                        });
                        None
                    }
                },

                Op::Quote(block) => {
                    block.attach(scope);
                    None
                }

                Op::Bind(binding) => {
                    self.resolve_binding(scope, binding, errors);
                    None
                }

                Op::Let(let_block) => {
                    self.resolve_let(scope, let_block, errors);
                    None
                }
            };

            if let Some(op) = resolved {
                node.op = op;
            }
        }
    }

    fn resolve_binding(&mut self, scope: &ScopePtr, binding: &mut Binding, errors: &mut Vec<CompileError>) {
        let binding_scope = Scope::new_binding(scope, binding.names.len());

        binding.base = scope.vars_below();

        for (offset, name) in binding.names.iter().enumerate() {
            let bound = binding_scope.bind_variable(
                self.registry,
                &name.symbol,
                binding.base + offset,
                name.line,
                self.diagnostics,
            );

            if let Err(error) = bound {
                errors.push(error);
            }
        }

        self.resolve_words(&binding_scope, &mut binding.body, errors);
    }

    fn resolve_let(&mut self, scope: &ScopePtr, let_block: &mut LetBlock, errors: &mut Vec<CompileError>) {
        let let_scope = Scope::new_child(scope);
        let mut introduced = Vec::new();
        let nested = self.compile_unit(&let_scope, &mut let_block.decls, &mut introduced);

        if !nested.is_empty() {
            errors.extend(nested);
            return;
        }

        self.resolve_words(&let_scope, &mut let_block.body, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{diagnostics::Severity, parser::parse_unit},
        runtime::data_structures::{function::FunctionKind, symbol::SymbolTable},
    };

    struct Session {
        symbols: SymbolTable,
        registry: FunctionRegistry,
        diagnostics: Diagnostics,
        scope: ScopePtr,
    }

    impl Session {
        fn new() -> Session {
            Session {
                symbols: SymbolTable::new(),
                registry: FunctionRegistry::new(),
                diagnostics: Diagnostics::new(),
                scope: Scope::new_root(),
            }
        }

        fn compile(&mut self, source: &str) -> Result<(), CompileFailure> {
            let mut decls = parse_unit(&self.symbols, "<test>", source).unwrap();

            Compiler::new(&self.registry, &mut self.diagnostics).compile(&self.scope, &mut decls)
        }

        fn is_bound(&self, name: &str) -> bool {
            self.scope.find_func(&self.symbols, name).is_some()
        }
    }

    #[test]
    fn forward_references_resolve_to_the_final_definition() {
        let mut session = Session::new();

        session
            .compile("func first : second .\nfunc second : .")
            .unwrap();

        let first = session.scope.find_func(&session.symbols, "first").unwrap();
        let second = session.scope.find_func(&session.symbols, "second").unwrap();

        let kind = first.kind();
        let FunctionKind::Named(user) = &*kind else {
            panic!("first was not compiled");
        };
        let Op::Call(called) = &user.body.iter().next().unwrap().op else {
            panic!("call was not resolved");
        };

        assert!(Rc::ptr_eq(called, &second));
        assert!(matches!(*second.kind(), FunctionKind::Named(_)));
    }

    #[test]
    fn empty_unit_succeeds() {
        let mut session = Session::new();

        assert!(session.compile("").is_ok());
        assert!(session.scope.is_empty());
    }

    #[test]
    fn failed_unit_leaves_no_bindings() {
        let mut session = Session::new();
        let failure = session.compile("func ok : .\nfunc broken : missing .").unwrap_err();

        assert_eq!(
            failure.errors,
            vec![CompileError::UnknownWord {
                name: "missing".to_string(),
                line: 2
            }]
        );
        assert!(!session.is_bound("ok"));
        assert!(!session.is_bound("broken"));
    }

    #[test]
    fn every_error_in_a_pass_is_counted() {
        let mut session = Session::new();
        let failure = session.compile("func a : x .\nfunc b : y .").unwrap_err();

        assert_eq!(failure.errors.len(), 2);
        assert_eq!(session.diagnostics.errors().count(), 2);
    }

    #[test]
    fn quoted_words_are_not_resolved_until_run() {
        let mut session = Session::new();

        assert!(session.compile("func f : [ nothing ] .").is_ok());
    }

    #[test]
    fn bind_names_shadow_words_with_a_warning() {
        let mut session = Session::new();

        session
            .compile("func x : .\nfunc f : 1 -> x ; x .")
            .unwrap();

        let warnings: Vec<_> = session.diagnostics.warnings().collect();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Warning);
        assert_eq!(
            warnings[0].message,
            "declaration of variable ‘x’ at line 2 shadows previous definition at line 1"
        );
    }

    #[test]
    fn block_compilation_is_memoized() {
        let registry = FunctionRegistry::new();
        let mut diagnostics = Diagnostics::new();
        let scope = Scope::new_root();
        let block = Block::new(1, WordSeq::default());

        block.attach(&scope);

        let mut compiler = Compiler::new(&registry, &mut diagnostics);
        let first = compiler.compile_block(&block).unwrap();
        let second = compiler.compile_block(&block).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert!(block.environment().is_none());
    }

    #[test]
    fn detached_blocks_fail_to_compile() {
        let registry = FunctionRegistry::new();
        let mut diagnostics = Diagnostics::new();
        let block = Block::new(9, WordSeq::default());

        let failure = Compiler::new(&registry, &mut diagnostics)
            .compile_block(&block)
            .err().expect("expected an error");

        assert_eq!(failure.errors, vec![CompileError::DetachedBlock { line: 9 }]);
    }

    #[test]
    fn imports_without_an_importer_fail() {
        let mut session = Session::new();
        let failure = session.compile("import nowhere").unwrap_err();

        assert!(matches!(
            failure.errors[0],
            CompileError::ModuleNotFound { line: 1, .. }
        ));
    }
}
