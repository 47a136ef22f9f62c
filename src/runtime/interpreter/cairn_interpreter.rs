use std::{ fs::read_to_string,
           io::{ stdout, Write },
           path::Path,
           rc::Rc };
use crate::{ config::{ Config,
                       BUNDLED_STD },
             error::{ Error,
                      Result as CairnResult },
             lang::{ ast::{ Block,
                            DeclSeq,
                            Declaration,
                            Node,
                            Op,
                            WordSeq },
                     compilation::Compiler,
                     diagnostics::Diagnostics,
                     import::{ ModuleCache,
                               ModuleLoader,
                               ModuleResolver },
                     parser::{ parse_unit,
                               parse_words } },
             runtime::{ built_ins::register_built_ins,
                        data_structures::{ function::{ Closure,
                                                       Function,
                                                       FunctionKind,
                                                       FunctionRef,
                                                       FunctionRegistry,
                                                       Primitive },
                                           scope::{ Scope,
                                                    ScopeEntry,
                                                    ScopePtr },
                                           symbol::{ Symbol,
                                                     SymbolTable },
                                           value::{ BoundBlock,
                                                    Value },
                                           var_buffer::VarBuffer },
                        error::{ self,
                                 script_error,
                                 script_error_str },
                        interpreter::{ CallItem,
                                       CallStack,
                                       CodeManagement,
                                       Interpreter,
                                       InterpreterStack,
                                       ValueStack,
                                       WordHandler,
                                       WordManagement },
                        stack::ensure_sufficient_stack } };



/// What a call resolves to, taken out of the function's payload before anything runs so the
/// payload isn't borrowed while the body executes.
enum Dispatch
{
    Native(Rc<WordHandler>),
    Body(Rc<WordSeq>, Option<Rc<VarBuffer>>),
    Variable(usize),
    Undefined
}



/// The interpreter session for the cairn language.  Owns the symbol table, the function
/// registry and the chain of scopes code is compiled into:
///
/// * the library scope holds the primitives,
/// * the prelude scope holds the standard library,
/// * the top level scope holds user declarations.
pub struct CairnInterpreter
{
    /// The operand stack.
    stack: ValueStack,


    /// The last source line evaluation has reached.
    current_line: Option<usize>,

    /// The words currently executing.
    call_stack: CallStack,

    max_call_depth: usize,


    library: ScopePtr,
    prelude: ScopePtr,
    scope: ScopePtr,


    config: Config,
    resolver: ModuleResolver,
    modules: ModuleCache,

    diagnostics: Diagnostics,

    /// Where `print` and `.s` write to.
    output: Box<dyn Write>,


    /// Owns every compiled function.  Tears them all down when the session ends.
    registry: FunctionRegistry,

    symbols: SymbolTable
}


impl Interpreter for CairnInterpreter
{
    fn top_level_scope(&self) -> &ScopePtr
    {
        &self.scope
    }

    fn diagnostics(&self) -> &Diagnostics
    {
        &self.diagnostics
    }

    fn diagnostics_mut(&mut self) -> &mut Diagnostics
    {
        &mut self.diagnostics
    }

    fn write_output(&mut self, text: &str) -> error::Result<()>
    {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;

        Ok(())
    }
}


impl InterpreterStack for CairnInterpreter
{
    fn stack(&self) -> &ValueStack
    {
        &self.stack
    }

    fn clear_stack(&mut self)
    {
        self.stack.clear();
    }

    fn push(&mut self, value: Value)
    {
        self.stack.push(value);
    }

    fn pop(&mut self) -> error::Result<Value>
    {
        match self.stack.pop()
        {
            Some(value) => Ok(value),
            None => script_error_str(self, "stack underflow")
        }
    }

    fn pop_as_int(&mut self) -> error::Result<i64>
    {
        let value = self.pop()?;

        if !value.is_numeric()
        {
            return script_error(self, format!("expected a number but found {}", value.type_name()));
        }

        Ok(value.get_int_val())
    }

    fn pop_as_usize(&mut self) -> error::Result<usize>
    {
        let value = self.pop_as_int()?;

        if value < 0
        {
            return script_error(self, format!("expected a count but found {}", value));
        }

        Ok(value as usize)
    }

    fn pop_as_bool(&mut self) -> error::Result<bool>
    {
        Ok(self.pop()?.get_bool_val())
    }

    fn peek(&self, index: usize) -> error::Result<Value>
    {
        if index >= self.stack.len()
        {
            return script_error_str(self, "stack underflow");
        }

        Ok(self.stack[self.stack.len() - 1 - index].clone())
    }

    fn pick(&mut self, index: usize) -> error::Result<Value>
    {
        if index >= self.stack.len()
        {
            return script_error_str(self, "stack underflow");
        }

        let position = self.stack.len() - 1 - index;

        Ok(self.stack.remove(position))
    }
}


impl CodeManagement for CairnInterpreter
{
    fn process_source(&mut self, path: &str, source: &str) -> CairnResult<()>
    {
        let scope = Rc::clone(&self.scope);

        self.compile_into(&scope, path, source)
    }

    fn redefine_source(&mut self, path: &str, source: &str) -> CairnResult<()>
    {
        let mut decls = parse_unit(&self.symbols, path, source)?;
        let scope = Rc::clone(&self.scope);

        let replaced: Vec<( Symbol, ScopeEntry )> =
            decls.iter()
                 .filter_map(|decl| match decl
                     {
                         Declaration::Func(func) => Some(func.symbol.clone()),
                         Declaration::Import(_) => None
                     })
                 .filter_map(|symbol| scope.delete(&symbol).map(|entry| ( symbol, entry )))
                 .collect();

        for ( symbol, _ ) in &replaced
        {
            log::debug!("Replacing the definition of {}.", symbol);
        }

        let result = self.compile_decls(&scope, &mut decls);

        if result.is_err()
        {
            for ( symbol, entry ) in replaced
            {
                scope.restore(&symbol, entry);
            }
        }

        result
    }

    fn process_source_file(&mut self, path: &Path) -> CairnResult<()>
    {
        let source = read_to_string(path).map_err(|error| Error::Io { path: path.to_path_buf(),
                                                                       source: error })?;

        self.process_source(&path.display().to_string(), &source)
    }

    fn evaluate_source(&mut self, path: &str, source: &str) -> CairnResult<()>
    {
        let mut words = parse_words(&self.symbols, path, source)?;
        let scope = Rc::clone(&self.scope);

        Compiler::new(&self.registry, &mut self.diagnostics).compile_words(&scope, &mut words)?;

        self.call_stack.clear();
        self.eval_sequence(&words, None)?;

        Ok(())
    }

    fn apply(&mut self, value: Value) -> error::Result<()>
    {
        let ( block, buffer ) = match value
            {
                Value::Block(block) => ( block, None ),
                Value::BoundBlock(bound) => ( Rc::clone(bound.block()), Some(Rc::clone(bound.buffer())) ),
                other => return script_error(self, format!("cannot apply a {}", other.type_name()))
            };

        let body = self.compile_block(&block)?;
        let closure = Function::new(None, FunctionKind::Closure(Closure { body, buffer }));

        self.call_function(&closure, Some(block.line()), None)
    }

    fn run_main(&mut self) -> CairnResult<()>
    {
        self.stack.clear();
        self.call_stack.clear();

        let Some(main) = self.scope.find_func(&self.symbols, "main")
        else
        {
            return Err(Error::MissingMain);
        };

        log::debug!("Running main.");

        self.call_function(&main, None, None)?;
        Ok(())
    }
}


impl WordManagement for CairnInterpreter
{
    fn current_line(&self) -> Option<usize>
    {
        self.current_line
    }

    fn add_word(&mut self,
                name: &str,
                handler: Rc<WordHandler>,
                description: String,
                signature: String)
    {
        let symbol = self.symbols.intern(name);
        let kind = FunctionKind::Primitive(Primitive { handler, description, signature });
        let function = self.registry.register(Some(symbol.clone()), kind);

        if self.library.delete(&symbol).is_some()
        {
            log::warn!("Primitive {} was registered more than once.", name);
        }

        if let Err(error) = self.library.register(&symbol, &function)
        {
            log::error!("Could not register primitive {}: {}", name, error);
        }
    }

    fn find_word(&self, name: &str) -> Option<FunctionRef>
    {
        self.scope.find_func(&self.symbols, name)
    }

    fn call_stack(&self) -> &CallStack
    {
        &self.call_stack
    }

    fn call_stack_push(&mut self, name: String, line: Option<usize>) -> error::Result<()>
    {
        if self.call_stack.len() >= self.max_call_depth
        {
            return script_error(self, format!("maximum call depth of {} exceeded calling {}",
                                              self.max_call_depth,
                                              name));
        }

        self.call_stack.push(CallItem::new(name, line));
        Ok(())
    }
}


impl CairnInterpreter
{
    /// Create a bare session, with no primitives and no standard library.
    pub fn new(config: Config) -> CairnInterpreter
    {
        let library = Scope::new_root();
        let prelude = Scope::new_child(&library);
        let scope = Scope::new_child(&prelude);

        CairnInterpreter
            {
                stack: Vec::with_capacity(20),

                current_line: None,
                call_stack: CallStack::with_capacity(40),
                max_call_depth: config.max_call_depth,

                library,
                prelude,
                scope,

                resolver: ModuleResolver::new(&config.search_path, &config.extension),
                modules: ModuleCache::new(),
                config,

                diagnostics: Diagnostics::new(),

                output: Box::new(stdout()),

                registry: FunctionRegistry::new(),
                symbols: SymbolTable::new()
            }
    }

    /// Create a session with the primitives registered and, if the configuration asks for it,
    /// the standard library compiled.
    pub fn with_library(config: Config) -> CairnResult<CairnInterpreter>
    {
        let mut interpreter = CairnInterpreter::new(config);

        register_built_ins(&mut interpreter);

        if interpreter.config.load_std
        {
            interpreter.load_std()?;
        }

        Ok(interpreter)
    }

    /// Send program output somewhere other than stdout.
    pub fn with_output(mut self, output: Box<dyn Write>) -> CairnInterpreter
    {
        self.output = output;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry
    {
        &self.registry
    }

    /// Compile the standard library into the prelude scope.  The file on the search path wins
    /// over the bundled copy.
    pub fn load_std(&mut self) -> CairnResult<()>
    {
        let prelude = Rc::clone(&self.prelude);

        match self.resolver.find_file(&self.config.std_library)
        {
            Some(path) =>
                {
                    log::debug!("Loading the standard library from {}.", path.display());

                    let source = read_to_string(&path).map_err(|error| Error::Io { path: path.clone(),
                                                                                     source: error })?;

                    self.compile_into(&prelude, &path.display().to_string(), &source)
                },

            None =>
                {
                    log::debug!("Loading the bundled standard library.");
                    self.compile_into(&prelude, "<std>", BUNDLED_STD)
                }
        }
    }

    fn compile_into(&mut self, scope: &ScopePtr, path: &str, source: &str) -> CairnResult<()>
    {
        let mut decls = parse_unit(&self.symbols, path, source)?;

        self.compile_decls(scope, &mut decls)
    }

    fn compile_decls(&mut self, scope: &ScopePtr, decls: &mut DeclSeq) -> CairnResult<()>
    {
        let mut loader = ModuleLoader::new(&self.symbols,
                                           &self.resolver,
                                           &mut self.modules,
                                           &self.prelude);

        Compiler::new(&self.registry, &mut self.diagnostics).with_importer(&mut loader)
                                                              .compile(scope, decls)?;

        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> error::Result<Rc<WordSeq>>
    {
        let result = Compiler::new(&self.registry, &mut self.diagnostics).compile_block(block);

        match result
        {
            Ok(body) => Ok(body),
            Err(failure) => script_error(self, failure.report())
        }
    }

    fn call_function(&mut self,
                     function: &FunctionRef,
                     line: Option<usize>,
                     buffer: Option<&Rc<VarBuffer>>) -> error::Result<()>
    {
        let captured = function.captured_count();

        let dispatch = match &*function.kind()
            {
                FunctionKind::Primitive(primitive) => Dispatch::Native(Rc::clone(&primitive.handler)),

                FunctionKind::Named(user) =>
                    {
                        let window = match buffer
                            {
                                Some(buffer) if captured > 0 => VarBuffer::window(buffer, captured),
                                _ => None
                            };

                        Dispatch::Body(Rc::clone(&user.body), window)
                    },

                FunctionKind::Closure(closure) => Dispatch::Body(Rc::clone(&closure.body),
                                                                 closure.buffer.clone()),

                FunctionKind::Variable(slot) => Dispatch::Variable(*slot),

                FunctionKind::Placeholder => Dispatch::Undefined
            };

        match dispatch
        {
            Dispatch::Variable(slot) =>
                {
                    match buffer.and_then(|buffer| buffer.get(slot))
                    {
                        Some(value) =>
                            {
                                self.push(value.clone());
                                Ok(())
                            },

                        None => script_error(self, format!("variable {} is not bound here",
                                                           function.display_name()))
                    }
                },

            Dispatch::Undefined => script_error(self, format!("word ‘{}’ has no definition",
                                                              function.display_name())),

            Dispatch::Native(handler) =>
                {
                    log::trace!("Calling primitive {}.", function.display_name());
                    self.enter(function, line, |interpreter| (*handler)(interpreter))
                },

            Dispatch::Body(body, window) =>
                {
                    log::trace!("Calling {}.", function.display_name());
                    self.enter(function, line, |interpreter| interpreter.eval_sequence(&body,
                                                                                       window.as_ref()))
                }
        }
    }

    /// Run `body` with `function` on the call stack.  The entry is popped whether or not the body
    /// succeeds, errors have already captured the stack they were raised with.  The host stack is
    /// grown as needed so only the call depth limit can stop a deep recursion.
    fn enter<F>(&mut self, function: &FunctionRef, line: Option<usize>, body: F) -> error::Result<()>
        where
            F: FnOnce(&mut CairnInterpreter) -> error::Result<()>
    {
        self.call_stack_push(function.display_name(), line)?;

        let result = ensure_sufficient_stack(|| body(&mut *self));

        let _ = self.call_stack.pop();
        result
    }

    fn eval_sequence(&mut self, words: &WordSeq, buffer: Option<&Rc<VarBuffer>>) -> error::Result<()>
    {
        for node in words.iter()
        {
            self.eval_node(node, buffer)?;
        }

        Ok(())
    }

    fn eval_node(&mut self, node: &Node, buffer: Option<&Rc<VarBuffer>>) -> error::Result<()>
    {
        self.current_line = Some(node.line);

        match &node.op
        {
            Op::PushValue(value) => self.push(value.clone()),

            Op::Word(symbol) =>
                {
                    return script_error(self, format!("word ‘{}’ was never resolved", symbol));
                },

            Op::Call(function) => return self.call_function(function, Some(node.line), buffer),

            Op::Quote(block) =>
                {
                    let captured = block.captured_count();

                    let window = match buffer
                        {
                            Some(buffer) if captured > 0 => VarBuffer::window(buffer, captured),
                            _ => None
                        };

                    let value = match window
                        {
                            Some(window) => Value::BoundBlock(Rc::new(BoundBlock::new(Rc::clone(block),
                                                                                     window))),
                            None => Value::Block(Rc::clone(block))
                        };

                    self.push(value);
                },

            Op::Bind(binding) =>
                {
                    let count = binding.names.len();

                    if self.stack.len() < count
                    {
                        return script_error(self, format!("stack underflow binding {} variables",
                                                          count));
                    }

                    let values = self.stack.split_off(self.stack.len() - count);
                    let parent = buffer.and_then(|buffer| VarBuffer::window(buffer, binding.base));
                    let frame = VarBuffer::new(binding.base, values, parent);

                    return self.eval_sequence(&binding.body, Some(&frame));
                },

            Op::Let(let_block) => return self.eval_sequence(&let_block.body, buffer)
        }

        Ok(())
    }
}


impl Default for CairnInterpreter
{
    fn default() -> Self
    {
        Self::new(Config::default())
    }
}
