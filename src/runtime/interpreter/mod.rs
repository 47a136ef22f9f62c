use crate::{
    error::Result as CairnResult,
    lang::diagnostics::Diagnostics,
    runtime::{
        data_structures::{function::FunctionRef, scope::ScopePtr, value::Value},
        error,
    },
};
use std::{
    fmt::{self, Display, Formatter},
    path::Path,
    rc::Rc,
};

pub mod cairn_interpreter;

/// A call stack item is a record of the executing word's name and the line it was called from.
/// These items are read-only and the fields are accessed by member functions.
#[derive(Clone)]
pub struct CallItem {
    line: Option<usize>,
    word: String,
}

impl CallItem {
    pub fn new(word: String, line: Option<usize>) -> CallItem {
        CallItem { line, word }
    }

    /// Where in the source code the call was made from.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn word(&self) -> &String {
        &self.word
    }
}

/// Make sure that this word can be nicely displayed to the user in event of an error.
impl Display for CallItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.word),
            None => write!(f, "{}", self.word),
        }
    }
}

/// The words currently being executed, outermost first.
pub type CallStack = Vec<CallItem>;

/// The operand stack of values managed by the interpreter.
pub type ValueStack = Vec<Value>;

/// Trait for managing the interpreter's operand stack.  Primitives take their inputs from here
/// and leave their outputs here.
pub trait InterpreterStack {
    /// Examine the full stack, bottom first.  Used by the `.s` word and the REPL.
    fn stack(&self) -> &ValueStack;

    /// Release every value on the stack.
    fn clear_stack(&mut self);

    fn push(&mut self, value: Value);

    /// Pop a value from the stack.  If the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Value>;

    /// Pop the top value and require it to be numeric, truncating floats.
    fn pop_as_int(&mut self) -> error::Result<i64>;

    /// Pop the top value as a count.  Negative numbers are an error.
    fn pop_as_usize(&mut self) -> error::Result<usize>;

    /// Pop the top value and treat it as a condition.
    fn pop_as_bool(&mut self) -> error::Result<bool>;

    /// Alias the value `index` places below the top of the stack, 0 being the top.
    fn peek(&self, index: usize) -> error::Result<Value>;

    /// Remove and return the value `index` places below the top of the stack.
    fn pick(&mut self, index: usize) -> error::Result<Value>;
}

/// Trait for compiling source code into the session and running it.
pub trait CodeManagement {
    /// Compile a unit of declarations into the top level scope.
    fn process_source(&mut self, path: &str, source: &str) -> CairnResult<()>;

    /// Compile a unit of declarations into the top level scope, replacing any earlier top level
    /// definitions of the words it declares.  If the unit fails to compile the earlier
    /// definitions are put back.
    fn redefine_source(&mut self, path: &str, source: &str) -> CairnResult<()>;

    /// Read and compile a unit of declarations from a file.
    fn process_source_file(&mut self, path: &Path) -> CairnResult<()>;

    /// Compile and immediately run a bare word sequence against the current stack.
    fn evaluate_source(&mut self, path: &str, source: &str) -> CairnResult<()>;

    /// Run a block or closure value.  Blocks are compiled the first time they run.
    fn apply(&mut self, value: Value) -> error::Result<()>;

    /// Look up `main` and run it on a fresh, empty stack.
    fn run_main(&mut self) -> CairnResult<()>;
}

/// Definition of a word handler function.  This is the function that is called when a primitive
/// is executed.  Can be a lambda, a callable object or a Rust function.
pub type WordHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()>;

/// Register a native word in the interpreter's library scope.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        use std::rc::Rc;

        $interpreter.add_word(
            $name,
            Rc::new($function),
            $description.to_string(),
            $signature.to_string(),
        );
    }};
}

/// Trait for managing the words known to the interpreter and the calls between them.
pub trait WordManagement {
    /// The source line most recently reached by evaluation.
    fn current_line(&self) -> Option<usize>;

    /// Add a primitive to the library scope.
    fn add_word(
        &mut self,
        name: &str,
        handler: Rc<WordHandler>,
        description: String,
        signature: String,
    );

    /// Find the function a name resolves to from the top level scope.
    fn find_word(&self, name: &str) -> Option<FunctionRef>;

    fn call_stack(&self) -> &CallStack;

    /// Enter a word.  Fails once the maximum call depth is reached.
    fn call_stack_push(&mut self, name: String, line: Option<usize>) -> error::Result<()>;
}

/// The full interface of an interpreter session, as seen by primitives and the driver.
pub trait Interpreter: InterpreterStack + CodeManagement + WordManagement {
    /// The scope user code is compiled into.
    fn top_level_scope(&self) -> &ScopePtr;

    /// Warnings and errors from every unit compiled so far.  They accumulate for the life of the
    /// session until the host drains them with `Diagnostics::take`.
    fn diagnostics(&self) -> &Diagnostics;

    fn diagnostics_mut(&mut self) -> &mut Diagnostics;

    /// Write text produced by the program, `print` and `.s` go through here.
    fn write_output(&mut self, text: &str) -> error::Result<()>;
}
