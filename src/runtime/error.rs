use std::{ error::Error,
           fmt::{ self, Debug, Display, Formatter },
           process::{ ExitCode, Termination } };
use crate::runtime::interpreter::{ CallStack, Interpreter };



pub type Result<T> = std::result::Result<T, ScriptError>;



/// Any error that occurs while evaluating cairn code.  Raising one aborts the evaluation, the
/// driver reports it and the session carries on.
#[derive(Clone)]
pub struct ScriptError
{
    /// The source line being evaluated when the error occurred, if available.
    line: Option<usize>,

    /// The description of the error.
    error: String,

    /// The words being executed at the time of the error, if available.
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
}


/// When returned from main, convert the error result to an operating system exit code.
impl Termination for ScriptError
{
    fn report(self) -> ExitCode
    {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}


/// Pretty print the ScriptError, with the call stack innermost first.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match self.line
        {
            Some(line) => write!(f, "line {}: {}", line, self.error)?,
            None => write!(f, "{}", self.error)?
        }

        if let Some(call_stack) = &self.call_stack
            && !call_stack.is_empty()
        {
            write!(f, "\n\nCall stack\n")?;

            for item in call_stack.iter().rev()
            {
                writeln!(f, "  {}", item)?;
            }
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    pub fn new(line: Option<usize>,
               error: String,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                line,
                error,
                call_stack
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(line: Option<usize>,
                            error: String,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(line, error, call_stack))
    }

    /// If available, the line being evaluated when the error occurred.
    pub fn line(&self) -> Option<usize>
    {
        self.line
    }

    /// The description of the error.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// If available, the call stack at the time of the error.
    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }
}


/// Allow for the conversion of a std::io::Error into a ScriptError, for the output words.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(None, format!("I/O error: {}", error), None)
    }
}



/// A convenience function for creating a ScriptError and wrapping it in a Result::Err using the
/// interpreter's current line and call stack.
pub fn script_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T>
{
    let line = interpreter.current_line();
    let call_stack = interpreter.call_stack().clone();

    ScriptError::new_as_result(line, message, Some(call_stack))
}



pub fn script_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T>
{
    script_error(interpreter, message.to_string())
}
