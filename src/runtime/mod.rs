/// All of the core data structures used by the cairn interpreter.
pub mod data_structures;

/// Module for defining the built-in native words that are available to cairn code.
pub mod built_ins;

/// Module for defining the run-time error reporting of the cairn interpreter.
pub mod error;

/// Module for defining the core functionality of the cairn interpreter.  This includes tools for
/// managing and examining the interpreter's state.
pub mod interpreter;

/// Keeps deep cairn recursion off the end of the host thread's stack.
pub mod stack;
