//! The cairn language: a small concatenative language with lexically scoped variables and
//! closures.
//!
//! Source is read into declarations, compiled in two passes into functions held by a scope
//! chain, then evaluated against an operand stack.

/// Settings for an interpreter session.
pub mod config;

/// The errors reported to the driver.
pub mod error;

/// Module for managing the source code and turning it into compiled functions.
pub mod lang;

/// Module for the runtime and the data structures used by the interpreter.  As well as the
/// interpreter itself.
#[macro_use]
pub mod runtime;

pub use config::Config;
pub use error::{Error, Result};
pub use runtime::interpreter::{
    cairn_interpreter::CairnInterpreter, CodeManagement, Interpreter, InterpreterStack,
    WordManagement,
};
