/// The core words of the language.
pub mod base_words;

/// Words that write to the session's output.
pub mod io_words;

use crate::runtime::{
    built_ins::{base_words::register_base_words, io_words::register_io_words},
    interpreter::Interpreter,
};

/// Register every primitive in the interpreter's library scope.
pub fn register_built_ins(interpreter: &mut dyn Interpreter) {
    register_base_words(interpreter);
    register_io_words(interpreter);
}
