/// Words that manipulate the operand stack.
mod stack_words;

/// Words that work with math, comparison and logic.
mod arithmetic_words;

/// Words that run blocks and closures.
mod block_words;

/// Words that work with strings.
mod string_words;

use crate::runtime::{
    built_ins::base_words::{
        arithmetic_words::register_arithmetic_words, block_words::register_block_words,
        stack_words::register_stack_words, string_words::register_string_words,
    },
    interpreter::Interpreter,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(interpreter: &mut dyn Interpreter) {
    register_stack_words(interpreter);
    register_arithmetic_words(interpreter);
    register_block_words(interpreter);
    register_string_words(interpreter);
}
