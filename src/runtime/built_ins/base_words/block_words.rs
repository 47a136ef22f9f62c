use crate::{
    add_native_word,
    runtime::{
        error::{self, script_error},
        interpreter::Interpreter,
    },
};

/// Run a block or closure.  A block is compiled the first time it's run.
///
/// Signature: `block -- ...`
fn word_apply(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let block = interpreter.pop()?;

    interpreter.apply(block)
}

/// Run one of two blocks depending on a condition.
///
/// Signature: `condition then-block else-block -- ...`
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let else_block = interpreter.pop()?;
    let then_block = interpreter.pop()?;
    let condition = interpreter.pop_as_bool()?;

    if !then_block.is_executable() || !else_block.is_executable() {
        return script_error(
            interpreter,
            format!(
                "if expects two blocks, found {} and {}",
                then_block.type_name(),
                else_block.type_name()
            ),
        );
    }

    interpreter.apply(if condition { then_block } else { else_block })
}

/// Run a block a number of times.
///
/// Signature: `count block -- ...`
fn word_times(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let block = interpreter.pop()?;
    let count = interpreter.pop_as_usize()?;

    if !block.is_executable() {
        return script_error(interpreter, format!("times expects a block, found {}", block.type_name()));
    }

    for _ in 0..count {
        interpreter.apply(block.clone())?;
    }

    Ok(())
}

pub fn register_block_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "apply",
        word_apply,
        "Run a block or closure.",
        "block -- ..."
    );

    add_native_word!(
        interpreter,
        "if",
        word_if,
        "Run the then block if the condition is true, otherwise the else block.",
        "condition then-block else-block -- ..."
    );

    add_native_word!(
        interpreter,
        "times",
        word_times,
        "Run a block a number of times.",
        "count block -- ..."
    );
}
