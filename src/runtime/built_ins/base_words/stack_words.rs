use crate::{
    add_native_word,
    runtime::{data_structures::value::ToValue, error, interpreter::Interpreter},
};

/// Duplicate the top value on the stack.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.peek(0)?;

    interpreter.push(value);
    Ok(())
}

/// Drop the top value on the stack.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let _ = interpreter.pop()?;

    Ok(())
}

/// Swap the top 2 values on the stack.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b);
    interpreter.push(a);

    Ok(())
}

/// Copy the second value over the top one.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.peek(1)?;

    interpreter.push(a);
    Ok(())
}

/// Rotate the third value up to the top of the stack.
///
/// Signature: `a b c -- b c a`
fn word_rot(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let a = interpreter.pick(2)?;

    interpreter.push(a);
    Ok(())
}

/// Push how many values were on the stack before this word was called.
///
/// Signature: ` -- depth`
fn word_depth(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let depth = interpreter.stack().len();

    interpreter.push(depth.to_value());
    Ok(())
}

/// Release every value on the stack.
///
/// Signature: `... -- `
fn word_clear(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    interpreter.clear_stack();
    Ok(())
}

pub fn register_stack_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "dup",
        word_dup,
        "Duplicate the top value on the stack.",
        "value -- value value"
    );

    add_native_word!(
        interpreter,
        "drop",
        word_drop,
        "Discard the top value on the stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "swap",
        word_swap,
        "Swap the top 2 values on the stack.",
        "a b -- b a"
    );

    add_native_word!(
        interpreter,
        "over",
        word_over,
        "Copy the second value over the top one.",
        "a b -- a b a"
    );

    add_native_word!(
        interpreter,
        "rot",
        word_rot,
        "Rotate the third value to the top.",
        "a b c -- b c a"
    );

    add_native_word!(
        interpreter,
        "depth",
        word_depth,
        "Get the depth of the stack before calling this word.",
        " -- depth"
    );

    add_native_word!(
        interpreter,
        "clear",
        word_clear,
        "Remove every value from the stack.",
        "... -- "
    );
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        runtime::{
            data_structures::value::Value,
            interpreter::{cairn_interpreter::CairnInterpreter, CodeManagement, InterpreterStack},
        },
    };
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn run(source: &str) -> Vec<Value> {
        let mut interpreter =
            CairnInterpreter::with_library(Config::default().with_std(false)).unwrap();

        interpreter.evaluate_source("<test>", source).unwrap();
        interpreter.stack().clone()
    }

    #[test_case("1 dup", vec![1, 1] ; "dup")]
    #[test_case("1 2 drop", vec![1] ; "drop")]
    #[test_case("1 2 swap", vec![2, 1] ; "swap")]
    #[test_case("1 2 over", vec![1, 2, 1] ; "over")]
    #[test_case("1 2 3 rot", vec![2, 3, 1] ; "rot")]
    #[test_case("7 8 depth", vec![7, 8, 2] ; "depth")]
    #[test_case("1 2 3 clear", vec![] ; "clear")]
    fn stack_words(source: &str, expected: Vec<i64>) {
        let expected: Vec<Value> = expected.into_iter().map(Value::Int).collect();

        assert_eq!(run(source), expected);
    }

    #[test]
    fn underflow_is_an_error() {
        let mut interpreter =
            CairnInterpreter::with_library(Config::default().with_std(false)).unwrap();

        let error = interpreter.evaluate_source("<test>", "1 swap").unwrap_err();

        assert!(error.to_string().contains("stack underflow"));
        assert!(error.to_string().contains("swap"));
    }
}
