use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error},
        interpreter::Interpreter,
    },
};

/// Helper function to handle math operations.  Handlers for int or floating point operations are
/// passed in as arguments.  An int combined with a float is promoted to a float.  The stack
/// operations and value conversions are handled here.
fn math_op(
    interpreter: &mut dyn Interpreter,
    name: &str,
    fop: fn(f64, f64) -> f64,
    iop: fn(i64, i64) -> i64,
) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    if !Value::both_are_numeric(&a, &b) {
        return script_error(
            interpreter,
            format!("{} expects numbers, found {} and {}", name, a.type_name(), b.type_name()),
        );
    }

    let result = if Value::either_is_float(&a, &b) {
        fop(a.get_float_val(), b.get_float_val()).to_value()
    } else {
        iop(a.get_int_val(), b.get_int_val()).to_value()
    };

    interpreter.push(result);
    Ok(())
}

/// Like `math_op`, but a zero divisor is an error rather than a panic or an infinity.
fn division_op(
    interpreter: &mut dyn Interpreter,
    name: &str,
    fop: fn(f64, f64) -> f64,
    iop: fn(i64, i64) -> i64,
) -> error::Result<()> {
    let divisor = interpreter.peek(0)?;

    if divisor.is_numeric() && divisor.get_float_val() == 0.0 {
        let _ = interpreter.pop()?;
        return script_error(interpreter, format!("division by zero in {}", name));
    }

    math_op(interpreter, name, fop, iop)
}

/// Helper for the ordering comparisons.  Numbers compare by value, strings by their text.
fn compare_op(
    interpreter: &mut dyn Interpreter,
    name: &str,
    fop: fn(f64, f64) -> bool,
    sop: fn(&str, &str) -> bool,
) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    let result = match (&a, &b) {
        (Value::String(a), Value::String(b)) => sop(a, b),
        _ if Value::both_are_numeric(&a, &b) => fop(a.get_float_val(), b.get_float_val()),
        _ => {
            return script_error(
                interpreter,
                format!("cannot compare {} with {} in {}", a.type_name(), b.type_name(), name),
            );
        }
    };

    interpreter.push(result.to_value());
    Ok(())
}

/// Add 2 numbers together.
///
/// Signature: `a b -- result`
fn word_add(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    math_op(interpreter, "+", |a, b| a + b, |a, b| a.wrapping_add(b))
}

/// Subtract 2 numbers.
///
/// Signature: `a b -- result`
fn word_subtract(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    math_op(interpreter, "-", |a, b| a - b, |a, b| a.wrapping_sub(b))
}

/// Multiply 2 numbers.
///
/// Signature: `a b -- result`
fn word_multiply(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    math_op(interpreter, "*", |a, b| a * b, |a, b| a.wrapping_mul(b))
}

/// Divide 2 numbers.  Integer division truncates toward zero.
///
/// Signature: `a b -- result`
fn word_divide(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    division_op(interpreter, "/", |a, b| a / b, |a, b| a.wrapping_div(b))
}

/// The remainder of dividing 2 numbers.  Takes the sign of the dividend.
///
/// Signature: `a b -- remainder`
fn word_mod(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    division_op(interpreter, "mod", |a, b| a % b, |a, b| a.wrapping_rem(b))
}

/// Signature: `a -- -a`
fn word_negate(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let result = match value {
        Value::Int(value) => value.wrapping_neg().to_value(),
        Value::Float(value) => (-value).to_value(),
        other => {
            return script_error(interpreter, format!("neg expects a number, found {}", other.type_name()));
        }
    };

    interpreter.push(result);
    Ok(())
}

/// Are 2 values equal?  Numbers compare across int and float, strings by content, symbols by
/// identity and everything else by reference.
///
/// Signature: `a b -- bool`
fn word_equal(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push((a == b).to_value());
    Ok(())
}

/// Signature: `a b -- bool`
fn word_less_than(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    compare_op(interpreter, "<", |a, b| a < b, |a, b| a < b)
}

/// Signature: `a b -- bool`
fn word_greater_than(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    compare_op(interpreter, ">", |a, b| a > b, |a, b| a > b)
}

/// Logically invert a value.  Zero and the empty string are false, everything else is true.
///
/// Signature: `value -- bool`
fn word_not(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop_as_bool()?;

    interpreter.push((!value).to_value());
    Ok(())
}

pub fn register_arithmetic_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "+", word_add, "Add 2 numbers.", "a b -- result");

    add_native_word!(interpreter, "-", word_subtract, "Subtract 2 numbers.", "a b -- result");

    add_native_word!(interpreter, "*", word_multiply, "Multiply 2 numbers.", "a b -- result");

    add_native_word!(interpreter, "/", word_divide, "Divide 2 numbers.", "a b -- result");

    add_native_word!(
        interpreter,
        "mod",
        word_mod,
        "Get the remainder of dividing 2 numbers.",
        "a b -- remainder"
    );

    add_native_word!(interpreter, "neg", word_negate, "Negate a number.", "a -- -a");

    add_native_word!(interpreter, "=", word_equal, "Are 2 values equal?", "a b -- bool");

    add_native_word!(
        interpreter,
        "<",
        word_less_than,
        "Is one value less than another?",
        "a b -- bool"
    );

    add_native_word!(
        interpreter,
        ">",
        word_greater_than,
        "Is one value greater than another?",
        "a b -- bool"
    );

    add_native_word!(interpreter, "not", word_not, "Logically invert a value.", "value -- bool");
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

    fn interpreter() -> CairnInterpreter {
        CairnInterpreter::with_library(Config::default().with_std(false)).unwrap()
    }

    fn top_of(source: &str) -> Value {
        let mut interpreter = interpreter();

        interpreter.evaluate_source("<test>", source).unwrap();
        interpreter.stack().last().cloned().unwrap()
    }

    #[test_case("2 3 +", Value::Int(5) ; "int add")]
    #[test_case("2 0.5 +", Value::Float(2.5) ; "promoted add")]
    #[test_case("2 5 -", Value::Int(-3) ; "subtract")]
    #[test_case("6 7 *", Value::Int(42) ; "multiply")]
    #[test_case("7 2 /", Value::Int(3) ; "int divide truncates")]
    #[test_case("7.0 2 /", Value::Float(3.5) ; "float divide")]
    #[test_case("-7 3 mod", Value::Int(-1) ; "mod keeps dividend sign")]
    #[test_case("4 neg", Value::Int(-4) ; "negate")]
    #[test_case("1 1.0 =", Value::Int(1) ; "numeric equality across types")]
    #[test_case("\"a\" \"a\" =", Value::Int(1) ; "string equality")]
    #[test_case("1 2 <", Value::Int(1) ; "less than")]
    #[test_case("1 2 >", Value::Int(0) ; "greater than")]
    #[test_case("\"b\" \"a\" >", Value::Int(1) ; "string ordering")]
    #[test_case("0 not", Value::Int(1) ; "not zero")]
    #[test_case("\"x\" not", Value::Int(0) ; "not string")]
    fn arithmetic(source: &str, expected: Value) {
        assert_eq!(top_of(source), expected);
    }

    #[test_case("1 0 /" ; "int division")]
    #[test_case("1.5 0.0 /" ; "float division")]
    #[test_case("1 0 mod" ; "modulo")]
    fn division_by_zero_is_an_error(source: &str) {
        let error = interpreter().evaluate_source("<test>", source).unwrap_err();

        assert!(error.to_string().contains("division by zero"));
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let error = interpreter().evaluate_source("<test>", "1 \"a\" +").unwrap_err();

        assert!(error.to_string().contains("+ expects numbers, found int and string"));
    }
}
