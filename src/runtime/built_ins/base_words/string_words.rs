use crate::{
    add_native_word,
    runtime::{
        data_structures::value::{ToValue, Value},
        error::{self, script_error},
        interpreter::Interpreter,
    },
};

/// Join the text of 2 values.  Anything that isn't a string is converted the way `->string`
/// converts it.
///
/// Signature: `a b -- string`
fn word_concat(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(format!("{}{}", a, b).to_value());
    Ok(())
}

/// The length of a string in characters, or the number of items in a list literal.
///
/// Signature: `value -- length`
fn word_len(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let length = match &value {
        Value::String(text) => text.chars().count(),
        Value::Symbol(symbol) => symbol.name().chars().count(),
        Value::List(list) => list.len(),
        other => {
            return script_error(
                interpreter,
                format!("len expects a string or list, found {}", other.type_name()),
            );
        }
    };

    interpreter.push(length.to_value());
    Ok(())
}

/// Convert a value to a string.  A symbol converts to its bare name.
///
/// Signature: `value -- string`
fn word_to_string(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    let string = match value {
        Value::String(_) => value,
        Value::Symbol(symbol) => symbol.name().to_value(),
        other => other.to_string().to_value(),
    };

    interpreter.push(string);
    Ok(())
}

pub fn register_string_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "concat",
        word_concat,
        "Join the text of 2 values into a new string.",
        "a b -- string"
    );

    add_native_word!(
        interpreter,
        "len",
        word_len,
        "Get the length of a string, symbol or list.",
        "value -- length"
    );

    add_native_word!(
        interpreter,
        "->string",
        word_to_string,
        "Convert a value to a string.",
        "value -- string"
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

    fn top_of(source: &str) -> Value {
        let mut interpreter =
            CairnInterpreter::with_library(Config::default().with_std(false)).unwrap();

        interpreter.evaluate_source("<test>", source).unwrap();
        interpreter.stack().last().cloned().unwrap()
    }

    #[test_case("\"ab\" \"cd\" concat", "abcd" ; "strings")]
    #[test_case("\"n=\" 4 concat", "n=4" ; "string and number")]
    #[test_case("42 ->string", "42" ; "int")]
    #[test_case("2.5 ->string", "2.5" ; "float")]
    #[test_case("/sym ->string", "sym" ; "symbol")]
    #[test_case("\"kept\" ->string", "kept" ; "string unchanged")]
    fn produces_string(source: &str, expected: &str) {
        assert_eq!(top_of(source).to_string(), expected);
        assert!(top_of(source).is_string());
    }

    #[test_case("\"héllo\" len", 5 ; "string")]
    #[test_case("/abc len", 3 ; "symbol")]
    #[test_case("{ 1 , 2 3 , 4 } len", 3 ; "list")]
    #[test_case("{ } len", 0 ; "empty list")]
    fn length(source: &str, expected: i64) {
        assert_eq!(top_of(source), Value::Int(expected));
    }
}
