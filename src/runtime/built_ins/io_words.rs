use crate::{
    add_native_word,
    runtime::{error, interpreter::Interpreter},
};

/// Print a value followed by a new line.  Strings are printed without their quotes.
///
/// Signature: `value -- `
fn word_print(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let value = interpreter.pop()?;

    interpreter.write_output(&format!("{}\n", value))
}

/// Print the whole stack, bottom first, in the form the values would be written in source.  The
/// stack is left untouched.
///
/// Signature: ` -- `
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let text = format_stack(interpreter);

    interpreter.write_output(&text)
}

/// Render the stack the way `.s` shows it.  Shared with the REPL.
pub fn format_stack(interpreter: &dyn Interpreter) -> String {
    let stack = interpreter.stack();
    let mut text = format!("<{}>", stack.len());

    for value in stack.iter() {
        text.push(' ');
        text.push_str(&value.stringify());
    }

    text.push('\n');
    text
}

pub fn register_io_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(
        interpreter,
        "print",
        word_print,
        "Print a value followed by a new line.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        ".s",
        word_print_stack,
        "Print the contents of the stack without changing it.",
        " -- "
    );
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        runtime::interpreter::{cairn_interpreter::CairnInterpreter, CodeManagement},
    };
    use pretty_assertions::assert_eq;
    use std::{cell::RefCell, io::Write, rc::Rc};

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn output_of(source: &str) -> String {
        let captured = Captured::default();
        let mut interpreter = CairnInterpreter::with_library(Config::default().with_std(false))
            .unwrap()
            .with_output(Box::new(captured.clone()));

        interpreter.evaluate_source("<test>", source).unwrap();

        let bytes = captured.0.borrow().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn print_writes_display_form() {
        assert_eq!(output_of("\"hi\" print 42 print 1.5 print"), "hi\n42\n1.5\n");
    }

    #[test]
    fn print_stack_uses_source_form() {
        assert_eq!(
            output_of("1 \"two\" /three [ 4 ] .s"),
            "<4> 1 \"two\" /three [ 4 ]\n"
        );
    }
}
