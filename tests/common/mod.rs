#![allow(dead_code)]

use cairn::{CairnInterpreter, CodeManagement, Config, InterpreterStack};
use std::{cell::RefCell, io::Write, rc::Rc};

/// Collects everything a session prints.
#[derive(Clone, Default)]
pub struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn session_with(config: Config) -> CairnInterpreter {
    CairnInterpreter::with_library(config).unwrap()
}

/// A session with the primitives and the standard library loaded.
pub fn session() -> CairnInterpreter {
    session_with(Config::default())
}

/// The stack as integers, bottom first.
pub fn ints(interpreter: &CairnInterpreter) -> Vec<i64> {
    interpreter
        .stack()
        .iter()
        .map(|value| value.get_int_val())
        .collect()
}

/// Compile a unit, run its main and hand back the stack.
pub fn run_program(source: &str) -> Vec<i64> {
    let mut interpreter = session();

    interpreter.process_source("<test>", source).unwrap();
    interpreter.run_main().unwrap();

    ints(&interpreter)
}
