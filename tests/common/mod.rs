//! Shared helpers for the integration tests: an in-memory output sink
//! and a tiny source-to-output runner.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rill_lang::interpreter::{Interpreter, RuntimeError};
use rill_lang::parser::parse;

/// A clonable sink capturing everything `print` writes.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output was not UTF-8")
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn interpreter_with_output() -> (Interpreter, SharedOutput) {
    let output = SharedOutput::default();
    (Interpreter::with_output(Box::new(output.clone())), output)
}

/// Run a program, returning everything it printed. Panics on parse or
/// runtime errors.
#[allow(dead_code)]
pub fn run(source: &str) -> String {
    try_run(source).expect("program failed")
}

/// Run a program, returning the printed output or the first runtime
/// error.
#[allow(dead_code)]
pub fn try_run(source: &str) -> Result<String, RuntimeError> {
    let statements = parse(source).expect("parse failed");
    let (mut interp, output) = interpreter_with_output();
    for statement in &statements {
        interp.execute(statement)?;
    }
    Ok(output.contents())
}
