//! Read and evaluate source text against a global frame
use fallible_iterator::FallibleIterator;

use crate::reader::{Buffer, Datums};
use crate::vm::{default_env, Environment, Evaluator, ExecutionError, GcShared, SymbolTable, Value};

pub struct Interpreter {
    symbols: SymbolTable,
    evaluator: Evaluator,
    global: GcShared<Environment>,
}

impl Interpreter {
    /// An interpreter whose global frame holds the standard primitives
    pub fn new() -> Interpreter {
        let symbols = SymbolTable::new();
        let evaluator = Evaluator::new(symbols.clone());
        Interpreter::with_evaluator(evaluator)
    }

    pub fn with_evaluator(evaluator: Evaluator) -> Interpreter {
        let symbols = evaluator.symbols().clone();
        let global = default_env(&symbols);

        Interpreter {
            symbols,
            evaluator,
            global,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn global(&self) -> &GcShared<Environment> {
        &self.global
    }

    /// Evaluates every expression in `code` and returns the value of the
    /// last one. Stops at the first error.
    pub fn interpret(&self, code: &str) -> Result<Value, ExecutionError> {
        self.load_lines(code.lines().map(String::from))
    }

    pub fn load_lines<L>(&self, lines: L) -> Result<Value, ExecutionError>
    where
        L: Iterator<Item = String>,
    {
        let mut datums = Datums::new(Buffer::new(lines), self.symbols.clone());
        let mut value = Value::Unspecified;

        while let Some(expression) = datums.next()? {
            value = self.evaluator.eval(&expression, &self.global)?;
        }

        Ok(value)
    }
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}
