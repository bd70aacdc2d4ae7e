//! Evaluate expressions against a chain of environments
use ::gc::Gc;
use std::cell::Cell;
use std::error::Error;
use std::fmt;

use crate::reader::ReaderError;

pub use self::environment::{
    define, global_frame, lookup, make_call_frame, null_env, set, Environment,
};
pub use self::gc::{shared, GcShared};
pub use self::procedure::{Closure, NativeFn, Primitive, Procedure, Thunk};
pub use self::symbol::{Symbol, SymbolTable};
pub use self::value::{DeepEqual, Pair, Value};

mod environment;
mod forms;
mod gc;
mod keywords;
mod procedure;
pub mod stdlib;
mod symbol;
mod value;

use self::keywords::Keywords;

/// Default limit of nested (non-tail) evaluations
pub const MAX_EVAL_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The text could not be read
    Syntax(ReaderError),
    /// A malformed expression or special form
    BadSyntax(String),
    UnboundVar(String),
    /// `expected` follows the `(n, rest)` arity convention
    BadArgc { expected: (usize, bool), given: usize },
    DuplicateParameter(String),
    BadArgType(String),
    Arithmetic(&'static str),
    NonCallable(String),
    /// Too many nested evaluations
    StackOverflow,
    Io(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ExecutionError::*;

        match *self {
            Syntax(ref e) => write!(f, "syntax error: {}", e),
            BadSyntax(ref msg) => write!(f, "syntax error: {}", msg),
            UnboundVar(ref name) => write!(f, "unknown identifier: {}", name),
            BadArgc {
                expected: (n, rest),
                given,
            } => write!(
                f,
                "wrong number of arguments: expected {}{}, given {}",
                if rest { "at least " } else { "" },
                n,
                given
            ),
            DuplicateParameter(ref name) => write!(f, "duplicate parameter: {}", name),
            BadArgType(ref msg) => write!(f, "type error: {}", msg),
            Arithmetic(msg) => write!(f, "arithmetic error: {}", msg),
            NonCallable(ref what) => write!(f, "attempt to call non-procedure: {}", what),
            StackOverflow => f.write_str("maximum recursion depth exceeded"),
            Io(ref msg) => write!(f, "i/o error: {}", msg),
        }
    }
}

impl Error for ExecutionError {}

impl From<ReaderError> for ExecutionError {
    fn from(e: ReaderError) -> ExecutionError {
        ExecutionError::Syntax(e)
    }
}

/// What a special form or a procedure application hands back to the
/// trampoline: either a final value, or an expression to continue with
/// in tail position.
#[derive(Debug)]
pub enum Outcome {
    Value(Value),
    TailCall(Value, GcShared<Environment>),
}

#[derive(Debug)]
pub struct Evaluator {
    symbols: SymbolTable,
    keywords: Keywords,
    depth: Cell<usize>,
    max_depth: usize,
    memoize_thunks: bool,
}

impl Evaluator {
    pub fn new(symbols: SymbolTable) -> Evaluator {
        Evaluator {
            keywords: Keywords::new(&symbols),
            symbols,
            depth: Cell::new(0),
            max_depth: MAX_EVAL_DEPTH,
            memoize_thunks: false,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Evaluator {
        self.max_depth = max_depth;
        self
    }

    /// Thunks re-evaluate on every force unless this is enabled
    pub fn with_memoized_thunks(mut self, memoize: bool) -> Evaluator {
        self.memoize_thunks = memoize;
        self
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Evaluates `expression` in `environment`. Each call counts as one
    /// level of host recursion; tail positions reuse the same level.
    pub fn eval(
        &self,
        expression: &Value,
        environment: &GcShared<Environment>,
    ) -> Result<Value, ExecutionError> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(ExecutionError::StackOverflow);
        }

        self.depth.set(depth + 1);
        let result = self.trampoline(expression.clone(), environment.clone());
        self.depth.set(depth);

        result
    }

    fn trampoline(
        &self,
        mut expression: Value,
        mut environment: GcShared<Environment>,
    ) -> Result<Value, ExecutionError> {
        loop {
            debug!("eval {} (depth {})", expression, self.depth.get());

            let (head, tail) = match expression {
                Value::Symbol(ref name) => {
                    let value = lookup(&environment, name)?;
                    return self.force(value);
                }
                Value::Pair(ref pair) => {
                    let pair = pair.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                }
                Value::Nil => return Err(ExecutionError::BadSyntax("empty combination: ()".into())),
                Value::Thunk(ref thunk) => return self.force(Value::Thunk(thunk.clone())),
                ref atom => return Ok(atom.clone()),
            };

            let operands = tail
                .to_vec()
                .ok_or_else(|| {
                    ExecutionError::BadSyntax(format!("malformed list: {}", expression))
                })?;

            let form = head.symbol().and_then(|name| self.keywords.special_form(name));

            let outcome = match form {
                Some(form) => self.special_form(form, operands, &environment)?,
                None => self.combination(&head, &operands, &environment)?,
            };

            match outcome {
                Outcome::Value(value) => return Ok(value),
                Outcome::TailCall(next_expression, next_environment) => {
                    trace!("tail call: {}", next_expression);
                    expression = next_expression;
                    environment = next_environment;
                }
            }
        }
    }

    // Procedure call: the operator is evaluated first, then the procedure
    // decides how its operands become arguments
    fn combination(
        &self,
        operator: &Value,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        let procedure = match self.eval(operator, environment)? {
            Value::Procedure(procedure) => procedure,
            other => return Err(ExecutionError::NonCallable(other.to_string())),
        };

        let args = procedure.evaluate_arguments(self, operands, environment)?;
        procedure.apply(self, args, environment)
    }

    /// Applies `procedure` to already evaluated `args` and runs it to
    /// completion
    pub fn apply(
        &self,
        procedure: &Value,
        args: Vec<Value>,
        environment: &GcShared<Environment>,
    ) -> Result<Value, ExecutionError> {
        let procedure = match *procedure {
            Value::Procedure(ref procedure) => procedure.clone(),
            ref other => return Err(ExecutionError::NonCallable(other.to_string())),
        };

        match procedure.apply(self, args, environment)? {
            Outcome::Value(value) => Ok(value),
            Outcome::TailCall(expression, frame) => self.eval(&expression, &frame),
        }
    }

    /// Evaluates a thunk in its captured environment; other values are
    /// returned as they are
    pub fn force(&self, value: Value) -> Result<Value, ExecutionError> {
        let thunk: Gc<Thunk> = match value {
            Value::Thunk(thunk) => thunk,
            other => return Ok(other),
        };

        if self.memoize_thunks {
            if let Some(ref value) = *thunk.memo.borrow() {
                return Ok(value.clone());
            }
        }

        let value = self.eval(&thunk.expression, &thunk.environment)?;

        if self.memoize_thunks {
            *thunk.memo.borrow_mut() = Some(value.clone());
        }

        Ok(value)
    }
}

/// A global frame holding the given primitives, each bound under all of
/// its names
pub fn create_global_frame(
    symbols: &SymbolTable,
    primitives: &[(&'static [&'static str], NativeFn, (usize, bool))],
) -> GcShared<Environment> {
    let mut env = Environment::default();

    for &(names, fun, arity) in primitives.iter() {
        let name = names.first().cloned().unwrap_or("anonymous");
        let primitive = Primitive { name, fun, arity };
        let procedure = Value::Procedure(Gc::new(Procedure::Primitive(primitive)));
        for alias in names.iter() {
            env.define(symbols.intern(alias), procedure.clone());
        }
    }

    shared(env)
}

/// A global frame with the standard primitives
pub fn default_env(symbols: &SymbolTable) -> GcShared<Environment> {
    create_global_frame(symbols, stdlib::STDLIB)
}
