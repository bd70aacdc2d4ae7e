use gc::{Finalize, Gc, GcCell, Trace};
use std::fmt::{self, Debug, Display, Formatter, Result as FmtResult};

use super::environment::{make_call_frame, Environment};
use super::gc::GcShared;
use super::symbol::Symbol;
use super::value::Value;
use super::{Evaluator, ExecutionError, Outcome};

type PureFn = fn(Vec<Value>) -> Result<Value, ExecutionError>;
type ContextFn =
    fn(&Evaluator, Vec<Value>, &GcShared<Environment>) -> Result<Value, ExecutionError>;

/// A host function. `WithEnv` functions also get the evaluator and the
/// environment of the call site.
#[derive(Clone, Copy)]
pub enum NativeFn {
    Pure(PureFn),
    WithEnv(ContextFn),
}

/// `arity` is `(n, rest)`: exactly `n` arguments, or at least `n` if `rest`
#[derive(Clone)]
pub struct Primitive {
    pub name: &'static str,
    pub fun: NativeFn,
    pub arity: (usize, bool),
}

impl Debug for Primitive {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "Primitive({}, {:?})", self.name, self.arity)
    }
}

impl Primitive {
    fn call(
        &self,
        evaluator: &Evaluator,
        args: Vec<Value>,
        environment: &GcShared<Environment>,
    ) -> Result<Value, ExecutionError> {
        let (n_of_args, rest) = self.arity;
        let given = args.len();

        if (!rest && given != n_of_args) || (rest && given < n_of_args) {
            return Err(ExecutionError::BadArgc {
                expected: self.arity,
                given,
            });
        }

        match self.fun {
            NativeFn::Pure(fun) => fun(args),
            NativeFn::WithEnv(fun) => fun(evaluator, args, environment),
        }
    }
}

/// Formals, body and defining environment of a user procedure. A body of
/// several expressions has already been wrapped in a `begin`.
#[derive(Debug)]
pub struct Closure {
    pub formals: Vec<Symbol>,
    pub body: Value,
    pub environment: GcShared<Environment>,
}

#[derive(Debug)]
pub enum Procedure {
    Primitive(Primitive),
    Lambda(Closure),
    /// Arguments are passed unevaluated, as thunks
    CallByName(Closure),
}

impl Finalize for Procedure {}
unsafe impl Trace for Procedure {
    custom_trace!(this, {
        match *this {
            Procedure::Primitive(_) => {}
            Procedure::Lambda(ref closure) | Procedure::CallByName(ref closure) => {
                mark(&closure.body);
                mark(&closure.environment);
            }
        }
    });
}

impl Procedure {
    /// Turns the operand expressions of a call into arguments
    pub fn evaluate_arguments(
        &self,
        evaluator: &Evaluator,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Vec<Value>, ExecutionError> {
        match *self {
            Procedure::CallByName(_) => Ok(operands
                .iter()
                .map(|operand| {
                    Value::Thunk(Gc::new(Thunk::new(operand.clone(), environment.clone())))
                })
                .collect()),
            _ => operands
                .iter()
                .map(|operand| evaluator.eval(operand, environment))
                .collect(),
        }
    }

    /// Primitives run to completion. User procedures hand their body and
    /// a fresh call frame back to the trampoline.
    pub fn apply(
        &self,
        evaluator: &Evaluator,
        args: Vec<Value>,
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        match *self {
            Procedure::Primitive(ref primitive) => primitive
                .call(evaluator, args, environment)
                .map(Outcome::Value),
            Procedure::Lambda(ref closure) | Procedure::CallByName(ref closure) => {
                let frame = make_call_frame(&closure.environment, &closure.formals, args)?;
                Ok(Outcome::TailCall(closure.body.clone(), frame))
            }
        }
    }

    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Procedure::Primitive(ref primitive) => Some(primitive.name),
            _ => None,
        }
    }
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let (keyword, closure) = match *self {
            Procedure::Primitive(ref primitive) => {
                return write!(f, "#[primitive {}]", primitive.name)
            }
            Procedure::Lambda(ref closure) => ("lambda", closure),
            Procedure::CallByName(ref closure) => ("nu", closure),
        };

        write!(f, "({} (", keyword)?;
        for (i, formal) in closure.formals.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", formal)?;
        }
        write!(f, ") {})", closure.body)
    }
}

/// An unevaluated argument expression together with the environment it
/// must be evaluated in
#[derive(Debug)]
pub struct Thunk {
    pub expression: Value,
    pub environment: GcShared<Environment>,
    pub(super) memo: GcCell<Option<Value>>,
}

impl Thunk {
    pub fn new(expression: Value, environment: GcShared<Environment>) -> Thunk {
        Thunk {
            expression,
            environment,
            memo: GcCell::new(None),
        }
    }
}

impl Finalize for Thunk {}
unsafe impl Trace for Thunk {
    custom_trace!(this, {
        mark(&this.expression);
        mark(&this.environment);
        mark(&this.memo);
    });
}
