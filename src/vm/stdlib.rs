//! The primitive procedures bound in the default global frame
use std::cmp::Ordering;
use std::fs;
use std::io::{stdout, Write};

use fallible_iterator::FallibleIterator;

use super::environment::Environment;
use super::gc::GcShared;
use super::procedure::NativeFn;
use super::value::{DeepEqual, Value};
use super::{Evaluator, ExecutionError};
use crate::reader::{Buffer, Datums};

/// `(names, function, (n, rest))`. The first name is the one used in
/// error messages.
pub type PrimitiveEntry = (&'static [&'static str], NativeFn, (usize, bool));

pub static STDLIB: &[PrimitiveEntry] = &[
    (&["+"], NativeFn::Pure(add), (0, true)),
    (&["-"], NativeFn::Pure(sub), (1, true)),
    (&["*"], NativeFn::Pure(mul), (0, true)),
    (&["/"], NativeFn::Pure(div), (1, true)),
    (&["quotient"], NativeFn::Pure(quotient), (2, false)),
    (&["remainder"], NativeFn::Pure(remainder), (2, false)),
    (&["modulo"], NativeFn::Pure(modulo), (2, false)),
    (&["abs"], NativeFn::Pure(abs), (1, false)),
    (&["min"], NativeFn::Pure(min), (1, true)),
    (&["max"], NativeFn::Pure(max), (1, true)),
    (&["="], NativeFn::Pure(num_eq), (1, true)),
    (&["<"], NativeFn::Pure(lt), (1, true)),
    (&[">"], NativeFn::Pure(gt), (1, true)),
    (&["<="], NativeFn::Pure(le), (1, true)),
    (&[">="], NativeFn::Pure(ge), (1, true)),
    (&["eqv?", "eq?"], NativeFn::Pure(eqv), (2, false)),
    (&["equal?"], NativeFn::Pure(equal), (2, false)),
    (&["not"], NativeFn::Pure(not), (1, false)),
    (&["cons"], NativeFn::Pure(cons), (2, false)),
    (&["car"], NativeFn::Pure(car), (1, false)),
    (&["cdr"], NativeFn::Pure(cdr), (1, false)),
    (&["set-car!"], NativeFn::Pure(set_car), (2, false)),
    (&["set-cdr!"], NativeFn::Pure(set_cdr), (2, false)),
    (&["list"], NativeFn::Pure(list), (0, true)),
    (&["length"], NativeFn::Pure(length), (1, false)),
    (&["append"], NativeFn::Pure(append), (0, true)),
    (&["null?"], NativeFn::Pure(is_null), (1, false)),
    (&["pair?"], NativeFn::Pure(is_pair), (1, false)),
    (&["list?"], NativeFn::Pure(is_list), (1, false)),
    (&["boolean?"], NativeFn::Pure(is_boolean), (1, false)),
    (&["number?", "real?"], NativeFn::Pure(is_number), (1, false)),
    (&["integer?"], NativeFn::Pure(is_integer), (1, false)),
    (&["symbol?"], NativeFn::Pure(is_symbol), (1, false)),
    (&["string?"], NativeFn::Pure(is_string), (1, false)),
    (&["procedure?"], NativeFn::Pure(is_procedure), (1, false)),
    (&["zero?"], NativeFn::Pure(is_zero), (1, false)),
    (&["even?"], NativeFn::Pure(is_even), (1, false)),
    (&["odd?"], NativeFn::Pure(is_odd), (1, false)),
    (&["display"], NativeFn::Pure(display), (1, false)),
    (&["newline"], NativeFn::Pure(newline), (0, false)),
    (&["print"], NativeFn::Pure(print), (1, false)),
    (&["eval"], NativeFn::WithEnv(eval), (1, false)),
    (&["apply"], NativeFn::WithEnv(apply), (2, true)),
    (&["load"], NativeFn::WithEnv(load), (1, false)),
];

fn wrong_type(name: &str, position: usize, value: &Value) -> ExecutionError {
    ExecutionError::BadArgType(format!(
        "argument {} of {} has wrong type ({})",
        position + 1,
        name,
        value.type_name()
    ))
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Real(f64),
}

impl Number {
    fn real(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Real(r) => r,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Number::Integer(n) => n == 0,
            Number::Real(r) => r == 0.0,
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Value {
        match n {
            Number::Integer(n) => Value::Integer(n),
            Number::Real(r) => Value::Real(r),
        }
    }
}

fn number(name: &str, position: usize, value: &Value) -> Result<Number, ExecutionError> {
    match *value {
        Value::Integer(n) => Ok(Number::Integer(n)),
        Value::Real(r) => Ok(Number::Real(r)),
        ref other => Err(wrong_type(name, position, other)),
    }
}

fn integer(name: &str, position: usize, value: &Value) -> Result<i64, ExecutionError> {
    match *value {
        Value::Integer(n) => Ok(n),
        ref other => Err(wrong_type(name, position, other)),
    }
}

fn numbers(name: &str, args: &[Value]) -> Result<Vec<Number>, ExecutionError> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| number(name, i, arg))
        .collect()
}

fn overflow() -> ExecutionError {
    ExecutionError::Arithmetic("integer overflow")
}

fn division_by_zero() -> ExecutionError {
    ExecutionError::Arithmetic("division by zero")
}

// Exact when both operands are, inexact otherwise
fn combine(
    a: Number,
    b: Number,
    exact: fn(i64, i64) -> Option<i64>,
    inexact: fn(f64, f64) -> f64,
) -> Result<Number, ExecutionError> {
    match (a, b) {
        (Number::Integer(n), Number::Integer(m)) => {
            exact(n, m).map(Number::Integer).ok_or_else(overflow)
        }
        (a, b) => Ok(Number::Real(inexact(a.real(), b.real()))),
    }
}

fn fold(
    name: &str,
    init: Number,
    args: &[Value],
    exact: fn(i64, i64) -> Option<i64>,
    inexact: fn(f64, f64) -> f64,
) -> Result<Value, ExecutionError> {
    numbers(name, args)?
        .into_iter()
        .try_fold(init, |acc, n| combine(acc, n, exact, inexact))
        .map(Value::from)
}

fn add(args: Vec<Value>) -> Result<Value, ExecutionError> {
    fold("+", Number::Integer(0), &args, i64::checked_add, |a, b| a + b)
}

fn mul(args: Vec<Value>) -> Result<Value, ExecutionError> {
    fold("*", Number::Integer(1), &args, i64::checked_mul, |a, b| a * b)
}

fn sub(args: Vec<Value>) -> Result<Value, ExecutionError> {
    let first = number("-", 0, &args[0])?;
    if args.len() == 1 {
        return combine(Number::Integer(0), first, i64::checked_sub, |a, b| a - b).map(Value::from);
    }
    fold("-", first, &args[1..], i64::checked_sub, |a, b| a - b)
}

fn divide(a: Number, b: Number) -> Result<Number, ExecutionError> {
    if b.is_zero() {
        return Err(division_by_zero());
    }

    match (a, b) {
        (Number::Integer(n), Number::Integer(m)) if n.checked_rem(m) == Some(0) => {
            n.checked_div(m).map(Number::Integer).ok_or_else(overflow)
        }
        (a, b) => Ok(Number::Real(a.real() / b.real())),
    }
}

fn div(args: Vec<Value>) -> Result<Value, ExecutionError> {
    let numbers = numbers("/", &args)?;
    if numbers.len() == 1 {
        return divide(Number::Integer(1), numbers[0]).map(Value::from);
    }

    numbers[1..]
        .iter()
        .try_fold(numbers[0], |acc, &n| divide(acc, n))
        .map(Value::from)
}

fn integer_division(
    name: &str,
    args: &[Value],
    op: fn(i64, i64) -> Option<i64>,
) -> Result<i64, ExecutionError> {
    let n = integer(name, 0, &args[0])?;
    let m = integer(name, 1, &args[1])?;

    if m == 0 {
        return Err(division_by_zero());
    }

    op(n, m).ok_or_else(overflow)
}

fn quotient(args: Vec<Value>) -> Result<Value, ExecutionError> {
    integer_division("quotient", &args, i64::checked_div).map(Value::Integer)
}

fn remainder(args: Vec<Value>) -> Result<Value, ExecutionError> {
    integer_division("remainder", &args, i64::checked_rem).map(Value::Integer)
}

// Takes the sign of the divisor
fn modulo(args: Vec<Value>) -> Result<Value, ExecutionError> {
    let m = integer("modulo", 1, &args[1])?;
    let r = integer_division("modulo", &args, i64::checked_rem)?;

    if r != 0 && (r < 0) != (m < 0) {
        Ok(Value::Integer(r + m))
    } else {
        Ok(Value::Integer(r))
    }
}

fn abs(args: Vec<Value>) -> Result<Value, ExecutionError> {
    match number("abs", 0, &args[0])? {
        Number::Integer(n) => n.checked_abs().map(Value::Integer).ok_or_else(overflow),
        Number::Real(r) => Ok(Value::Real(r.abs())),
    }
}

fn compare(a: Number, b: Number) -> Option<Ordering> {
    match (a, b) {
        (Number::Integer(n), Number::Integer(m)) => Some(n.cmp(&m)),
        (a, b) => a.real().partial_cmp(&b.real()),
    }
}

// Any inexact argument makes the result inexact
fn extremum(name: &str, args: &[Value], wanted: Ordering) -> Result<Value, ExecutionError> {
    let numbers = numbers(name, args)?;
    let inexact = numbers.iter().any(|n| match *n {
        Number::Real(_) => true,
        _ => false,
    });

    let mut best = numbers[0];
    for &n in &numbers[1..] {
        if compare(n, best) == Some(wanted) {
            best = n;
        }
    }

    if inexact {
        Ok(Value::Real(best.real()))
    } else {
        Ok(best.into())
    }
}

fn min(args: Vec<Value>) -> Result<Value, ExecutionError> {
    extremum("min", &args, Ordering::Less)
}

fn max(args: Vec<Value>) -> Result<Value, ExecutionError> {
    extremum("max", &args, Ordering::Greater)
}

fn chain(name: &str, args: &[Value], holds: fn(Ordering) -> bool) -> Result<Value, ExecutionError> {
    let numbers = numbers(name, args)?;
    let result = numbers
        .windows(2)
        .all(|w| compare(w[0], w[1]).map(holds).unwrap_or(false));

    Ok(Value::Boolean(result))
}

fn num_eq(args: Vec<Value>) -> Result<Value, ExecutionError> {
    chain("=", &args, |o| o == Ordering::Equal)
}

fn lt(args: Vec<Value>) -> Result<Value, ExecutionError> {
    chain("<", &args, |o| o == Ordering::Less)
}

fn gt(args: Vec<Value>) -> Result<Value, ExecutionError> {
    chain(">", &args, |o| o == Ordering::Greater)
}

fn le(args: Vec<Value>) -> Result<Value, ExecutionError> {
    chain("<=", &args, |o| o != Ordering::Greater)
}

fn ge(args: Vec<Value>) -> Result<Value, ExecutionError> {
    chain(">=", &args, |o| o != Ordering::Less)
}

fn eqv(args: Vec<Value>) -> Result<Value, ExecutionError> {
    Ok(Value::Boolean(args[0] == args[1]))
}

fn equal(args: Vec<Value>) -> Result<Value, ExecutionError> {
    Ok(Value::Boolean(args[0].equal(&args[1])))
}

fn not(args: Vec<Value>) -> Result<Value, ExecutionError> {
    Ok(Value::Boolean(!args[0].is_true()))
}

fn cons(mut args: Vec<Value>) -> Result<Value, ExecutionError> {
    let cdr = args.pop().unwrap_or(Value::Nil);
    let car = args.pop().unwrap_or(Value::Nil);
    Ok(Value::cons(car, cdr))
}

fn car(args: Vec<Value>) -> Result<Value, ExecutionError> {
    args[0].car().ok_or_else(|| wrong_type("car", 0, &args[0]))
}

fn cdr(args: Vec<Value>) -> Result<Value, ExecutionError> {
    args[0].cdr().ok_or_else(|| wrong_type("cdr", 0, &args[0]))
}

fn set_car(args: Vec<Value>) -> Result<Value, ExecutionError> {
    let pair = args[0].pair().ok_or_else(|| wrong_type("set-car!", 0, &args[0]))?;
    pair.borrow_mut().car = args[1].clone();
    Ok(Value::Unspecified)
}

fn set_cdr(args: Vec<Value>) -> Result<Value, ExecutionError> {
    let pair = args[0].pair().ok_or_else(|| wrong_type("set-cdr!", 0, &args[0]))?;
    pair.borrow_mut().cdr = args[1].clone();
    Ok(Value::Unspecified)
}

fn list(args: Vec<Value>) -> Result<Value, ExecutionError> {
    Ok(Value::list(args))
}

fn length(args: Vec<Value>) -> Result<Value, ExecutionError> {
    args[0]
        .list_len()
        .map(|len| Value::Integer(len as i64))
        .ok_or_else(|| wrong_type("length", 0, &args[0]))
}

// The last argument becomes the tail, unchanged
fn append(mut args: Vec<Value>) -> Result<Value, ExecutionError> {
    let tail = match args.pop() {
        Some(tail) => tail,
        None => return Ok(Value::Nil),
    };

    let mut items = vec![];
    for (i, arg) in args.iter().enumerate() {
        let elements = arg.to_vec().ok_or_else(|| wrong_type("append", i, arg))?;
        items.extend(elements);
    }

    Ok(Value::list_with_tail(items, tail))
}

macro_rules! predicate {
    ($name:ident, $test:expr) => {
        fn $name(args: Vec<Value>) -> Result<Value, ExecutionError> {
            let test: fn(&Value) -> bool = $test;
            Ok(Value::Boolean(test(&args[0])))
        }
    };
}

predicate!(is_null, Value::is_nil);
predicate!(is_pair, Value::is_pair);
predicate!(is_list, Value::is_list);
predicate!(is_boolean, Value::is_boolean);
predicate!(is_number, Value::is_number);
predicate!(is_symbol, Value::is_symbol);
predicate!(is_string, Value::is_string);
predicate!(is_procedure, Value::is_procedure);
predicate!(is_integer, |v| match *v {
    Value::Integer(_) => true,
    Value::Real(r) => r.is_finite() && r.fract() == 0.0,
    _ => false,
});

fn is_zero(args: Vec<Value>) -> Result<Value, ExecutionError> {
    number("zero?", 0, &args[0]).map(|n| Value::Boolean(n.is_zero()))
}

fn is_even(args: Vec<Value>) -> Result<Value, ExecutionError> {
    integer("even?", 0, &args[0]).map(|n| Value::Boolean(n % 2 == 0))
}

fn is_odd(args: Vec<Value>) -> Result<Value, ExecutionError> {
    integer("odd?", 0, &args[0]).map(|n| Value::Boolean(n % 2 != 0))
}

fn write_out(text: &str) -> Result<Value, ExecutionError> {
    let mut out = stdout();
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| ExecutionError::Io(e.to_string()))?;
    Ok(Value::Unspecified)
}

fn display(args: Vec<Value>) -> Result<Value, ExecutionError> {
    write_out(&args[0].to_display())
}

fn newline(_args: Vec<Value>) -> Result<Value, ExecutionError> {
    write_out("\n")
}

fn print(args: Vec<Value>) -> Result<Value, ExecutionError> {
    write_out(&format!("{}\n", args[0]))
}

fn eval(
    evaluator: &Evaluator,
    args: Vec<Value>,
    environment: &GcShared<Environment>,
) -> Result<Value, ExecutionError> {
    evaluator.eval(&args[0], environment)
}

// (apply f a b '(c d)) calls f with a b c d
fn apply(
    evaluator: &Evaluator,
    mut args: Vec<Value>,
    environment: &GcShared<Environment>,
) -> Result<Value, ExecutionError> {
    let last_position = args.len() - 1;
    let last = args.pop().unwrap_or(Value::Nil);
    let spread = last.to_vec().ok_or_else(|| wrong_type("apply", last_position, &last))?;

    let mut args = args.into_iter();
    let procedure = args.next().unwrap_or(Value::Nil);
    let args: Vec<Value> = args.chain(spread).collect();

    evaluator.apply(&procedure, args, environment)
}

fn load(
    evaluator: &Evaluator,
    args: Vec<Value>,
    environment: &GcShared<Environment>,
) -> Result<Value, ExecutionError> {
    let path = match args[0] {
        Value::Str(ref path) => path.to_string(),
        Value::Symbol(ref name) => format!("{}.scm", name),
        ref other => return Err(wrong_type("load", 0, other)),
    };

    info!("loading {}", path);

    let source = fs::read_to_string(&path)
        .map_err(|e| ExecutionError::Io(format!("{}: {}", path, e)))?;
    let lines = source.lines().map(String::from).collect::<Vec<_>>();
    let mut datums = Datums::new(Buffer::new(lines.into_iter()), evaluator.symbols().clone());

    while let Some(expression) = datums.next()? {
        evaluator.eval(&expression, environment)?;
    }

    Ok(Value::Unspecified)
}
