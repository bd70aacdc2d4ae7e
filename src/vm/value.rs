use gc::{Finalize, Gc, GcCell, Trace};
use std::fmt;
use std::rc::Rc;

use super::gc::{shared, GcShared};
use super::procedure::{Procedure, Thunk};
use super::symbol::Symbol;

/// Scheme values
#[derive(Debug, Clone)]
pub enum Value {
    /// The empty list `'()`
    Nil,
    /// A boolean. Only `#f` is false.
    Boolean(bool),
    /// An exact integer
    Integer(i64),
    /// An inexact number
    Real(f64),
    /// An interned symbol (`'a`)
    Symbol(Symbol),
    /// An immutable string
    Str(Rc<str>),
    /// A pair (`'(1 . 2)`)
    Pair(GcShared<Pair>),
    /// A primitive, lambda or call-by-name procedure
    Procedure(Gc<Procedure>),
    /// A by-name argument waiting to be forced. Only ever bound in frames.
    Thunk(Gc<Thunk>),
    /// The "unspecified" value returned by some forms (e.g. `(set!)`)
    Unspecified,
}

#[derive(Debug, Clone)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

impl Finalize for Pair {}
unsafe impl Trace for Pair {
    custom_trace!(this, {
        mark(&this.car);
        mark(&this.cdr);
    });
}

impl Finalize for Value {}
unsafe impl Trace for Value {
    custom_trace!(this, {
        use self::Value::*;
        match *this {
            Pair(ref pair) => mark(pair),
            Procedure(ref procedure) => mark(procedure),
            Thunk(ref thunk) => mark(thunk),
            Nil | Boolean(_) | Integer(_) | Real(_) | Symbol(_) | Str(_) | Unspecified => {}
        }
    });
}

// This PartialEq implementation corresponds to the native eqv? procedure:
// reference types are compared by identity, without looking at their contents
impl PartialEq<Value> for Value {
    fn eq(&self, other: &Value) -> bool {
        use self::Value::*;

        match (self, other) {
            (&Nil, &Nil) | (&Unspecified, &Unspecified) => true,
            (&Boolean(x), &Boolean(y)) => x == y,
            (&Integer(n), &Integer(m)) => n == m,
            (&Real(f), &Real(g)) => f == g,
            (&Symbol(ref x), &Symbol(ref y)) => x == y,
            (&Str(ref x), &Str(ref y)) => Rc::ptr_eq(x, y),
            (&Pair(ref x), &Pair(ref y)) => Gc::ptr_eq(x, y),
            (&Procedure(ref x), &Procedure(ref y)) => Gc::ptr_eq(x, y),
            (&Thunk(ref x), &Thunk(ref y)) => Gc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl<'a> From<&'a Value> for bool {
    fn from(v: &Value) -> bool {
        match *v {
            Value::Boolean(false) => false,
            _ => true,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Real(f)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }
}

macro_rules! simple_type {
    ($name:ident, $var:pat) => (
        pub fn $name(&self) -> bool {
            match *self {
                $var => true,
                _ => false
            }
        }
    );
    ($name:ident, $var:pat, $var2:pat) => (
        pub fn $name(&self) -> bool {
            match *self {
                $var | $var2 => true,
                _ => false
            }
        }
    )
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(shared(Pair { car, cdr }))
    }

    /// Builds a proper list
    pub fn list(values: Vec<Value>) -> Value {
        Value::list_with_tail(values, Value::Nil)
    }

    /// Builds a list ending in `tail` instead of `()`
    pub fn list_with_tail(values: Vec<Value>, tail: Value) -> Value {
        values
            .into_iter()
            .rev()
            .fold(tail, |cdr, car| Value::cons(car, cdr))
    }

    pub fn is_true(&self) -> bool {
        self.into()
    }

    simple_type!(is_nil, Value::Nil);
    simple_type!(is_unspecified, Value::Unspecified);
    simple_type!(is_pair, Value::Pair(..));
    simple_type!(is_symbol, Value::Symbol(..));
    simple_type!(is_string, Value::Str(..));
    simple_type!(is_boolean, Value::Boolean(..));
    simple_type!(is_procedure, Value::Procedure(..));
    simple_type!(is_integer, Value::Integer(..));
    simple_type!(is_number, Value::Integer(_), Value::Real(_));

    pub fn is_list(&self) -> bool {
        self.list_len().is_some()
    }

    /// Length of a proper list, `None` for anything else
    pub fn list_len(&self) -> Option<usize> {
        let mut len = 0;
        let mut current = self.clone();
        loop {
            current = match current {
                Value::Nil => return Some(len),
                Value::Pair(ref pair) => pair.borrow().cdr.clone(),
                _ => return None,
            };
            len += 1;
        }
    }

    /// The elements of a proper list, `None` for anything else
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut values = vec![];
        let mut current = self.clone();
        loop {
            current = match current {
                Value::Nil => return Some(values),
                Value::Pair(ref pair) => {
                    let pair = pair.borrow();
                    values.push(pair.car.clone());
                    pair.cdr.clone()
                }
                _ => return None,
            };
        }
    }

    pub fn pair(&self) -> Option<GcShared<Pair>> {
        match *self {
            Value::Pair(ref pair) => Some(pair.clone()),
            _ => None,
        }
    }

    pub fn car(&self) -> Option<Value> {
        self.pair().map(|pair| pair.borrow().car.clone())
    }

    pub fn cdr(&self) -> Option<Value> {
        self.pair().map(|pair| pair.borrow().cdr.clone())
    }

    pub fn symbol(&self) -> Option<&Symbol> {
        match *self {
            Value::Symbol(ref s) => Some(s),
            _ => None,
        }
    }

    /// Name used in type error messages
    pub fn type_name(&self) -> &'static str {
        match *self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Symbol(_) => "symbol",
            Value::Str(_) => "string",
            Value::Pair(_) => "pair",
            Value::Procedure(_) => "procedure",
            Value::Thunk(_) => "thunk",
            Value::Unspecified => "unspecified",
        }
    }

    /// Text written by `display`: like the printed form, but strings
    /// appear without quotes or escapes
    pub fn to_display(&self) -> String {
        match *self {
            Value::Str(ref s) => s.to_string(),
            ref other => other.to_string(),
        }
    }
}

pub trait DeepEqual {
    fn equal(&self, other: &Self) -> bool;
}

impl DeepEqual for Value {
    // Recurses on cars only; list spines are walked in a loop
    fn equal(&self, other: &Value) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        loop {
            if left == right {
                return true;
            }
            let (next_left, next_right) = match (&left, &right) {
                (&Value::Str(ref s), &Value::Str(ref s2)) => return s == s2,
                (&Value::Pair(ref pair), &Value::Pair(ref pair2)) => {
                    let borrowed = pair.borrow();
                    let borrowed2 = pair2.borrow();
                    if !borrowed.car.equal(&borrowed2.car) {
                        return false;
                    }
                    (borrowed.cdr.clone(), borrowed2.cdr.clone())
                }
                _ => return false,
            };
            left = next_left;
            right = next_right;
        }
    }
}

fn escape(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}

// Pairs being printed, from the outermost list inwards. Meeting one of them
// again means the structure is cyclic.
type Printing = Vec<*const GcCell<Pair>>;

fn write_value(f: &mut fmt::Formatter, value: &Value, printing: &mut Printing) -> fmt::Result {
    let mut pair = match *value {
        Value::Pair(ref pair) => pair.clone(),
        ref atom => return write_atom(f, atom),
    };

    let outer = printing.len();
    f.write_str("(")?;

    let result = loop {
        printing.push(&*pair as *const GcCell<Pair>);

        let (car, cdr) = {
            let borrowed = pair.borrow();
            (borrowed.car.clone(), borrowed.cdr.clone())
        };

        match car {
            Value::Pair(ref inner) if printing.contains(&(&**inner as *const _)) => {
                f.write_str("...")?
            }
            ref car => write_value(f, car, printing)?,
        }

        match cdr {
            Value::Nil => break Ok(()),
            Value::Pair(ref next) if printing.contains(&(&**next as *const _)) => {
                break f.write_str(" . ...");
            }
            Value::Pair(next) => {
                f.write_str(" ")?;
                pair = next;
            }
            tail => {
                f.write_str(" . ")?;
                break write_value(f, &tail, printing);
            }
        }
    };

    printing.truncate(outer);
    result?;
    f.write_str(")")
}

fn write_atom(f: &mut fmt::Formatter, value: &Value) -> fmt::Result {
    match *value {
        Value::Nil => f.write_str("()"),
        Value::Boolean(b) => f.write_str(if b { "#t" } else { "#f" }),
        Value::Integer(n) => write!(f, "{}", n),
        Value::Real(r) => write!(f, "{:?}", r),
        Value::Symbol(ref s) => write!(f, "{}", s),
        Value::Str(ref s) => write!(f, "\"{}\"", escape(s)),
        Value::Procedure(ref procedure) => write!(f, "{}", procedure),
        Value::Thunk(_) => f.write_str("#[thunk]"),
        Value::Unspecified => f.write_str("okay"),
        Value::Pair(_) => write_value(f, value, &mut vec![]),
    }
}

/// The printed (REPL) representation. Cyclic structure is cut short with
/// `...`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_value(f, self, &mut vec![])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vm::SymbolTable;

    fn ints(ns: &[i64]) -> Value {
        Value::list(ns.iter().map(|&n| Value::Integer(n)).collect())
    }

    #[test]
    fn only_false_is_false() {
        assert!(!Value::Boolean(false).is_true());
        assert!(Value::Boolean(true).is_true());
        assert!(Value::Integer(0).is_true());
        assert!(Value::from("").is_true());
        assert!(Value::Nil.is_true());
        assert!(Value::Unspecified.is_true());
    }

    #[test]
    fn proper_lists() {
        let list = ints(&[1, 2, 3]);
        assert!(list.is_list());
        assert_eq!(list.list_len(), Some(3));
        assert_eq!(list.to_vec().map(|v| v.len()), Some(3));
        assert!(Value::Nil.is_list());
        assert_eq!(Value::Nil.list_len(), Some(0));
    }

    #[test]
    fn dotted_pairs_are_not_lists() {
        let dotted = Value::cons(Value::Integer(1), Value::Integer(2));
        assert!(!dotted.is_list());
        assert_eq!(dotted.to_vec(), None);
        assert_eq!(dotted.cdr(), Some(Value::Integer(2)));
    }

    #[test]
    fn printing() {
        let symbols = SymbolTable::new();
        assert_eq!(ints(&[1, 2, 3]).to_string(), "(1 2 3)");
        assert_eq!(ints(&[]).to_string(), "()");
        assert_eq!(
            Value::list_with_tail(vec![Value::Integer(1), Value::Integer(2)], Value::Integer(3))
                .to_string(),
            "(1 2 . 3)"
        );
        let nested = Value::list(vec![
            Value::Symbol(symbols.intern("a")),
            ints(&[1]),
            Value::from("s\"q"),
        ]);
        assert_eq!(nested.to_string(), "(a (1) \"s\\\"q\")");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Real(314.0).to_string(), "314.0");
        assert_eq!(Value::Boolean(false).to_string(), "#f");
    }

    #[test]
    fn display_strips_quotes() {
        assert_eq!(Value::from("hi there").to_display(), "hi there");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
    }

    #[test]
    fn eqv_and_equal() {
        let a = ints(&[1, 2]);
        let b = ints(&[1, 2]);
        assert!(a != b);
        assert!(a == a.clone());
        assert!(a.equal(&b));
        assert!(Value::from("x").equal(&Value::from("x")));
        assert!(Value::from("x") != Value::from("x"));
        assert!(Value::Integer(1) != Value::Real(1.0));
    }

    // The collector marks lists recursively, so building them needs the room
    #[test]
    fn equal_on_long_lists() {
        let child = std::thread::Builder::new()
            .stack_size(128 * 1024 * 1024)
            .spawn(|| {
                let long: Vec<i64> = (0..50_000).collect();
                assert!(ints(&long).equal(&ints(&long)));

                let mut other = long.clone();
                other[49_999] = -1;
                assert!(!ints(&long).equal(&ints(&other)));
            })
            .unwrap();
        child.join().unwrap();
    }

    #[test]
    fn printing_cycles() {
        let p = ints(&[1, 2]);
        if let Value::Pair(ref second) = p.cdr().unwrap() {
            second.borrow_mut().cdr = p.clone();
        }
        assert_eq!(p.to_string(), "(1 2 . ...)");

        let q = ints(&[1]);
        if let Value::Pair(ref pair) = q {
            pair.borrow_mut().car = q.clone();
        }
        assert_eq!(q.to_string(), "(...)");

        let shared = ints(&[7]);
        let twice = Value::list(vec![shared.clone(), shared]);
        assert_eq!(twice.to_string(), "((7) (7))");
    }
}
