use gc::{Finalize, Trace};
use std::collections::{hash_map, HashMap};
use std::fmt::{Debug, Error as FmtError, Formatter};

use super::gc::{shared, GcShared};
use super::symbol::Symbol;
use super::value::Value;
use super::ExecutionError;

/// A frame of bindings. Only the global frame has no parent.
pub struct Environment {
    pub(super) parent: Option<GcShared<Environment>>,
    pub(super) bindings: HashMap<Symbol, Value>,
}

impl Default for Environment {
    fn default() -> Environment {
        Environment {
            parent: None,
            bindings: HashMap::new(),
        }
    }
}

#[derive(Debug)]
struct FmtEnvironment<'a> {
    parent: Option<&'a GcShared<Environment>>,
    bindings: hash_map::Keys<'a, Symbol, Value>,
}

impl Debug for Environment {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), FmtError> {
        FmtEnvironment {
            parent: self.parent.as_ref(),
            bindings: self.bindings.keys(),
        }
        .fmt(fmt)
    }
}

impl Finalize for Environment {}
unsafe impl Trace for Environment {
    custom_trace!(this, {
        if let Some(ref env) = this.parent {
            mark(env);
        }
        for v in this.bindings.values() {
            mark(v);
        }
    });
}

impl Environment {
    pub fn child(parent: &GcShared<Environment>) -> Environment {
        Environment {
            parent: Some(parent.clone()),
            bindings: HashMap::new(),
        }
    }

    /// Binds in this frame only
    pub fn define(&mut self, name: Symbol, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }
}

/// An empty global frame
pub fn null_env() -> GcShared<Environment> {
    shared(Environment::default())
}

/// Finds the nearest binding of `name`, walking up from `environment`
pub fn lookup(environment: &GcShared<Environment>, name: &Symbol) -> Result<Value, ExecutionError> {
    let mut env = environment.clone();
    loop {
        env = {
            let borrowed = env.borrow();
            if let Some(value) = borrowed.bindings.get(name) {
                return Ok(value.clone());
            }
            match borrowed.parent {
                Some(ref parent) => parent.clone(),
                None => return Err(ExecutionError::UnboundVar(name.to_string())),
            }
        }
    }
}

/// Inserts or overwrites `name` in `environment` itself, never in a parent
pub fn define(environment: &GcShared<Environment>, name: Symbol, value: Value) {
    environment.borrow_mut().define(name, value);
}

/// Mutates the nearest existing binding of `name`
pub fn set(
    environment: &GcShared<Environment>,
    name: &Symbol,
    value: Value,
) -> Result<(), ExecutionError> {
    let mut env = environment.clone();
    loop {
        env = {
            let mut envref = env.borrow_mut();
            if let Some(slot) = envref.bindings.get_mut(name) {
                *slot = value;
                return Ok(());
            }
            match envref.parent {
                Some(ref parent) => parent.clone(),
                None => return Err(ExecutionError::UnboundVar(name.to_string())),
            }
        }
    }
}

/// The root of the chain
pub fn global_frame(environment: &GcShared<Environment>) -> GcShared<Environment> {
    let mut env = environment.clone();
    loop {
        let parent = match env.borrow().parent {
            Some(ref parent) => parent.clone(),
            None => break,
        };
        env = parent;
    }
    env
}

/// A child of `environment` binding each formal to its argument
pub fn make_call_frame(
    environment: &GcShared<Environment>,
    formals: &[Symbol],
    args: Vec<Value>,
) -> Result<GcShared<Environment>, ExecutionError> {
    if formals.len() != args.len() {
        return Err(ExecutionError::BadArgc {
            expected: (formals.len(), false),
            given: args.len(),
        });
    }

    let mut frame = Environment::child(environment);

    for (name, arg) in formals.iter().zip(args.into_iter()) {
        if frame.bindings.contains_key(name) {
            return Err(ExecutionError::DuplicateParameter(name.to_string()));
        }
        frame.define(name.clone(), arg);
    }

    trace!("call frame {:?}", frame);

    Ok(shared(frame))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vm::SymbolTable;

    #[test]
    fn lookup_walks_parents() {
        let symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let global = null_env();
        define(&global, x.clone(), Value::Integer(1));
        let child = shared(Environment::child(&global));
        assert_eq!(lookup(&child, &x), Ok(Value::Integer(1)));
    }

    #[test]
    fn lookup_unbound() {
        let symbols = SymbolTable::new();
        let global = null_env();
        assert_eq!(
            lookup(&global, &symbols.intern("nope")),
            Err(ExecutionError::UnboundVar("nope".into()))
        );
    }

    #[test]
    fn define_shadows_without_touching_parent() {
        let symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let global = null_env();
        define(&global, x.clone(), Value::Integer(1));
        let child = shared(Environment::child(&global));
        define(&child, x.clone(), Value::Integer(2));
        assert_eq!(lookup(&child, &x), Ok(Value::Integer(2)));
        assert_eq!(lookup(&global, &x), Ok(Value::Integer(1)));
    }

    #[test]
    fn set_mutates_nearest_binding() {
        let symbols = SymbolTable::new();
        let x = symbols.intern("x");
        let global = null_env();
        define(&global, x.clone(), Value::Integer(1));
        let child = shared(Environment::child(&global));
        assert_eq!(set(&child, &x, Value::Integer(5)), Ok(()));
        assert_eq!(lookup(&global, &x), Ok(Value::Integer(5)));
        assert!(child.borrow().bindings.is_empty());
    }

    #[test]
    fn set_requires_existing_binding() {
        let symbols = SymbolTable::new();
        let global = null_env();
        let child = shared(Environment::child(&global));
        assert_eq!(
            set(&child, &symbols.intern("y"), Value::Nil),
            Err(ExecutionError::UnboundVar("y".into()))
        );
    }

    #[test]
    fn call_frame_binds_formals() {
        let symbols = SymbolTable::new();
        let (a, b) = (symbols.intern("a"), symbols.intern("b"));
        let global = null_env();
        let args = vec![Value::Integer(1), Value::Integer(2)];
        let frame = make_call_frame(&global, &[a.clone(), b.clone()], args)
            .expect("valid frame");
        assert_eq!(lookup(&frame, &b), Ok(Value::Integer(2)));
        assert!(global_frame(&frame).borrow().is_global());
        assert!(!frame.borrow().is_global());
    }

    #[test]
    fn call_frame_arity() {
        let symbols = SymbolTable::new();
        let a = symbols.intern("a");
        let global = null_env();
        assert_eq!(
            make_call_frame(&global, &[a], vec![]).map(|_| ()),
            Err(ExecutionError::BadArgc {
                expected: (1, false),
                given: 0
            })
        );
    }

    #[test]
    fn call_frame_duplicates() {
        let symbols = SymbolTable::new();
        let a = symbols.intern("a");
        let global = null_env();
        assert_eq!(
            make_call_frame(&global, &[a.clone(), a], vec![Value::Nil, Value::Nil]).map(|_| ()),
            Err(ExecutionError::DuplicateParameter("a".into()))
        );
    }
}
