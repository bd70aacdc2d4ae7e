use gc::Gc;

use super::environment::{define, make_call_frame, set, Environment};
use super::gc::GcShared;
use super::keywords::SpecialForm;
use super::procedure::{Closure, Procedure};
use super::symbol::Symbol;
use super::value::Value;
use super::{Evaluator, ExecutionError, Outcome};

macro_rules! bad_syntax {
    ($($arg:tt)*) => (Err(ExecutionError::BadSyntax(format!($($arg)*))))
}

fn check_operands(
    keyword: &str,
    operands: &[Value],
    min: usize,
    max: Option<usize>,
) -> Result<(), ExecutionError> {
    let given = operands.len();
    let too_many = max.map(|max| given > max).unwrap_or(false);

    if given < min || too_many {
        return bad_syntax!("{}: wrong number of operands ({})", keyword, given);
    }

    Ok(())
}

impl Evaluator {
    /// Runs a special form. Subexpressions in tail position are handed back
    /// to the trampoline instead of being evaluated here.
    pub(super) fn special_form(
        &self,
        form: SpecialForm,
        operands: Vec<Value>,
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        trace!("special form {:?}", form);

        match form {
            SpecialForm::Quote => {
                check_operands("quote", &operands, 1, Some(1))?;
                Ok(Outcome::Value(operands[0].clone()))
            }
            SpecialForm::If => self.if_form(&operands, environment),
            SpecialForm::Define => self.define_form(&operands, environment),
            SpecialForm::SetBang => self.set_form(&operands, environment),
            SpecialForm::Lambda => {
                check_operands("lambda", &operands, 2, None)?;
                let closure = self.make_closure(&operands[0], &operands[1..], environment)?;
                Ok(Outcome::Value(Value::Procedure(Gc::new(Procedure::Lambda(closure)))))
            }
            SpecialForm::Nu => {
                check_operands("nu", &operands, 2, None)?;
                let closure = self.make_closure(&operands[0], &operands[1..], environment)?;
                Ok(Outcome::Value(Value::Procedure(Gc::new(Procedure::CallByName(closure)))))
            }
            SpecialForm::Begin => self.sequence(&operands, environment),
            SpecialForm::Let => self.let_form(&operands, environment),
            SpecialForm::And => self.and_form(&operands, environment),
            SpecialForm::Or => self.or_form(&operands, environment),
            SpecialForm::Cond => self.cond_form(&operands, environment),
            SpecialForm::Quasiquote => {
                check_operands("quasiquote", &operands, 1, Some(1))?;
                self.quasiquote(&operands[0], 1, environment).map(Outcome::Value)
            }
            SpecialForm::Unquote => bad_syntax!("unquote outside of quasiquote"),
        }
    }

    /// Evaluates all but the last expression for effect; the last one
    /// continues in tail position
    fn sequence(
        &self,
        body: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        let (last, init) = match body.split_last() {
            Some(split) => split,
            None => return Ok(Outcome::Value(Value::Unspecified)),
        };

        for expression in init {
            self.eval(expression, environment)?;
        }

        Ok(Outcome::TailCall(last.clone(), environment.clone()))
    }

    fn if_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        check_operands("if", operands, 2, Some(3))?;

        let test = self.eval(&operands[0], environment)?;

        if test.is_true() {
            Ok(Outcome::TailCall(operands[1].clone(), environment.clone()))
        } else if let Some(alternative) = operands.get(2) {
            Ok(Outcome::TailCall(alternative.clone(), environment.clone()))
        } else {
            Ok(Outcome::Value(Value::Unspecified))
        }
    }

    fn define_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        check_operands("define", operands, 2, None)?;

        match operands[0] {
            Value::Symbol(ref name) => {
                check_operands("define", operands, 2, Some(2))?;
                let value = self.eval(&operands[1], environment)?;
                define(environment, name.clone(), value);
                Ok(Outcome::Value(Value::Symbol(name.clone())))
            }
            Value::Pair(ref pair) => {
                let (name, formals) = {
                    let pair = pair.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                };
                let name = match name {
                    Value::Symbol(name) => name,
                    other => return bad_syntax!("define: cannot bind {}", other),
                };
                let closure = self.make_closure(&formals, &operands[1..], environment)?;
                let procedure = Value::Procedure(Gc::new(Procedure::Lambda(closure)));
                define(environment, name.clone(), procedure);
                Ok(Outcome::Value(Value::Symbol(name)))
            }
            ref other => bad_syntax!("define: cannot bind {}", other),
        }
    }

    fn set_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        check_operands("set!", operands, 2, Some(2))?;

        let name = match operands[0] {
            Value::Symbol(ref name) => name,
            ref other => return bad_syntax!("set!: cannot assign {}", other),
        };

        let value = self.eval(&operands[1], environment)?;
        set(environment, name, value)?;

        Ok(Outcome::Value(Value::Unspecified))
    }

    /// Shared by `lambda`, `nu` and the procedure form of `define`
    fn make_closure(
        &self,
        formals: &Value,
        body: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Closure, ExecutionError> {
        let formals = formals
            .to_vec()
            .ok_or_else(|| {
                ExecutionError::BadSyntax(format!("formals must be a proper list: {}", formals))
            })?;

        let mut names: Vec<Symbol> = Vec::with_capacity(formals.len());
        for formal in formals {
            let name = match formal {
                Value::Symbol(name) => name,
                other => return bad_syntax!("formal parameter is not a symbol: {}", other),
            };
            if names.contains(&name) {
                return Err(ExecutionError::DuplicateParameter(name.to_string()));
            }
            names.push(name);
        }

        let body = match body.len() {
            0 => return bad_syntax!("empty procedure body"),
            1 => body[0].clone(),
            _ => Value::cons(
                Value::Symbol(self.keywords.begin.clone()),
                Value::list(body.to_vec()),
            ),
        };

        Ok(Closure {
            formals: names,
            body,
            environment: environment.clone(),
        })
    }

    fn let_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        check_operands("let", operands, 2, None)?;

        let bindings = operands[0]
            .to_vec()
            .ok_or_else(|| {
                ExecutionError::BadSyntax(format!("let: malformed bindings {}", operands[0]))
            })?;

        let mut names = Vec::with_capacity(bindings.len());
        let mut values = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let (name, expression) = match binding.to_vec() {
                Some(ref parts) if parts.len() == 2 => match parts[0] {
                    Value::Symbol(ref name) => (name.clone(), parts[1].clone()),
                    _ => return bad_syntax!("let: malformed binding {}", binding),
                },
                _ => return bad_syntax!("let: malformed binding {}", binding),
            };
            values.push(self.eval(&expression, environment)?);
            names.push(name);
        }

        let frame = make_call_frame(environment, &names, values)?;

        self.sequence(&operands[1..], &frame)
    }

    fn and_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        let (last, init) = match operands.split_last() {
            Some(split) => split,
            None => return Ok(Outcome::Value(Value::Boolean(true))),
        };

        for operand in init {
            if !self.eval(operand, environment)?.is_true() {
                return Ok(Outcome::Value(Value::Boolean(false)));
            }
        }

        Ok(Outcome::TailCall(last.clone(), environment.clone()))
    }

    fn or_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        let (last, init) = match operands.split_last() {
            Some(split) => split,
            None => return Ok(Outcome::Value(Value::Boolean(false))),
        };

        for operand in init {
            if self.eval(operand, environment)?.is_true() {
                return Ok(Outcome::Value(Value::Boolean(true)));
            }
        }

        Ok(Outcome::TailCall(last.clone(), environment.clone()))
    }

    fn cond_form(
        &self,
        operands: &[Value],
        environment: &GcShared<Environment>,
    ) -> Result<Outcome, ExecutionError> {
        let mut clauses = Vec::with_capacity(operands.len());

        for (i, operand) in operands.iter().enumerate() {
            let clause = match operand.to_vec() {
                Some(ref clause) if clause.is_empty() => return bad_syntax!("cond: empty clause"),
                Some(clause) => clause,
                None => return bad_syntax!("cond: malformed clause {}", operand),
            };
            if self.is_else(&clause[0]) && i + 1 != operands.len() {
                return bad_syntax!("cond: else clause must be the last one");
            }
            clauses.push(clause);
        }

        for clause in clauses {
            if self.is_else(&clause[0]) {
                return self.sequence(&clause[1..], environment);
            }

            let test = self.eval(&clause[0], environment)?;
            if !test.is_true() {
                continue;
            }

            return match clause.get(1) {
                None => Ok(Outcome::Value(test)),
                Some(&Value::Symbol(ref arrow)) if *arrow == self.keywords.arrow => {
                    if clause.len() != 3 {
                        return bad_syntax!("cond: => expects exactly one recipient");
                    }
                    match self.eval(&clause[2], environment)? {
                        Value::Procedure(recipient) => {
                            recipient.apply(self, vec![test], environment)
                        }
                        other => Err(ExecutionError::NonCallable(other.to_string())),
                    }
                }
                Some(_) => self.sequence(&clause[1..], environment),
            };
        }

        Ok(Outcome::Value(Value::Unspecified))
    }

    fn is_else(&self, test: &Value) -> bool {
        test.symbol() == Some(&self.keywords.else_)
    }

    // (unquote x) or (unquote-splicing x) with the keyword checked by the caller
    fn unquoted_operand(&self, form: &Value) -> Result<Value, ExecutionError> {
        match form.cdr().and_then(|operands| operands.to_vec()) {
            Some(ref operands) if operands.len() == 1 => Ok(operands[0].clone()),
            _ => bad_syntax!("malformed unquote: {}", form),
        }
    }

    fn head_is(form: &Value, keyword: &Symbol) -> bool {
        form.car().map(|head| head.symbol() == Some(keyword)).unwrap_or(false)
    }

    /// Builds the structure described by `template`. `depth` counts the
    /// enclosing quasiquotes; only unquotes at depth 1 are evaluated.
    fn quasiquote(
        &self,
        template: &Value,
        depth: usize,
        environment: &GcShared<Environment>,
    ) -> Result<Value, ExecutionError> {
        if !template.is_pair() {
            return Ok(template.clone());
        }

        let keywords = &self.keywords;

        if Evaluator::head_is(template, &keywords.unquote) {
            let operand = self.unquoted_operand(template)?;
            return if depth == 1 {
                self.eval(&operand, environment)
            } else {
                let inner = self.quasiquote(&operand, depth - 1, environment)?;
                Ok(Value::list(vec![Value::Symbol(keywords.unquote.clone()), inner]))
            };
        }

        if Evaluator::head_is(template, &keywords.unquote_splicing) {
            if depth == 1 {
                return bad_syntax!("unquote-splicing outside of a list");
            }
            let operand = self.unquoted_operand(template)?;
            let inner = self.quasiquote(&operand, depth - 1, environment)?;
            return Ok(Value::list(vec![Value::Symbol(keywords.unquote_splicing.clone()), inner]));
        }

        if Evaluator::head_is(template, &keywords.quasiquote) {
            let operand = self.unquoted_operand(template)?;
            let inner = self.quasiquote(&operand, depth + 1, environment)?;
            return Ok(Value::list(vec![Value::Symbol(keywords.quasiquote.clone()), inner]));
        }

        let mut items = vec![];
        let mut current = template.clone();

        let tail = loop {
            let (element, rest) = match current {
                Value::Pair(ref pair) => {
                    let pair = pair.borrow();
                    (pair.car.clone(), pair.cdr.clone())
                }
                Value::Nil => break Value::Nil,
                ref atom => break atom.clone(),
            };

            // `(a . ,b)` reads as `(a unquote b)`
            if Evaluator::head_is(&current, &keywords.unquote) {
                break self.quasiquote(&current, depth, environment)?;
            }

            if depth == 1 && Evaluator::head_is(&element, &keywords.unquote_splicing) {
                let operand = self.unquoted_operand(&element)?;
                let spliced = self.eval(&operand, environment)?;
                let spliced = spliced.to_vec().ok_or_else(|| {
                    ExecutionError::BadArgType(format!(
                        "unquote-splicing expects a list, given {}",
                        spliced
                    ))
                })?;
                items.extend(spliced);
            } else {
                items.push(self.quasiquote(&element, depth, environment)?);
            }

            current = rest;
        };

        Ok(Value::list_with_tail(items, tail))
    }
}
