//! Convert tokens into values
use fallible_iterator::FallibleIterator;
use std::error::Error;
use std::fmt;

mod buffer;

#[cfg(test)]
mod test;

pub use self::buffer::{Buffer, TokenSource};
use crate::lexer::{Token, TokenizerError};
use crate::vm::{Symbol, SymbolTable, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// The input ended in the middle of an expression
    UnexpectedEof,
    UnexpectedClose,
    /// A dot outside of a list, or at its start
    UnexpectedDot,
    /// Anything but exactly one expression after a dot
    BadDottedPair,
    Tokenizer(TokenizerError),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReaderError::UnexpectedEof => f.write_str("unexpected end of input"),
            ReaderError::UnexpectedClose => f.write_str("unexpected )"),
            ReaderError::UnexpectedDot => f.write_str("unexpected ."),
            ReaderError::BadDottedPair => f.write_str("expected exactly one expression after ."),
            ReaderError::Tokenizer(ref e) => write!(f, "{}", e),
        }
    }
}

impl Error for ReaderError {}

impl From<TokenizerError> for ReaderError {
    fn from(e: TokenizerError) -> ReaderError {
        ReaderError::Tokenizer(e)
    }
}

// A list whose closing paren has not been read yet
struct OpenList {
    items: Vec<Value>,
    dotted: bool,
    tail: Option<Value>,
}

impl OpenList {
    fn push(&mut self, value: Value) -> Result<(), ReaderError> {
        if !self.dotted {
            self.items.push(value);
            return Ok(());
        }

        check!(self.tail.is_none(), ReaderError::BadDottedPair);
        self.tail = Some(value);
        Ok(())
    }

    fn dot(&mut self) -> Result<(), ReaderError> {
        check!(!self.items.is_empty(), ReaderError::UnexpectedDot);
        check!(!self.dotted, ReaderError::BadDottedPair);
        self.dotted = true;
        Ok(())
    }

    fn close(self) -> Result<Value, ReaderError> {
        check!(!self.dotted || self.tail.is_some(), ReaderError::BadDottedPair);
        Ok(Value::list_with_tail(self.items, self.tail.unwrap_or(Value::Nil)))
    }
}

enum Partial {
    List(OpenList),
    /// `'x`, `` `x``, `,x` or `,@x` waiting for its `x`
    Abbreviation(Symbol),
}

/// Reads one expression. Reading does not recurse on nesting, but the
/// collector marks pairs recursively, so very deep or very long lists are
/// still limited by the host stack.
pub fn read<T: TokenSource>(source: &mut T, symbols: &SymbolTable) -> Result<Value, ReaderError> {
    let mut stack: Vec<Partial> = vec![];

    loop {
        let token = source.pop()?.ok_or(ReaderError::UnexpectedEof)?;
        trace!("read {:?}", token);

        let mut value = match token {
            Token::Open => {
                stack.push(Partial::List(OpenList {
                    items: vec![],
                    dotted: false,
                    tail: None,
                }));
                continue;
            }
            Token::SingleQuote | Token::BackQuote | Token::Comma | Token::CommaAt => {
                let keyword = match token {
                    Token::SingleQuote => "quote",
                    Token::BackQuote => "quasiquote",
                    Token::Comma => "unquote",
                    _ => "unquote-splicing",
                };
                stack.push(Partial::Abbreviation(symbols.intern(keyword)));
                continue;
            }
            Token::Dot => {
                match stack.last_mut() {
                    Some(&mut Partial::List(ref mut list)) => list.dot()?,
                    _ => return Err(ReaderError::UnexpectedDot),
                }
                continue;
            }
            Token::Close => match stack.pop() {
                Some(Partial::List(list)) => list.close()?,
                _ => return Err(ReaderError::UnexpectedClose),
            },
            Token::Nil => Value::Nil,
            Token::Boolean(b) => Value::Boolean(b),
            Token::Integer(n) => Value::Integer(n),
            Token::Real(r) => Value::Real(r),
            Token::String(s) => Value::from(&s[..]),
            Token::Symbol(name) => Value::Symbol(symbols.intern(&name)),
        };

        // Hand the finished value to whatever is waiting for it
        loop {
            match stack.last_mut() {
                None => return Ok(value),
                Some(&mut Partial::List(ref mut list)) => {
                    list.push(value)?;
                    break;
                }
                Some(&mut Partial::Abbreviation(_)) => {}
            }

            if let Some(Partial::Abbreviation(keyword)) = stack.pop() {
                value = Value::list(vec![Value::Symbol(keyword), value]);
            }
        }
    }
}

/// The expressions of a token source, one at a time
pub struct Datums<T> {
    source: T,
    symbols: SymbolTable,
}

impl<T: TokenSource> Datums<T> {
    pub fn new(source: T, symbols: SymbolTable) -> Datums<T> {
        Datums { source, symbols }
    }

    pub fn source_mut(&mut self) -> &mut T {
        &mut self.source
    }
}

impl<T: TokenSource> FallibleIterator for Datums<T> {
    type Item = Value;
    type Error = ReaderError;

    fn next(&mut self) -> Result<Option<Value>, ReaderError> {
        if self.source.peek()?.is_none() {
            return Ok(None);
        }

        read(&mut self.source, &self.symbols).map(Some)
    }
}
