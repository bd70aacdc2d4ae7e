use std::error::Error;
use std::fmt;

use super::chars::Chars;

/**
    Tokenizer

    Works one line at a time. Classification order for the next token:
    comment, whitespace, single-character delimiters, `#` literals,
    unquote markers, strings and finally a generic run of symbol or
    number characters, which extends up to the next delimiter.

    A run that starts like a number but is neither an integer nor a
    float is only accepted if it is made of symbol characters. Anything
    else is an invalid token: it is consumed and reported, and the
    stream stays usable.
*/

/// A Scheme token
#[derive(Clone, PartialEq, Debug)]
pub enum Token {
    Open,
    Close,
    SingleQuote,
    BackQuote,
    Comma,
    CommaAt,
    Dot,
    Nil,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerError {
    pub error: TokenErrorClass,
    pub line: usize,
    pub column: usize,
    pub text: String,
}

/// The possible errors while tokenizing the input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenErrorClass {
    InvalidToken,
    UnclosedString,
}

impl TokenizerError {
    /// Invalid tokens are skipped; an unclosed string loses the rest of the line
    pub fn is_recoverable(&self) -> bool {
        self.error == TokenErrorClass::InvalidToken
    }
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let what = match self.error {
            TokenErrorClass::InvalidToken => "invalid token",
            TokenErrorClass::UnclosedString => "unclosed string",
        };
        write!(
            fmt,
            "{} {:?} at line {}, column {}",
            what,
            self.text,
            self.line,
            self.column + 1
        )
    }
}

impl Error for TokenizerError {}

macro_rules! tok_ret {
    ($value:expr; advance $stream:ident; $amount:expr) => ({
        $stream.advance($amount);
        return Ok(Some($value))
    });
}

pub fn next_token(stream: &mut Chars, line: usize) -> Result<Option<Token>, TokenizerError> {
    loop {
        let c = match stream.peek(0) {
            Some(c) => c,
            None => return Ok(None),
        };

        if c == ';' {
            stream.skip_line();
            return Ok(None);
        }

        if is_whitespace!(c) {
            stream.advance(1);
            continue;
        }

        let start = stream.pos();
        let fail = |error: TokenErrorClass, text: String| TokenizerError {
            error,
            line,
            column: start,
            text,
        };

        match c {
            '(' => tok_ret!(Token::Open; advance stream; 1),
            ')' => tok_ret!(Token::Close; advance stream; 1),
            '\'' => tok_ret!(Token::SingleQuote; advance stream; 1),
            '`' => tok_ret!(Token::BackQuote; advance stream; 1),
            '#' => {
                let run = read_run(stream);
                return match &run.to_ascii_lowercase()[..] {
                    "#t" | "#true" => ok_some!(Token::Boolean(true)),
                    "#f" | "#false" => ok_some!(Token::Boolean(false)),
                    _ => Err(fail(TokenErrorClass::InvalidToken, run)),
                };
            }
            ',' => match stream.peek(1) {
                Some('@') => tok_ret!(Token::CommaAt; advance stream; 2),
                _ => tok_ret!(Token::Comma; advance stream; 1),
            },
            '"' => {
                stream.advance(1);
                return match read_string(stream) {
                    Ok(s) => ok_some!(Token::String(s)),
                    Err(partial) => Err(fail(TokenErrorClass::UnclosedString, partial)),
                };
            }
            _ => {
                let run = read_run(stream);
                return classify_run(run)
                    .map(Some)
                    .map_err(|run| fail(TokenErrorClass::InvalidToken, run));
            }
        }
    }
}

// Consumes characters up to (not including) the next delimiter
fn read_run(stream: &mut Chars) -> String {
    let mut run = String::new();
    run.extend(stream.next());
    while !is_delimiter!(stream.peek(0)) {
        run.extend(stream.next());
    }
    run
}

// Assumes the opening quote has been consumed. Err carries what was read
// before the line ended.
fn read_string(stream: &mut Chars) -> Result<String, String> {
    let mut string_buf = String::new();

    loop {
        let c = match stream.next() {
            Some(c) => c,
            None => return Err(string_buf),
        };
        match c {
            '"' => return Ok(string_buf),
            '\\' => match stream.next() {
                None => return Err(string_buf),
                Some(escaped) => match escaped {
                    'n' => string_buf.push('\n'),
                    't' => string_buf.push('\t'),
                    'r' => string_buf.push('\r'),
                    '0' => string_buf.push('\0'),
                    '\\' => string_buf.push('\\'),
                    '"' => string_buf.push('"'),
                    '\'' => string_buf.push('\''),
                    other => {
                        string_buf.push('\\');
                        string_buf.push(other);
                    }
                },
            },
            c => string_buf.push(c),
        }
    }
}

fn classify_run(run: String) -> Result<Token, String> {
    if run == "." {
        return Ok(Token::Dot);
    }

    if run.eq_ignore_ascii_case("nil") {
        return Ok(Token::Nil);
    }

    let first = run.chars().next().unwrap_or(' ');

    if is_numeral_start(first) {
        if let Ok(n) = run.parse::<i64>() {
            return Ok(Token::Integer(n));
        }
        if let Ok(f) = run.parse::<f64>() {
            return Ok(Token::Real(f));
        }
    }

    if run.chars().all(is_symbol_char) {
        Ok(Token::Symbol(run))
    } else {
        Err(run)
    }
}

#[inline]
fn is_numeral_start(c: char) -> bool {
    is_digit!(c) || c == '+' || c == '-' || c == '.'
}

#[inline]
pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_special_subsequent(c)
}

#[inline]
fn is_special_subsequent(c: char) -> bool {
    match c {
        '!' | '$' | '%' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '^' | '_' | '~' => true,
        '+' | '-' | '.' | '@' => true,
        _ => false,
    }
}
