//! Convert lines of text into tokens
use fallible_iterator::FallibleIterator;

#[macro_use]
mod macros;

mod chars;
mod token;

#[cfg(test)]
mod token_test;

use self::chars::Chars;
use self::token::next_token;
pub use self::token::{is_symbol_char, Token, TokenErrorClass, TokenizerError};

/// The tokens of a single line
pub struct Tokens {
    source: Chars,
    line: usize,
}

impl Tokens {
    /// `line` is only used to locate diagnostics
    pub fn new(source: &str, line: usize) -> Tokens {
        Tokens {
            source: Chars::from_str(source),
            line,
        }
    }
}

/// Errors are reported after the offending text has been consumed, so the
/// stream can be resumed after a recoverable one.
impl FallibleIterator for Tokens {
    type Item = Token;
    type Error = TokenizerError;

    fn next(&mut self) -> Result<Option<Token>, TokenizerError> {
        next_token(&mut self.source, self.line)
    }
}

/// Tokenizes a whole line, skipping (and returning) recoverable diagnostics.
/// Fails on the first unrecoverable error.
pub fn tokenize_line(
    source: &str,
    line: usize,
) -> Result<(Vec<Token>, Vec<TokenizerError>), TokenizerError> {
    let mut tokens = Tokens::new(source, line);
    let mut result = vec![];
    let mut diagnostics = vec![];

    loop {
        match tokens.next() {
            Ok(Some(token)) => result.push(token),
            Ok(None) => break,
            Err(e) => {
                if !e.is_recoverable() {
                    return Err(e);
                }
                warn!("{}", e);
                diagnostics.push(e);
            }
        }
    }

    Ok((result, diagnostics))
}
