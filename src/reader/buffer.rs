use std::collections::VecDeque;

use super::ReaderError;
use crate::lexer::{tokenize_line, Token, TokenizerError};

/// Where the reader gets its tokens from
pub trait TokenSource {
    /// The next token, without consuming it. `None` at end of input.
    fn peek(&mut self) -> Result<Option<&Token>, ReaderError>;
    fn pop(&mut self) -> Result<Option<Token>, ReaderError>;
}

impl TokenSource for VecDeque<Token> {
    fn peek(&mut self) -> Result<Option<&Token>, ReaderError> {
        Ok(self.front())
    }

    fn pop(&mut self) -> Result<Option<Token>, ReaderError> {
        Ok(self.pop_front())
    }
}

/// Tokens spread across lines. Lines are only pulled from the underlying
/// iterator when the tokens of the current one are exhausted.
pub struct Buffer<L> {
    lines: L,
    tokens: VecDeque<Token>,
    line: usize,
    diagnostics: Vec<TokenizerError>,
}

impl<L: Iterator<Item = String>> Buffer<L> {
    pub fn new(lines: L) -> Buffer<L> {
        Buffer {
            lines,
            tokens: VecDeque::new(),
            line: 0,
            diagnostics: vec![],
        }
    }

    // false at end of input
    fn fill(&mut self) -> Result<bool, ReaderError> {
        while self.tokens.is_empty() {
            let text = match self.lines.next() {
                Some(text) => text,
                None => return Ok(false),
            };
            self.line += 1;

            let (tokens, diagnostics) = tokenize_line(&text, self.line)?;
            self.tokens.extend(tokens);
            self.diagnostics.extend(diagnostics);
        }

        Ok(true)
    }

    /// Whether tokens of the last pulled line are still pending
    pub fn more_on_line(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// Drops whatever is left of the current line
    pub fn discard_line(&mut self) {
        self.tokens.clear();
    }

    /// Number of lines pulled so far
    pub fn line(&self) -> usize {
        self.line
    }

    /// Recoverable tokenizer errors seen since the last call
    pub fn take_diagnostics(&mut self) -> Vec<TokenizerError> {
        self.diagnostics.drain(..).collect()
    }
}

impl<L: Iterator<Item = String>> TokenSource for Buffer<L> {
    fn peek(&mut self) -> Result<Option<&Token>, ReaderError> {
        if self.fill()? {
            Ok(self.tokens.front())
        } else {
            Ok(None)
        }
    }

    fn pop(&mut self) -> Result<Option<Token>, ReaderError> {
        if self.fill()? {
            Ok(self.tokens.pop_front())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(text: &[&str]) -> Buffer<::std::vec::IntoIter<String>> {
        Buffer::new(text.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter())
    }

    #[test]
    fn pulls_lines_lazily() {
        let mut buffer = lines(&["(+", "", "; nothing here", "1)"]);
        assert_eq!(buffer.pop(), Ok(Some(Token::Open)));
        assert!(buffer.more_on_line());
        assert_eq!(buffer.pop(), Ok(Some(Token::Symbol("+".into()))));
        assert!(!buffer.more_on_line());
        assert_eq!(buffer.line(), 1);
        assert_eq!(buffer.peek(), Ok(Some(&Token::Integer(1))));
        assert_eq!(buffer.line(), 4);
        assert_eq!(buffer.pop(), Ok(Some(Token::Integer(1))));
        assert_eq!(buffer.pop(), Ok(Some(Token::Close)));
        assert_eq!(buffer.pop(), Ok(None));
        assert_eq!(buffer.peek(), Ok(None));
    }

    #[test]
    fn keeps_diagnostics() {
        let mut buffer = lines(&["a #z b"]);
        assert_eq!(buffer.pop(), Ok(Some(Token::Symbol("a".into()))));
        assert_eq!(buffer.pop(), Ok(Some(Token::Symbol("b".into()))));
        let diagnostics = buffer.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].line, 1);
        assert!(buffer.take_diagnostics().is_empty());
    }

    #[test]
    fn unclosed_string() {
        let mut buffer = lines(&["\"abc"]);
        match buffer.pop() {
            Err(ReaderError::Tokenizer(ref e)) => assert!(!e.is_recoverable()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn discard_line() {
        let mut buffer = lines(&["a b c", "d"]);
        assert_eq!(buffer.pop(), Ok(Some(Token::Symbol("a".into()))));
        buffer.discard_line();
        assert_eq!(buffer.pop(), Ok(Some(Token::Symbol("d".into()))));
    }

    #[test]
    fn token_queue() {
        let mut tokens = vec_deque![Token::Open, Token::Close];
        assert_eq!(tokens.peek(), Ok(Some(&Token::Open)));
        assert_eq!(tokens.pop(), Ok(Some(Token::Open)));
        assert_eq!(tokens.pop(), Ok(Some(Token::Close)));
        assert_eq!(tokens.pop(), Ok(None));
    }
}
