use fallible_iterator::FallibleIterator;

use super::*;

fn assert_next(code: &str, token: Token) {
    let result = Tokens::new(code, 1).next().ok().unwrap().unwrap();
    assert_eq!(result, token);
}

fn assert_tokens(code: &str, tokens: Vec<Token>) {
    let (result, diagnostics) = tokenize_line(code, 1).expect("valid line");
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    assert_eq!(result, tokens);
}

fn symbol(s: &str) -> Token {
    Token::Symbol(s.to_string())
}

#[test]
fn whitespace_test() {
    assert_next(" (", Token::Open);
    assert_next("\t  (", Token::Open);
}

#[test]
fn clopen_test() {
    assert_next("(asdd", Token::Open);
    assert_next(")#t", Token::Close);
}

#[test]
fn booleans_test() {
    assert_next("#t 13", Token::Boolean(true));
    assert_next("#T(1)", Token::Boolean(true));
    assert_next("#F 4t8i90", Token::Boolean(false));
    assert_next("#false)", Token::Boolean(false));
}

#[test]
fn invalid_pound_test() {
    let err = Tokens::new("#x1F", 3).next().unwrap_err();
    assert_eq!(err.error, TokenErrorClass::InvalidToken);
    assert_eq!(err.line, 3);
    assert_eq!(err.text, "#x1F");
}

#[test]
fn strings_test() {
    assert_next("\"asdf\"", Token::String("asdf".to_string()));
    assert_next("\"foo\\\"#bar\"", Token::String("foo\"#bar".to_string()));
    assert_next("\"foo bar\"", Token::String("foo bar".to_string()));
    assert_next("\"a\\nb\\tc\"", Token::String("a\nb\tc".to_string()));
    assert_next("\"a\\qb\"", Token::String("a\\qb".to_string()));
    assert_next("\"(not a list)\"", Token::String("(not a list)".to_string()));
}

#[test]
fn unclosed_string_test() {
    let err = tokenize_line("(display \"abc", 1).unwrap_err();
    assert_eq!(err.error, TokenErrorClass::UnclosedString);
    assert!(!err.is_recoverable());
}

#[test]
fn quotes_test() {
    assert_next("'.(#24@", Token::SingleQuote);
    assert_next("`(a)", Token::BackQuote);
    assert_next(",(a)", Token::Comma);
    assert_next(",@(a)", Token::CommaAt);
}

#[test]
fn dot_test() {
    assert_tokens("(a . b)", vec![Token::Open, symbol("a"), Token::Dot, symbol("b"), Token::Close]);
    assert_tokens("...", vec![symbol("...")]);
}

#[test]
fn numbers_test() {
    assert_next("42", Token::Integer(42));
    assert_next("-7)", Token::Integer(-7));
    assert_next("+3", Token::Integer(3));
    assert_next("3.25", Token::Real(3.25));
    assert_next(".5", Token::Real(0.5));
    assert_next("1e3", Token::Real(1000.0));
}

#[test]
fn number_like_symbols_test() {
    assert_next("+", symbol("+"));
    assert_next("-", symbol("-"));
    assert_next("1+", symbol("1+"));
    assert_next("->x", symbol("->x"));
}

#[test]
fn nil_test() {
    assert_next("nil", Token::Nil);
    assert_next("NIL", Token::Nil);
    assert_next("nils", symbol("nils"));
}

#[test]
fn case_is_preserved_test() {
    assert_next("FooBar", symbol("FooBar"));
}

#[test]
fn comment_test() {
    assert_tokens("; nothing here", vec![]);
    assert_tokens("(+ 1 2) ; sum", vec![
        Token::Open,
        symbol("+"),
        Token::Integer(1),
        Token::Integer(2),
        Token::Close,
    ]);
    assert_tokens("a;b", vec![symbol("a")]);
}

#[test]
fn expression_test() {
    assert_tokens(
        "(* (+ 1 2) (- 3 4))",
        vec![
            Token::Open,
            symbol("*"),
            Token::Open,
            symbol("+"),
            Token::Integer(1),
            Token::Integer(2),
            Token::Close,
            Token::Open,
            symbol("-"),
            Token::Integer(3),
            Token::Integer(4),
            Token::Close,
            Token::Close,
        ],
    );
}

#[test]
fn invalid_token_is_skipped_test() {
    let (tokens, diagnostics) = tokenize_line("(a {b} c)", 7).expect("recoverable");
    assert_eq!(tokens, vec![Token::Open, symbol("a"), symbol("c"), Token::Close]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].text, "{b}");
    assert_eq!(diagnostics[0].line, 7);
    assert_eq!(diagnostics[0].column, 3);
}

#[test]
fn stream_resumes_after_error_test() {
    let mut tokens = Tokens::new("#q 5", 1);
    assert!(tokens.next().is_err());
    assert_eq!(tokens.next(), Ok(Some(Token::Integer(5))));
    assert_eq!(tokens.next(), Ok(None));
}
