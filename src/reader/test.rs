use fallible_iterator::FallibleIterator;

use super::*;
use crate::vm::DeepEqual;

fn read_all(text: &str) -> Result<Vec<Value>, ReaderError> {
    let symbols = SymbolTable::new();
    let lines = text.lines().map(String::from).collect::<Vec<_>>();
    Datums::new(Buffer::new(lines.into_iter()), symbols).collect()
}

fn read_one(text: &str) -> Result<Value, ReaderError> {
    let mut values = read_all(text)?;
    assert_eq!(values.len(), 1, "expected a single expression in {:?}", text);
    Ok(values.remove(0))
}

fn printed(text: &str) -> String {
    read_one(text).expect("valid expression").to_string()
}

#[test]
fn atoms() {
    assert_eq!(read_one("42"), Ok(Value::Integer(42)));
    assert_eq!(read_one("-1.5"), Ok(Value::Real(-1.5)));
    assert_eq!(read_one("#t"), Ok(Value::Boolean(true)));
    assert_eq!(read_one("nil"), Ok(Value::Nil));
    assert!(read_one("\"a\\nb\"").expect("string").equal(&Value::from("a\nb")));
    assert_eq!(printed("Hello"), "hello");
}

#[test]
fn symbols_are_interned() {
    let symbols = SymbolTable::new();
    let mut tokens = vec_deque![
        Token::Open,
        Token::Symbol("a".into()),
        Token::Symbol("A".into()),
        Token::Close
    ];
    let list = read(&mut tokens, &symbols).expect("valid list");
    let items = list.to_vec().expect("proper list");
    assert_eq!(items[0], items[1]);
    assert_eq!(items[0], Value::Symbol(symbols.intern("a")));
}

#[test]
fn lists_round_trip() {
    let texts = [
        "()",
        "(1 2 3)",
        "(1 (2 (3 ())) \"s\")",
        "(a . b)",
        "(1 2 . 3)",
        "((a b) (c d))",
    ];
    for text in &texts {
        assert_eq!(&printed(text), text);
    }
}

#[test]
fn dotted_list_normalizes() {
    assert_eq!(printed("(1 . (2 . (3 . ())))"), "(1 2 3)");
}

#[test]
fn abbreviations() {
    assert_eq!(printed("'a"), "(quote a)");
    assert_eq!(printed("''a"), "(quote (quote a))");
    assert_eq!(printed("`(a ,b ,@c)"), "(quasiquote (a (unquote b) (unquote-splicing c)))");
    assert_eq!(printed("'(1 . 2)"), "(quote (1 . 2))");
}

#[test]
fn several_per_line() {
    let values = read_all("1 'a\n(b\n c) 2").expect("valid input");
    assert_eq!(values.len(), 4);
    assert_eq!(values[3], Value::Integer(2));
    assert_eq!(values[2].to_string(), "(b c)");
}

#[test]
fn empty_input() {
    assert_eq!(read_all(""), Ok(vec![]));
    assert_eq!(read_all("  ; only a comment\n\n"), Ok(vec![]));
}

#[test]
fn unexpected_eof() {
    assert_eq!(read_all("(1 2"), Err(ReaderError::UnexpectedEof));
    assert_eq!(read_all("'"), Err(ReaderError::UnexpectedEof));
    assert_eq!(read_all("(a . "), Err(ReaderError::UnexpectedEof));
}

#[test]
fn unexpected_close() {
    assert_eq!(read_all(")"), Err(ReaderError::UnexpectedClose));
    assert_eq!(read_all("(a ')"), Err(ReaderError::UnexpectedClose));
}

#[test]
fn bad_dots() {
    assert_eq!(read_all("( . a)"), Err(ReaderError::UnexpectedDot));
    assert_eq!(read_all("."), Err(ReaderError::UnexpectedDot));
    assert_eq!(read_all("(a . b c)"), Err(ReaderError::BadDottedPair));
    assert_eq!(read_all("(a . . b)"), Err(ReaderError::BadDottedPair));
    assert_eq!(read_all("(a .)"), Err(ReaderError::BadDottedPair));
}

#[test]
fn invalid_tokens_are_skipped() {
    assert_eq!(printed("(a {b} c)"), "(a c)");
}

#[test]
fn deep_nesting() {
    let depth = 1_000;
    let text = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    let mut value = read_one(&text).expect("deeply nested list");
    let mut levels = 0;
    while let Some(inner) = value.car() {
        value = inner;
        levels += 1;
    }
    assert_eq!(levels, depth - 1);
}
