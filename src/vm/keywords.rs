use std::collections::HashMap;

use super::symbol::{Symbol, SymbolTable};

pub const IF: &str = "if";
pub const OR: &str = "or";
pub const NU: &str = "nu";
pub const AND: &str = "and";
pub const LET: &str = "let";
pub const ELSE: &str = "else";
pub const ARROW: &str = "=>";
pub const SET_BANG: &str = "set!";
pub const COND: &str = "cond";
pub const QUOTE: &str = "quote";
pub const BEGIN: &str = "begin";
pub const DEFINE: &str = "define";
pub const LAMBDA: &str = "lambda";
pub const UNQUOTE: &str = "unquote";
pub const QUASIQUOTE: &str = "quasiquote";
pub const UNQUOTE_SPLICING: &str = "unquote-splicing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Quote,
    If,
    Define,
    SetBang,
    Lambda,
    Nu,
    Begin,
    Let,
    And,
    Or,
    Cond,
    Quasiquote,
    Unquote,
}

/// Reserved names, interned once so that dispatch compares identities
#[derive(Debug, Clone)]
pub struct Keywords {
    forms: HashMap<Symbol, SpecialForm>,
    pub begin: Symbol,
    pub else_: Symbol,
    pub arrow: Symbol,
    pub quasiquote: Symbol,
    pub unquote: Symbol,
    pub unquote_splicing: Symbol,
}

impl Keywords {
    pub fn new(symbols: &SymbolTable) -> Keywords {
        let forms = [
            (QUOTE, SpecialForm::Quote),
            (IF, SpecialForm::If),
            (DEFINE, SpecialForm::Define),
            (SET_BANG, SpecialForm::SetBang),
            (LAMBDA, SpecialForm::Lambda),
            (NU, SpecialForm::Nu),
            (BEGIN, SpecialForm::Begin),
            (LET, SpecialForm::Let),
            (AND, SpecialForm::And),
            (OR, SpecialForm::Or),
            (COND, SpecialForm::Cond),
            (QUASIQUOTE, SpecialForm::Quasiquote),
            (UNQUOTE, SpecialForm::Unquote),
            (UNQUOTE_SPLICING, SpecialForm::Unquote),
        ]
        .iter()
        .map(|&(name, form)| (symbols.intern(name), form))
        .collect();

        Keywords {
            forms,
            begin: symbols.intern(BEGIN),
            else_: symbols.intern(ELSE),
            arrow: symbols.intern(ARROW),
            quasiquote: symbols.intern(QUASIQUOTE),
            unquote: symbols.intern(UNQUOTE),
            unquote_splicing: symbols.intern(UNQUOTE_SPLICING),
        }
    }

    pub fn special_form(&self, symbol: &Symbol) -> Option<SpecialForm> {
        self.forms.get(symbol).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forms_dispatch_by_identity() {
        let symbols = SymbolTable::new();
        let keywords = Keywords::new(&symbols);

        let quote = symbols.intern("QUOTE");
        assert_eq!(keywords.special_form(&quote), Some(SpecialForm::Quote));
        assert_eq!(
            keywords.special_form(&keywords.unquote_splicing),
            Some(SpecialForm::Unquote)
        );
        assert_eq!(keywords.special_form(&keywords.else_), None);
        assert_eq!(keywords.special_form(&symbols.intern("car")), None);
    }
}
