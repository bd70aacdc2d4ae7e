//! A small Scheme runtime: a line-oriented reader and a trampolined evaluator
#[macro_use]
extern crate gc;
#[macro_use]
extern crate log;

#[macro_use]
mod helpers;

pub mod interpreter;
pub mod lexer;
pub mod reader;
pub mod vm;
