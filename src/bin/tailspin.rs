#[macro_use]
extern crate log;

use std::env::args;
use std::fs;
use std::process::exit;
use std::thread;

use fallible_iterator::FallibleIterator;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use tailspin::interpreter::Interpreter;
use tailspin::reader::{Buffer, Datums, ReaderError};
use tailspin::vm::{Evaluator, SymbolTable};

// Non-tail recursion runs on the host stack
const STACK_SIZE: usize = 64 * 1024 * 1024;
// Nested evaluations that fit in STACK_SIZE
const MAX_DEPTH: usize = 8000;

struct Options {
    file: Option<String>,
    interactive: bool,
}

fn parse_options() -> Options {
    let mut options = Options {
        file: None,
        interactive: false,
    };

    for arg in args().skip(1) {
        match &arg[..] {
            "-i" => options.interactive = true,
            _ => options.file = Some(arg),
        }
    }

    options
}

fn main() {
    env_logger::init();

    let options = parse_options();

    let status = thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(move || run(options))
        .map(|handle| handle.join().unwrap_or(1));

    match status {
        Ok(status) => exit(status),
        Err(e) => {
            eprintln!("unable to start: {}", e);
            exit(1);
        }
    }
}

fn run(options: Options) -> i32 {
    let evaluator = Evaluator::new(SymbolTable::new()).with_max_depth(MAX_DEPTH);
    let interpreter = Interpreter::with_evaluator(evaluator);

    if let Some(ref path) = options.file {
        if let Err(e) = run_file(&interpreter, path) {
            eprintln!("Error: {}", e);
            return 1;
        }
        if !options.interactive {
            return 0;
        }
    }

    match run_repl(&interpreter) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run_file(interpreter: &Interpreter, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("running {}", path);
    let source = fs::read_to_string(path)?;
    interpreter.load_lines(source.lines().map(String::from))?;
    Ok(())
}

// Lines typed by the user; ends on end of file
struct Prompt {
    editor: Editor<()>,
}

impl Iterator for Prompt {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.editor.readline("> ") {
                Ok(line) => {
                    self.editor.add_history_entry(line.as_str());
                    return Some(line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return None,
                Err(e) => {
                    error!("{}", e);
                    return None;
                }
            }
        }
    }
}

fn run_repl(interpreter: &Interpreter) -> Result<(), ReadlineError> {
    let prompt = Prompt {
        editor: Editor::<()>::new()?,
    };
    let mut datums = Datums::new(Buffer::new(prompt), interpreter.symbols().clone());

    loop {
        let expression = match datums.next() {
            Ok(Some(expression)) => expression,
            Ok(None) | Err(ReaderError::UnexpectedEof) => break,
            Err(e) => {
                println!("Error: {}", e);
                datums.source_mut().discard_line();
                continue;
            }
        };

        for diagnostic in datums.source_mut().take_diagnostics() {
            println!("Warning: {}", diagnostic);
        }

        match interpreter.evaluator().eval(&expression, interpreter.global()) {
            Ok(value) => println!("{}", value),
            Err(e) => {
                println!("Error: {}", e);
                datums.source_mut().discard_line();
            }
        }
    }

    Ok(())
}
