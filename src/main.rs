use std::env;
use std::fs;
use std::io::{self, Write};
use std::process;

use phasa::{interpret, PhasaError, Vm};

fn report(error: &PhasaError) {
    match error {
        PhasaError::Compile(errors) => {
            for error in errors {
                eprintln!("{}", error);
            }
        }
        PhasaError::Runtime(error) => {
            eprintln!("{}", error.message);
            eprintln!("[line {}] in script", error.line);
        }
    }
}

fn repl() {
    let mut vm = Vm::new();
    loop {
        print!("> ");
        io::stdout().flush().unwrap();
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .expect("Unable to read line from the REPL");
        if line.is_empty() {
            break;
        }
        if let Err(error) = interpret(&line, &mut vm) {
            report(&error);
        }
    }
}

fn run_file(path: &str) {
    let code = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("Unable to read file {}: {}", path, error);
            process::exit(74);
        }
    };

    let mut vm = Vm::new();
    if let Err(error) = interpret(&code, &mut vm) {
        report(&error);
        match error {
            PhasaError::Compile(_) => process::exit(65),
            PhasaError::Runtime(_) => process::exit(70),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => repl(),
        2 => run_file(&args[1]),
        _ => process::exit(64),
    }
}
