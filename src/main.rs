// subc: a tree-walking interpreter for a small C subset

use std::fs;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use subc::interpreter::engine::Interpreter;
use subc::parser::parse::Parser;

#[derive(ClapParser, Debug)]
#[command(
    name = "subc",
    about = "Run a C source file with bit-exact layout semantics",
    version
)]
struct Args {
    /// C source file to evaluate
    input_file: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input_file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", args.input_file, err);
            return ExitCode::FAILURE;
        }
    };

    let program = match Parser::new(&source).and_then(|mut p| p.parse_program()) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut interpreter = match Interpreter::new(program) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    match interpreter.run() {
        Ok(status) => {
            print!("{}", interpreter.output());
            ExitCode::from(status as u8)
        }
        Err(err) => {
            print!("{}", interpreter.output());
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
