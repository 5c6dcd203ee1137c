//! Tensor algebra compiler CLI entry point.
//!
//! Usage:
//!   tacc compile <input.tac> [-o <output.ir>] [--trace <trace.xml>]
//!   tacc trace <input.tac> [-o <trace.xml>]   (parse trace)
//!   tacc parse <input.tac>                    (dump AST)
//!   tacc lex <input.tac>                      (dump tokens)
//!
//! Exit status: 0 on success, 64 on bad usage, 65 on a compile error,
//! 74 on an I/O error.

use clap::{Parser, Subcommand};
use miette::NamedSource;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tac_compiler::{codegen, lexer, parser, vm_writer, CompileError};

#[derive(Parser)]
#[command(name = "tacc")]
#[command(about = "Tensor algebra compiler - compile tensor declarations to stack-machine code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one token per line as `kind lexeme`
    Lex {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse and print the AST
    Parse {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Write the parse trace
    Trace {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile to stack-machine instructions
    Compile {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: input with extension .ir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the parse trace to this file
        #[arg(long, value_name = "XML")]
        trace: Option<PathBuf>,
    },
}

enum Failure {
    Compile(miette::Report),
    Io { path: PathBuf, error: io::Error },
}

impl Failure {
    fn compile(err: CompileError, path: &Path, source: &str) -> Self {
        let report = miette::Report::new(err)
            .with_source_code(NamedSource::new(path.display().to_string(), source.to_string()));
        Failure::Compile(report)
    }

    fn io(path: &Path, error: io::Error) -> Self {
        Failure::Io {
            path: path.to_path_buf(),
            error,
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            Failure::Compile(_) => 65,
            Failure::Io { .. } => 74,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 64 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(failure) = run(cli.command) {
        match &failure {
            Failure::Compile(report) => eprintln!("{:?}", report),
            Failure::Io { path, error } => eprintln!("Error: '{}': {}", path.display(), error),
        }
        process::exit(failure.exit_code());
    }
}

fn run(command: Command) -> Result<(), Failure> {
    match command {
        Command::Lex { input } => {
            let source = read_source(&input)?;
            let tokens =
                lexer::tokenize(&source).map_err(|e| Failure::compile(e, &input, &source))?;
            for token in tokens.iter().filter(|t| !t.is_eof()) {
                println!("{} {}", token.kind, token.lexeme);
            }
        }
        Command::Parse { input } => {
            let source = read_source(&input)?;
            let (program, _) =
                parser::parse(&source).map_err(|e| Failure::compile(e, &input, &source))?;
            print!("{}", program);
        }
        Command::Trace { input, output } => {
            let source = read_source(&input)?;
            let (result, trace) = parser::parse_traced(&source);
            match &output {
                Some(path) => fs::write(path, trace.as_str()).map_err(|e| Failure::io(path, e))?,
                None => print!("{}", trace.as_str()),
            }
            result.map_err(|e| Failure::compile(e, &input, &source))?;
        }
        Command::Compile {
            input,
            output,
            trace,
        } => {
            let source = read_source(&input)?;
            let (result, parse_trace) = parser::parse_traced(&source);
            if let Some(path) = &trace {
                fs::write(path, parse_trace.as_str()).map_err(|e| Failure::io(path, e))?;
                log::info!("wrote parse trace to {}", path.display());
            }

            let (program, symbols) = result.map_err(|e| Failure::compile(e, &input, &source))?;
            let code = codegen::generate(&program, &symbols)
                .map_err(|e| Failure::compile(e, &input, &source))?;

            let output = output.unwrap_or_else(|| input.with_extension("ir"));
            vm_writer::write_instructions(&output, &code).map_err(|e| Failure::io(&output, e))?;
            println!("Compiled to {}", output.display());
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String, Failure> {
    fs::read_to_string(path).map_err(|e| Failure::io(path, e))
}
