use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use treelox as lox;

use lox::ast_printer::AstPrinter;
use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a Vec<u8> via a memory map.
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(Vec::new());
    }

    let mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Read {} bytes from {:?}", mmap.len(), filename);

    Ok(mmap.to_vec())
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'treelox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every static diagnostic to stderr and exit 65 when any exist.
fn bail_on_static_errors(diagnostics: &[LoxError]) {
    if diagnostics.is_empty() {
        return;
    }

    for e in diagnostics {
        debug!("Static error: {}", e);

        eprintln!("{}", e);
    }

    std::process::exit(65);
}

/// Scan `source`, printing lexical diagnostics; exits 65 on any.
fn scan_or_exit(source: &[u8]) -> Vec<Token> {
    let scanner = Scanner::new(source);
    let (tokens, diagnostics) = scanner.scan();

    bail_on_static_errors(&diagnostics);

    tokens
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let buf = read_file(&filename)?;
                let scanner = Scanner::new(&buf);
                let (tokens, diagnostics) = scanner.scan();

                for e in &diagnostics {
                    debug!("Tokenization debug: {}", e);

                    eprintln!("{}", e);
                }

                if json {
                    let rendered = serde_json::to_string_pretty(&tokens)
                        .context("Failed to serialize tokens")?;

                    println!("{}", rendered);
                } else {
                    for token in &tokens {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }
                }

                if !diagnostics.is_empty() {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let buf = read_file(&filename)?;
                let tokens = scan_or_exit(&buf);
                let parser = Parser::new(tokens);

                match parser.parse_expression() {
                    Ok(expr) => {
                        info!("Expression parsed successfully");

                        let ast_str = AstPrinter::print(&expr);

                        debug!("AST: {}", ast_str);
                        println!("{}", ast_str);
                    }

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(65);
                    }
                }

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");

                let buf = read_file(&filename)?;
                let tokens = scan_or_exit(&buf);
                let parser = Parser::new(tokens);
                let mut interpreter = Interpreter::new();

                match parser.parse_expression() {
                    Ok(expr) => {
                        info!("Expression parsed successfully");

                        match interpreter.evaluate_expression(&expr) {
                            Ok(value) => {
                                debug!("Evaluated to: {}", value);
                                println!("{}", value);
                            }

                            Err(e) => {
                                debug!("Evaluation debug: {}", e);
                                eprintln!("{}", e);
                                std::process::exit(70);
                            }
                        }
                    }

                    Err(e) => {
                        debug!("Parse debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(65);
                    }
                }

                info!("Evaluate subcommand completed");
            }

            None => {
                info!("No filepath provided for Evaluate");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let buf = read_file(&filename)?;

                // For logging only
                info!("Provided input:\n {}", String::from_utf8_lossy(&buf));

                let scanner = Scanner::new(&buf);
                let (tokens, mut diagnostics) = scanner.scan();

                let parser = Parser::new(tokens);
                let (statements, parse_errors) = parser.parse();
                diagnostics.extend(parse_errors);

                info!("Parsed {} statements", statements.len());

                let resolver = Resolver::new();
                let (locals, resolve_errors) = resolver.resolve(&statements);
                diagnostics.extend(resolve_errors);

                // Nothing runs if any pass reported a static error.
                bail_on_static_errors(&diagnostics);

                let mut interpreter = Interpreter::new();
                interpreter.resolve(locals);

                match interpreter.interpret(&statements) {
                    Ok(()) => {
                        info!("Program executed successfully");
                    }

                    Err(e) => {
                        debug!("Runtime debug: {}", e);
                        eprintln!("{}", e);
                        std::process::exit(70);
                    }
                }
            }

            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },
    }

    Ok(())
}
