use rule_compiler::fixtures::calculator;
use rule_compiler::pipeline::{self, PipelineError, PipelineOutput};
use rule_compiler::{logging, PrecedenceTable};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Sexpr,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    expression: String,
    format: OutputFormat,
    evaluate: bool,
    precedence_file: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program_name = program_name(&args);

    let Some(expression) = args.get(1) else {
        eprintln!("Usage: {} <expression> [options]", program_name);
        eprintln!("       {} --help", program_name);
        std::process::exit(1);
    };

    if expression == "--help" {
        print_help(program_name);
        return Ok(());
    }

    let options = parse_options(expression, &args[2..]);

    // stdout carries a single JSON document in --json mode
    if options.format == OutputFormat::Sexpr {
        logging::init_global_logging()?;
    }

    if let Err(error) = run(&options) {
        eprintln!("\nFAILED: {}", error);
        print_detailed_error(&error);
        std::process::exit(1);
    }

    Ok(())
}

/// argv may be empty when the process is spawned without argument zero
fn program_name(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or(env!("CARGO_PKG_NAME"))
}

fn print_help(program_name: &str) {
    println!("Rule Compiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Parses arithmetic with the calculator grammar and prints the tree");
    println!();
    println!("USAGE:");
    println!("    {} <expression> [options]", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help               Show this help message");
    println!("    --sexpr              Print the tree as an S-expression (default)");
    println!("    --json               Print the tree and statistics as JSON");
    println!("    --eval               Also evaluate the expression");
    println!("    --precedence FILE    Load the precedence table from a TOML file");
    println!();
    println!("EXAMPLES:");
    println!("    {} \"2 + 3 * 4\" --eval", program_name);
    println!("    {} \"2 ^ 3 ^ 2\" --json", program_name);
    println!("    {} \"8 - 3 - 2\" --precedence table.toml", program_name);
}

fn parse_options(expression: &str, args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        expression: expression.to_string(),
        format: OutputFormat::Sexpr,
        evaluate: false,
        precedence_file: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => options.format = OutputFormat::Json,
            "--sexpr" => options.format = OutputFormat::Sexpr,
            "--eval" => options.evaluate = true,
            "--precedence" => {
                if i + 1 < args.len() {
                    options.precedence_file = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Warning: --precedence requires a file path");
                }
            }
            _ => {
                eprintln!("Warning: Unknown option '{}'", args[i]);
            }
        }
        i += 1;
    }

    options
}

fn run(options: &CliOptions) -> Result<(), PipelineError> {
    let table = match &options.precedence_file {
        Some(path) => PrecedenceTable::from_toml_file(path)?,
        None => calculator::precedence_table(),
    };

    let compiled = pipeline::compile(&calculator::grammar()?, &table)?;
    let result = pipeline::parse_source(&compiled, &options.expression)?;

    let value = if options.evaluate {
        Some(calculator::evaluate(&result.tree)?)
    } else {
        None
    };

    match options.format {
        OutputFormat::Sexpr => {
            println!("{}", result.tree.to_sexpr());
            if let Some(value) = value {
                println!("= {}", value);
            }
        }
        OutputFormat::Json => {
            let mut output = PipelineOutput::new(
                compiled.name(),
                compiled.start(),
                &result.tree,
                result.statistics,
            );
            if let Some(value) = value {
                output = output.with_value(value);
            }
            let json = output
                .to_json()
                .map_err(|e| PipelineError::pipeline_error(&e.to_string()))?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn print_detailed_error(error: &PipelineError) {
    eprintln!("{} stage failed [{}]:", error.stage(), error.error_code());
    match error {
        PipelineError::Parse(parse_error) => {
            let expected = parse_error.expected();
            if !expected.is_empty() {
                eprintln!("  expected one of: {}", expected.join(", "));
            }
        }
        PipelineError::LexicalAnalysis(lex_error) => {
            if let Some(position) = lex_error.position() {
                eprintln!("  at source position {}", position);
            }
        }
        _ => {}
    }
    eprintln!("  {}", error.recommended_action());
}
