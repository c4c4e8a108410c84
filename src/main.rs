use clap::{Parser as ClapParser, Subcommand};
use fhirpath_lang::{
    Value,
    cli::{self, CliError, EvalOptions, EvalOutcome},
    output::{to_json, to_json_pretty},
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "fhirpath")]
#[command(about = "Evaluate FHIRPath expressions against JSON resources")]
#[command(version)]
struct Cli {
    /// Log parsing and evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Eval {
        /// The FHIRPath expression
        expression: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Bind %name to a JSON value, as name=value
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,

        /// Require where() criteria to be boolean
        #[arg(long)]
        strict: bool,
    },

    /// Parse an expression and print its canonical form
    Parse {
        /// The FHIRPath expression
        expression: String,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "fhirpath_lang=debug" } else { "fhirpath_lang=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            vars,
            pretty,
            syntax_only,
            strict,
        } => run_eval(expression, input, vars, pretty, syntax_only, strict),
        Commands::Parse { expression } => run_eval(expression, None, Vec::new(), false, true, false),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    expression: String,
    input: Option<String>,
    variables: Vec<String>,
    pretty: bool,
    syntax_only: bool,
    strict: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer).filter(|b| !b.trim().is_empty())
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        input,
        syntax_only,
        strict,
        variables,
    };

    match cli::execute_eval(&options)? {
        EvalOutcome::SyntaxValid(canonical) => println!("{}", canonical),
        EvalOutcome::Success(values) => {
            let output = Value::Collection(values);
            if pretty {
                println!("{}", to_json_pretty(&output));
            } else {
                println!("{}", to_json(&output));
            }
        }
    }
    Ok(())
}
