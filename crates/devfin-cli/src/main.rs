mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::financing::{ApplicableArgs, AssessArgs, EvaluateArgs, MethodsArgs};

/// Real-estate development financing scenarios
#[derive(Parser)]
#[command(
    name = "devfin",
    version,
    about = "Real-estate development financing scenarios",
    long_about = "Estimate the blended cost of capital, financing cost and developer \
                  profit of a real-estate development for a chosen mix of financing \
                  methods and leverage, with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List financing methods and their cost-of-capital ranges
    Methods(MethodsArgs),
    /// Show the financing methods and leverage caps for a phase
    Applicable(ApplicableArgs),
    /// Evaluate a financing scenario (WACC, financing cost, developer profit)
    Evaluate(EvaluateArgs),
    /// Suggest a development phase and financing route from the project state
    Assess(AssessArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Methods(args) => commands::financing::run_methods(args),
        Commands::Applicable(args) => commands::financing::run_applicable(args),
        Commands::Evaluate(args) => commands::financing::run_evaluate(args),
        Commands::Assess(args) => commands::financing::run_assess(args),
        Commands::Version => {
            println!("devfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
