mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use commands::evaluate::EvaluateArgs;
use equity_val_core::ValuationError;

/// Deterministic equity valuation from a single financial snapshot
#[derive(Parser)]
#[command(
    name = "eqval",
    version,
    about = "Deterministic equity valuation from a single financial snapshot",
    long_about = "Evaluates one listed company snapshot with decimal precision: \
                  price multiples, a three-scenario FCF DCF, a liquidation-value \
                  check and a rule-based rating."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a company snapshot (JSON file or stdin)
    Evaluate(EvaluateArgs),
    /// Print the default engine configuration
    Config,
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

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Config => commands::evaluate::run_config(),
        Commands::Version => {
            println!("eqval {}", env!("CARGO_PKG_VERSION"));
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
            process::exit(exit_code(e.as_ref()));
        }
    }
}

/// Log to stderr so stdout stays a clean result document. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// 2 for rejected input or config, 3 for a divergent DCF scenario, 1 otherwise.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<ValuationError>() {
        Some(e) if e.is_validation() => 2,
        Some(ValuationError::DivergentScenario { .. }) => 3,
        _ => 1,
    }
}
