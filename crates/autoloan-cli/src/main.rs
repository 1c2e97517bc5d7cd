mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::budget::BudgetArgs;
use commands::compare::CompareArgs;
use commands::insurance::InsuranceArgs;
use commands::quote::QuoteArgs;

/// Vehicle loan quotes and down-payment budgeting
#[derive(Parser)]
#[command(
    name = "autoloan",
    version,
    about = "Vehicle loan quotes and down-payment budgeting",
    long_about = "Quote flat-rate vehicle installment loans with decimal precision. \
                  Computes the full upfront and monthly breakdown, compares every \
                  tenor side by side, and solves for the down payment that fits a budget."
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
    /// Quote a single loan
    Quote(QuoteArgs),
    /// Compare every supported tenor for one price and down payment
    Compare(CompareArgs),
    /// Find the down payment that matches an upfront or monthly budget
    Budget(BudgetArgs),
    /// Estimate the first-year insurance premium
    Insurance(InsuranceArgs),
    /// Print the rate sheet
    Rates,
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
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Quote(args) => commands::quote::run_quote(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Budget(args) => commands::budget::run_budget(args),
        Commands::Insurance(args) => commands::insurance::run_insurance(args),
        Commands::Rates => commands::rates::run_rates(),
        Commands::Version => {
            println!("autoloan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
