mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::dcf::DcfArgs;
use commands::multiples::MultiplesArgs;
use commands::profile::ProfileArgs;
use commands::sensitivity::SensitivityArgs;

/// Discounted cash flow valuation workbench
#[derive(Parser)]
#[command(
    name = "dcfw",
    version,
    about = "Discounted cash flow valuation workbench",
    long_about = "Projects free cash flows from a small set of company assumptions, \
                  discounts them to an implied equity value per share, and sweeps a \
                  two-way WACC / terminal-growth sensitivity grid. Assumptions come \
                  from a JSON file, piped stdin, a built-in demo profile, or field \
                  overrides."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full projection and valuation
    Dcf(DcfArgs),
    /// Two-way sensitivity grid of implied share prices
    Sensitivity(SensitivityArgs),
    /// Football field across the DCF, EV/EBITDA and P/E methods
    Multiples(MultiplesArgs),
    /// Resolve a company profile from a ticker or raw provider response
    Profile(ProfileArgs),
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
    let cli = Cli::parse();

    let result: Result<output::Report, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::dcf::run(args),
        Commands::Sensitivity(args) => commands::sensitivity::run(args),
        Commands::Multiples(args) => commands::multiples::run(args),
        Commands::Profile(args) => commands::profile::run(args),
        Commands::Version => {
            println!("dcfw {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(report) => {
            output::render(&cli.output, &report);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
