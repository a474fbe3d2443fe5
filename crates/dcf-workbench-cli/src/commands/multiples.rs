use clap::Args;

use dcf_workbench_core::valuation::multiples::{football_field, MultiplesInput};

use crate::commands::{load_assumptions, AssumptionArgs};
use crate::output::Report;

/// Arguments for the football-field comparison
#[derive(Args)]
pub struct MultiplesArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Earnings per share for the P/E method
    #[arg(long)]
    pub eps: Option<f64>,

    /// P/E multiple applied to --eps
    #[arg(long)]
    pub pe_multiple: Option<f64>,
}

pub fn run(args: MultiplesArgs) -> Result<Report, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(&args.assumptions)?;
    let symbol = assumptions.display_symbol().to_string();

    let input = MultiplesInput {
        assumptions,
        eps: args.eps,
        pe_multiple: args.pe_multiple,
    };
    let output = football_field(&input);
    Ok(Report::Multiples { output, symbol })
}
