use clap::Args;

use dcf_workbench_core::valuation::engine;

use crate::commands::{load_assumptions, AssumptionArgs};
use crate::output::Report;

/// Arguments for the DCF valuation
#[derive(Args)]
pub struct DcfArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

pub fn run(args: DcfArgs) -> Result<Report, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(&args.assumptions)?;
    let symbol = assumptions.display_symbol().to_string();
    let output = engine::project(&assumptions);
    Ok(Report::Valuation { output, symbol })
}
