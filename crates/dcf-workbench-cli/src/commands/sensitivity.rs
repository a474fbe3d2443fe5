use clap::Args;

use dcf_workbench_core::valuation::sensitivity::{sweep, SweepSchedule, SweepVariable};
use dcf_workbench_core::Pct;

use crate::commands::{load_assumptions, AssumptionArgs};
use crate::output::Report;

/// Arguments for the two-way sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Use the 10-year grid layout (terminal growth on the rows, tighter steps)
    #[arg(long)]
    pub ten_year: bool,

    /// Comma-separated WACC deltas in points, overriding the layout default
    #[arg(long, allow_hyphen_values = true, value_name = "DELTAS")]
    pub wacc_deltas: Option<String>,

    /// Comma-separated terminal-growth deltas in points
    #[arg(long, allow_hyphen_values = true, value_name = "DELTAS")]
    pub growth_deltas: Option<String>,
}

pub fn run(args: SensitivityArgs) -> Result<Report, Box<dyn std::error::Error>> {
    let assumptions = load_assumptions(&args.assumptions)?;
    let symbol = assumptions.display_symbol().to_string();

    let mut schedule = if args.ten_year {
        SweepSchedule::ten_year()
    } else {
        SweepSchedule::default()
    };

    if let Some(ref raw) = args.wacc_deltas {
        assign_deltas(&mut schedule, SweepVariable::DiscountRate, parse_deltas(raw)?);
    }
    if let Some(ref raw) = args.growth_deltas {
        assign_deltas(
            &mut schedule,
            SweepVariable::TerminalGrowth,
            parse_deltas(raw)?,
        );
    }

    let output = sweep(&assumptions, &schedule);
    Ok(Report::Sensitivity { output, symbol })
}

fn parse_deltas(raw: &str) -> Result<Vec<Pct>, Box<dyn std::error::Error>> {
    let deltas = raw
        .split(',')
        .map(|part| part.trim().parse::<Pct>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Bad delta list '{raw}': {e}"))?;
    if deltas.is_empty() {
        return Err(format!("Empty delta list '{raw}'").into());
    }
    Ok(deltas)
}

fn assign_deltas(schedule: &mut SweepSchedule, variable: SweepVariable, deltas: Vec<Pct>) {
    if schedule.row_variable == variable {
        schedule.row_deltas = deltas;
    } else {
        schedule.col_deltas = deltas;
    }
}
