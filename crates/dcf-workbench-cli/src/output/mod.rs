pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use serde_json::Value;

use dcf_workbench_core::profile::CompanyProfile;
use dcf_workbench_core::types::ComputationOutput;
use dcf_workbench_core::valuation::engine::ValuationOutput;
use dcf_workbench_core::valuation::multiples::FootballField;
use dcf_workbench_core::valuation::sensitivity::SensitivityGrid;

use crate::OutputFormat;

/// Typed result of one command, carrying the display symbol alongside the
/// computation envelope so formatters never re-derive it.
pub enum Report {
    Valuation {
        output: ComputationOutput<ValuationOutput>,
        symbol: String,
    },
    Sensitivity {
        output: ComputationOutput<SensitivityGrid>,
        symbol: String,
    },
    Multiples {
        output: ComputationOutput<FootballField>,
        symbol: String,
    },
    Profile(CompanyProfile),
}

impl Report {
    /// JSON view used by the json / minimal formatters. Non-finite numbers
    /// serialise as null, so degenerate cells never print as NaN/Infinity.
    pub fn to_value(&self) -> Value {
        match self {
            Report::Valuation { output, .. } => serde_json::to_value(output),
            Report::Sensitivity { output, .. } => serde_json::to_value(output),
            Report::Multiples { output, .. } => serde_json::to_value(output),
            Report::Profile(profile) => serde_json::to_value(profile),
        }
        .unwrap_or_default()
    }
}

/// Dispatch output to the appropriate formatter.
pub fn render(format: &OutputFormat, report: &Report) {
    match format {
        OutputFormat::Json => json::print_json(report),
        OutputFormat::Table => table::print_table(report),
        OutputFormat::Csv => csv_out::print_csv(report),
        OutputFormat::Minimal => minimal::print_minimal(&report.to_value()),
    }
}
