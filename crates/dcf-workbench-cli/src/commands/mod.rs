pub mod dcf;
pub mod multiples;
pub mod profile;
pub mod sensitivity;

use clap::Args;

use dcf_workbench_core::fields;
use dcf_workbench_core::profile::{parse_profile_response, FetchOutcome};
use dcf_workbench_core::valuation::engine::{Assumptions, GrowthSchedule};

use crate::input;

/// Shared flags for assembling the assumption record. Sources are tried in
/// order: JSON file, piped stdin, raw provider response, demo profile by
/// ticker, built-in defaults. Field overrides apply on top of whichever
/// source won.
#[derive(Args)]
pub struct AssumptionArgs {
    /// Path to a JSON file holding a full assumption record
    #[arg(long)]
    pub input: Option<String>,

    /// Ticker resolved against the built-in demo profiles
    #[arg(long)]
    pub ticker: Option<String>,

    /// Path to a raw provider response (markdown fences tolerated)
    #[arg(long)]
    pub profile_response: Option<String>,

    /// Override a single assumption field, e.g. --set ebitda_margin_pct=32.5
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Override one projection year's growth rate, e.g. --set-growth 3=7.5
    #[arg(long = "set-growth", value_name = "YEAR=RATE")]
    pub set_growth: Vec<String>,

    /// Use a two-phase 10-year growth profile: HIGH,LOW in percent
    #[arg(long, value_name = "HIGH,LOW", allow_hyphen_values = true)]
    pub two_phase: Option<String>,
}

pub fn load_assumptions(args: &AssumptionArgs) -> Result<Assumptions, Box<dyn std::error::Error>> {
    let mut assumptions: Assumptions = if let Some(ref path) = args.input {
        input::read_json(path)?
    } else if let Some(data) = input::read_stdin()? {
        serde_json::from_value(data)?
    } else if let Some(ref path) = args.profile_response {
        let raw = input::read_text(path)?;
        let profile = parse_profile_response(&raw)?;
        let ticker = args.ticker.clone().unwrap_or_else(|| profile.ticker.clone());
        Assumptions::from_profile(&FetchOutcome::Fetched(profile), &ticker)
    } else if let Some(ref ticker) = args.ticker {
        // The CLI carries no live data source; demo profiles stand in for
        // the unavailable-fetch path
        let outcome = FetchOutcome::Unavailable {
            reason: "no live data source".into(),
        };
        Assumptions::from_profile(&outcome, ticker)
    } else {
        Assumptions::default()
    };

    if let Some(ref spec) = args.two_phase {
        let (high, low) = spec
            .split_once(',')
            .ok_or_else(|| format!("--two-phase expects HIGH,LOW, got '{spec}'"))?;
        assumptions.growth = GrowthSchedule::TwoPhase {
            high: high.trim().parse()?,
            low: low.trim().parse()?,
        };
    }

    for pair in &args.set {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("--set expects KEY=VALUE, got '{pair}'"))?;
        let spec = fields::lookup(key).ok_or_else(|| format!("Unknown field '{key}'"))?;
        fields::apply_field(&mut assumptions, spec.field, value);
    }

    for pair in &args.set_growth {
        let (year, rate) = pair
            .split_once('=')
            .ok_or_else(|| format!("--set-growth expects YEAR=RATE, got '{pair}'"))?;
        let year: usize = year.trim().parse()?;
        if year == 0 || year > assumptions.growth.horizon() {
            return Err(format!(
                "Growth year {year} is outside the {}-year horizon",
                assumptions.growth.horizon()
            )
            .into());
        }
        fields::set_growth_year(&mut assumptions, year - 1, rate);
    }

    Ok(assumptions)
}
