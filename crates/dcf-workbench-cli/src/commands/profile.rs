use clap::Args;

use dcf_workbench_core::profile::{demo_profile, parse_profile_response};

use crate::input;
use crate::output::Report;

/// Arguments for profile resolution
#[derive(Args)]
pub struct ProfileArgs {
    /// Ticker resolved against the built-in demo profiles
    #[arg(long, required_unless_present = "response")]
    pub ticker: Option<String>,

    /// Path to a raw provider response to parse instead
    #[arg(long)]
    pub response: Option<String>,
}

pub fn run(args: ProfileArgs) -> Result<Report, Box<dyn std::error::Error>> {
    let profile = if let Some(ref path) = args.response {
        let raw = input::read_text(path)?;
        parse_profile_response(&raw)?
    } else if let Some(ref ticker) = args.ticker {
        demo_profile(ticker)
    } else {
        return Err("Either --ticker or --response is required".into());
    };

    Ok(Report::Profile(profile))
}
