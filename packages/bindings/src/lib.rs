use napi::Result as NapiResult;
use napi_derive::napi;

use dcf_workbench_core::profile::FetchOutcome;
use dcf_workbench_core::valuation::engine::{self, Assumptions};
use dcf_workbench_core::valuation::multiples::{self, MultiplesInput};
use dcf_workbench_core::valuation::sensitivity::{self, SweepSchedule};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn project_valuation(input_json: String) -> NapiResult<String> {
    let assumptions: Assumptions = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = engine::project(&assumptions);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct SweepBindingInput {
    #[serde(flatten)]
    assumptions: Assumptions,
    #[serde(default)]
    schedule: Option<SweepSchedule>,
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    let binding_input: SweepBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let schedule = binding_input.schedule.unwrap_or_default();
    let output = sensitivity::sweep(&binding_input.assumptions, &schedule);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn football_field(input_json: String) -> NapiResult<String> {
    let input: MultiplesInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = multiples::football_field(&input);
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[napi]
pub fn demo_profile(ticker: String) -> NapiResult<String> {
    let profile = dcf_workbench_core::profile::demo_profile(&ticker);
    serde_json::to_string(&profile).map_err(to_napi_error)
}

#[napi]
pub fn parse_profile_response(raw: String) -> NapiResult<String> {
    let profile =
        dcf_workbench_core::profile::parse_profile_response(&raw).map_err(to_napi_error)?;
    serde_json::to_string(&profile).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct MergeBindingInput {
    outcome: FetchOutcome,
    ticker: String,
}

#[napi]
pub fn assumptions_from_profile(input_json: String) -> NapiResult<String> {
    let binding_input: MergeBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let assumptions = Assumptions::from_profile(&binding_input.outcome, &binding_input.ticker);
    serde_json::to_string(&assumptions).map_err(to_napi_error)
}
