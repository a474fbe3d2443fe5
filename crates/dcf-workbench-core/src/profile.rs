use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::types::Currency;
use crate::valuation::engine::{Assumptions, GrowthSchedule};
use crate::WorkbenchResult;

/// Wire shape of an external company-data response. Field names follow the
/// provider's JSON exactly; zero means "not reported" for every numeric
/// field and triggers the documented fallback during the merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub company_name: String,
    pub ticker: String,
    pub currency: String,
    pub currency_symbol: String,
    pub current_price: f64,
    pub revenue: f64,
    pub ebitda_margin: f64,
    pub net_debt: f64,
    pub shares_outstanding: f64,
    pub capex_percent: f64,
    pub da_percent: f64,
    pub tax_rate: f64,
    /// Most recent annual revenue growth; the merge decays it across the
    /// projection years
    pub revenue_growth_last: f64,
}

/// Result of attempting to obtain live company data. The fetch itself lives
/// outside this crate; whichever path supplied the data, the merge below is
/// invoked identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FetchOutcome {
    Fetched(CompanyProfile),
    Unavailable { reason: String },
}

/// Geometric decay applied to the last known growth rate across years 1-5.
pub const GROWTH_DECAY: [f64; 5] = [1.0, 0.88, 0.78, 0.70, 0.64];

/// Locally known demo profiles, used when live data is unavailable.
/// Matching is by ticker substring, case-insensitive.
pub fn demo_profile(ticker: &str) -> CompanyProfile {
    let t = ticker.to_ascii_uppercase();
    if t.contains("AAPL") {
        CompanyProfile {
            company_name: "Apple Inc.".into(),
            ticker: "AAPL".into(),
            currency: "USD".into(),
            currency_symbol: "$".into(),
            current_price: 210.0,
            revenue: 383_000.0,
            ebitda_margin: 33.0,
            net_debt: 60_000.0,
            shares_outstanding: 15_500.0,
            capex_percent: 3.5,
            da_percent: 2.5,
            tax_rate: 16.0,
            revenue_growth_last: 8.0,
        }
    } else if t.contains("MSFT") {
        CompanyProfile {
            company_name: "Microsoft Corporation".into(),
            ticker: "MSFT".into(),
            currency: "USD".into(),
            currency_symbol: "$".into(),
            current_price: 430.0,
            revenue: 245_000.0,
            ebitda_margin: 46.0,
            net_debt: 35_000.0,
            shares_outstanding: 7_450.0,
            capex_percent: 5.0,
            da_percent: 3.0,
            tax_rate: 18.0,
            revenue_growth_last: 12.0,
        }
    } else if t.contains("RELIANCE") {
        CompanyProfile {
            company_name: "Reliance Industries".into(),
            ticker: "RELIANCE.NS".into(),
            currency: "INR".into(),
            currency_symbol: "₹".into(),
            current_price: 2_900.0,
            revenue: 1_000_000.0,
            ebitda_margin: 16.0,
            net_debt: 285_000.0,
            shares_outstanding: 6_760.0,
            capex_percent: 6.0,
            da_percent: 4.0,
            tax_rate: 25.0,
            revenue_growth_last: 10.0,
        }
    } else {
        CompanyProfile {
            company_name: t.clone(),
            ticker: t,
            currency: "USD".into(),
            currency_symbol: "$".into(),
            current_price: 120.0,
            revenue: 50_000.0,
            ebitda_margin: 25.0,
            net_debt: 10_000.0,
            shares_outstanding: 1_000.0,
            capex_percent: 5.0,
            da_percent: 4.0,
            tax_rate: 21.0,
            revenue_growth_last: 10.0,
        }
    }
}

/// Parse a provider response defensively: responses frequently arrive
/// wrapped in a markdown code fence, which is stripped before JSON parsing.
pub fn parse_profile_response(raw: &str) -> WorkbenchResult<CompanyProfile> {
    let clean = raw.replace("```json", "").replace("```", "");
    let clean = clean.trim();
    if clean.is_empty() {
        return Err(ValuationError::MalformedProfile("empty response".into()));
    }
    serde_json::from_str(clean).map_err(|e| ValuationError::MalformedProfile(e.to_string()))
}

fn or_default(value: f64, fallback: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Round to one decimal place, matching the presentation precision the
/// profiles are quoted at.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl Assumptions {
    /// Pure merge from a fetch outcome to a full assumption record. The
    /// `Unavailable` arm substitutes the demo profile matching the requested
    /// ticker; the `Fetched` arm applies the per-field fallback defaults.
    pub fn from_profile(outcome: &FetchOutcome, requested_ticker: &str) -> Assumptions {
        let profile = match outcome {
            FetchOutcome::Fetched(profile) => profile.clone(),
            FetchOutcome::Unavailable { .. } => demo_profile(requested_ticker),
        };

        let g0 = or_default(profile.revenue_growth_last, 10.0).clamp(3.0, 35.0);
        let growth_rates: Vec<f64> = GROWTH_DECAY.iter().map(|f| round1(g0 * f)).collect();

        let currency = if profile.currency.is_empty() {
            Currency::USD
        } else {
            Currency::from_code(&profile.currency)
        };
        let (wacc, terminal_growth) = if currency == Currency::INR {
            (12.0, 4.0)
        } else {
            (10.0, 3.0)
        };

        Assumptions {
            company_name: profile.company_name,
            ticker: profile.ticker,
            currency,
            currency_symbol: profile.currency_symbol,
            base_revenue: profile.revenue,
            growth: GrowthSchedule::PerYear(growth_rates),
            ebitda_margin_pct: round1(or_default(profile.ebitda_margin, 25.0)),
            da_pct: round1(or_default(profile.da_percent, 4.0)),
            tax_rate_pct: round1(or_default(profile.tax_rate, 21.0)),
            capex_pct: round1(or_default(profile.capex_percent, 5.0)),
            nwc_change_pct: Some(2.0),
            discount_rate_pct: wacc,
            terminal_growth_pct: terminal_growth,
            net_debt: profile.net_debt,
            shares_outstanding: or_default(profile.shares_outstanding, 1_000.0),
            current_price: profile.current_price,
            ..Assumptions::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
