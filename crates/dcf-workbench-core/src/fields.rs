//! Statically enumerated assumption fields.
//!
//! Every form-bound input maps to one entry here: key, label and value kind
//! in a single table that both the input surface and the update logic
//! iterate, so there is no string-keyed dynamic field access anywhere else.

use crate::valuation::engine::{Assumptions, GrowthSchedule, TerminalMethod};

/// How a raw field value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Parsed as floating point; parse failure falls back to 0
    Numeric,
    /// Passed through verbatim
    Text,
}

/// Scalar assumption fields addressable from an input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionField {
    CompanyName,
    Ticker,
    BaseRevenue,
    NetDebt,
    SharesOutstanding,
    CurrentPrice,
    EbitdaMargin,
    DaPct,
    TaxRate,
    CapexPct,
    NwcChangePct,
    DiscountRate,
    TerminalGrowth,
    TerminalMethod,
    ExitMultiple,
}

pub struct FieldSpec {
    pub field: AssumptionField,
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        field: AssumptionField::CompanyName,
        key: "company_name",
        label: "Company Name",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: AssumptionField::Ticker,
        key: "ticker",
        label: "Ticker",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: AssumptionField::BaseRevenue,
        key: "base_revenue",
        label: "Revenue (M)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::NetDebt,
        key: "net_debt",
        label: "Net Debt (M)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::SharesOutstanding,
        key: "shares_outstanding",
        label: "Shares Out (M)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::CurrentPrice,
        key: "current_price",
        label: "Current Price",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::EbitdaMargin,
        key: "ebitda_margin_pct",
        label: "EBITDA Margin (%)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::DaPct,
        key: "da_pct",
        label: "D&A (% Revenue)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::TaxRate,
        key: "tax_rate_pct",
        label: "Tax Rate (%)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::CapexPct,
        key: "capex_pct",
        label: "CapEx (% Revenue)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::NwcChangePct,
        key: "nwc_change_pct",
        label: "NWC Change (% Revenue)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::DiscountRate,
        key: "discount_rate_pct",
        label: "WACC (%)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::TerminalGrowth,
        key: "terminal_growth_pct",
        label: "Terminal Growth (%)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        field: AssumptionField::TerminalMethod,
        key: "terminal_method",
        label: "Terminal Method",
        kind: FieldKind::Text,
    },
    FieldSpec {
        field: AssumptionField::ExitMultiple,
        key: "exit_multiple",
        label: "EV/EBITDA Multiple",
        kind: FieldKind::Numeric,
    },
];

/// Look up a field spec by key.
pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|spec| spec.key == key)
}

/// Numeric parsing policy for form input: anything unparseable becomes 0.
pub fn parse_numeric(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

/// Apply one raw field value to an assumption record.
pub fn apply_field(assumptions: &mut Assumptions, field: AssumptionField, raw: &str) {
    let numeric = parse_numeric(raw);
    match field {
        AssumptionField::CompanyName => assumptions.company_name = raw.to_string(),
        AssumptionField::Ticker => assumptions.ticker = raw.to_string(),
        AssumptionField::BaseRevenue => assumptions.base_revenue = numeric,
        AssumptionField::NetDebt => assumptions.net_debt = numeric,
        AssumptionField::SharesOutstanding => assumptions.shares_outstanding = numeric,
        AssumptionField::CurrentPrice => assumptions.current_price = numeric,
        AssumptionField::EbitdaMargin => assumptions.ebitda_margin_pct = numeric,
        AssumptionField::DaPct => assumptions.da_pct = numeric,
        AssumptionField::TaxRate => assumptions.tax_rate_pct = numeric,
        AssumptionField::CapexPct => assumptions.capex_pct = numeric,
        AssumptionField::NwcChangePct => assumptions.nwc_change_pct = Some(numeric),
        AssumptionField::DiscountRate => assumptions.discount_rate_pct = numeric,
        AssumptionField::TerminalGrowth => assumptions.terminal_growth_pct = numeric,
        AssumptionField::TerminalMethod => {
            assumptions.terminal_method = match raw.trim().to_ascii_lowercase().as_str() {
                "multiple" | "exit" | "exit_multiple" => TerminalMethod::ExitMultiple,
                "both" => TerminalMethod::Both,
                _ => TerminalMethod::GordonGrowth,
            }
        }
        AssumptionField::ExitMultiple => assumptions.exit_multiple = numeric,
    }
}

/// Set one year's growth rate on a per-year schedule. A two-phase schedule
/// is converted to its expanded per-year form first.
pub fn set_growth_year(assumptions: &mut Assumptions, year_idx: usize, raw: &str) {
    let rate = parse_numeric(raw);
    let mut rates = match &assumptions.growth {
        GrowthSchedule::PerYear(rates) => rates.clone(),
        two_phase @ GrowthSchedule::TwoPhase { .. } => (0..two_phase.horizon())
            .map(|idx| two_phase.rate_for_year(idx))
            .collect(),
    };
    if year_idx < rates.len() {
        rates[year_idx] = rate;
        assumptions.growth = GrowthSchedule::PerYear(rates);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
