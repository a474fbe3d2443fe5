use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    with_metadata, ComputationOutput, Currency, Money, Multiple, Pct, ProjectionPeriod,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Method for computing terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalMethod {
    /// Gordon growth model: TV = FCF_terminal * (1+g) / (WACC - g)
    GordonGrowth,
    /// Exit multiple: TV = EBITDA_terminal * exit_multiple
    ExitMultiple,
    /// Compute both and report; uses Gordon as primary
    Both,
}

/// Revenue growth schedule over the explicit forecast period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrowthSchedule {
    /// One rate per projection year; the length fixes the horizon.
    /// If shorter than the horizon ever requested, the last rate carries
    /// forward.
    PerYear(Vec<Pct>),
    /// Two-phase profile: `high` for years 1-5, `low` for years 6-10.
    TwoPhase { high: Pct, low: Pct },
}

impl GrowthSchedule {
    /// Number of explicit projection years implied by the schedule.
    pub fn horizon(&self) -> usize {
        match self {
            GrowthSchedule::PerYear(rates) => rates.len(),
            GrowthSchedule::TwoPhase { .. } => 10,
        }
    }

    /// Growth rate for a zero-based year index.
    pub fn rate_for_year(&self, year_idx: usize) -> Pct {
        match self {
            GrowthSchedule::PerYear(rates) => rates
                .get(year_idx)
                .or_else(|| rates.last())
                .copied()
                .unwrap_or(0.0),
            GrowthSchedule::TwoPhase { high, low } => {
                if year_idx < 5 {
                    *high
                } else {
                    *low
                }
            }
        }
    }
}

/// Input record for a valuation run. Immutable from the engine's point of
/// view: every recomputation takes a fresh snapshot, no state is retained
/// between calls.
///
/// Values are deliberately unvalidated: a degenerate combination (zero
/// shares, WACC at or below terminal growth) flows through the formulas and
/// comes out non-finite, to be rendered as a placeholder downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assumptions {
    pub company_name: String,
    pub ticker: String,
    pub currency: Currency,
    /// Display symbol as reported by the data provider; empty falls back to
    /// the currency's own symbol
    pub currency_symbol: String,
    /// Base (Year 0) revenue
    pub base_revenue: Money,
    pub growth: GrowthSchedule,
    pub ebitda_margin_pct: Pct,
    pub da_pct: Pct,
    pub tax_rate_pct: Pct,
    pub capex_pct: Pct,
    /// Net working capital change as % of revenue; `None` drops the term.
    /// Always serialized (as null when absent) so the no-NWC state survives
    /// a round trip; an omitted field means the 2% default, not "dropped".
    pub nwc_change_pct: Option<Pct>,
    /// Discount rate (WACC)
    pub discount_rate_pct: Pct,
    pub terminal_growth_pct: Pct,
    pub terminal_method: TerminalMethod,
    /// EV/EBITDA exit multiple, used by `ExitMultiple` and `Both`
    pub exit_multiple: Multiple,
    pub net_debt: Money,
    pub shares_outstanding: f64,
    /// Current market price; zero or negative means "not known"
    pub current_price: Money,
}

impl Assumptions {
    /// Symbol used when formatting monetary output: the provider-reported
    /// symbol when one was given, otherwise the currency's own.
    pub fn display_symbol(&self) -> &str {
        if self.currency_symbol.is_empty() {
            self.currency.symbol()
        } else {
            &self.currency_symbol
        }
    }
}

impl Default for Assumptions {
    fn default() -> Self {
        Assumptions {
            company_name: String::new(),
            ticker: String::new(),
            currency: Currency::USD,
            currency_symbol: String::new(),
            base_revenue: 0.0,
            growth: GrowthSchedule::PerYear(vec![10.0, 9.0, 8.0, 7.0, 6.0]),
            ebitda_margin_pct: 25.0,
            da_pct: 4.0,
            tax_rate_pct: 21.0,
            capex_pct: 5.0,
            nwc_change_pct: Some(2.0),
            discount_rate_pct: 10.0,
            terminal_growth_pct: 3.0,
            terminal_method: TerminalMethod::GordonGrowth,
            exit_multiple: 15.0,
            net_debt: 0.0,
            shares_outstanding: 1000.0,
            current_price: 0.0,
        }
    }
}

/// Projection for a single year of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodProjection {
    pub period: ProjectionPeriod,
    pub revenue: Money,
    pub ebitda: Money,
    pub da: Money,
    pub ebit: Money,
    pub nopat: Money,
    pub capex: Money,
    pub nwc_change: Money,
    pub fcf: Money,
    pub discount_factor: f64,
    pub pv_fcf: Money,
}

/// Output of a valuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    /// Year-by-year projections, strictly ordered
    pub projections: Vec<PeriodProjection>,
    /// Terminal value via Gordon growth (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_value_gordon: Option<Money>,
    /// Terminal value via exit multiple (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_value_exit: Option<Money>,
    /// Terminal value used in the primary valuation, undiscounted
    pub terminal_value: Money,
    /// Sum of present values of explicit-period FCFs
    pub pv_of_fcf: Money,
    /// Present value of the terminal value
    pub pv_of_terminal: Money,
    /// Enterprise value = PV(FCFs) + PV(TV)
    pub enterprise_value: Money,
    /// Equity value = EV - net debt
    pub equity_value: Money,
    /// Equity value / shares outstanding
    pub implied_price: Money,
    /// PV of terminal value as a percentage of enterprise value
    pub terminal_value_pct_of_ev: Pct,
    /// Upside vs the current market price. Absent (not zero) when no
    /// current price was supplied; "not computable" is not "no upside".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upside_pct: Option<Pct>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full projection and valuation.
///
/// Pure and deterministic: the same `Assumptions` snapshot always yields the
/// same result, and the function never fails. Degenerate inputs produce
/// non-finite fields in the output, with an explanatory warning attached to
/// the envelope.
pub fn project(assumptions: &Assumptions) -> ComputationOutput<ValuationOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let horizon = assumptions.growth.horizon();
    let projections = build_projections(assumptions, horizon);

    let pv_of_fcf: Money = projections.iter().map(|p| p.pv_fcf).sum();
    let (last_fcf, last_ebitda) = projections
        .last()
        .map(|p| (p.fcf, p.ebitda))
        .unwrap_or((0.0, 0.0));

    let (tv_gordon, tv_exit, terminal_value) =
        terminal_values(assumptions, last_fcf, last_ebitda, &mut warnings);

    let wacc = assumptions.discount_rate_pct;
    let pv_of_terminal = terminal_value / (1.0 + wacc / 100.0).powi(horizon as i32);
    let enterprise_value = pv_of_fcf + pv_of_terminal;
    let equity_value = enterprise_value - assumptions.net_debt;

    // Zero shares yields a non-finite price by contract, never a panic.
    let implied_price = equity_value / assumptions.shares_outstanding;

    let terminal_value_pct_of_ev = pv_of_terminal / enterprise_value * 100.0;
    if terminal_value_pct_of_ev.is_finite() && terminal_value_pct_of_ev > 75.0 {
        warnings.push(format!(
            "Terminal value represents {terminal_value_pct_of_ev:.1}% of enterprise value; \
             consider extending the explicit forecast period"
        ));
    }

    let upside_pct = if assumptions.current_price > 0.0 {
        Some((implied_price / assumptions.current_price - 1.0) * 100.0)
    } else {
        None
    };

    let output = ValuationOutput {
        projections,
        terminal_value_gordon: tv_gordon,
        terminal_value_exit: tv_exit,
        terminal_value,
        pv_of_fcf,
        pv_of_terminal,
        enterprise_value,
        equity_value,
        implied_price,
        terminal_value_pct_of_ev,
        upside_pct,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let methodology = format!("{horizon}-Year FCFF DCF (WACC-based)");

    with_metadata(&methodology, assumptions, warnings, elapsed, output)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Project revenue through FCF for each explicit year. Strictly sequential:
/// each year's revenue compounds from the previous year's.
pub(crate) fn build_projections(
    assumptions: &Assumptions,
    horizon: usize,
) -> Vec<PeriodProjection> {
    let mut projections = Vec::with_capacity(horizon);
    let mut revenue = assumptions.base_revenue;
    let wacc = assumptions.discount_rate_pct;

    for year_idx in 0..horizon {
        let year_num = year_idx as i32 + 1;
        let growth = assumptions.growth.rate_for_year(year_idx);
        revenue *= 1.0 + growth / 100.0;

        let ebitda = revenue * assumptions.ebitda_margin_pct / 100.0;
        let da = revenue * assumptions.da_pct / 100.0;
        let ebit = ebitda - da;
        let nopat = ebit * (1.0 - assumptions.tax_rate_pct / 100.0);
        let capex = revenue * assumptions.capex_pct / 100.0;
        let nwc_change = revenue * assumptions.nwc_change_pct.unwrap_or(0.0) / 100.0;

        // FCF = NOPAT + D&A - CapEx - NWC change
        let fcf = nopat + da - capex - nwc_change;

        let discount_factor = 1.0 / (1.0 + wacc / 100.0).powi(year_num);
        let pv_fcf = fcf * discount_factor;

        projections.push(PeriodProjection {
            period: ProjectionPeriod {
                year: year_num,
                label: format!("Year {year_num}"),
                is_terminal: year_idx + 1 == horizon,
            },
            revenue,
            ebitda,
            da,
            ebit,
            nopat,
            capex,
            nwc_change,
            fcf,
            discount_factor,
            pv_fcf,
        });
    }

    projections
}

/// Gordon growth terminal value from a terminal-year FCF. Exposed to the
/// sensitivity sweep, which revalues it per grid cell.
///
/// Known instability: when the WACC/growth spread approaches zero the result
/// blows up toward ±infinity, and at exactly zero it is non-finite. That is
/// deliberate: the value is propagated, not clamped, and callers render
/// non-finite cells as placeholders.
pub(crate) fn gordon_terminal_value(last_fcf: Money, wacc: Pct, growth: Pct) -> Money {
    last_fcf * (1.0 + growth / 100.0) / ((wacc - growth) / 100.0)
}

fn terminal_values(
    assumptions: &Assumptions,
    last_fcf: Money,
    last_ebitda: Money,
    warnings: &mut Vec<String>,
) -> (Option<Money>, Option<Money>, Money) {
    let wacc = assumptions.discount_rate_pct;
    let g = assumptions.terminal_growth_pct;

    let gordon_applies = matches!(
        assumptions.terminal_method,
        TerminalMethod::GordonGrowth | TerminalMethod::Both
    );
    if gordon_applies {
        let spread = wacc - g;
        if spread <= 0.0 {
            warnings.push(format!(
                "WACC ({wacc}%) does not exceed terminal growth ({g}%); \
                 Gordon terminal value is not finite"
            ));
        } else if spread < 0.1 {
            warnings.push(format!(
                "WACC ({wacc}%) is within 0.1pt of terminal growth ({g}%); \
                 Gordon terminal value is unstable"
            ));
        }
    }

    let tv_gordon = gordon_applies.then(|| gordon_terminal_value(last_fcf, wacc, g));
    let tv_exit = matches!(
        assumptions.terminal_method,
        TerminalMethod::ExitMultiple | TerminalMethod::Both
    )
    .then(|| last_ebitda * assumptions.exit_multiple);

    let terminal_value = match assumptions.terminal_method {
        TerminalMethod::GordonGrowth => tv_gordon.unwrap_or(0.0),
        TerminalMethod::ExitMultiple => tv_exit.unwrap_or(0.0),
        TerminalMethod::Both => {
            if let (Some(gv), Some(ev)) = (tv_gordon, tv_exit) {
                if gv.is_finite() && ev.is_finite() && gv > 0.0 && ev > 0.0 {
                    let diff_pct = ((gv - ev) / gv).abs() * 100.0;
                    if diff_pct > 25.0 {
                        warnings.push(format!(
                            "Gordon TV ({gv:.0}) and exit-multiple TV ({ev:.0}) differ by \
                             {diff_pct:.1}%; review assumptions"
                        ));
                    }
                }
            }
            // Gordon is the primary when both are requested
            tv_gordon.unwrap_or(0.0)
        }
    };

    (tv_gordon, tv_exit, terminal_value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_assumptions() -> Assumptions {
        Assumptions {
            company_name: "Sample Co".into(),
            ticker: "SMPL".into(),
            base_revenue: 50_000.0,
            growth: GrowthSchedule::PerYear(vec![10.0, 9.0, 8.0, 7.0, 6.0]),
            net_debt: 10_000.0,
            current_price: 120.0,
            ..Assumptions::default()
        }
    }

    #[test]
    fn test_projection_horizon_and_sequencing() {
        let out = project(&sample_assumptions());
        let proj = &out.result.projections;

        assert_eq!(proj.len(), 5);
        // Year 1 revenue = 50,000 * 1.10
        assert!((proj[0].revenue - 55_000.0).abs() < 1e-9);
        // Year 2 compounds from year 1, not from base
        assert!((proj[1].revenue - 55_000.0 * 1.09).abs() < 1e-9);
        assert!(proj.last().unwrap().period.is_terminal);
        assert!(!proj[0].period.is_terminal);
    }

    #[test]
    fn test_year1_line_items() {
        let out = project(&sample_assumptions());
        let y1 = &out.result.projections[0];

        // Revenue 55,000; EBITDA 25% = 13,750; D&A 4% = 2,200
        assert!((y1.ebitda - 13_750.0).abs() < 1e-9);
        assert!((y1.da - 2_200.0).abs() < 1e-9);
        // EBIT = 13,750 - 2,200 = 11,550; NOPAT at 21% tax = 9,124.5
        assert!((y1.ebit - 11_550.0).abs() < 1e-9);
        assert!((y1.nopat - 9_124.5).abs() < 1e-9);
        // CapEx 5% = 2,750; NWC 2% = 1,100
        assert!((y1.capex - 2_750.0).abs() < 1e-9);
        assert!((y1.nwc_change - 1_100.0).abs() < 1e-9);
        // FCF = 9,124.5 + 2,200 - 2,750 - 1,100 = 7,474.5
        assert!((y1.fcf - 7_474.5).abs() < 1e-9);
        // Discount factor = 1/1.1
        assert!((y1.discount_factor - 1.0 / 1.1).abs() < 1e-12);
        assert!((y1.pv_fcf - y1.fcf / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_aggregation_identities() {
        let out = project(&sample_assumptions()).result;

        let pv_sum: f64 = out.projections.iter().map(|p| p.pv_fcf).sum();
        assert!((out.pv_of_fcf - pv_sum).abs() < 1e-9);
        assert!((out.enterprise_value - (out.pv_of_fcf + out.pv_of_terminal)).abs() < 1e-9);
        assert!((out.equity_value - (out.enterprise_value - 10_000.0)).abs() < 1e-9);
        assert!((out.implied_price - out.equity_value / 1000.0).abs() < 1e-12);
        assert!(
            (out.terminal_value_pct_of_ev - out.pv_of_terminal / out.enterprise_value * 100.0)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_gordon_terminal_value_formula() {
        let out = project(&sample_assumptions()).result;
        let last = out.projections.last().unwrap();

        let expected_tv = last.fcf * 1.03 / ((10.0 - 3.0) / 100.0);
        assert!((out.terminal_value - expected_tv).abs() < 1e-6);
        assert!((out.pv_of_terminal - expected_tv / 1.1_f64.powi(5)).abs() < 1e-6);
        assert!(out.terminal_value_gordon.is_some());
        assert!(out.terminal_value_exit.is_none());
    }

    #[test]
    fn test_exit_multiple_terminal_value() {
        let mut assumptions = sample_assumptions();
        assumptions.terminal_method = TerminalMethod::ExitMultiple;
        assumptions.exit_multiple = 12.0;

        let out = project(&assumptions).result;
        let last_ebitda = out.projections.last().unwrap().ebitda;

        assert_eq!(out.terminal_value_exit, Some(last_ebitda * 12.0));
        assert!(out.terminal_value_gordon.is_none());
        assert!((out.terminal_value - last_ebitda * 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_both_methods_use_gordon_as_primary() {
        let mut assumptions = sample_assumptions();
        assumptions.terminal_method = TerminalMethod::Both;

        let out = project(&assumptions).result;
        assert!(out.terminal_value_gordon.is_some());
        assert!(out.terminal_value_exit.is_some());
        assert_eq!(Some(out.terminal_value), out.terminal_value_gordon);
    }

    #[test]
    fn test_two_phase_growth_schedule() {
        let mut assumptions = sample_assumptions();
        assumptions.growth = GrowthSchedule::TwoPhase {
            high: 12.0,
            low: 4.0,
        };
        assumptions.nwc_change_pct = None;

        let out = project(&assumptions).result;
        assert_eq!(out.projections.len(), 10);

        // Years 1-5 grow at 12%, years 6-10 at 4%
        let y5 = out.projections[4].revenue;
        let y6 = out.projections[5].revenue;
        assert!((y6 / y5 - 1.04).abs() < 1e-12);
        // NWC term dropped entirely
        assert!(out.projections.iter().all(|p| p.nwc_change == 0.0));
    }

    #[test]
    fn test_growth_rate_carry_forward() {
        let mut assumptions = sample_assumptions();
        assumptions.growth = GrowthSchedule::PerYear(vec![8.0, 6.0]);

        // Horizon follows the schedule length here
        let out = project(&assumptions).result;
        assert_eq!(out.projections.len(), 2);

        // But a longer explicit projection carries the last rate forward
        let proj = build_projections(&assumptions, 4);
        let growth_y4 = proj[3].revenue / proj[2].revenue - 1.0;
        assert!((growth_y4 - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_wacc_equals_growth_is_nonfinite_not_panic() {
        let mut assumptions = sample_assumptions();
        assumptions.terminal_growth_pct = assumptions.discount_rate_pct;

        let out = project(&assumptions);
        assert!(!out.result.terminal_value.is_finite());
        assert!(!out.result.implied_price.is_finite());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("does not exceed terminal growth")));
    }

    #[test]
    fn test_near_degenerate_spread_warns() {
        let mut assumptions = sample_assumptions();
        assumptions.terminal_growth_pct = assumptions.discount_rate_pct - 0.05;

        let out = project(&assumptions);
        assert!(out.result.terminal_value.is_finite());
        assert!(out.warnings.iter().any(|w| w.contains("unstable")));
    }

    #[test]
    fn test_zero_shares_outstanding_is_nonfinite() {
        let mut assumptions = sample_assumptions();
        assumptions.shares_outstanding = 0.0;

        let out = project(&assumptions).result;
        assert!(out.enterprise_value.is_finite());
        assert!(!out.implied_price.is_finite());
    }

    #[test]
    fn test_zero_revenue_degrades_to_zero_output() {
        let mut assumptions = sample_assumptions();
        assumptions.base_revenue = 0.0;
        assumptions.current_price = 0.0;

        let out = project(&assumptions).result;
        assert_eq!(out.pv_of_fcf, 0.0);
        assert_eq!(out.enterprise_value, 0.0);
    }

    #[test]
    fn test_upside_absent_without_current_price() {
        let mut assumptions = sample_assumptions();
        assumptions.current_price = 0.0;
        assert_eq!(project(&assumptions).result.upside_pct, None);

        assumptions.current_price = 120.0;
        let out = project(&assumptions).result;
        let expected = (out.implied_price / 120.0 - 1.0) * 100.0;
        assert!((out.upside_pct.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_nwc_none_survives_serde_round_trip() {
        let mut assumptions = sample_assumptions();
        assumptions.nwc_change_pct = None;

        let json = serde_json::to_string(&assumptions).unwrap();
        let restored: Assumptions = serde_json::from_str(&json).unwrap();
        // The dropped-NWC state must not come back as the 2% default
        assert_eq!(restored.nwc_change_pct, None);
        assert_eq!(restored, assumptions);

        // A record that never mentions the field still gets the default
        let sparse: Assumptions = serde_json::from_str("{}").unwrap();
        assert_eq!(sparse.nwc_change_pct, Some(2.0));
    }

    #[test]
    fn test_methodology_reflects_horizon() {
        let out = project(&sample_assumptions());
        assert_eq!(out.methodology, "5-Year FCFF DCF (WACC-based)");
    }
}
