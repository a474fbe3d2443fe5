use dcf_workbench_core::profile::{self, FetchOutcome};
use dcf_workbench_core::valuation::engine::{
    project, Assumptions, GrowthSchedule, TerminalMethod,
};
use dcf_workbench_core::valuation::multiples::{football_field, MultiplesInput};
use dcf_workbench_core::valuation::sensitivity::{sweep, SweepSchedule};

// ===========================================================================
// End-to-end reference case
// ===========================================================================

/// Base revenue 50,000, flat 10% growth for 5 years, margin 25%, D&A 4%,
/// tax 21%, capex 5%, NWC 2%, WACC 10%, terminal growth 3%, Gordon,
/// net debt 10,000, 1,000 shares, current price 120.
fn reference_assumptions() -> Assumptions {
    Assumptions {
        company_name: "Reference Co".into(),
        ticker: "REF".into(),
        base_revenue: 50_000.0,
        growth: GrowthSchedule::PerYear(vec![10.0; 5]),
        net_debt: 10_000.0,
        current_price: 120.0,
        ..Assumptions::default()
    }
}

#[test]
fn test_reference_case_period_sequence() {
    let out = project(&reference_assumptions()).result;

    assert!((out.projections[0].revenue - 55_000.0).abs() < 1e-9);
    let year5 = 50_000.0 * 1.1_f64.powi(5);
    assert!((out.projections[4].revenue - year5).abs() < 1e-6);
}

#[test]
fn test_reference_case_formula_consistency() {
    // Every aggregate must reproduce from the model formulas applied to the
    // period sequence, to tight tolerance.
    let out = project(&reference_assumptions()).result;

    let mut pv_sum = 0.0;
    for (idx, p) in out.projections.iter().enumerate() {
        let year = idx as i32 + 1;
        let revenue = 50_000.0 * 1.1_f64.powi(year);
        let ebitda = revenue * 0.25;
        let da = revenue * 0.04;
        let nopat = (ebitda - da) * (1.0 - 0.21);
        let fcf = nopat + da - revenue * 0.05 - revenue * 0.02;
        let pv = fcf / 1.1_f64.powi(year);

        assert!((p.revenue - revenue).abs() < 1e-6);
        assert!((p.fcf - fcf).abs() < 1e-6);
        assert!((p.pv_fcf - pv).abs() < 1e-6);
        pv_sum += p.pv_fcf;
    }

    let last_fcf = out.projections[4].fcf;
    let tv = last_fcf * 1.03 / 0.07;
    let pv_tv = tv / 1.1_f64.powi(5);
    let ev = pv_sum + pv_tv;
    let implied = (ev - 10_000.0) / 1_000.0;

    assert!((out.terminal_value - tv).abs() / tv < 1e-9);
    assert!((out.enterprise_value - ev).abs() / ev < 1e-9);
    assert!((out.implied_price - implied).abs() / implied < 1e-9);

    let upside = (implied / 120.0 - 1.0) * 100.0;
    assert!((out.upside_pct.unwrap() - upside).abs() < 1e-9);
}

#[test]
fn test_determinism_round_trip() {
    let assumptions = reference_assumptions();
    let first = project(&assumptions).result;
    let second = project(&assumptions).result;
    // Bit-identical on an unmutated record
    assert_eq!(first, second);
}

// ===========================================================================
// Sensitivity properties
// ===========================================================================

#[test]
fn test_base_cell_equals_implied_price_gordon_and_exit() {
    for method in [TerminalMethod::GordonGrowth, TerminalMethod::ExitMultiple] {
        let mut assumptions = reference_assumptions();
        assumptions.terminal_method = method;

        let primary = project(&assumptions).result.implied_price;
        let grid = sweep(&assumptions, &SweepSchedule::default()).result;
        let (row, col) = grid.base_position.unwrap();
        assert_eq!(
            grid.matrix[row][col], primary,
            "base cell must reproduce the primary price for {method:?}"
        );
    }
}

#[test]
fn test_monotonicity_in_growth_and_wacc() {
    let base = reference_assumptions();
    let price_at = |wacc: f64, growth: f64| {
        let mut a = base.clone();
        a.discount_rate_pct = wacc;
        a.terminal_growth_pct = growth;
        project(&a).result.implied_price
    };

    // Higher terminal growth (below WACC): strictly higher price
    assert!(price_at(10.0, 3.5) > price_at(10.0, 3.0));
    assert!(price_at(10.0, 4.0) > price_at(10.0, 3.5));
    // Higher WACC: strictly lower price
    assert!(price_at(11.0, 3.0) < price_at(10.0, 3.0));
    assert!(price_at(12.0, 3.0) < price_at(11.0, 3.0));
}

#[test]
fn test_degenerate_spread_reaches_grid_as_nonfinite() {
    let mut assumptions = reference_assumptions();
    // +2pt growth column meets the -2pt WACC row at equality
    assumptions.discount_rate_pct = 7.0;
    assumptions.terminal_growth_pct = 5.0;

    let out = sweep(&assumptions, &SweepSchedule::default());
    let nonfinite = out
        .result
        .matrix
        .iter()
        .flatten()
        .filter(|c| !c.is_finite())
        .count();
    assert!(nonfinite > 0);
    assert!(out.warnings.iter().any(|w| w.contains("placeholder")));
    // Finite cells still drive the heat map
    let (min, max) = out.result.value_range().unwrap();
    assert!(min.is_finite() && max.is_finite() && min < max);
}

// ===========================================================================
// Profile-to-valuation flow
// ===========================================================================

#[test]
fn test_demo_profile_flows_through_engine() {
    let outcome = FetchOutcome::Unavailable {
        reason: "offline".into(),
    };
    let assumptions = Assumptions::from_profile(&outcome, "AAPL");
    let out = project(&assumptions);

    assert_eq!(out.result.projections.len(), 5);
    assert!(out.result.enterprise_value.is_finite());
    assert!(out.result.upside_pct.is_some());
}

#[test]
fn test_fetched_profile_flows_through_engine() {
    let raw = r#"```json
    {"companyName": "Acme Industrial", "ticker": "ACME", "currency": "USD",
     "currencySymbol": "$", "currentPrice": 74.0, "revenue": 18000,
     "ebitdaMargin": 22, "netDebt": 4000, "sharesOutstanding": 450,
     "capexPercent": 6, "daPercent": 5, "taxRate": 24, "revenueGrowthLast": 14}
    ```"#;
    let fetched = profile::parse_profile_response(raw).unwrap();
    let assumptions = Assumptions::from_profile(&FetchOutcome::Fetched(fetched), "ACME");

    assert_eq!(assumptions.company_name, "Acme Industrial");
    assert_eq!(assumptions.base_revenue, 18_000.0);

    let out = project(&assumptions).result;
    // Year 1 growth is the clamped last-known rate, undecayed
    assert!((out.projections[0].revenue - 18_000.0 * 1.14).abs() < 1e-6);
    assert!(out.implied_price.is_finite());
}

// ===========================================================================
// Football field
// ===========================================================================

#[test]
fn test_football_field_spans_methods() {
    let input = MultiplesInput {
        assumptions: reference_assumptions(),
        eps: Some(6.0),
        pe_multiple: Some(20.0),
    };
    let out = football_field(&input).result;

    assert_eq!(out.bands.len(), 3);
    assert_eq!(out.current_price, Some(120.0));
    let low = out.low.unwrap();
    let high = out.high.unwrap();
    assert!(out
        .bands
        .iter()
        .all(|b| b.implied_price >= low && b.implied_price <= high));
}
