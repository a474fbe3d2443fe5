use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Multiple};
use crate::valuation::engine::{project, Assumptions};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Valuation methods that can appear on the football field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMethod {
    Dcf,
    EvEbitda,
    PriceEarnings,
}

impl std::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValuationMethod::Dcf => write!(f, "DCF"),
            ValuationMethod::EvEbitda => write!(f, "EV/EBITDA"),
            ValuationMethod::PriceEarnings => write!(f, "P/E"),
        }
    }
}

/// Input for the comparison methods that sit alongside the DCF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplesInput {
    pub assumptions: Assumptions,
    /// Externally supplied earnings per share, for the P/E method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<Money>,
    /// P/E multiple applied to `eps`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_multiple: Option<Multiple>,
}

/// One method's implied per-share value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodValue {
    pub method: ValuationMethod,
    pub implied_price: Money,
}

/// Comparative banding of every available method against the market price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootballField {
    /// One band per method, in a fixed presentation order
    pub bands: Vec<MethodValue>,
    /// Lowest finite implied price across the bands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Money>,
    /// Highest finite implied price across the bands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Money>,
    /// Current market price, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// EV/EBITDA implied per-share value from a projected EBITDA. Shares the
/// engine's degeneracy contract: zero shares gives a non-finite value.
pub fn ev_ebitda_value(
    ebitda: Money,
    exit_multiple: Multiple,
    net_debt: Money,
    shares_outstanding: f64,
) -> Money {
    (ebitda * exit_multiple - net_debt) / shares_outstanding
}

/// P/E implied per-share value. A direct multiple of externally supplied
/// EPS; does not depend on the projection at all.
pub fn price_earnings_value(eps: Money, pe_multiple: Multiple) -> Money {
    eps * pe_multiple
}

/// Band the DCF, EV/EBITDA and (when EPS is supplied) P/E implied values
/// for comparative display.
pub fn football_field(input: &MultiplesInput) -> ComputationOutput<FootballField> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let dcf = project(&input.assumptions);
    warnings.extend(dcf.warnings.iter().cloned());
    let dcf = dcf.result;

    // Year-5 EBITDA anchors the multiple method, even on a 10-year horizon;
    // shorter horizons fall back to the final explicit year.
    let anchor_ebitda = dcf
        .projections
        .get(4)
        .or_else(|| dcf.projections.last())
        .map(|p| p.ebitda)
        .unwrap_or(0.0);

    let mut bands = vec![
        MethodValue {
            method: ValuationMethod::Dcf,
            implied_price: dcf.implied_price,
        },
        MethodValue {
            method: ValuationMethod::EvEbitda,
            implied_price: ev_ebitda_value(
                anchor_ebitda,
                input.assumptions.exit_multiple,
                input.assumptions.net_debt,
                input.assumptions.shares_outstanding,
            ),
        },
    ];

    match (input.eps, input.pe_multiple) {
        (Some(eps), Some(pe)) => bands.push(MethodValue {
            method: ValuationMethod::PriceEarnings,
            implied_price: price_earnings_value(eps, pe),
        }),
        (Some(_), None) | (None, Some(_)) => {
            warnings.push(
                "P/E method skipped: both eps and pe_multiple are required".to_string(),
            );
        }
        (None, None) => {}
    }

    let finite: Vec<Money> = bands
        .iter()
        .map(|b| b.implied_price)
        .filter(|p| p.is_finite())
        .collect();
    let low = finite.iter().copied().reduce(f64::min);
    let high = finite.iter().copied().reduce(f64::max);

    let current_price = if input.assumptions.current_price > 0.0 {
        Some(input.assumptions.current_price)
    } else {
        None
    };

    let output = FootballField {
        bands,
        low,
        high,
        current_price,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Football Field (DCF / EV-EBITDA / P-E)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::engine::GrowthSchedule;

    fn sample_input() -> MultiplesInput {
        MultiplesInput {
            assumptions: Assumptions {
                base_revenue: 50_000.0,
                growth: GrowthSchedule::TwoPhase {
                    high: 10.0,
                    low: 5.0,
                },
                net_debt: 10_000.0,
                current_price: 120.0,
                ..Assumptions::default()
            },
            eps: Some(8.5),
            pe_multiple: Some(18.0),
        }
    }

    #[test]
    fn test_ev_ebitda_formula() {
        // (1000 * 12 - 2000) / 100 = 100
        assert!((ev_ebitda_value(1_000.0, 12.0, 2_000.0, 100.0) - 100.0).abs() < 1e-12);
        // Zero shares: non-finite, not a panic
        assert!(!ev_ebitda_value(1_000.0, 12.0, 2_000.0, 0.0).is_finite());
    }

    #[test]
    fn test_pe_is_independent_of_projection() {
        assert_eq!(price_earnings_value(8.5, 18.0), 153.0);
    }

    #[test]
    fn test_football_field_bands() {
        let input = sample_input();
        let out = football_field(&input).result;

        assert_eq!(out.bands.len(), 3);
        assert_eq!(out.bands[0].method, ValuationMethod::Dcf);
        assert_eq!(out.bands[2].method, ValuationMethod::PriceEarnings);
        assert_eq!(out.bands[2].implied_price, 153.0);
        assert_eq!(out.current_price, Some(120.0));

        let (low, high) = (out.low.unwrap(), out.high.unwrap());
        assert!(low <= high);
        for band in &out.bands {
            assert!(band.implied_price >= low && band.implied_price <= high);
        }
    }

    #[test]
    fn test_pe_skipped_without_eps() {
        let mut input = sample_input();
        input.eps = None;
        input.pe_multiple = None;

        let out = football_field(&input);
        assert_eq!(out.result.bands.len(), 2);

        input.pe_multiple = Some(18.0);
        let out = football_field(&input);
        assert_eq!(out.result.bands.len(), 2);
        assert!(out.warnings.iter().any(|w| w.contains("P/E method skipped")));
    }

    #[test]
    fn test_ev_ebitda_band_anchors_on_year5_ebitda() {
        let input = sample_input();
        let dcf = project(&input.assumptions).result;
        // Ten-year horizon, but the multiple method still reads year 5
        assert_eq!(dcf.projections.len(), 10);
        let year5_ebitda = dcf.projections[4].ebitda;

        let out = football_field(&input).result;
        let expected = (year5_ebitda * 15.0 - 10_000.0) / 1000.0;
        assert!((out.bands[1].implied_price - expected).abs() < 1e-9);
    }
}
