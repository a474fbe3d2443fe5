use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Pct};
use crate::valuation::engine::{
    build_projections, gordon_terminal_value, Assumptions, TerminalMethod,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Variable perturbed along one axis of the sensitivity grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepVariable {
    DiscountRate,
    TerminalGrowth,
}

impl SweepVariable {
    pub fn label(&self) -> &'static str {
        match self {
            SweepVariable::DiscountRate => "WACC",
            SweepVariable::TerminalGrowth => "Terminal Growth",
        }
    }

    fn other(&self) -> SweepVariable {
        match self {
            SweepVariable::DiscountRate => SweepVariable::TerminalGrowth,
            SweepVariable::TerminalGrowth => SweepVariable::DiscountRate,
        }
    }
}

/// Perturbation schedule for a two-way sweep. Deltas are percentage-point
/// offsets from the base assumption, in the exact order the grid axes should
/// be laid out. Whichever variable is not on the rows runs along the columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSchedule {
    pub row_variable: SweepVariable,
    pub row_deltas: Vec<Pct>,
    pub col_deltas: Vec<Pct>,
}

impl Default for SweepSchedule {
    /// Classic 5x5 layout: WACC on the rows at ±2/±1 points, terminal growth
    /// on the columns at ±1/±0.5 points.
    fn default() -> Self {
        SweepSchedule {
            row_variable: SweepVariable::DiscountRate,
            row_deltas: vec![-2.0, -1.0, 0.0, 1.0, 2.0],
            col_deltas: vec![-1.0, -0.5, 0.0, 0.5, 1.0],
        }
    }
}

impl SweepSchedule {
    /// 10-year layout: axes swapped (terminal growth on the rows) with
    /// tighter growth steps.
    pub fn ten_year() -> Self {
        SweepSchedule {
            row_variable: SweepVariable::TerminalGrowth,
            row_deltas: vec![-0.5, -0.25, 0.0, 0.25, 0.5],
            col_deltas: vec![-1.0, -0.5, 0.0, 0.5, 1.0],
        }
    }
}

/// Two-way grid of implied share prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub row_variable: SweepVariable,
    pub col_variable: SweepVariable,
    /// Absolute row-axis values (base assumption plus delta), in order
    pub row_values: Vec<Pct>,
    /// Absolute column-axis values, in order
    pub col_values: Vec<Pct>,
    /// matrix[i][j] = implied price at (row_values[i], col_values[j]).
    /// Cells may be non-finite where the perturbed inputs are degenerate.
    pub matrix: Vec<Vec<Money>>,
    /// Position of the zero-delta cell on both axes, when the schedule
    /// contains one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_position: Option<(usize, usize)>,
    /// Value at the base position; NaN when no base cell exists
    pub base_value: Money,
}

impl SensitivityGrid {
    /// (min, max) over the finite cells, for caller-side heat mapping.
    /// `None` when no cell is finite.
    pub fn value_range(&self) -> Option<(Money, Money)> {
        let mut range: Option<(Money, Money)> = None;
        for cell in self.matrix.iter().flatten().filter(|c| c.is_finite()) {
            range = Some(match range {
                Some((min, max)) => (min.min(*cell), max.max(*cell)),
                None => (*cell, *cell),
            });
        }
        range
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Re-value the model across a grid of WACC / terminal-growth perturbations.
///
/// The undiscounted free cash flows do not depend on either swept variable,
/// so they are projected exactly once; each cell only recomputes the
/// terminal value and the discounting stage. The zero-delta cell reproduces
/// the primary valuation's implied price bit-for-bit (same formula, zero
/// offset).
pub fn sweep(
    assumptions: &Assumptions,
    schedule: &SweepSchedule,
) -> ComputationOutput<SensitivityGrid> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let horizon = assumptions.growth.horizon();
    let projections = build_projections(assumptions, horizon);
    let fcfs: Vec<Money> = projections.iter().map(|p| p.fcf).collect();
    let last_ebitda = projections.last().map(|p| p.ebitda).unwrap_or(0.0);

    let (base_wacc, base_growth) = (
        assumptions.discount_rate_pct,
        assumptions.terminal_growth_pct,
    );
    let base_for = |variable: SweepVariable| match variable {
        SweepVariable::DiscountRate => base_wacc,
        SweepVariable::TerminalGrowth => base_growth,
    };

    let row_variable = schedule.row_variable;
    let col_variable = row_variable.other();
    let row_values: Vec<Pct> = schedule
        .row_deltas
        .iter()
        .map(|d| base_for(row_variable) + d)
        .collect();
    let col_values: Vec<Pct> = schedule
        .col_deltas
        .iter()
        .map(|d| base_for(col_variable) + d)
        .collect();

    let mut non_finite_cells = 0usize;
    let mut matrix = Vec::with_capacity(row_values.len());
    for row_value in &row_values {
        let mut row = Vec::with_capacity(col_values.len());
        for col_value in &col_values {
            let (wacc, growth) = match row_variable {
                SweepVariable::DiscountRate => (*row_value, *col_value),
                SweepVariable::TerminalGrowth => (*col_value, *row_value),
            };
            let price = revalue(assumptions, &fcfs, last_ebitda, wacc, growth);
            if !price.is_finite() {
                non_finite_cells += 1;
            }
            row.push(price);
        }
        matrix.push(row);
    }

    if non_finite_cells > 0 {
        warnings.push(format!(
            "{non_finite_cells} grid cell(s) are not computable (WACC does not exceed \
             terminal growth, or zero shares outstanding); render as placeholders"
        ));
    }

    let base_position = match (
        schedule.row_deltas.iter().position(|d| *d == 0.0),
        schedule.col_deltas.iter().position(|d| *d == 0.0),
    ) {
        (Some(r), Some(c)) => Some((r, c)),
        _ => None,
    };
    let base_value = base_position
        .map(|(r, c)| matrix[r][c])
        .unwrap_or(f64::NAN);

    let output = SensitivityGrid {
        row_variable,
        col_variable,
        row_values,
        col_values,
        matrix,
        base_position,
        base_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "2-Way DCF Sensitivity (WACC x Terminal Growth)",
        &serde_json::json!({
            "ticker": assumptions.ticker,
            "row_variable": row_variable,
            "row_deltas": schedule.row_deltas,
            "col_deltas": schedule.col_deltas,
        }),
        warnings,
        elapsed,
        output,
    )
}

/// One grid cell: rediscount the fixed FCF sequence and recompute the
/// terminal value at the perturbed WACC / terminal growth.
fn revalue(
    assumptions: &Assumptions,
    fcfs: &[Money],
    last_ebitda: Money,
    wacc: Pct,
    growth: Pct,
) -> Money {
    // Same operations in the same order as the engine, so the zero-delta
    // cell reproduces the primary implied price exactly.
    let one_plus_w = 1.0 + wacc / 100.0;
    let pv_of_fcf: Money = fcfs
        .iter()
        .enumerate()
        .map(|(idx, fcf)| fcf * (1.0 / one_plus_w.powi(idx as i32 + 1)))
        .sum();

    let last_fcf = fcfs.last().copied().unwrap_or(0.0);
    let terminal_value = match assumptions.terminal_method {
        TerminalMethod::GordonGrowth | TerminalMethod::Both => {
            gordon_terminal_value(last_fcf, wacc, growth)
        }
        TerminalMethod::ExitMultiple => last_ebitda * assumptions.exit_multiple,
    };
    let pv_of_terminal = terminal_value / one_plus_w.powi(fcfs.len() as i32);

    (pv_of_fcf + pv_of_terminal - assumptions.net_debt) / assumptions.shares_outstanding
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
