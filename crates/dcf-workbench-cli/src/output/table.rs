use colored::Colorize;
use tabled::builder::Builder;
use tabled::Table;

use dcf_workbench_core::types::ComputationOutput;
use dcf_workbench_core::valuation::engine::{PeriodProjection, ValuationOutput};
use dcf_workbench_core::valuation::multiples::FootballField;
use dcf_workbench_core::valuation::sensitivity::SensitivityGrid;

use super::Report;

/// Render a report as terminal tables.
pub fn print_table(report: &Report) {
    match report {
        Report::Valuation { output, symbol } => print_valuation(output, symbol),
        Report::Sensitivity { output, symbol } => print_sensitivity(output, symbol),
        Report::Multiples { output, symbol } => print_multiples(output, symbol),
        Report::Profile(profile) => print_profile(profile),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Placeholder shown for any non-finite value. NaN/Infinity must never reach
/// the terminal as digits.
const PLACEHOLDER: &str = "—";

fn fmt_num(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    group_thousands(&format!("{value:.decimals$}"))
}

fn group_thousands(formatted: &str) -> String {
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::new();
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Millions-denominated money with a magnitude suffix (T/B/M).
fn fmt_money(value_millions: f64, symbol: &str) -> String {
    if !value_millions.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let value = value_millions * 1e6;
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e12 {
        format!("{sign}{symbol}{}T", fmt_num(abs / 1e12, 2))
    } else if abs >= 1e9 {
        format!("{sign}{symbol}{}B", fmt_num(abs / 1e9, 1))
    } else if abs >= 1e6 {
        format!("{sign}{symbol}{}M", fmt_num(abs / 1e6, 0))
    } else {
        format!("{sign}{symbol}{}", fmt_num(abs, 0))
    }
}

fn fmt_pct(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{}%", fmt_num(value, 1))
}

fn fmt_price(value: f64, symbol: &str) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{symbol}{}", fmt_num(value, 2))
}

fn print_envelope_footer<T: serde::Serialize>(output: &ComputationOutput<T>) {
    if !output.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &output.warnings {
            println!("  - {}", w.yellow());
        }
    }
    println!("\nMethodology: {}", output.methodology);
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

fn print_valuation(output: &ComputationOutput<ValuationOutput>, symbol: &str) {
    let v = &output.result;

    // Header KPIs
    println!(
        "Enterprise Value {}   Equity Value {}   Implied Price {}",
        fmt_money(v.enterprise_value, symbol).bold(),
        fmt_money(v.equity_value, symbol).bold(),
        fmt_price(v.implied_price, symbol).bold(),
    );
    if let Some(upside) = v.upside_pct {
        let tag = format!(
            "{}{}",
            if upside >= 0.0 { "+" } else { "" },
            fmt_pct(upside)
        );
        let colored_tag = if upside >= 0.0 { tag.green() } else { tag.red() };
        println!("Upside/(Downside) {colored_tag}");
    }

    // Year-by-year projection table, metrics down the side
    let mut builder = Builder::default();
    let mut header = vec!["Metric".to_string()];
    header.extend(v.projections.iter().map(|p| p.period.label.clone()));
    builder.push_record(header);

    let money_rows: [(&str, fn(&PeriodProjection) -> f64); 8] = [
        ("Revenue", |p| p.revenue),
        ("EBITDA", |p| p.ebitda),
        ("D&A", |p| p.da),
        ("EBIT", |p| p.ebit),
        ("NOPAT", |p| p.nopat),
        ("CapEx", |p| p.capex),
        ("NWC Change", |p| p.nwc_change),
        ("Free Cash Flow", |p| p.fcf),
    ];
    for (label, extract) in money_rows {
        let mut row = vec![label.to_string()];
        row.extend(v.projections.iter().map(|p| fmt_money(extract(p), symbol)));
        builder.push_record(row);
    }

    let mut row = vec!["Discount Factor".to_string()];
    row.extend(v.projections.iter().map(|p| fmt_num(p.discount_factor, 4)));
    builder.push_record(row);
    let mut row = vec!["PV of FCF".to_string()];
    row.extend(v.projections.iter().map(|p| fmt_money(p.pv_fcf, symbol)));
    builder.push_record(row);

    println!("\n{}", Table::from(builder));

    // Valuation bridge
    let mut builder = Builder::default();
    builder.push_record(["Valuation Bridge", "Value"]);
    builder.push_record([
        format!("PV of FCFs (Years 1-{})", v.projections.len()),
        fmt_money(v.pv_of_fcf, symbol),
    ]);
    builder.push_record([
        "PV of Terminal Value".to_string(),
        fmt_money(v.pv_of_terminal, symbol),
    ]);
    builder.push_record([
        "Enterprise Value".to_string(),
        fmt_money(v.enterprise_value, symbol),
    ]);
    builder.push_record([
        "Less: Net Debt".to_string(),
        format!(
            "({})",
            fmt_money(v.enterprise_value - v.equity_value, symbol)
        ),
    ]);
    builder.push_record([
        "Equity Value".to_string(),
        fmt_money(v.equity_value, symbol),
    ]);
    builder.push_record([
        "Implied Share Price".to_string(),
        fmt_price(v.implied_price, symbol),
    ]);
    builder.push_record([
        "TV % of EV".to_string(),
        fmt_pct(v.terminal_value_pct_of_ev),
    ]);
    println!("\n{}", Table::from(builder));

    print_envelope_footer(output);
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

fn print_sensitivity(output: &ComputationOutput<SensitivityGrid>, symbol: &str) {
    let grid = &output.result;
    let range = grid.value_range();

    let mut builder = Builder::default();
    let corner = format!(
        "{} \\ {}",
        grid.row_variable.label(),
        grid.col_variable.label()
    );
    let mut header = vec![corner];
    header.extend(grid.col_values.iter().map(|v| fmt_pct(*v)));
    builder.push_record(header);

    for (row_idx, row) in grid.matrix.iter().enumerate() {
        let mut record = vec![fmt_pct(grid.row_values[row_idx])];
        for (col_idx, cell) in row.iter().enumerate() {
            let is_base = grid.base_position == Some((row_idx, col_idx));
            record.push(heat_cell(*cell, symbol, range, is_base));
        }
        builder.push_record(record);
    }

    println!("{}", Table::from(builder));
    println!(
        "{}",
        "Highlighted cell = base case · Green = higher valuation · Red = lower".dimmed()
    );

    print_envelope_footer(output);
}

/// Two-color gradient over the finite cells: t > 0.65 favorable, t < 0.35
/// unfavorable. The base-case cell is highlighted instead of colored.
fn heat_cell(value: f64, symbol: &str, range: Option<(f64, f64)>, is_base: bool) -> String {
    let text = fmt_price(value, symbol);
    if is_base {
        return text.bold().underline().to_string();
    }
    if !value.is_finite() {
        return text;
    }
    let Some((min, max)) = range else {
        return text;
    };
    let spread = max - min;
    let t = if spread > 0.0 {
        (value - min) / spread
    } else {
        0.5
    };
    if t > 0.65 {
        text.green().to_string()
    } else if t < 0.35 {
        text.red().to_string()
    } else {
        text
    }
}

// ---------------------------------------------------------------------------
// Multiples
// ---------------------------------------------------------------------------

fn print_multiples(output: &ComputationOutput<FootballField>, symbol: &str) {
    let field = &output.result;

    let mut builder = Builder::default();
    builder.push_record(["Method", "Implied Price"]);
    for band in &field.bands {
        builder.push_record([
            band.method.to_string(),
            fmt_price(band.implied_price, symbol),
        ]);
    }
    println!("{}", Table::from(builder));

    if let (Some(low), Some(high)) = (field.low, field.high) {
        println!(
            "\nRange: {} - {}",
            fmt_price(low, symbol),
            fmt_price(high, symbol)
        );
    }
    if let Some(price) = field.current_price {
        println!("Current Market Price: {}", fmt_price(price, symbol));
    }

    print_envelope_footer(output);
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

fn print_profile(profile: &dcf_workbench_core::profile::CompanyProfile) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(profile) {
        for (key, val) in map {
            let rendered = match val {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => PLACEHOLDER.to_string(),
                other => other.to_string(),
            };
            builder.push_record([key, rendered]);
        }
    }
    println!("{}", Table::from(builder));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
