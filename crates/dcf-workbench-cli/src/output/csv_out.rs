use std::io;

use dcf_workbench_core::types::ComputationOutput;
use dcf_workbench_core::valuation::engine::ValuationOutput;
use dcf_workbench_core::valuation::multiples::FootballField;
use dcf_workbench_core::valuation::sensitivity::SensitivityGrid;

use super::Report;

/// Write a report as CSV to stdout. Non-finite values become empty cells.
pub fn print_csv(report: &Report) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    match report {
        Report::Valuation { output, .. } => write_valuation(&mut wtr, output),
        Report::Sensitivity { output, .. } => write_sensitivity(&mut wtr, output),
        Report::Multiples { output, .. } => write_multiples(&mut wtr, output),
        Report::Profile(profile) => {
            let _ = wtr.write_record(["field", "value"]);
            if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(profile) {
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &json_csv_value(&val)]);
                }
            }
        }
    }

    let _ = wtr.flush();
}

fn write_valuation(wtr: &mut csv::Writer<io::StdoutLock<'_>>, output: &ComputationOutput<ValuationOutput>) {
    let v = &output.result;

    let _ = wtr.write_record([
        "year",
        "label",
        "revenue",
        "ebitda",
        "da",
        "ebit",
        "nopat",
        "capex",
        "nwc_change",
        "fcf",
        "discount_factor",
        "pv_fcf",
    ]);
    for p in &v.projections {
        let _ = wtr.write_record([
            p.period.year.to_string(),
            p.period.label.clone(),
            num(p.revenue),
            num(p.ebitda),
            num(p.da),
            num(p.ebit),
            num(p.nopat),
            num(p.capex),
            num(p.nwc_change),
            num(p.fcf),
            num(p.discount_factor),
            num(p.pv_fcf),
        ]);
    }

    let _ = wtr.write_record::<_, &str>([]);
    let _ = wtr.write_record(["field", "value"]);
    let summary = [
        ("pv_of_fcf", v.pv_of_fcf),
        ("pv_of_terminal", v.pv_of_terminal),
        ("terminal_value", v.terminal_value),
        ("enterprise_value", v.enterprise_value),
        ("equity_value", v.equity_value),
        ("implied_price", v.implied_price),
        ("terminal_value_pct_of_ev", v.terminal_value_pct_of_ev),
    ];
    for (key, value) in summary {
        let _ = wtr.write_record([key, &num(value)]);
    }
    if let Some(upside) = v.upside_pct {
        let _ = wtr.write_record(["upside_pct", &num(upside)]);
    }
}

fn write_sensitivity(wtr: &mut csv::Writer<io::StdoutLock<'_>>, output: &ComputationOutput<SensitivityGrid>) {
    let grid = &output.result;

    let mut header = vec![format!(
        "{} \\ {}",
        grid.row_variable.label(),
        grid.col_variable.label()
    )];
    header.extend(grid.col_values.iter().map(|v| num(*v)));
    let _ = wtr.write_record(&header);

    for (row_idx, row) in grid.matrix.iter().enumerate() {
        let mut record = vec![num(grid.row_values[row_idx])];
        record.extend(row.iter().map(|cell| num(*cell)));
        let _ = wtr.write_record(&record);
    }
}

fn write_multiples(wtr: &mut csv::Writer<io::StdoutLock<'_>>, output: &ComputationOutput<FootballField>) {
    let field = &output.result;

    let _ = wtr.write_record(["method", "implied_price"]);
    for band in &field.bands {
        let _ = wtr.write_record([band.method.to_string(), num(band.implied_price)]);
    }
    if let Some(low) = field.low {
        let _ = wtr.write_record(["range_low", &num(low)]);
    }
    if let Some(high) = field.high {
        let _ = wtr.write_record(["range_high", &num(high)]);
    }
    if let Some(price) = field.current_price {
        let _ = wtr.write_record(["current_price", &num(price)]);
    }
}

fn num(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn json_csv_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
