use super::Report;

/// Pretty-print a report's JSON view to stdout.
pub fn print_json(report: &Report) {
    match render_json(report) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Stable JSON rendering of a report. Non-finite numbers come out as null,
/// matching the placeholder policy of the other formats.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&report.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcf_workbench_core::valuation::engine::{project, Assumptions};

    #[test]
    fn test_degenerate_values_render_as_null() {
        let assumptions = Assumptions {
            base_revenue: 50_000.0,
            shares_outstanding: 0.0,
            ..Assumptions::default()
        };
        let report = Report::Valuation {
            output: project(&assumptions),
            symbol: "$".to_string(),
        };

        let rendered = render_json(&report).unwrap();
        assert!(rendered.contains("\"implied_price\": null"));
        assert!(!rendered.contains("NaN"));
        assert!(!rendered.contains("inf"));
    }
}
