use colored::Colorize;
use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table,
};

use crate::analysis::Metric;
use crate::export::ExportReport;
use crate::models::Experiment;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an aggregated metric series as a table of step, year and value.
pub fn format_series_table(
    experiment: &Experiment,
    metric: Metric,
    points: impl IntoIterator<Item = (usize, f64)>,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", format!("{metric} ({})", metric.unit()).bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    let mut table = new_table();
    table.set_header(vec!["Step", "Year", "Value"]);
    for (step, value) in points {
        table.add_row(vec![
            Cell::new(step),
            Cell::new(experiment.year_of(step)),
            Cell::new(format!("{value:.2}")),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print an aggregated metric series.
pub fn print_series_table(
    experiment: &Experiment,
    metric: Metric,
    points: impl IntoIterator<Item = (usize, f64)>,
) {
    println!("{}", format_series_table(experiment, metric, points));
}

/// Format the latest values of several metrics.
pub fn format_summary_table(title: &str, summary: &[(Metric, f64)]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", title.bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(50)));

    let mut table = new_table();
    table.set_header(vec!["Metric", "Value", "Unit"]);
    for (metric, value) in summary {
        let value = if value.is_finite() {
            format!("{value:.2}")
        } else {
            "n/a".to_string()
        };
        table.add_row(vec![
            Cell::new(metric.tag()),
            Cell::new(value),
            Cell::new(metric.unit()),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_summary_table(title: &str, summary: &[(Metric, f64)]) {
    println!("{}", format_summary_table(title, summary));
}

/// Format the outcome of an export session, one line per table.
pub fn format_export_report(report: &ExportReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Export Report".bold().green()));
    output.push_str(&format!(
        "{}\n",
        format!(
            "Simulation {} | {} matrices",
            report.simulation_id, report.matrices
        )
        .dimmed()
    ));

    let mut table = new_table();
    table.set_header(vec!["Table", "Rows", "Status"]);
    for (t, rows) in &report.exported {
        table.add_row(vec![
            Cell::new(t.table_name()),
            Cell::new(rows),
            Cell::new("ok"),
        ]);
    }
    for (t, err) in &report.failed {
        table.add_row(vec![
            Cell::new(t.table_name()),
            Cell::new("-"),
            Cell::new(format!("failed: {err}")),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

pub fn print_export_report(report: &ExportReport) {
    println!("{}", format_export_report(report));
}
