mod tables;
mod charts;

pub use tables::{
    format_export_report, print_export_report,
    format_series_table, print_series_table,
    format_summary_table, print_summary_table,
};
pub use charts::{
    format_distribution_chart, print_distribution_chart,
    format_series_chart, print_series_chart,
};
