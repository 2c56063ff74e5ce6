use colored::Colorize;

use crate::analysis::Metric;
use crate::models::{age_class_label, AgeClasses, Experiment};

const BAR_WIDTH: f64 = 40.0;

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 && value > 0.0 {
        ((value / max) * BAR_WIDTH).round() as usize
    } else {
        0
    };
    "\u{2588}".repeat(len)
}

/// Format a metric series as a horizontal bar chart, one bar per step.
pub fn format_series_chart(
    experiment: &Experiment,
    metric: Metric,
    points: impl IntoIterator<Item = (usize, f64)>,
) -> String {
    let points: Vec<(usize, f64)> = points.into_iter().collect();
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", format!("{metric} over time").bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    if points.is_empty() {
        output.push_str("  No data available.\n");
        return output;
    }

    let max = points.iter().map(|(_, v)| *v).fold(0.0f64, f64::max);
    output.push_str(&format!("  {:>6}  {:>12}  {}\n", "Year", metric.unit(), "Chart"));
    output.push_str(&format!("  {}\n", "-".repeat(60)));
    for (step, value) in points {
        output.push_str(&format!(
            "  {:>6}  {:>12.2}  {}\n",
            experiment.year_of(step),
            value,
            bar(value, max).green()
        ));
    }

    output.push('\n');
    output
}

pub fn print_series_chart(
    experiment: &Experiment,
    metric: Metric,
    points: impl IntoIterator<Item = (usize, f64)>,
) {
    print!("{}", format_series_chart(experiment, metric, points));
}

/// Format an age-class distribution as a histogram.
pub fn format_distribution_chart(metric: Metric, year: i64, classes: &AgeClasses) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{}\n",
        format!("{metric} by age class, {year}").bold().green()
    ));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let max = classes.iter().copied().fold(0.0f64, f64::max);
    output.push_str(&format!("  {:>8}  {:>12}  {}\n", "Age", metric.unit(), "Distribution"));
    output.push_str(&format!("  {}\n", "-".repeat(60)));
    for (i, value) in classes.iter().enumerate() {
        output.push_str(&format!(
            "  {:>8}  {:>12.2}  {}\n",
            age_class_label(i),
            value,
            bar(*value, max).green()
        ));
    }

    output.push('\n');
    output
}

pub fn print_distribution_chart(metric: Metric, year: i64, classes: &AgeClasses) {
    print!("{}", format_distribution_chart(metric, year, classes));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_chart_empty() {
        let exp = Experiment::new("chart", 2000, 5);
        let output = format_series_chart(&exp, Metric::Area, Vec::new());
        assert!(output.contains("No data available."));
    }

    #[test]
    fn test_series_chart_scales_to_max() {
        let exp = Experiment::new("chart", 2000, 5);
        let output = format_series_chart(&exp, Metric::Area, vec![(0, 10.0), (1, 20.0)]);
        assert!(output.contains("2005"));
        assert!(output.contains(&"\u{2588}".repeat(40)));
        assert!(!output.contains(&"\u{2588}".repeat(41)));
    }

    #[test]
    fn test_distribution_chart_labels() {
        let mut classes = [0.0; 16];
        classes[2] = 5.0;
        let output = format_distribution_chart(Metric::Area, 2010, &classes);
        assert!(output.contains("20-30"));
        assert!(output.contains(">150"));
        assert!(output.contains("2010"));
    }
}
