use std::path::Path;

use crate::analysis::Metric;
use crate::error::EfiscenError;
use crate::models::Experiment;

/// CSV row of an aggregated metric series.
#[derive(Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SeriesRow {
    pub metric: String,
    pub step: usize,
    pub year: i64,
    pub value: f64,
}

/// Write aggregated `(step, value)` series to a CSV file, one row per point.
pub fn write_series_csv<I>(
    experiment: &Experiment,
    series: &[(Metric, I)],
    path: impl AsRef<Path>,
) -> Result<(), EfiscenError>
where
    I: IntoIterator<Item = (usize, f64)> + Clone,
{
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for (metric, points) in series {
        for (step, value) in points.clone() {
            wtr.serialize(SeriesRow {
                metric: metric.tag().to_string(),
                step,
                year: experiment.year_of(step),
                value,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Read series rows back from a CSV file.
pub fn read_series_csv(path: impl AsRef<Path>) -> Result<Vec<SeriesRow>, EfiscenError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: SeriesRow = result?;
        rows.push(row);
    }
    Ok(rows)
}
