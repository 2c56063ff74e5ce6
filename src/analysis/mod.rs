mod metric;
mod aggregator;

pub use metric::Metric;
pub use aggregator::Aggregator;
