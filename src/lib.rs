pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod models;
pub mod visualization;

pub use analysis::{Aggregator, Metric};
pub use config::RunConfig;
pub use error::EfiscenError;
pub use export::{
    CsvWriter, DatabaseWriter, ExportReport, Exporter, OutputStore, SimulationInfo, Table,
};
pub use models::{Experiment, Selection, SharedExperiment, Stratum, StratumKey};
