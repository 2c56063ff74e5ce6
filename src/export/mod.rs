mod columns;
mod csv_store;
mod database;
mod derive;
mod exporter;
mod rows;
mod selection_file;
mod store;
mod table;

pub use columns::{
    age_class_column, age_class_columns, check_age_classes, column, read_age_classes, Column,
    ColumnValue, ColumnsBuilder,
};
pub use csv_store::CsvWriter;
pub use database::DatabaseWriter;
pub use derive::{
    carbon_factor, carbon_factors, country_litter_input, gross_increment, litter_input, SoilTotals,
    LITTER_INPUT_EPSILON,
};
pub use exporter::{ExportReport, ExportSession, Exporter, SimulationInfo};
pub use rows::{
    BaseRow, CarbonCountryRow, CarbonSoilRow, DeadwoodRow, FellResiduesRow, FellingMatrixRow,
    HarvestMatrixRow, NatMortRow, ResidueRow, TableRow, ThinResiduesRow, ThinningMatrixRow,
    TreeCRow,
};
pub use selection_file::{parse_selection, read_selection_file};
pub use store::{MatrixRecord, OutputStore, SimulationRecord};
pub use table::Table;
