use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::rows::TableRow;
use super::store::{MatrixRecord, OutputStore, SimulationRecord};
use super::table::Table;
use crate::error::EfiscenError;

/// Writes export sessions as one CSV file per table into a directory.
///
/// Matrix ids are deduplicated in memory for the lifetime of the writer.
pub struct CsvWriter {
    dir: PathBuf,
    tables: HashMap<Table, csv::Writer<File>>,
    matrix_writer: Option<csv::Writer<File>>,
    simulation_writer: Option<csv::Writer<File>>,
    matrices: HashMap<MatrixRecord, i64>,
    next_simulation_id: i64,
}

const MATRIX_HEADER: [&str; 6] = ["id", "country_id", "region", "owner", "site", "species"];
const SIMULATION_HEADER: [&str; 7] = [
    "id",
    "scenario_id",
    "country_id",
    "project_id",
    "param_file",
    "base_year",
    "step_length",
];

impl CsvWriter {
    /// Create the output directory if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, EfiscenError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            tables: HashMap::new(),
            matrix_writer: None,
            simulation_writer: None,
            matrices: HashMap::new(),
            next_simulation_id: 1,
        })
    }

    /// Path of the CSV file backing a table.
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.dir.join(format!("{}.csv", table.table_name()))
    }

    fn open<'h>(
        &self,
        name: &str,
        header: impl IntoIterator<Item = &'h str>,
    ) -> Result<csv::Writer<File>, EfiscenError> {
        let path = self.dir.join(format!("{name}.csv"));
        debug!(path = %path.display(), "opening csv output");
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(header)?;
        Ok(wtr)
    }
}

impl OutputStore for CsvWriter {
    fn find_matrix(&mut self, record: &MatrixRecord) -> Result<Option<i64>, EfiscenError> {
        Ok(self.matrices.get(record).copied())
    }

    fn insert_matrix(&mut self, record: &MatrixRecord) -> Result<i64, EfiscenError> {
        if self.matrices.contains_key(record) {
            return Err(EfiscenError::DuplicateKey(format!(
                "matrix {}/{}/{}/{}/{}",
                record.country_id, record.region, record.owner, record.site, record.species
            )));
        }
        let id = self.matrices.len() as i64 + 1;
        if self.matrix_writer.is_none() {
            self.matrix_writer = Some(self.open("matrix", MATRIX_HEADER)?);
        }
        if let Some(wtr) = self.matrix_writer.as_mut() {
            wtr.write_record([
                id.to_string(),
                record.country_id.to_string(),
                record.region.to_string(),
                record.owner.to_string(),
                record.site.to_string(),
                record.species.to_string(),
            ])?;
        }
        self.matrices.insert(*record, id);
        Ok(id)
    }

    fn insert_simulation(&mut self, record: &SimulationRecord) -> Result<i64, EfiscenError> {
        let id = self.next_simulation_id;
        if self.simulation_writer.is_none() {
            self.simulation_writer = Some(self.open("simulation", SIMULATION_HEADER)?);
        }
        if let Some(wtr) = self.simulation_writer.as_mut() {
            wtr.write_record([
                id.to_string(),
                record.scenario_id.to_string(),
                record.country_id.to_string(),
                record.project_id.to_string(),
                record.param_file.clone(),
                record.base_year.to_string(),
                record.step_length.to_string(),
            ])?;
        }
        self.next_simulation_id += 1;
        Ok(id)
    }

    fn insert_row(&mut self, row: &dyn TableRow) -> Result<(), EfiscenError> {
        let columns = row.to_columns()?;
        let table = row.table();
        if !self.tables.contains_key(&table) {
            let wtr = self.open(table.table_name(), columns.iter().map(|c| c.name.as_str()))?;
            self.tables.insert(table, wtr);
        }
        if let Some(wtr) = self.tables.get_mut(&table) {
            wtr.write_record(columns.iter().map(|c| c.value.to_string()))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EfiscenError> {
        for wtr in self.tables.values_mut() {
            wtr.flush()?;
        }
        if let Some(wtr) = self.matrix_writer.as_mut() {
            wtr.flush()?;
        }
        if let Some(wtr) = self.simulation_writer.as_mut() {
            wtr.flush()?;
        }
        Ok(())
    }
}
