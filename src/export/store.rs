use serde::{Deserialize, Serialize};

use super::rows::TableRow;
use crate::error::EfiscenError;
use crate::models::StratumKey;

/// Persistent identity of one stratum within a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub country_id: i64,
    pub region: u32,
    pub owner: u8,
    pub site: u8,
    pub species: u8,
}

impl MatrixRecord {
    pub fn new(country_id: i64, key: StratumKey) -> Self {
        let (region, owner, site, species) = key.unpack();
        Self {
            country_id,
            region,
            owner,
            site,
            species,
        }
    }
}

/// Parameters describing one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub scenario_id: i64,
    pub country_id: i64,
    pub project_id: i64,
    pub param_file: String,
    pub base_year: i32,
    pub step_length: u32,
}

/// Destination of exported rows.
///
/// Implementations validate a row completely before writing any part of it
/// and never retry a failed write.
pub trait OutputStore {
    /// Id of an existing matrix entry.
    fn find_matrix(&mut self, record: &MatrixRecord) -> Result<Option<i64>, EfiscenError>;

    /// Create a matrix entry. Fails with `DuplicateKey` when it already exists.
    fn insert_matrix(&mut self, record: &MatrixRecord) -> Result<i64, EfiscenError>;

    /// Allocate a fresh simulation id.
    fn insert_simulation(&mut self, record: &SimulationRecord) -> Result<i64, EfiscenError>;

    fn insert_row(&mut self, row: &dyn TableRow) -> Result<(), EfiscenError>;

    /// Flush buffered output.
    fn flush(&mut self) -> Result<(), EfiscenError> {
        Ok(())
    }
}
