use super::columns::{check_age_classes, Column, ColumnsBuilder};
use super::table::Table;
use crate::error::EfiscenError;

/// A typed row of one output table.
pub trait TableRow {
    fn table(&self) -> Table;

    /// Check fixed-size arrays before anything is serialized.
    fn validate(&self) -> Result<(), EfiscenError> {
        Ok(())
    }

    /// Ordered column list. Only meaningful after `validate` succeeded.
    fn columns(&self) -> Vec<Column>;

    /// Validate, then serialize. No column is produced for an invalid row.
    fn to_columns(&self) -> Result<Vec<Column>, EfiscenError> {
        self.validate()?;
        Ok(self.columns())
    }
}

fn stratum_header(simulation_id: i64, matrix_id: i64, step: i64) -> ColumnsBuilder {
    ColumnsBuilder::new()
        .int("simulation_id", simulation_id)
        .int("matrix_id", matrix_id)
        .int("step", step)
}

fn country_header(simulation_id: i64, step: i64) -> ColumnsBuilder {
    ColumnsBuilder::new()
        .int("simulation_id", simulation_id)
        .int("step", step)
}

/// Area and growing stock per age class plus stand-level flows.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub area: Vec<f64>,
    pub growing_stock: Vec<f64>,
    /// Gross increment, m3/ha/yr when the stratum has area
    pub gross_increment: f64,
    /// Net increment as recorded by the simulation
    pub net_increment: f64,
    pub natural_mortality: f64,
    pub thinning_removals: f64,
    pub felling_removals: f64,
    pub bare_area: f64,
    pub afforestation: f64,
}

impl TableRow for BaseRow {
    fn table(&self) -> Table {
        Table::Base
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "area", &self.area)?;
        check_age_classes(self.table().label(), "growing_stock", &self.growing_stock)
    }

    fn columns(&self) -> Vec<Column> {
        stratum_header(self.simulation_id, self.matrix_id, self.step)
            .age_classes("area", &self.area)
            .age_classes("gs", &self.growing_stock)
            .real("grincr", self.gross_increment)
            .real("netincr", self.net_increment)
            .real("natmort", self.natural_mortality)
            .real("thinrems", self.thinning_removals)
            .real("felrems", self.felling_removals)
            .real("bare_area", self.bare_area)
            .real("afforestation", self.afforestation)
            .build()
    }
}

/// Harvest area and removals per age class for one harvest type.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestMatrixRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub area: Vec<f64>,
    pub removals: Vec<f64>,
}

/// Final fellings.
#[derive(Debug, Clone, PartialEq)]
pub struct FellingMatrixRow(pub HarvestMatrixRow);

/// Thinnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinningMatrixRow(pub HarvestMatrixRow);

fn harvest_columns(row: &HarvestMatrixRow) -> Vec<Column> {
    stratum_header(row.simulation_id, row.matrix_id, row.step)
        .age_classes("area", &row.area)
        .age_classes("vol", &row.removals)
        .build()
}

impl TableRow for FellingMatrixRow {
    fn table(&self) -> Table {
        Table::FellingMatrix
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "area", &self.0.area)?;
        check_age_classes(self.table().label(), "removals", &self.0.removals)
    }

    fn columns(&self) -> Vec<Column> {
        harvest_columns(&self.0)
    }
}

impl TableRow for ThinningMatrixRow {
    fn table(&self) -> Table {
        Table::ThinningMatrix
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "area", &self.0.area)?;
        check_age_classes(self.table().label(), "removals", &self.0.removals)
    }

    fn columns(&self) -> Vec<Column> {
        harvest_columns(&self.0)
    }
}

/// Natural mortality volume per age class.
#[derive(Debug, Clone, PartialEq)]
pub struct NatMortRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub volume: Vec<f64>,
}

impl TableRow for NatMortRow {
    fn table(&self) -> Table {
        Table::NatMort
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "volume", &self.volume)
    }

    fn columns(&self) -> Vec<Column> {
        stratum_header(self.simulation_id, self.matrix_id, self.step)
            .age_classes("vol", &self.volume)
            .build()
    }
}

/// Harvest residue carbon per age class.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub carbon: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FellResiduesRow(pub ResidueRow);

#[derive(Debug, Clone, PartialEq)]
pub struct ThinResiduesRow(pub ResidueRow);

fn residue_columns(row: &ResidueRow) -> Vec<Column> {
    stratum_header(row.simulation_id, row.matrix_id, row.step)
        .age_classes("c", &row.carbon)
        .real("total", row.carbon.iter().sum())
        .build()
}

impl TableRow for FellResiduesRow {
    fn table(&self) -> Table {
        Table::FellingResidues
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "carbon", &self.0.carbon)
    }

    fn columns(&self) -> Vec<Column> {
        residue_columns(&self.0)
    }
}

impl TableRow for ThinResiduesRow {
    fn table(&self) -> Table {
        Table::ThinningResidues
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "carbon", &self.0.carbon)
    }

    fn columns(&self) -> Vec<Column> {
        residue_columns(&self.0)
    }
}

/// Deadwood volume per age class.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadwoodRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub volume: Vec<f64>,
}

impl TableRow for DeadwoodRow {
    fn table(&self) -> Table {
        Table::Deadwood
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "volume", &self.volume)
    }

    fn columns(&self) -> Vec<Column> {
        stratum_header(self.simulation_id, self.matrix_id, self.step)
            .age_classes("dw", &self.volume)
            .real("total", self.volume.iter().sum())
            .build()
    }
}

/// Tree carbon per compartment and age class.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeCRow {
    pub simulation_id: i64,
    pub matrix_id: i64,
    pub step: i64,
    pub stem: Vec<f64>,
    pub coarse_roots: Vec<f64>,
    pub fine_roots: Vec<f64>,
    pub branches: Vec<f64>,
    pub leaves: Vec<f64>,
}

impl TableRow for TreeCRow {
    fn table(&self) -> Table {
        Table::TreeC
    }

    fn validate(&self) -> Result<(), EfiscenError> {
        check_age_classes(self.table().label(), "stem", &self.stem)?;
        check_age_classes(self.table().label(), "coarse_roots", &self.coarse_roots)?;
        check_age_classes(self.table().label(), "fine_roots", &self.fine_roots)?;
        check_age_classes(self.table().label(), "branches", &self.branches)?;
        check_age_classes(self.table().label(), "leaves", &self.leaves)
    }

    fn columns(&self) -> Vec<Column> {
        stratum_header(self.simulation_id, self.matrix_id, self.step)
            .age_classes("stem", &self.stem)
            .age_classes("croots", &self.coarse_roots)
            .age_classes("froots", &self.fine_roots)
            .age_classes("branches", &self.branches)
            .age_classes("leaves", &self.leaves)
            .build()
    }
}

/// Country-wide soil carbon pools for one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarbonSoilRow {
    pub simulation_id: i64,
    pub step: i64,
    pub nwl: f64,
    pub fwl: f64,
    pub cwl: f64,
    pub sol: f64,
    pub cel: f64,
    pub lig: f64,
    pub hum1: f64,
    pub hum2: f64,
    pub carbon_lost: f64,
    pub litter_input: f64,
}

impl CarbonSoilRow {
    pub fn total(&self) -> f64 {
        self.nwl + self.fwl + self.cwl + self.sol + self.cel + self.lig + self.hum1 + self.hum2
    }
}

impl TableRow for CarbonSoilRow {
    fn table(&self) -> Table {
        Table::CarbonSoil
    }

    fn columns(&self) -> Vec<Column> {
        country_header(self.simulation_id, self.step)
            .real("nwl", self.nwl)
            .real("fwl", self.fwl)
            .real("cwl", self.cwl)
            .real("sol", self.sol)
            .real("cel", self.cel)
            .real("lig", self.lig)
            .real("hum1", self.hum1)
            .real("hum2", self.hum2)
            .real("csoil", self.total())
            .real("cout", self.carbon_lost)
            .real("litin", self.litter_input)
            .build()
    }
}

/// Country-wide carbon stock for one step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarbonCountryRow {
    pub simulation_id: i64,
    pub step: i64,
    pub stem: f64,
    pub coarse_roots: f64,
    pub fine_roots: f64,
    pub branches: f64,
    pub leaves: f64,
    pub soil: f64,
    pub litter_input: f64,
}

impl CarbonCountryRow {
    pub fn biomass(&self) -> f64 {
        self.stem + self.coarse_roots + self.fine_roots + self.branches + self.leaves
    }
}

impl TableRow for CarbonCountryRow {
    fn table(&self) -> Table {
        Table::CarbonCountry
    }

    fn columns(&self) -> Vec<Column> {
        country_header(self.simulation_id, self.step)
            .real("stem", self.stem)
            .real("croots", self.coarse_roots)
            .real("froots", self.fine_roots)
            .real("branches", self.branches)
            .real("leaves", self.leaves)
            .real("biomass", self.biomass())
            .real("soil", self.soil)
            .real("total", self.biomass() + self.soil)
            .real("litin", self.litter_input)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::columns::{column, read_age_classes};

    fn base_row(area: Vec<f64>) -> BaseRow {
        BaseRow {
            simulation_id: 7,
            matrix_id: 3,
            step: 2005,
            area,
            growing_stock: vec![2.0; 16],
            gross_increment: 4.2,
            net_increment: 3.9,
            natural_mortality: 0.1,
            thinning_removals: 1.0,
            felling_removals: 2.0,
            bare_area: 0.0,
            afforestation: 0.0,
        }
    }

    #[test]
    fn test_base_row_column_order() {
        let cols = base_row(vec![1.0; 16]).to_columns().unwrap();
        let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(&names[..4], &["simulation_id", "matrix_id", "step", "area_0_10"]);
        assert_eq!(names[18], "area_>150");
        assert_eq!(names[19], "gs_0_10");
        assert_eq!(names.len(), 3 + 32 + 7);
    }

    #[test]
    fn test_short_array_fails_before_serialization() {
        let err = base_row(vec![1.0; 15]).to_columns().unwrap_err();
        match err {
            EfiscenError::AgeClassLength { table, array, len } => {
                assert_eq!(table, "Base");
                assert_eq!(array, "area");
                assert_eq!(len, 15);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tree_c_checks_every_compartment() {
        let row = TreeCRow {
            simulation_id: 1,
            matrix_id: 1,
            step: 2000,
            stem: vec![0.0; 16],
            coarse_roots: vec![0.0; 16],
            fine_roots: vec![0.0; 16],
            branches: vec![0.0; 16],
            leaves: vec![0.0; 17],
        };
        let err = row.to_columns().unwrap_err();
        assert!(err.to_string().contains("TreeC"));
        assert!(err.to_string().contains("leaves"));
    }

    #[test]
    fn test_residue_row_round_trip() {
        let carbon: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let row = ThinResiduesRow(ResidueRow {
            simulation_id: 1,
            matrix_id: 2,
            step: 2010,
            carbon: carbon.clone(),
        });
        let cols = row.to_columns().unwrap();
        assert_eq!(read_age_classes("c", &cols).unwrap(), carbon);
        assert_eq!(column(&cols, "total").unwrap().as_f64(), Some(120.0));
    }

    #[test]
    fn test_carbon_country_totals() {
        let row = CarbonCountryRow {
            simulation_id: 1,
            step: 2000,
            stem: 1.0,
            coarse_roots: 2.0,
            fine_roots: 3.0,
            branches: 4.0,
            leaves: 5.0,
            soil: 10.0,
            litter_input: 0.0,
        };
        let cols = row.to_columns().unwrap();
        assert_eq!(column(&cols, "biomass").unwrap().as_f64(), Some(15.0));
        assert_eq!(column(&cols, "total").unwrap().as_f64(), Some(25.0));
        assert!(column(&cols, "matrix_id").is_none());
    }
}
