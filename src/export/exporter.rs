use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::derive::{carbon_factors, country_litter_input, gross_increment, SoilTotals};
use super::rows::{
    BaseRow, CarbonCountryRow, CarbonSoilRow, DeadwoodRow, FellResiduesRow, FellingMatrixRow,
    HarvestMatrixRow, NatMortRow, ResidueRow, ThinResiduesRow, ThinningMatrixRow, TreeCRow,
};
use super::selection_file::read_selection_file;
use super::store::{MatrixRecord, OutputStore, SimulationRecord};
use super::table::Table;
use crate::error::EfiscenError;
use crate::models::{Experiment, SharedExperiment, Stratum, StratumKey};

/// Who ran the simulation and with what, as recorded in the `simulation` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInfo {
    pub scenario_id: i64,
    pub country_id: i64,
    pub project_id: i64,
    pub param_file: String,
}

/// State shared by all table exports of one session.
#[derive(Debug, Clone)]
pub struct ExportSession {
    pub simulation_id: i64,
    pub country_id: i64,
    matrix_ids: HashMap<StratumKey, i64>,
}

impl ExportSession {
    pub fn new(simulation_id: i64, country_id: i64, matrix_ids: HashMap<StratumKey, i64>) -> Self {
        Self {
            simulation_id,
            country_id,
            matrix_ids,
        }
    }

    pub fn matrix_id(&self, key: StratumKey) -> Result<i64, EfiscenError> {
        self.matrix_ids.get(&key).copied().ok_or_else(|| {
            EfiscenError::InsufficientData(format!("no matrix id for stratum {key}"))
        })
    }

    pub fn num_matrices(&self) -> usize {
        self.matrix_ids.len()
    }
}

/// Outcome of one export session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub simulation_id: i64,
    pub matrices: usize,
    /// Tables written completely, with their row counts
    pub exported: Vec<(Table, usize)>,
    /// Tables that failed, with the error text
    pub failed: Vec<(Table, String)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn rows(&self, table: Table) -> Option<usize> {
        self.exported
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, n)| *n)
    }
}

/// Exports a point-in-time view of an experiment into an output store.
pub struct Exporter<S: OutputStore> {
    experiment: Arc<Experiment>,
    /// Live experiment to snapshot again at the start of each session
    shared: Option<SharedExperiment>,
    store: S,
}

impl<S: OutputStore> Exporter<S> {
    pub fn new(experiment: Arc<Experiment>, store: S) -> Self {
        Self {
            experiment,
            shared: None,
            store,
        }
    }

    /// Export from an experiment the simulation may still be writing to.
    ///
    /// Every session takes a fresh snapshot when it begins, and all tables
    /// of that session read it.
    pub fn from_shared(shared: &SharedExperiment, store: S) -> Result<Self, EfiscenError> {
        Ok(Self {
            experiment: Experiment::snapshot(shared)?,
            shared: Some(Arc::clone(shared)),
            store,
        })
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn year(&self, step: usize) -> i64 {
        self.experiment.year_of(step)
    }

    /// Look up or create a matrix id for every stratum.
    ///
    /// An insert that collides with an existing entry is resolved by a
    /// second lookup, so repeated calls hand back the same ids.
    pub fn save_matrices(
        &mut self,
        country_id: i64,
    ) -> Result<HashMap<StratumKey, i64>, EfiscenError> {
        let mut ids = HashMap::with_capacity(self.experiment.num_strata());
        for key in self.experiment.strata.keys() {
            let record = MatrixRecord::new(country_id, *key);
            let id = match self.store.find_matrix(&record)? {
                Some(id) => id,
                None => match self.store.insert_matrix(&record) {
                    Ok(id) => id,
                    Err(EfiscenError::DuplicateKey(msg)) => {
                        debug!(stratum = %key, %msg, "matrix already present");
                        self.store.find_matrix(&record)?.ok_or_else(|| {
                            EfiscenError::InsufficientData(format!(
                                "matrix for stratum {key} neither inserted nor found"
                            ))
                        })?
                    }
                    Err(e) => return Err(e),
                },
            };
            ids.insert(*key, id);
        }
        info!(count = ids.len(), country_id, "matrix ids resolved");
        Ok(ids)
    }

    /// Allocate the session's simulation id.
    pub fn save_simulation(&mut self, info: &SimulationInfo) -> Result<i64, EfiscenError> {
        let record = SimulationRecord {
            scenario_id: info.scenario_id,
            country_id: info.country_id,
            project_id: info.project_id,
            param_file: info.param_file.clone(),
            base_year: self.experiment.base_year,
            step_length: self.experiment.step_length,
        };
        let id = self.store.insert_simulation(&record)?;
        info!(simulation_id = id, scenario_id = info.scenario_id, "simulation registered");
        Ok(id)
    }

    /// Snapshot the shared experiment, resolve matrix ids and allocate a
    /// simulation id.
    ///
    /// Any failure here aborts the session.
    pub fn begin_session(&mut self, info: &SimulationInfo) -> Result<ExportSession, EfiscenError> {
        if let Some(shared) = &self.shared {
            self.experiment = Experiment::snapshot(shared)?;
        }
        let matrix_ids = self
            .save_matrices(info.country_id)
            .map_err(|e| EfiscenError::SessionAborted(format!("matrix ids: {e}")))?;
        let simulation_id = self
            .save_simulation(info)
            .map_err(|e| EfiscenError::SessionAborted(format!("simulation id: {e}")))?;
        Ok(ExportSession::new(simulation_id, info.country_id, matrix_ids))
    }

    /// Export every table.
    pub fn save(&mut self, info: &SimulationInfo) -> Result<ExportReport, EfiscenError> {
        self.save_tables(info, &Table::ALL)
    }

    /// Export the tables switched on in a selection file.
    pub fn save_selected_database(
        &mut self,
        info: &SimulationInfo,
        selection_file: impl AsRef<Path>,
    ) -> Result<ExportReport, EfiscenError> {
        let tables = read_selection_file(selection_file)?;
        self.save_tables(info, &tables)
    }

    /// Run one session over the given tables.
    ///
    /// A failing table is logged and reported; the remaining tables still run.
    pub fn save_tables(
        &mut self,
        info: &SimulationInfo,
        tables: &[Table],
    ) -> Result<ExportReport, EfiscenError> {
        let session = self.begin_session(info)?;
        let mut report = ExportReport {
            simulation_id: session.simulation_id,
            matrices: session.num_matrices(),
            ..Default::default()
        };
        for &table in tables {
            match self.save_table(&session, table) {
                Ok(rows) => {
                    info!(table = table.table_name(), rows, "table exported");
                    report.exported.push((table, rows));
                }
                Err(e) => {
                    error!(table = table.table_name(), error = %e, "table export failed");
                    report.failed.push((table, e.to_string()));
                }
            }
        }
        if let Err(e) = self.store.flush() {
            error!(error = %e, "flushing output failed");
            return Err(e);
        }
        Ok(report)
    }

    /// Export a single table within an open session. Returns the row count.
    pub fn save_table(
        &mut self,
        session: &ExportSession,
        table: Table,
    ) -> Result<usize, EfiscenError> {
        match table {
            Table::Base => self.save_base(session),
            Table::FellingMatrix => self.save_felling_matrix(session),
            Table::ThinningMatrix => self.save_thinning_matrix(session),
            Table::NatMort => self.save_nat_mort(session),
            Table::CarbonSoil => self.save_carbon_soil(session),
            Table::TreeC => self.save_tree_c(session),
            Table::CarbonCountry => self.save_carbon_country(session),
            Table::FellingResidues => self.save_fell_residues(session),
            Table::ThinningResidues => self.save_thin_residues(session),
            Table::Deadwood => self.save_deadwood(session),
        }
    }

    /// Visit every recorded step of every stratum, in key then step order.
    fn for_each_stratum_step<F>(
        &mut self,
        session: &ExportSession,
        mut write: F,
    ) -> Result<usize, EfiscenError>
    where
        F: FnMut(&mut S, StratumKey, &Stratum, i64, usize, i64) -> Result<(), EfiscenError>,
    {
        let experiment = Arc::clone(&self.experiment);
        let mut rows = 0;
        for (key, stratum) in &experiment.strata {
            let matrix_id = session.matrix_id(*key)?;
            for step in 0..stratum.steps() {
                let year = experiment.year_of(step);
                write(&mut self.store, *key, stratum, matrix_id, step, year)?;
                rows += 1;
            }
        }
        Ok(rows)
    }

    pub fn save_base(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        let step_length = self.experiment.step_length;
        let factors = carbon_factors(&self.experiment);
        self.for_each_stratum_step(session, |store, key, s, matrix_id, step, year| {
            let cfactor = factors.get(&key).copied().ok_or_else(|| {
                EfiscenError::InsufficientData(format!("no carbon factor for stratum {key}"))
            })?;
            store.insert_row(&BaseRow {
                simulation_id,
                matrix_id,
                step: year,
                area: s.area.classes_at(step).to_vec(),
                growing_stock: s.growing_stock.classes_at(step).to_vec(),
                gross_increment: gross_increment(s, step, step_length, cfactor),
                net_increment: s.increment.total_at(step),
                natural_mortality: s.natural_mortality.total_at(step),
                thinning_removals: s.thinning_removals.total_at(step),
                felling_removals: s.felling_removals.total_at(step),
                bare_area: s.bare_area.total_at(step),
                afforestation: s.afforestation.total_at(step),
            })
        })
    }

    pub fn save_felling_matrix(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&FellingMatrixRow(HarvestMatrixRow {
                simulation_id,
                matrix_id,
                step: year,
                area: s.felling_area.classes_at(step).to_vec(),
                removals: s.felling_removals.classes_at(step).to_vec(),
            }))
        })
    }

    pub fn save_thinning_matrix(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&ThinningMatrixRow(HarvestMatrixRow {
                simulation_id,
                matrix_id,
                step: year,
                area: s.thinning_area.classes_at(step).to_vec(),
                removals: s.thinning_removals.classes_at(step).to_vec(),
            }))
        })
    }

    pub fn save_nat_mort(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&NatMortRow {
                simulation_id,
                matrix_id,
                step: year,
                volume: s.natural_mortality.classes_at(step).to_vec(),
            })
        })
    }

    pub fn save_fell_residues(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&FellResiduesRow(ResidueRow {
                simulation_id,
                matrix_id,
                step: year,
                carbon: s.felling_residues.classes_at(step).to_vec(),
            }))
        })
    }

    pub fn save_thin_residues(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&ThinResiduesRow(ResidueRow {
                simulation_id,
                matrix_id,
                step: year,
                carbon: s.thinning_residues.classes_at(step).to_vec(),
            }))
        })
    }

    pub fn save_deadwood(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            store.insert_row(&DeadwoodRow {
                simulation_id,
                matrix_id,
                step: year,
                volume: s.deadwood.classes_at(step).to_vec(),
            })
        })
    }

    pub fn save_tree_c(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let simulation_id = session.simulation_id;
        self.for_each_stratum_step(session, |store, _, s, matrix_id, step, year| {
            let c = &s.tree_carbon;
            store.insert_row(&TreeCRow {
                simulation_id,
                matrix_id,
                step: year,
                stem: c.stem.classes_at(step).to_vec(),
                coarse_roots: c.coarse_roots.classes_at(step).to_vec(),
                fine_roots: c.fine_roots.classes_at(step).to_vec(),
                branches: c.branches.classes_at(step).to_vec(),
                leaves: c.leaves.classes_at(step).to_vec(),
            })
        })
    }

    /// Soil pools summed over all strata, one row per step.
    pub fn save_carbon_soil(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let steps = self.experiment.history_length();
        for step in 0..steps {
            let soil = SoilTotals::at(&self.experiment, step);
            let row = CarbonSoilRow {
                simulation_id: session.simulation_id,
                step: self.year(step),
                nwl: soil.nwl,
                fwl: soil.fwl,
                cwl: soil.cwl,
                sol: soil.sol,
                cel: soil.cel,
                lig: soil.lig,
                hum1: soil.hum1,
                hum2: soil.hum2,
                carbon_lost: soil.carbon_lost,
                litter_input: country_litter_input(&self.experiment, step),
            };
            self.store.insert_row(&row)?;
        }
        Ok(steps)
    }

    /// Tree and soil carbon summed over all strata, one row per step.
    pub fn save_carbon_country(&mut self, session: &ExportSession) -> Result<usize, EfiscenError> {
        let steps = self.experiment.history_length();
        for step in 0..steps {
            let mut row = CarbonCountryRow {
                simulation_id: session.simulation_id,
                step: self.year(step),
                soil: SoilTotals::at(&self.experiment, step).total(),
                litter_input: country_litter_input(&self.experiment, step),
                ..Default::default()
            };
            for s in self.experiment.strata.values() {
                let c = &s.tree_carbon;
                row.stem += c.stem.total_at(step);
                row.coarse_roots += c.coarse_roots.total_at(step);
                row.fine_roots += c.fine_roots.total_at(step);
                row.branches += c.branches.total_at(step);
                row.leaves += c.leaves.total_at(step);
            }
            self.store.insert_row(&row)?;
        }
        Ok(steps)
    }
}
