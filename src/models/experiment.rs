use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::key::StratumKey;
use super::series::{AgeClasses, TimeSeries};
use crate::error::EfiscenError;

/// Carbon content used when a stratum leaves it unset (fraction of dry mass).
pub const DEFAULT_CARBON_CONTENT: f64 = 0.5;
/// Wood density used when a stratum leaves it unset (t dry mass per m3).
pub const DEFAULT_WOOD_DENSITY: f64 = 0.45;

/// Per-stratum conversion parameters. A value of exactly 0 means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StratumParams {
    #[serde(default)]
    pub carbon_content: f64,
    #[serde(default)]
    pub wood_density: f64,
}

/// Soil carbon pools, one scalar per step each.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilSeries {
    /// Non-woody litter
    pub nwl: TimeSeries<f64>,
    /// Fine woody litter
    pub fwl: TimeSeries<f64>,
    /// Coarse woody litter
    pub cwl: TimeSeries<f64>,
    /// Soluble compounds
    pub sol: TimeSeries<f64>,
    /// Holocelluloses
    pub cel: TimeSeries<f64>,
    /// Lignin-like compounds
    pub lig: TimeSeries<f64>,
    /// Humus, first compartment
    pub hum1: TimeSeries<f64>,
    /// Humus, second compartment
    pub hum2: TimeSeries<f64>,
    /// Carbon released from the soil per year
    pub carbon_lost: TimeSeries<f64>,
}

impl SoilSeries {
    /// Sum of the eight pools at `step`.
    pub fn total_at(&self, step: usize) -> f64 {
        self.pools().iter().map(|p| p.total_at(step)).sum()
    }

    pub fn pools(&self) -> [&TimeSeries<f64>; 8] {
        [
            &self.nwl, &self.fwl, &self.cwl, &self.sol, &self.cel, &self.lig, &self.hum1,
            &self.hum2,
        ]
    }

    /// Longest recorded pool history.
    pub fn steps(&self) -> usize {
        self.pools().iter().map(|p| p.len()).max().unwrap_or(0)
    }
}

/// Tree carbon by compartment, distributed over age classes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeCarbonSeries {
    pub stem: TimeSeries<AgeClasses>,
    pub coarse_roots: TimeSeries<AgeClasses>,
    pub fine_roots: TimeSeries<AgeClasses>,
    pub branches: TimeSeries<AgeClasses>,
    pub leaves: TimeSeries<AgeClasses>,
}

impl TreeCarbonSeries {
    pub fn compartments(&self) -> [&TimeSeries<AgeClasses>; 5] {
        [
            &self.stem,
            &self.coarse_roots,
            &self.fine_roots,
            &self.branches,
            &self.leaves,
        ]
    }

    pub fn total_at(&self, step: usize) -> f64 {
        self.compartments().iter().map(|c| c.total_at(step)).sum()
    }
}

/// Everything the simulation recorded for one stratum.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stratum {
    pub params: StratumParams,
    pub area: TimeSeries<AgeClasses>,
    pub growing_stock: TimeSeries<AgeClasses>,
    pub deadwood: TimeSeries<AgeClasses>,
    /// Net annual increment per hectare
    pub increment: TimeSeries<f64>,
    pub natural_mortality: TimeSeries<AgeClasses>,
    pub thinning_area: TimeSeries<AgeClasses>,
    pub felling_area: TimeSeries<AgeClasses>,
    pub thinning_removals: TimeSeries<AgeClasses>,
    pub felling_removals: TimeSeries<AgeClasses>,
    pub thinning_residues: TimeSeries<AgeClasses>,
    pub felling_residues: TimeSeries<AgeClasses>,
    pub potential_felling_area: TimeSeries<f64>,
    pub potential_felling_volume: TimeSeries<f64>,
    pub bare_area: TimeSeries<f64>,
    pub afforestation: TimeSeries<f64>,
    pub soil: SoilSeries,
    pub tree_carbon: TreeCarbonSeries,
}

impl Stratum {
    /// Length of every recorded series, by field name.
    pub fn series_lengths(&self) -> [(&'static str, usize); 29] {
        let soil = &self.soil;
        let carbon = &self.tree_carbon;
        [
            ("area", self.area.len()),
            ("growing_stock", self.growing_stock.len()),
            ("deadwood", self.deadwood.len()),
            ("increment", self.increment.len()),
            ("natural_mortality", self.natural_mortality.len()),
            ("thinning_area", self.thinning_area.len()),
            ("felling_area", self.felling_area.len()),
            ("thinning_removals", self.thinning_removals.len()),
            ("felling_removals", self.felling_removals.len()),
            ("thinning_residues", self.thinning_residues.len()),
            ("felling_residues", self.felling_residues.len()),
            ("potential_felling_area", self.potential_felling_area.len()),
            ("potential_felling_volume", self.potential_felling_volume.len()),
            ("bare_area", self.bare_area.len()),
            ("afforestation", self.afforestation.len()),
            ("soil.nwl", soil.nwl.len()),
            ("soil.fwl", soil.fwl.len()),
            ("soil.cwl", soil.cwl.len()),
            ("soil.sol", soil.sol.len()),
            ("soil.cel", soil.cel.len()),
            ("soil.lig", soil.lig.len()),
            ("soil.hum1", soil.hum1.len()),
            ("soil.hum2", soil.hum2.len()),
            ("soil.carbon_lost", soil.carbon_lost.len()),
            ("tree_carbon.stem", carbon.stem.len()),
            ("tree_carbon.coarse_roots", carbon.coarse_roots.len()),
            ("tree_carbon.fine_roots", carbon.fine_roots.len()),
            ("tree_carbon.branches", carbon.branches.len()),
            ("tree_carbon.leaves", carbon.leaves.len()),
        ]
    }

    /// Number of steps recorded for this stratum: its longest series.
    pub fn steps(&self) -> usize {
        self.series_lengths()
            .iter()
            .map(|(_, len)| *len)
            .max()
            .unwrap_or(0)
    }
}

/// Recorded output of one simulation run, keyed by stratum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    /// Calendar year of step 0
    pub base_year: i32,
    /// Years per simulation step
    pub step_length: u32,
    #[serde(default)]
    pub strata: BTreeMap<StratumKey, Stratum>,
}

/// Handle through which the simulation driver shares its experiment.
pub type SharedExperiment = Arc<RwLock<Experiment>>;

impl Experiment {
    pub fn new(name: impl Into<String>, base_year: i32, step_length: u32) -> Self {
        Self {
            name: name.into(),
            base_year,
            step_length,
            strata: BTreeMap::new(),
        }
    }

    pub fn num_strata(&self) -> usize {
        self.strata.len()
    }

    pub fn stratum(&self, key: StratumKey) -> Option<&Stratum> {
        self.strata.get(&key)
    }

    /// Longest recorded history over every series of every stratum.
    pub fn history_length(&self) -> usize {
        self.strata.values().map(Stratum::steps).max().unwrap_or(0)
    }

    /// Calendar year of a step.
    pub fn year_of(&self, step: usize) -> i64 {
        i64::from(self.base_year) + step as i64 * i64::from(self.step_length)
    }

    /// Check that the step length is usable, that every key names a concrete
    /// stratum, and that every recorded series covers the whole history.
    ///
    /// An empty series is allowed and reads as zero at every step.
    pub fn validate(&self) -> Result<(), EfiscenError> {
        if self.step_length == 0 {
            return Err(EfiscenError::ValidationError(
                "step_length must be at least 1 year".to_string(),
            ));
        }
        let history = self.history_length();
        for (key, stratum) in &self.strata {
            if !key.is_packable() {
                return Err(EfiscenError::ValidationError(format!(
                    "stratum key {} has a region beyond 32 bits",
                    key.0
                )));
            }
            if !key.is_concrete() {
                return Err(EfiscenError::ValidationError(format!(
                    "stratum key {} ({key}) has a zero field; stratum ids start at 1",
                    key.0
                )));
            }
            for (name, len) in stratum.series_lengths() {
                if len != 0 && len != history {
                    return Err(EfiscenError::ValidationError(format!(
                        "stratum {key}: {name} has {len} steps, expected {history}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn into_shared(self) -> SharedExperiment {
        Arc::new(RwLock::new(self))
    }

    /// Take a point-in-time copy of a shared experiment.
    pub fn snapshot(shared: &SharedExperiment) -> Result<Arc<Experiment>, EfiscenError> {
        let guard = shared.read().map_err(|_| {
            EfiscenError::SessionAborted("experiment lock poisoned".to_string())
        })?;
        Ok(Arc::new(guard.clone()))
    }
}
