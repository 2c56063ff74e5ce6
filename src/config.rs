use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EfiscenError;
use crate::export::SimulationInfo;
use crate::models::Experiment;

/// Calendar settings of the recorded run. Unset values keep what the
/// experiment file says.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base_year: Option<i32>,
    pub step_length: Option<u32>,
}

/// Identifiers written to the `simulation` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub scenario_id: i64,
    pub country_id: i64,
    pub project_id: i64,
    pub param_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scenario_id: 1,
            country_id: 1,
            project_id: 1,
            param_file: String::new(),
        }
    }
}

/// Contents of a run configuration file.
///
/// ```toml
/// [simulation]
/// base_year = 1990
/// step_length = 5
///
/// [export]
/// scenario_id = 3
/// country_id = 14
/// project_id = 1
/// param_file = "nl_params.txt"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    pub export: ExportConfig,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EfiscenError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "loaded run configuration");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, EfiscenError> {
        let config: RunConfig = toml::from_str(content)?;
        if config.simulation.step_length == Some(0) {
            return Err(EfiscenError::ValidationError(
                "simulation.step_length must be at least 1 year".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn to_info(&self) -> SimulationInfo {
        SimulationInfo {
            scenario_id: self.export.scenario_id,
            country_id: self.export.country_id,
            project_id: self.export.project_id,
            param_file: self.export.param_file.clone(),
        }
    }

    /// Override the experiment's calendar with any configured values.
    pub fn apply_to(&self, experiment: &mut Experiment) {
        if let Some(year) = self.simulation.base_year {
            experiment.base_year = year;
        }
        if let Some(len) = self.simulation.step_length {
            experiment.step_length = len;
        }
    }
}
