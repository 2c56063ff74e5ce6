mod key;
mod series;
mod experiment;
mod selection;

pub use key::StratumKey;
pub use series::{
    age_class_label, AgeClasses, StepValue, TimeSeries, AGE_CLASS_COUNT,
    AGE_CLASS_WIDTH,
};
pub use experiment::{
    Experiment, SharedExperiment, SoilSeries, Stratum, StratumParams, TreeCarbonSeries,
    DEFAULT_CARBON_CONTENT, DEFAULT_WOOD_DENSITY,
};
pub use selection::{parse_id_list, Selection};
