//! Quantities recomputed from raw series at export time.

use std::collections::HashMap;

use tracing::warn;

use crate::models::{
    Experiment, Stratum, StratumKey, StratumParams, DEFAULT_CARBON_CONTENT, DEFAULT_WOOD_DENSITY,
};

/// Litter input below this is treated as rounding noise.
pub const LITTER_INPUT_EPSILON: f64 = 0.001;

/// Carbon per cubic metre of stem wood: carbon content times wood density.
///
/// A parameter of exactly 0 is unset and replaced by its default.
pub fn carbon_factor(key: StratumKey, params: &StratumParams) -> f64 {
    let carbon_content = if params.carbon_content == 0.0 {
        warn!(stratum = %key, default = DEFAULT_CARBON_CONTENT, "carbon content unset");
        DEFAULT_CARBON_CONTENT
    } else {
        params.carbon_content
    };
    let wood_density = if params.wood_density == 0.0 {
        warn!(stratum = %key, default = DEFAULT_WOOD_DENSITY, "wood density unset");
        DEFAULT_WOOD_DENSITY
    } else {
        params.wood_density
    };
    carbon_content * wood_density
}

/// [`carbon_factor`] of every stratum, computed once each.
pub fn carbon_factors(experiment: &Experiment) -> HashMap<StratumKey, f64> {
    experiment
        .strata
        .iter()
        .map(|(key, stratum)| (*key, carbon_factor(*key, &stratum.params)))
        .collect()
}

/// Gross increment of a stratum over the interval ending at `step`.
///
/// Stock change plus everything that left the growing stock during the
/// previous step, with residue carbon converted back to volume. Expressed
/// per hectare per year when the stratum has area at `step`. Step 0 has no
/// previous interval and yields 0.
pub fn gross_increment(stratum: &Stratum, step: usize, step_length: u32, cfactor: f64) -> f64 {
    if step == 0 {
        return 0.0;
    }
    let prev = step - 1;
    let grincr = stratum.growing_stock.total_at(step) - stratum.growing_stock.total_at(prev)
        + stratum.thinning_removals.total_at(prev)
        + stratum.felling_removals.total_at(prev)
        + stratum.natural_mortality.total_at(prev)
        + stratum.thinning_residues.total_at(prev) / cfactor
        + stratum.felling_residues.total_at(prev) / cfactor;
    let area = stratum.area.total_at(step);
    if area > 0.0 {
        grincr / (area * f64::from(step_length))
    } else {
        grincr
    }
}

/// Carbon entering the soil over the interval ending at `step`.
///
/// `soil_prev`/`soil_now` are total soil carbon; `carbon_lost` is the annual
/// release at `step`. Values below [`LITTER_INPUT_EPSILON`] become 0.
pub fn litter_input(soil_prev: f64, soil_now: f64, carbon_lost: f64, step_length: u32) -> f64 {
    let litin = soil_now - soil_prev + f64::from(step_length) * carbon_lost;
    if litin < LITTER_INPUT_EPSILON {
        0.0
    } else {
        litin
    }
}

/// Country-wide soil pool totals at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilTotals {
    pub nwl: f64,
    pub fwl: f64,
    pub cwl: f64,
    pub sol: f64,
    pub cel: f64,
    pub lig: f64,
    pub hum1: f64,
    pub hum2: f64,
    pub carbon_lost: f64,
}

impl SoilTotals {
    pub fn at(experiment: &Experiment, step: usize) -> Self {
        experiment
            .strata
            .values()
            .fold(SoilTotals::default(), |acc, s| SoilTotals {
                nwl: acc.nwl + s.soil.nwl.total_at(step),
                fwl: acc.fwl + s.soil.fwl.total_at(step),
                cwl: acc.cwl + s.soil.cwl.total_at(step),
                sol: acc.sol + s.soil.sol.total_at(step),
                cel: acc.cel + s.soil.cel.total_at(step),
                lig: acc.lig + s.soil.lig.total_at(step),
                hum1: acc.hum1 + s.soil.hum1.total_at(step),
                hum2: acc.hum2 + s.soil.hum2.total_at(step),
                carbon_lost: acc.carbon_lost + s.soil.carbon_lost.total_at(step),
            })
    }

    pub fn total(&self) -> f64 {
        self.nwl + self.fwl + self.cwl + self.sol + self.cel + self.lig + self.hum1 + self.hum2
    }
}

/// Litter input for the whole country at `step`, 0 at step 0.
pub fn country_litter_input(experiment: &Experiment, step: usize) -> f64 {
    if step == 0 {
        return 0.0;
    }
    let prev = SoilTotals::at(experiment, step - 1);
    let now = SoilTotals::at(experiment, step);
    litter_input(
        prev.total(),
        now.total(),
        now.carbon_lost,
        experiment.step_length,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeClasses, SoilSeries, TimeSeries, AGE_CLASS_COUNT};
    use assert_approx_eq::assert_approx_eq;

    fn one_bucket(value: f64) -> AgeClasses {
        let mut classes = [0.0; AGE_CLASS_COUNT];
        classes[3] = value;
        classes
    }

    fn series(values: &[f64]) -> TimeSeries<AgeClasses> {
        values.iter().map(|v| one_bucket(*v)).collect()
    }

    #[test]
    fn test_carbon_factor_defaults() {
        let key = StratumKey::pack(1, 1, 1, 1);
        assert_approx_eq!(carbon_factor(key, &StratumParams::default()), 0.225);
        let params = StratumParams {
            carbon_content: 0.48,
            wood_density: 0.0,
        };
        assert_approx_eq!(carbon_factor(key, &params), 0.48 * 0.45);
        let params = StratumParams {
            carbon_content: 0.5,
            wood_density: 0.4,
        };
        assert_approx_eq!(carbon_factor(key, &params), 0.2);
    }

    #[test]
    fn test_carbon_factors_cover_every_stratum() {
        let mut exp = Experiment::new("factors", 2000, 5);
        exp.strata.insert(StratumKey::pack(1, 1, 1, 1), Stratum::default());
        let mut set = Stratum::default();
        set.params = StratumParams {
            carbon_content: 0.5,
            wood_density: 0.4,
        };
        exp.strata.insert(StratumKey::pack(1, 1, 1, 2), set);
        let factors = carbon_factors(&exp);
        assert_eq!(factors.len(), 2);
        assert_approx_eq!(factors[&StratumKey::pack(1, 1, 1, 1)], 0.225);
        assert_approx_eq!(factors[&StratumKey::pack(1, 1, 1, 2)], 0.2);
    }

    #[test]
    fn test_gross_increment_per_hectare_per_year() {
        let stratum = Stratum {
            area: series(&[10.0, 10.0]),
            growing_stock: series(&[1000.0, 1100.0]),
            thinning_removals: series(&[20.0, 0.0]),
            felling_removals: series(&[30.0, 0.0]),
            natural_mortality: series(&[5.0, 0.0]),
            thinning_residues: series(&[1.0, 0.0]),
            felling_residues: series(&[2.0, 0.0]),
            ..Default::default()
        };
        // 100 + 20 + 30 + 5 + 1/0.25 + 2/0.25 = 167, over 10 ha * 5 yr
        assert_approx_eq!(gross_increment(&stratum, 1, 5, 0.25), 3.34);
        assert_eq!(gross_increment(&stratum, 0, 5, 0.25), 0.0);
    }

    #[test]
    fn test_gross_increment_without_area_is_not_normalized() {
        let stratum = Stratum {
            area: series(&[10.0, 0.0]),
            growing_stock: series(&[100.0, 0.0]),
            felling_removals: series(&[100.0, 0.0]),
            ..Default::default()
        };
        assert_approx_eq!(gross_increment(&stratum, 1, 5, 0.225), 0.0);
        let stratum = Stratum {
            area: series(&[10.0, 0.0]),
            growing_stock: series(&[100.0, 20.0]),
            felling_removals: series(&[100.0, 0.0]),
            ..Default::default()
        };
        assert_approx_eq!(gross_increment(&stratum, 1, 5, 0.225), 20.0);
    }

    #[test]
    fn test_litter_input_clamps_noise() {
        assert_approx_eq!(litter_input(100.0, 102.0, 1.0, 5), 7.0);
        assert_eq!(litter_input(100.0, 100.0, 0.0001, 5), 0.0);
        assert_eq!(litter_input(100.0, 90.0, 1.0, 5), 0.0);
    }

    #[test]
    fn test_country_litter_input_sums_strata() {
        let mut exp = Experiment::new("soil", 2000, 5);
        for (species, hum) in [(1u8, [10.0, 12.0]), (2u8, [20.0, 21.0])] {
            let stratum = Stratum {
                soil: SoilSeries {
                    hum1: hum.to_vec().into(),
                    carbon_lost: vec![0.0, 0.5].into(),
                    ..Default::default()
                },
                ..Default::default()
            };
            exp.strata.insert(StratumKey::pack(1, 1, 1, species), stratum);
        }
        // (33 - 30) + 5 * (0.5 + 0.5)
        assert_approx_eq!(country_litter_input(&exp, 1), 8.0);
        assert_eq!(country_litter_input(&exp, 0), 0.0);
        assert_approx_eq!(SoilTotals::at(&exp, 1).total(), 33.0);
    }
}
