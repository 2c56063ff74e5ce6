use crate::analysis::Metric;
use crate::models::{AgeClasses, Experiment, Selection, Stratum, TimeSeries, AGE_CLASS_COUNT};

/// Age-class series backing a metric, if it has one.
fn age_class_series(metric: Metric, s: &Stratum) -> Option<&TimeSeries<AgeClasses>> {
    let series = match metric {
        Metric::Area => &s.area,
        Metric::GrowingStock => &s.growing_stock,
        Metric::DeadWood => &s.deadwood,
        Metric::NatMort => &s.natural_mortality,
        Metric::ThinArea => &s.thinning_area,
        Metric::FellArea => &s.felling_area,
        Metric::ThinRems => &s.thinning_removals,
        Metric::FelRems => &s.felling_removals,
        Metric::Stem => &s.tree_carbon.stem,
        Metric::CRoots => &s.tree_carbon.coarse_roots,
        Metric::FRoots => &s.tree_carbon.fine_roots,
        Metric::Branches => &s.tree_carbon.branches,
        Metric::Leaves => &s.tree_carbon.leaves,
        _ => return None,
    };
    Some(series)
}

/// One stratum's contribution to a summed metric.
///
/// For the area-weighted metrics this is the numerator term before
/// weighting: the raw increment for `IncrAv`, the growing stock for `AvgVolume`.
fn stratum_value(metric: Metric, s: &Stratum, step: usize) -> f64 {
    if let Some(series) = age_class_series(metric, s) {
        return series.total_at(step);
    }
    match metric {
        Metric::IncrAv => s.increment.total_at(step),
        Metric::AvgVolume => s.growing_stock.total_at(step),
        Metric::PotentFellArea => s.potential_felling_area.total_at(step),
        Metric::PotentFellVol => s.potential_felling_volume.total_at(step),
        Metric::BareArea => s.bare_area.total_at(step),
        Metric::AfforFund => s.afforestation.total_at(step),
        Metric::Nwl => s.soil.nwl.total_at(step),
        Metric::Fwl => s.soil.fwl.total_at(step),
        Metric::Cwl => s.soil.cwl.total_at(step),
        Metric::Sol => s.soil.sol.total_at(step),
        Metric::Cel => s.soil.cel.total_at(step),
        Metric::Lig => s.soil.lig.total_at(step),
        Metric::Hum1 => s.soil.hum1.total_at(step),
        Metric::Hum2 => s.soil.hum2.total_at(step),
        Metric::Cout => s.soil.carbon_lost.total_at(step),
        Metric::CSoil => s.soil.total_at(step),
        Metric::TCarbon => s.tree_carbon.total_at(step),
        // Covered by `age_class_series` above.
        _ => 0.0,
    }
}

/// Numerator and total area of an area-weighted metric over some strata.
fn weighted_terms<'a>(
    metric: Metric,
    strata: impl Iterator<Item = &'a Stratum>,
    step: usize,
) -> (f64, f64) {
    strata.fold((0.0, 0.0), |(num, den), s| {
        let area = s.area.total_at(step);
        let value = stratum_value(metric, s, step);
        match metric {
            Metric::IncrAv => (num + value * area, den + area),
            _ => (num + value, den + area),
        }
    })
}

/// Sums output metrics over the strata of an experiment that fall inside a selection.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    experiment: &'a Experiment,
    selection: &'a Selection,
}

impl<'a> Aggregator<'a> {
    pub fn new(experiment: &'a Experiment, selection: &'a Selection) -> Self {
        Self {
            experiment,
            selection,
        }
    }

    /// Strata whose key lies inside the selection, in key order.
    pub fn matched(&self) -> impl Iterator<Item = &'a Stratum> + Clone + 'a {
        let selection = self.selection;
        self.experiment
            .strata
            .iter()
            .filter(move |(key, _)| selection.matches(**key))
            .map(|(_, stratum)| stratum)
    }

    pub fn num_matched(&self) -> usize {
        self.matched().count()
    }

    /// Aggregated value at one step, or `None` when an area-weighted metric
    /// has no area to weight by.
    pub fn value_at(&self, metric: Metric, step: usize) -> Option<f64> {
        if metric.is_area_weighted() {
            let (num, den) = weighted_terms(metric, self.matched(), step);
            if den == 0.0 {
                return None;
            }
            return Some(num / den);
        }
        Some(self.matched().map(|s| stratum_value(metric, s, step)).sum())
    }

    /// Lazy `(step, value)` sequence over the recorded history.
    ///
    /// Steps where an area-weighted metric has zero total area are left out.
    /// The iterator is `Clone`, so a chart can walk it more than once.
    pub fn series(&self, metric: Metric) -> impl Iterator<Item = (usize, f64)> + Clone + 'a {
        let this = *self;
        (0..self.experiment.history_length())
            .filter_map(move |step| this.value_at(metric, step).map(|v| (step, v)))
    }

    /// Aggregated value at the last step of the experiment's history.
    ///
    /// `IncrAv` falls back to 0 when there is no area. `AvgVolume` divides
    /// unguarded, so zero total area yields NaN or infinity.
    pub fn latest(&self, metric: Metric) -> f64 {
        let step = self.experiment.history_length().saturating_sub(1);
        match metric {
            Metric::IncrAv => {
                let (num, den) = weighted_terms(metric, self.matched(), step);
                if den == 0.0 {
                    0.0
                } else {
                    num / den
                }
            }
            Metric::AvgVolume => {
                let (num, den) = weighted_terms(metric, self.matched(), step);
                num / den
            }
            _ => self.matched().map(|s| stratum_value(metric, s, step)).sum(),
        }
    }

    /// Summed age-class distribution of a metric at one step.
    ///
    /// Returns `None` for metrics that are not recorded per age class.
    pub fn distribution_at(&self, metric: Metric, step: usize) -> Option<AgeClasses> {
        if !metric.has_age_classes() {
            return None;
        }
        let mut total = [0.0; AGE_CLASS_COUNT];
        for series in self.matched().filter_map(|s| age_class_series(metric, s)) {
            for (acc, v) in total.iter_mut().zip(series.classes_at(step)) {
                *acc += v;
            }
        }
        Some(total)
    }

    /// Latest value of several metrics at once.
    pub fn summary(&self, metrics: &[Metric]) -> Vec<(Metric, f64)> {
        metrics.iter().map(|&m| (m, self.latest(m))).collect()
    }
}
